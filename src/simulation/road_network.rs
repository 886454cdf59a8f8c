//! Road network: segments, lanes, intersections and segment adjacency
//!
//! Segments and intersections refer to each other by id only; every relation
//! is resolved through the owning [`RoadNetwork`]. The network also maintains
//! a directed petgraph graph whose nodes are segments and whose edges join
//! segments sharing an intersection, which the pathfinder searches.

use log::debug;
use ordered_float::OrderedFloat;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{
    IntersectionId, LaneId, PathStep, SegmentEnd, SegmentId, Vec2, DEFAULT_LANE_WIDTH,
    DEGENERATE_LENGTH,
};

/// A road network shared between the simulation and an editor.
pub type SharedRoadNetwork = Rc<RefCell<RoadNetwork>>;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// What a lane may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LaneType {
    #[default]
    Driving,
    Parking,
    Bike,
    Bus,
    Emergency,
    Sidewalk,
}

/// A sub-channel of a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lane {
    id: LaneId,
    width: f32,
    lane_type: LaneType,
}

impl Lane {
    pub fn id(&self) -> LaneId {
        self.id
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn lane_type(&self) -> LaneType {
        self.lane_type
    }

    /// Only driving lanes carry general traffic
    pub fn is_drivable(&self) -> bool {
        self.lane_type == LaneType::Driving
    }

    /// Signed perpendicular offset of the lane centre from the segment
    /// centreline. Even lanes sit on the left of the travel direction, odd
    /// lanes on the right.
    pub fn offset(&self) -> f32 {
        let index = self.id.0;
        if index % 2 == 0 {
            (index / 2) as f32 * self.width + self.width / 2.0
        } else {
            -(((index + 1) / 2) as f32 * self.width) - self.width / 2.0
        }
    }
}

/// A straight stretch of road between two points
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    id: SegmentId,
    start: Vec2,
    end: Vec2,
    length: f32,
    lanes: Vec<Lane>,
    start_intersection: Option<IntersectionId>,
    end_intersection: Option<IntersectionId>,
}

impl Segment {
    pub(crate) fn new(id: SegmentId, start: Vec2, end: Vec2) -> Self {
        Self {
            id,
            start,
            end,
            length: start.distance(end),
            lanes: Vec::new(),
            start_intersection: None,
            end_intersection: None,
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn start(&self) -> Vec2 {
        self.start
    }

    pub fn end(&self) -> Vec2 {
        self.end
    }

    pub fn endpoint(&self, end: SegmentEnd) -> Vec2 {
        match end {
            SegmentEnd::Start => self.start,
            SegmentEnd::End => self.end,
        }
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn lane(&self, lane: LaneId) -> Option<&Lane> {
        self.lanes.get(lane.index())
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Total width of all lanes
    pub fn width(&self) -> f32 {
        self.lanes.iter().map(Lane::width).sum()
    }

    pub fn start_intersection(&self) -> Option<IntersectionId> {
        self.start_intersection
    }

    pub fn end_intersection(&self) -> Option<IntersectionId> {
        self.end_intersection
    }

    pub fn intersection_at(&self, end: SegmentEnd) -> Option<IntersectionId> {
        match end {
            SegmentEnd::Start => self.start_intersection,
            SegmentEnd::End => self.end_intersection,
        }
    }

    fn set_intersection(&mut self, end: SegmentEnd, intersection: Option<IntersectionId>) {
        match end {
            SegmentEnd::Start => self.start_intersection = intersection,
            SegmentEnd::End => self.end_intersection = intersection,
        }
    }

    pub(crate) fn push_lane(&mut self, width: f32, lane_type: LaneType) -> LaneId {
        let id = LaneId(self.lanes.len() as u32);
        self.lanes.push(Lane {
            id,
            width,
            lane_type,
        });
        id
    }

    /// Point on the centreline `distance` units from the start, clamped to
    /// the segment
    pub fn point_at_distance(&self, distance: f32) -> Vec2 {
        if self.length < DEGENERATE_LENGTH {
            return self.start;
        }
        let t = distance.clamp(0.0, self.length) / self.length;
        self.start + (self.end - self.start) * t
    }

    /// Unit travel direction; constant along a straight segment
    pub fn direction_at_distance(&self, _distance: f32) -> Vec2 {
        (self.end - self.start).normalize_or_zero()
    }

    /// Centre of `lane` at `distance`, or the centreline point for an
    /// unknown lane
    pub fn lane_position_at_distance(&self, lane: LaneId, distance: f32) -> Vec2 {
        let point = self.point_at_distance(distance);
        match self.lane(lane) {
            Some(lane) => point + self.direction_at_distance(distance).perp() * lane.offset(),
            None => point,
        }
    }

    /// Closest point of the segment to `point`, with its distance along the
    /// segment
    pub fn closest_point(&self, point: Vec2) -> (Vec2, f32) {
        if self.length < DEGENERATE_LENGTH {
            return (self.start, 0.0);
        }
        let direction = (self.end - self.start) / self.length;
        let along = (point - self.start).dot(direction).clamp(0.0, self.length);
        (self.start + direction * along, along)
    }
}

/// A junction joining segments, with its lane-to-lane connection table
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    id: IntersectionId,
    position: Vec2,
    attachments: Vec<(SegmentId, SegmentEnd)>,
    connections: BTreeMap<PathStep, Vec<PathStep>>,
}

impl Intersection {
    pub(crate) fn new(id: IntersectionId, position: Vec2) -> Self {
        Self {
            id,
            position,
            attachments: Vec::new(),
            connections: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> IntersectionId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Attached segments, each with the endpoint that touches this junction
    pub fn attachments(&self) -> &[(SegmentId, SegmentEnd)] {
        &self.attachments
    }

    pub fn connected_segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.attachments.iter().map(|(segment, _)| *segment)
    }

    /// Full connection table, keyed by incoming (segment, lane)
    pub fn connections(&self) -> &BTreeMap<PathStep, Vec<PathStep>> {
        &self.connections
    }

    /// Outgoing (segment, lane) pairs reachable from `from`
    pub fn allowed_destinations(&self, from: PathStep) -> &[PathStep] {
        self.connections
            .get(&from)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of (from, to) pairs in the connection table
    pub fn connection_count(&self) -> usize {
        self.connections.values().map(Vec::len).sum()
    }

    pub(crate) fn define_connection(&mut self, from: PathStep, to: PathStep) {
        let destinations = self.connections.entry(from).or_default();
        if !destinations.contains(&to) {
            destinations.push(to);
        }
    }

    pub(crate) fn attach(&mut self, segment: SegmentId, end: SegmentEnd) {
        if !self.attachments.contains(&(segment, end)) {
            self.attachments.push((segment, end));
        }
    }

    /// Drops one attachment of `segment`, scrubbing its connection entries
    /// once no attachment of it remains
    fn detach(&mut self, segment: SegmentId, end: SegmentEnd) {
        self.attachments.retain(|attachment| *attachment != (segment, end));
        if self.attachments.iter().all(|(id, _)| *id != segment) {
            self.scrub(segment);
        }
    }

    fn scrub(&mut self, segment: SegmentId) {
        self.connections.retain(|from, _| from.segment != segment);
        for destinations in self.connections.values_mut() {
            destinations.retain(|to| to.segment != segment);
        }
        self.connections.retain(|_, destinations| !destinations.is_empty());
    }
}

/// Owns every segment and intersection of a road network
#[derive(Debug)]
pub struct RoadNetwork {
    segments: BTreeMap<SegmentId, Segment>,
    intersections: BTreeMap<IntersectionId, Intersection>,
    next_segment_id: u32,
    next_intersection_id: u32,

    /// Segment adjacency. An edge a -> b exists when a and b share an
    /// intersection; its weight is the length of a.
    graph: StableDiGraph<SegmentId, f32>,
    segment_to_node: HashMap<SegmentId, NodeIndex>,

    /// Bumped on every structural edit
    revision: u64,
    /// Unique per network value; clones and cleared networks get a new one
    generation: u64,
}

impl Default for RoadNetwork {
    fn default() -> Self {
        Self {
            segments: BTreeMap::new(),
            intersections: BTreeMap::new(),
            next_segment_id: 0,
            next_intersection_id: 0,
            graph: StableDiGraph::default(),
            segment_to_node: HashMap::new(),
            revision: 0,
            generation: next_generation(),
        }
    }
}

impl Clone for RoadNetwork {
    fn clone(&self) -> Self {
        Self {
            segments: self.segments.clone(),
            intersections: self.intersections.clone(),
            next_segment_id: self.next_segment_id,
            next_intersection_id: self.next_intersection_id,
            graph: self.graph.clone(),
            segment_to_node: self.segment_to_node.clone(),
            revision: self.revision,
            generation: next_generation(),
        }
    }
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedRoadNetwork {
        Rc::new(RefCell::new(self))
    }

    /// Structural edit counter; changes whenever routes may have changed
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Identifies this network value. Two networks never share a
    /// generation, even when their revisions match.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// (generation, revision) pair that changes whenever cached routes
    /// may no longer hold
    pub fn version(&self) -> (u64, u64) {
        (self.generation, self.revision)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Creates a lane-less segment between two points
    pub fn create_segment(&mut self, start: Vec2, end: Vec2) -> SegmentId {
        let id = SegmentId(self.next_segment_id);
        self.next_segment_id += 1;
        self.insert_segment(Segment::new(id, start, end));
        debug!("Created segment {:?} from {:?} to {:?}", id, start, end);
        id
    }

    /// Creates a segment with one default driving lane
    pub fn create_road(&mut self, start: Vec2, end: Vec2) -> SegmentId {
        let id = self.create_segment(start, end);
        self.add_lane(id, DEFAULT_LANE_WIDTH, LaneType::Driving);
        id
    }

    pub(crate) fn insert_segment(&mut self, segment: Segment) {
        let id = segment.id;
        let node = self.graph.add_node(id);
        self.segment_to_node.insert(id, node);
        self.segments.insert(id, segment);
        self.next_segment_id = self.next_segment_id.max(id.0 + 1);
        self.touch();
    }

    /// Appends a lane; `None` if the segment is unknown
    pub fn add_lane(
        &mut self,
        segment: SegmentId,
        width: f32,
        lane_type: LaneType,
    ) -> Option<LaneId> {
        let lane = self.segments.get_mut(&segment)?.push_lane(width, lane_type);
        self.touch();
        Some(lane)
    }

    pub fn create_intersection(&mut self, position: Vec2) -> IntersectionId {
        let id = IntersectionId(self.next_intersection_id);
        self.next_intersection_id += 1;
        self.insert_intersection(Intersection::new(id, position));
        id
    }

    pub(crate) fn insert_intersection(&mut self, intersection: Intersection) {
        let id = intersection.id;
        self.intersections.insert(id, intersection);
        self.next_intersection_id = self.next_intersection_id.max(id.0 + 1);
        self.touch();
    }

    /// Joins two segment endpoints through a new intersection at their
    /// midpoint, allowing every lane of each to continue onto every lane of
    /// the other.
    ///
    /// Returns `None` if either segment is unknown.
    pub fn connect_with_intersection(
        &mut self,
        a: SegmentId,
        end_a: SegmentEnd,
        b: SegmentId,
        end_b: SegmentEnd,
    ) -> Option<IntersectionId> {
        let (point_a, lanes_a) = {
            let segment = self.segments.get(&a)?;
            (segment.endpoint(end_a), segment.lane_count())
        };
        let (point_b, lanes_b) = {
            let segment = self.segments.get(&b)?;
            (segment.endpoint(end_b), segment.lane_count())
        };

        let intersection = self.create_intersection((point_a + point_b) * 0.5);
        self.attach_segment(intersection, a, end_a);
        self.attach_segment(intersection, b, end_b);

        for lane_a in 0..lanes_a as u32 {
            for lane_b in 0..lanes_b as u32 {
                let from_a = PathStep::new(a, LaneId(lane_a));
                let from_b = PathStep::new(b, LaneId(lane_b));
                self.define_connection(intersection, from_a, from_b);
                self.define_connection(intersection, from_b, from_a);
            }
        }

        debug!(
            "Connected {:?} ({:?}) and {:?} ({:?}) at intersection {:?}",
            a, end_a, b, end_b, intersection
        );
        Some(intersection)
    }

    /// Attaches one endpoint of a segment to an intersection, replacing
    /// whatever intersection that endpoint was attached to before.
    ///
    /// Returns `false` if either id is unknown.
    pub fn attach_segment(
        &mut self,
        intersection: IntersectionId,
        segment: SegmentId,
        end: SegmentEnd,
    ) -> bool {
        if !self.intersections.contains_key(&intersection) {
            return false;
        }
        let previous = match self.segments.get_mut(&segment) {
            Some(seg) => {
                let previous = seg.intersection_at(end);
                seg.set_intersection(end, Some(intersection));
                previous
            }
            None => return false,
        };

        if let Some(previous) = previous.filter(|previous| *previous != intersection) {
            if let Some(old) = self.intersections.get_mut(&previous) {
                old.detach(segment, end);
            }
        }
        if let Some(junction) = self.intersections.get_mut(&intersection) {
            junction.attach(segment, end);
        }

        self.rebuild_adjacency();
        self.touch();
        true
    }

    /// Adds one lane-to-lane movement to an intersection's connection table.
    ///
    /// Returns `false` if the intersection is unknown.
    pub fn define_connection(
        &mut self,
        intersection: IntersectionId,
        from: PathStep,
        to: PathStep,
    ) -> bool {
        match self.intersections.get_mut(&intersection) {
            Some(junction) => {
                junction.define_connection(from, to);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Removes a segment, detaching it from its intersections and scrubbing
    /// every connection that referenced it
    pub fn remove_segment(&mut self, id: SegmentId) -> bool {
        let Some(segment) = self.segments.remove(&id) else {
            return false;
        };

        for end in [SegmentEnd::Start, SegmentEnd::End] {
            if let Some(junction) = segment
                .intersection_at(end)
                .and_then(|intersection| self.intersections.get_mut(&intersection))
            {
                junction.detach(id, end);
            }
        }

        if let Some(node) = self.segment_to_node.remove(&id) {
            self.graph.remove_node(node);
        }

        self.rebuild_adjacency();
        self.touch();
        debug!("Removed segment {:?}", id);
        true
    }

    /// Removes an intersection, leaving its segments with an open endpoint
    pub fn remove_intersection(&mut self, id: IntersectionId) -> bool {
        let Some(intersection) = self.intersections.remove(&id) else {
            return false;
        };

        for (segment, end) in intersection.attachments {
            if let Some(seg) = self.segments.get_mut(&segment) {
                if seg.intersection_at(end) == Some(id) {
                    seg.set_intersection(end, None);
                }
            }
        }

        self.rebuild_adjacency();
        self.touch();
        true
    }

    /// Recomputes every adjacency edge from the intersections, in id order
    fn rebuild_adjacency(&mut self) {
        self.graph.clear_edges();

        for intersection in self.intersections.values() {
            for (from, _) in &intersection.attachments {
                for (to, _) in &intersection.attachments {
                    if from == to {
                        continue;
                    }
                    let (Some(&from_node), Some(&to_node), Some(from_segment)) = (
                        self.segment_to_node.get(from),
                        self.segment_to_node.get(to),
                        self.segments.get(from),
                    ) else {
                        continue;
                    };
                    self.graph
                        .update_edge(from_node, to_node, from_segment.length);
                }
            }
        }
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }

    pub fn intersection(&self, id: IntersectionId) -> Option<&Intersection> {
        self.intersections.get(&id)
    }

    /// All segments in ascending id order
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// All intersections in ascending id order
    pub fn intersections(&self) -> impl Iterator<Item = &Intersection> {
        self.intersections.values()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    pub fn point_at_distance(&self, segment: SegmentId, distance: f32) -> Option<Vec2> {
        Some(self.segment(segment)?.point_at_distance(distance))
    }

    pub fn direction_at_distance(&self, segment: SegmentId, distance: f32) -> Option<Vec2> {
        Some(self.segment(segment)?.direction_at_distance(distance))
    }

    pub fn lane_position_at_distance(
        &self,
        segment: SegmentId,
        lane: LaneId,
        distance: f32,
    ) -> Option<Vec2> {
        Some(self.segment(segment)?.lane_position_at_distance(lane, distance))
    }

    /// Segments reachable from `segment` through a shared intersection
    pub fn neighbors(&self, segment: SegmentId) -> Vec<SegmentId> {
        let Some(&node) = self.segment_to_node.get(&segment) else {
            return Vec::new();
        };
        let mut neighbors: Vec<SegmentId> = self
            .graph
            .neighbors(node)
            .map(|neighbor| self.graph[neighbor])
            .collect();
        neighbors.sort();
        neighbors
    }

    pub(crate) fn adjacency(&self) -> &StableDiGraph<SegmentId, f32> {
        &self.graph
    }

    pub(crate) fn node_of(&self, segment: SegmentId) -> Option<NodeIndex> {
        self.segment_to_node.get(&segment).copied()
    }

    /// Segment closest to `point`, if any lies strictly within `max_distance`.
    /// Exact ties go to the lowest id.
    pub fn find_nearest_segment(&self, point: Vec2, max_distance: f32) -> Option<SegmentId> {
        self.find_closest_point_on_segment(point, max_distance)
            .map(|(segment, _, _)| segment)
    }

    /// Closest point on any segment within `max_distance`.
    /// Returns (segment, closest point, distance along the segment).
    pub fn find_closest_point_on_segment(
        &self,
        point: Vec2,
        max_distance: f32,
    ) -> Option<(SegmentId, Vec2, f32)> {
        self.segments
            .values()
            .map(|segment| {
                let (closest, along) = segment.closest_point(point);
                (segment.id, closest, along, closest.distance(point))
            })
            .filter(|(_, _, _, distance)| *distance < max_distance)
            .min_by_key(|(_, _, _, distance)| OrderedFloat(*distance))
            .map(|(segment, closest, along, _)| (segment, closest, along))
    }

    /// Intersection closest to `point`, if any lies strictly within
    /// `max_distance`
    pub fn find_nearest_intersection(
        &self,
        point: Vec2,
        max_distance: f32,
    ) -> Option<IntersectionId> {
        self.intersections
            .values()
            .map(|intersection| (intersection.id, intersection.position.distance(point)))
            .filter(|(_, distance)| *distance < max_distance)
            .min_by_key(|(_, distance)| OrderedFloat(*distance))
            .map(|(id, _)| id)
    }

    /// Drops every segment and intersection and restarts id allocation.
    /// The cleared network counts as a new one for route caching.
    pub fn clear(&mut self) {
        let revision = self.revision;
        *self = Self::default();
        self.revision = revision + 1;
        debug!("Cleared road network");
    }
}
