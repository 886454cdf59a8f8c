//! Plain-record interchange shape of a road network
//!
//! Save/load formats live outside the core; they only need to move these
//! records around. Lane order and connection tables survive a round trip.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::road_network::{Intersection, LaneType, RoadNetwork, Segment};
use super::types::{IntersectionId, PathStep, SegmentEnd, SegmentId, Vec2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneRecord {
    pub width: f32,
    pub lane_type: LaneType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: SegmentId,
    pub start: Vec2,
    pub end: Vec2,
    pub start_intersection: Option<IntersectionId>,
    pub end_intersection: Option<IntersectionId>,
    pub lanes: Vec<LaneRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub segment: SegmentId,
    pub is_start: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub from: PathStep,
    pub to: Vec<PathStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionRecord {
    pub id: IntersectionId,
    pub position: Vec2,
    pub attachments: Vec<AttachmentRecord>,
    pub connections: Vec<ConnectionRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub segments: Vec<SegmentRecord>,
    pub intersections: Vec<IntersectionRecord>,
}

impl RoadNetwork {
    /// Captures every segment and intersection in ascending id order
    pub fn snapshot(&self) -> NetworkSnapshot {
        let segments = self
            .segments()
            .map(|segment| SegmentRecord {
                id: segment.id(),
                start: segment.start(),
                end: segment.end(),
                start_intersection: segment.start_intersection(),
                end_intersection: segment.end_intersection(),
                lanes: segment
                    .lanes()
                    .iter()
                    .map(|lane| LaneRecord {
                        width: lane.width(),
                        lane_type: lane.lane_type(),
                    })
                    .collect(),
            })
            .collect();

        let intersections = self
            .intersections()
            .map(|intersection| IntersectionRecord {
                id: intersection.id(),
                position: intersection.position(),
                attachments: intersection
                    .attachments()
                    .iter()
                    .map(|(segment, end)| AttachmentRecord {
                        segment: *segment,
                        is_start: end.is_start(),
                    })
                    .collect(),
                connections: intersection
                    .connections()
                    .iter()
                    .map(|(from, to)| ConnectionRecord {
                        from: *from,
                        to: to.clone(),
                    })
                    .collect(),
            })
            .collect();

        NetworkSnapshot {
            segments,
            intersections,
        }
    }

    /// Rebuilds a network, keeping the recorded ids.
    ///
    /// Fails when records repeat an id, or when a segment and an
    /// intersection disagree about which endpoint is attached where.
    pub fn from_snapshot(snapshot: &NetworkSnapshot) -> Result<RoadNetwork> {
        let mut network = RoadNetwork::new();

        for record in &snapshot.segments {
            if network.segment(record.id).is_some() {
                bail!("Duplicate segment {:?} in snapshot", record.id);
            }
            let mut segment = Segment::new(record.id, record.start, record.end);
            for lane in &record.lanes {
                segment.push_lane(lane.width, lane.lane_type);
            }
            network.insert_segment(segment);
        }

        for record in &snapshot.intersections {
            if network.intersection(record.id).is_some() {
                bail!("Duplicate intersection {:?} in snapshot", record.id);
            }
            network.insert_intersection(Intersection::new(record.id, record.position));

            for attachment in &record.attachments {
                let end = if attachment.is_start {
                    SegmentEnd::Start
                } else {
                    SegmentEnd::End
                };
                if !network.attach_segment(record.id, attachment.segment, end) {
                    bail!(
                        "Intersection {:?} attaches unknown segment {:?}",
                        record.id,
                        attachment.segment
                    );
                }
            }

            for connection in &record.connections {
                for to in &connection.to {
                    network.define_connection(record.id, connection.from, *to);
                }
            }
        }

        for record in &snapshot.segments {
            let segment = network
                .segment(record.id)
                .with_context(|| format!("Segment {:?} missing after rebuild", record.id))?;
            if segment.start_intersection() != record.start_intersection
                || segment.end_intersection() != record.end_intersection
            {
                bail!(
                    "Segment {:?} endpoints disagree with intersection attachments",
                    record.id
                );
            }
        }

        Ok(network)
    }
}
