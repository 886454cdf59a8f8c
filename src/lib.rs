//! Traffic Simulation Core
//!
//! A real-time traffic simulation library: vehicles routed over a road
//! network, advanced tick by tick.

pub mod simulation;
