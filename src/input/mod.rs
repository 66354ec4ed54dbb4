//! Hosts that feed light endpoints and consume what they publish.

pub mod mqtt;
pub mod simulation;
