// src/lib.rs

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod common;
pub mod node;
pub mod radio;
pub mod sensor;

#[cfg(feature = "esp-idf")]
pub mod platform;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use common::{NodeConfig, OccupancyStatus, PeerAddress, RadioError, SensorError};
pub use node::{Board, CycleReport, OccupancyNode, WakeClockState};
pub use radio::Radio;
pub use sensor::{Classifier, DistanceSensor, Ultrasonic};
