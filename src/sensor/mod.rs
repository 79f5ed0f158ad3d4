// src/sensor/mod.rs

// Ranging driver and the classifier that turns its output into a status.
pub mod classifier;
pub mod ultrasonic;

use core::fmt::Debug;

use crate::common::types::Distance;

/// Anything that can produce one distance sample per cycle.
pub trait DistanceSensor {
    type Error: Debug;

    /// Puts the sensor's output lines in their idle state.
    fn prepare(&mut self) -> Result<(), Self::Error>;

    /// Takes one blocking reading.
    fn measure_distance(&mut self) -> Result<Distance, Self::Error>;
}

// --- Public Re-exports ---
pub use classifier::{classify, Classifier};
pub use ultrasonic::{RangingSettings, Ultrasonic};
