// src/sensor/classifier.rs

use crate::common::{
    timing,
    types::{Distance, OccupancyStatus},
};

/// Threshold classifier. Pure and total over every `f32`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Classifier {
    threshold_cm: f32,
}

impl Classifier {
    pub const fn new(threshold_cm: f32) -> Self {
        Self { threshold_cm }
    }

    pub const fn threshold_cm(&self) -> f32 {
        self.threshold_cm
    }

    /// `Occupied` iff strictly nearer than the threshold.
    ///
    /// Zero (the failed-reading sentinel) and negative distances are occupied.
    /// NaN compares false, so it is `Free`.
    pub fn classify(&self, distance: Distance) -> OccupancyStatus {
        if distance.as_cm() < self.threshold_cm {
            OccupancyStatus::Occupied
        } else {
            OccupancyStatus::Free
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(timing::THRESHOLD_CM)
    }
}

/// Classifies against the reference 50 cm threshold.
pub fn classify(distance: Distance) -> OccupancyStatus {
    Classifier::default().classify(distance)
}
