// src/common/types.rs

use core::fmt;
use core::time::Duration;

// --- Distance sample ---

/// One ranging result in centimeters.
///
/// Produced once per cycle and dropped after classification. A failed reading
/// is represented by [`Distance::SENTINEL`] (0 cm), which classifies as
/// occupied.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Distance(f32);

impl Distance {
    /// Reported when no usable echo was measured.
    pub const SENTINEL: Distance = Distance(0.0);

    pub const fn from_cm(cm: f32) -> Self {
        Self(cm)
    }

    /// Converts a round-trip echo width to a one-way distance.
    ///
    /// `speed_of_sound` is in cm per microsecond.
    pub fn from_echo(width: Duration, speed_of_sound: f32) -> Self {
        let micros = width.as_micros() as f32;
        Self(micros * speed_of_sound / 2.0)
    }

    pub fn as_cm(&self) -> f32 {
        self.0
    }

    /// Echo width that would produce `cm` at the given speed of sound.
    pub fn echo_width(cm: f32, speed_of_sound: f32) -> Duration {
        let micros = (cm * 2.0 / speed_of_sound) as u64;
        Duration::from_micros(micros)
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} cm", self.0)
    }
}

// --- Occupancy status ---

/// Two-valued classification result, sent to the peer as text.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OccupancyStatus {
    Occupied,
    Free,
}

impl OccupancyStatus {
    /// Wire text without the terminator.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OccupancyStatus::Occupied => "OCCUPIED",
            OccupancyStatus::Free => "FREE",
        }
    }

    /// Level of the local status indicator.
    pub const fn indicator_on(&self) -> bool {
        matches!(self, OccupancyStatus::Occupied)
    }
}

impl fmt::Display for OccupancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Wake cause ---

/// Why the processor is running this cycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WakeCause {
    /// Power was applied; retained memory holds garbage.
    ColdBoot,
    /// The sleep timer fired.
    Timer,
    /// Any other reset (watchdog, brownout, external reset...).
    Other,
}

// --- Cycle timings ---

/// Per-phase elapsed times for one cycle. Diagnostic only, never persisted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CycleTimings {
    /// Radio bring-up, including its settle delay.
    pub radio_on: Duration,
    /// Trigger pulse through echo measurement.
    pub sensor_read: Duration,
    /// Bring-up start through the end of the send.
    pub radio_active: Duration,
    /// Radio bring-down, including its settle delay.
    pub radio_off: Duration,
}
