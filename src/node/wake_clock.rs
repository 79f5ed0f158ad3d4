// src/node/wake_clock.rs

use core::time::Duration;

use log::{debug, warn};

use crate::common::{crc::record_checksum, types::WakeCause};

/// The only state that survives low-power sleep: the moment the previous
/// cycle entered sleep.
///
/// The record lives in memory that start-up code does not zero, so after
/// power-up it holds whatever the RAM came up with. `reconcile` must run
/// before any read: it resets the record on cold boot and whenever the
/// marker or checksum do not match.
#[repr(C)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeClockState {
    marker: u32,
    sleep_entered_at_ms: u64,
    checksum: u16,
}

impl WakeClockState {
    const MARKER: u32 = 0x5741_4B45; // "WAKE"

    // CRC-16/ARC of MARKER followed by eight zero bytes.
    const COLD_CHECKSUM: u16 = 0xF4F4;

    /// A valid record holding timestamp 0.
    pub const fn cold() -> Self {
        WakeClockState { marker: Self::MARKER, sleep_entered_at_ms: 0, checksum: Self::COLD_CHECKSUM }
    }

    /// Makes the record trustworthy for this cycle.
    ///
    /// Returns `true` when a previous sleep-entry timestamp was kept.
    pub fn reconcile(&mut self, cause: WakeCause) -> bool {
        if cause == WakeCause::ColdBoot {
            debug!("wake clock: cold boot, resetting");
            self.reset();
            return false;
        }
        if !self.is_valid() {
            warn!("wake clock: retained record invalid after {:?} wake, resetting", cause);
            self.reset();
            return false;
        }
        true
    }

    pub fn is_valid(&self) -> bool {
        self.marker == Self::MARKER
            && self.checksum == record_checksum(self.marker, self.sleep_entered_at_ms)
    }

    /// Timestamp written by the previous cycle, if the record is valid.
    pub fn sleep_entered_at_ms(&self) -> Option<u64> {
        self.is_valid().then_some(self.sleep_entered_at_ms)
    }

    /// Time between the previous sleep entry and `now_ms`.
    ///
    /// `None` if the record is invalid or the clock is behind the stored
    /// timestamp.
    pub fn slept_for(&self, now_ms: u64) -> Option<Duration> {
        let entered = self.sleep_entered_at_ms()?;
        now_ms.checked_sub(entered).map(Duration::from_millis)
    }

    /// Stores the sleep-entry moment. Called exactly once per cycle.
    pub fn record_sleep_entry(&mut self, now_ms: u64) {
        self.marker = Self::MARKER;
        self.sleep_entered_at_ms = now_ms;
        self.checksum = record_checksum(self.marker, now_ms);
    }

    fn reset(&mut self) {
        self.record_sleep_entry(0);
    }
}

impl Default for WakeClockState {
    fn default() -> Self {
        Self::cold()
    }
}
