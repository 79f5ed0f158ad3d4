// src/common/timing.rs

use core::time::Duration;

// Reference deployment values. `NodeConfig::default()` is built from these;
// everything here can be overridden per node.

// === Ranging (HC-SR04 class transducers) ===

/// Trigger line held low before the pulse to get a clean rising edge.
pub const TRIGGER_SETUP: Duration = Duration::from_micros(10);
/// Width of the trigger pulse.
pub const TRIGGER_PULSE: Duration = Duration::from_micros(10);
/// Nominal echo the transducer produces when nothing is in range. Real modules
/// jitter around this, so it must never be used as the echo cap itself.
pub const OUT_OF_RANGE_PULSE: Duration = Duration::from_millis(38);
/// Cap on each echo wait. An out-of-range pulse must finish well inside it so
/// an empty space still measures far.
pub const ECHO_TIMEOUT: Duration = Duration::from_millis(60);
/// Least headroom an echo timeout must keep above the longest echo it has to
/// measure, covering rise latency and polling jitter.
pub const ECHO_MARGIN: Duration = Duration::from_millis(2);
/// Speed of sound at ~20 °C, cm per microsecond.
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.0343;
/// Sleep between echo-line polls.
pub const ECHO_POLL_INTERVAL_US: u32 = 1;

// === Classification ===

/// Anything strictly nearer than this is occupied.
pub const THRESHOLD_CM: f32 = 50.0;

// === Radio ===

/// Settle delay after the radio and peer are configured.
pub const RADIO_UP_SETTLE: Duration = Duration::from_millis(500);
/// Settle delay after the radio is switched off.
pub const RADIO_DOWN_SETTLE: Duration = Duration::from_millis(1000);
/// Upper bound on how long a busy link may hold up a send.
pub const SEND_TIMEOUT: Duration = Duration::from_millis(50);
/// Pause between busy-link retries of the same frame.
pub const SEND_POLL_INTERVAL_US: u32 = 100;
/// Transmit power in dBm.
pub const TX_POWER_DBM: i8 = 2;

// === Duty cycle ===

/// Time the indicator is shown before the send.
pub const INDICATOR_HOLD: Duration = Duration::from_millis(100);
/// Timer wake interval.
pub const WAKE_INTERVAL: Duration = Duration::from_secs(20);
/// Simulator pacing used by the reference deployment before sleep entry.
pub const SIMULATION_PRE_SLEEP_DELAY: Duration = Duration::from_millis(18_800);

/// Blocks for `duration` using millisecond steps plus a microsecond remainder.
pub fn block_for<D: embedded_hal::delay::DelayNs>(delay: &mut D, duration: Duration) {
    let ms = duration.as_millis().min(u32::MAX as u128) as u32;
    if ms > 0 {
        delay.delay_ms(ms);
    }
    let rem_us = duration.subsec_micros() % 1000;
    if rem_us > 0 {
        delay.delay_us(rem_us);
    }
}
