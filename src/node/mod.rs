// src/node/mod.rs

//! Duty-cycle controller.
//!
//! A cycle runs once per restart: read the retained wake clock, bring the
//! radio up, take one distance reading, classify it, drive the indicator,
//! send the status, bring the radio down, stamp the wake clock and go to
//! sleep. Sleep is never resumed from; the next cycle starts from a fresh
//! restart with only [`WakeClockState`] carried over.

pub mod wake_clock;

use core::fmt;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, error, info, warn};

use crate::common::{
    config::NodeConfig,
    hal_traits::{Clock, PowerControl, RadioLink},
    timing::block_for,
    types::{CycleTimings, Distance, OccupancyStatus, WakeCause},
};
use crate::radio::{Radio, RadioSettings};
use crate::sensor::{Classifier, DistanceSensor};

pub use wake_clock::WakeClockState;

/// Hardware a node runs on, handed over once at start-up.
pub struct Board<S, L, CLK, D, LED, P> {
    pub sensor: S,
    pub link: L,
    pub clock: CLK,
    pub delay: D,
    /// Status indicator; high means occupied.
    pub indicator: LED,
    pub power: P,
}

/// What one cycle did, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub wake_cause: WakeCause,
    pub started_at_ms: u64,
    /// Time since the previous cycle entered sleep; `None` after a reset.
    pub slept_for: Option<Duration>,
    /// Measured distance, or [`Distance::SENTINEL`] when the reading failed.
    pub distance: Distance,
    pub reading_ok: bool,
    pub status: OccupancyStatus,
    pub radio_up: bool,
    pub sent: bool,
    pub timings: CycleTimings,
    pub sleep_entered_at_ms: u64,
    pub wake_armed: bool,
}

/// Controller context for one cycle. Owns every peripheral and borrows the
/// retained wake clock.
pub struct OccupancyNode<'w, S, L, CLK, D, LED, P> {
    config: NodeConfig,
    sensor: S,
    radio: Radio<L, CLK, D>,
    classifier: Classifier,
    clock: CLK,
    delay: D,
    indicator: LED,
    power: P,
    wake_clock: &'w mut WakeClockState,
}

impl<'w, S, L, CLK, D, LED, P> OccupancyNode<'w, S, L, CLK, D, LED, P>
where
    S: DistanceSensor,
    L: RadioLink,
    CLK: Clock + Clone,
    D: DelayNs + Clone,
    LED: OutputPin,
    P: PowerControl,
{
    pub fn new(
        config: NodeConfig,
        board: Board<S, L, CLK, D, LED, P>,
        wake_clock: &'w mut WakeClockState,
    ) -> Self {
        let radio = Radio::new(
            board.link,
            board.clock.clone(),
            board.delay.clone(),
            RadioSettings::from(&config),
        );
        OccupancyNode {
            classifier: Classifier::new(config.threshold_cm),
            config,
            sensor: board.sensor,
            radio,
            clock: board.clock,
            delay: board.delay,
            indicator: board.indicator,
            power: board.power,
            wake_clock,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn radio(&self) -> &Radio<L, CLK, D> {
        &self.radio
    }

    /// Runs one awake phase up to, but not including, sleep entry.
    ///
    /// Never fails: every error is logged and the cycle carries on.
    pub fn run_cycle(&mut self) -> CycleReport {
        let mut timings = CycleTimings::default();

        // 1. Wake clock
        let started_at_ms = self.clock.now_ms();
        let wake_cause = self.power.wake_cause();
        info!("---------- node wake ({:?}) ----------", wake_cause);
        info!("wake moment: {}", Seconds(started_at_ms));

        let slept_for = if self.wake_clock.reconcile(wake_cause) {
            self.wake_clock.slept_for(started_at_ms)
        } else {
            None
        };
        match slept_for {
            Some(slept) => info!("time spent in deep sleep: {}", Seconds(slept.as_millis() as u64)),
            None => info!("time spent in deep sleep: unknown"),
        }

        // 2. Pins
        if let Err(e) = self.sensor.prepare() {
            warn!("sensor: could not idle trigger line: {:?}", e);
        }

        // 3. Radio up
        let radio_start = self.clock.now_us();
        let radio_up = match self.radio.bring_up(self.config.peer) {
            Ok(()) => true,
            Err(e) => {
                error!("radio bring-up failed: {}", e);
                false
            }
        };
        timings.radio_on = self.clock.elapsed_since(radio_start);
        info!("time spent bringing radio up: {}", Seconds(timings.radio_on.as_millis() as u64));

        // 4. Distance
        let sensor_start = self.clock.now_us();
        let (distance, reading_ok) = match self.sensor.measure_distance() {
            Ok(distance) => (distance, true),
            Err(e) => {
                warn!("distance reading failed ({:?}), assuming very near", e);
                (Distance::SENTINEL, false)
            }
        };
        timings.sensor_read = self.clock.elapsed_since(sensor_start);
        info!("time spent in sensor reading: {} ms", timings.sensor_read.as_millis());
        info!("distance is {}", distance);

        // 5. Classify and indicate
        let status = self.classifier.classify(distance);
        if let Err(e) = self.indicator.set_state(PinState::from(status.indicator_on())) {
            warn!("indicator: {:?}", e);
        }
        block_for(&mut self.delay, self.config.indicator_hold);

        // 6. Send
        let sent = match self.radio.send(status) {
            Ok(()) => {
                info!("status sent: {}", status);
                true
            }
            Err(e) => {
                error!("failed to send {}: {}", status, e);
                false
            }
        };
        timings.radio_active = self.clock.elapsed_since(radio_start);
        info!("time spent with radio on: {}", Seconds(timings.radio_active.as_millis() as u64));

        // 7. Radio down
        let radio_off_start = self.clock.now_us();
        self.radio.bring_down();
        timings.radio_off = self.clock.elapsed_since(radio_off_start);
        info!("time spent switching radio off: {}", Seconds(timings.radio_off.as_millis() as u64));
        debug!("cycle timings: {:?}", timings);

        // 8. Stamp the wake clock
        let sleep_entered_at_ms = self.clock.now_ms();
        self.wake_clock.record_sleep_entry(sleep_entered_at_ms);
        info!("deep sleep start moment: {}", Seconds(sleep_entered_at_ms));

        // 9. Arm the wake source
        let wake_armed = match self.power.arm_timer_wakeup(self.config.wake_interval) {
            Ok(()) => {
                info!("sleeping for {} s", self.config.wake_interval.as_secs());
                true
            }
            Err(e) => {
                error!("could not arm wake timer: {:?}", e);
                false
            }
        };
        log::logger().flush();

        CycleReport {
            wake_cause,
            started_at_ms,
            slept_for,
            distance,
            reading_ok,
            status,
            radio_up,
            sent,
            timings,
            sleep_entered_at_ms,
            wake_armed,
        }
    }

    /// Runs a cycle and enters sleep. Never returns.
    ///
    /// If the wake timer could not be armed the node waits one wake interval
    /// and restarts instead, so it can never sleep with no way back.
    pub fn run(mut self) -> ! {
        let report = self.run_cycle();

        block_for(&mut self.delay, self.config.pre_sleep_delay);
        log::logger().flush();

        if report.wake_armed {
            self.power.enter_deep_sleep()
        }

        warn!("no wake source, restarting in {} s", self.config.wake_interval.as_secs());
        log::logger().flush();
        block_for(&mut self.delay, self.config.wake_interval);
        self.power.restart()
    }
}

/// Milliseconds printed as seconds with three decimals.
struct Seconds(u64);

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03} s", self.0 / 1000, self.0 % 1000)
    }
}
