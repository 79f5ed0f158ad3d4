// src/common/config.rs

use core::time::Duration;

use super::{address::PeerAddress, error::ConfigError, timing, types::Distance};

/// Everything a node needs to know at start-up.
///
/// `Default` is the reference deployment with the simulator pacing delay
/// turned off.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// Receiver of the status messages.
    pub peer: PeerAddress,
    /// Distances strictly below this are `Occupied`, in cm.
    pub threshold_cm: f32,
    /// Timer wake interval programmed before every sleep.
    pub wake_interval: Duration,
    /// Radio transmit power, dBm.
    pub tx_power_dbm: i8,
    pub radio_up_settle: Duration,
    pub radio_down_settle: Duration,
    /// Busy-link budget for one send.
    pub send_timeout: Duration,
    pub trigger_pulse: Duration,
    /// Cap on both the wait for the echo and its width. Must stay at least
    /// [`NodeConfig::min_echo_timeout`].
    pub echo_timeout: Duration,
    /// cm per microsecond.
    pub speed_of_sound: f32,
    pub indicator_hold: Duration,
    /// Extra wait right before sleep entry. Deployment pacing only.
    pub pre_sleep_delay: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            peer: PeerAddress::REFERENCE,
            threshold_cm: timing::THRESHOLD_CM,
            wake_interval: timing::WAKE_INTERVAL,
            tx_power_dbm: timing::TX_POWER_DBM,
            radio_up_settle: timing::RADIO_UP_SETTLE,
            radio_down_settle: timing::RADIO_DOWN_SETTLE,
            send_timeout: timing::SEND_TIMEOUT,
            trigger_pulse: timing::TRIGGER_PULSE,
            echo_timeout: timing::ECHO_TIMEOUT,
            speed_of_sound: timing::SPEED_OF_SOUND_CM_PER_US,
            indicator_hold: timing::INDICATOR_HOLD,
            pre_sleep_delay: Duration::ZERO,
        }
    }
}

impl NodeConfig {
    /// Reference deployment including its simulator pacing delay.
    pub fn simulation() -> Self {
        Self::default().with_pre_sleep_delay(timing::SIMULATION_PRE_SLEEP_DELAY)
    }

    pub fn with_peer(mut self, peer: PeerAddress) -> Self {
        self.peer = peer;
        self
    }

    pub fn with_threshold_cm(mut self, threshold_cm: f32) -> Self {
        self.threshold_cm = threshold_cm;
        self
    }

    pub fn with_wake_interval(mut self, wake_interval: Duration) -> Self {
        self.wake_interval = wake_interval;
        self
    }

    pub fn with_tx_power_dbm(mut self, dbm: i8) -> Self {
        self.tx_power_dbm = dbm;
        self
    }

    pub fn with_settle_delays(mut self, up: Duration, down: Duration) -> Self {
        self.radio_up_settle = up;
        self.radio_down_settle = down;
        self
    }

    pub fn with_echo_timeout(mut self, echo_timeout: Duration) -> Self {
        self.echo_timeout = echo_timeout;
        self
    }

    pub fn with_indicator_hold(mut self, hold: Duration) -> Self {
        self.indicator_hold = hold;
        self
    }

    pub fn with_pre_sleep_delay(mut self, delay: Duration) -> Self {
        self.pre_sleep_delay = delay;
        self
    }

    /// Applies one textual override, e.g. from a build-time environment variable.
    ///
    /// Keys: `peer`, `threshold_cm`, `wake_interval_s`, `tx_power_dbm`,
    /// `pre_sleep_delay_ms`, `echo_timeout_us`. The config is left untouched on
    /// error.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key {
            "peer" => self.peer = value.parse()?,
            "threshold_cm" => {
                let cm: f32 = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("threshold_cm"))?;
                check_threshold(cm)?;
                check_echo_timeout(self.echo_timeout, cm, self.speed_of_sound)?;
                self.threshold_cm = cm;
            }
            "wake_interval_s" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("wake_interval_s"))?;
                if secs == 0 {
                    return Err(ConfigError::ZeroWakeInterval);
                }
                self.wake_interval = Duration::from_secs(secs);
            }
            "tx_power_dbm" => {
                self.tx_power_dbm = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("tx_power_dbm"))?;
            }
            "pre_sleep_delay_ms" => {
                let ms: u64 = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("pre_sleep_delay_ms"))?;
                self.pre_sleep_delay = Duration::from_millis(ms);
            }
            "echo_timeout_us" => {
                let us: u64 = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("echo_timeout_us"))?;
                let echo_timeout = Duration::from_micros(us);
                check_echo_timeout(echo_timeout, self.threshold_cm, self.speed_of_sound)?;
                self.echo_timeout = echo_timeout;
            }
            _ => return Err(ConfigError::UnknownKey),
        }
        Ok(())
    }

    /// Checks the invariants the controller relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.peer.is_unicast() {
            return Err(ConfigError::MulticastPeer);
        }
        check_threshold(self.threshold_cm)?;
        if self.wake_interval.is_zero() {
            return Err(ConfigError::ZeroWakeInterval);
        }
        if !(self.speed_of_sound.is_finite() && self.speed_of_sound > 0.0) {
            return Err(ConfigError::InvalidNumber("speed_of_sound"));
        }
        check_echo_timeout(self.echo_timeout, self.threshold_cm, self.speed_of_sound)
    }

    /// Shortest echo timeout that still lets an out-of-range pulse, and any
    /// echo from beyond the threshold, be measured instead of timing out.
    pub fn min_echo_timeout(&self) -> Duration {
        min_echo_timeout(self.threshold_cm, self.speed_of_sound)
    }
}

fn min_echo_timeout(threshold_cm: f32, speed_of_sound: f32) -> Duration {
    let threshold_echo = Distance::echo_width(threshold_cm, speed_of_sound);
    timing::OUT_OF_RANGE_PULSE.max(threshold_echo) + timing::ECHO_MARGIN
}

fn check_echo_timeout(echo_timeout: Duration, threshold_cm: f32, speed_of_sound: f32) -> Result<(), ConfigError> {
    if echo_timeout >= min_echo_timeout(threshold_cm, speed_of_sound) {
        Ok(())
    } else {
        Err(ConfigError::EchoTimeoutTooShort)
    }
}

fn check_threshold(cm: f32) -> Result<(), ConfigError> {
    if cm.is_finite() && cm > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold)
    }
}
