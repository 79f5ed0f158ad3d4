// src/sensor/ultrasonic.rs

use core::fmt::Debug;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use super::DistanceSensor;
use crate::common::{
    config::NodeConfig,
    error::SensorError,
    hal_traits::Clock,
    timing::{self, block_for},
    types::Distance,
};

/// Ranging parameters for a pulse-echo transducer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RangingSettings {
    pub trigger_pulse: Duration,
    /// Bounds each of: waiting out a stale echo, waiting for the new echo,
    /// and the echo width itself.
    pub echo_timeout: Duration,
    /// cm per microsecond.
    pub speed_of_sound: f32,
}

impl Default for RangingSettings {
    fn default() -> Self {
        Self {
            trigger_pulse: timing::TRIGGER_PULSE,
            echo_timeout: timing::ECHO_TIMEOUT,
            speed_of_sound: timing::SPEED_OF_SOUND_CM_PER_US,
        }
    }
}

impl From<&NodeConfig> for RangingSettings {
    fn from(config: &NodeConfig) -> Self {
        Self {
            trigger_pulse: config.trigger_pulse,
            echo_timeout: config.echo_timeout,
            speed_of_sound: config.speed_of_sound,
        }
    }
}

/// HC-SR04 style driver: one trigger output, one echo input whose high time
/// is the round-trip time of the ping.
#[derive(Debug)]
pub struct Ultrasonic<TRIG, ECHO, CLK, D> {
    trigger: TRIG,
    echo: ECHO,
    clock: CLK,
    delay: D,
    settings: RangingSettings,
}

impl<TRIG, ECHO, CLK, D, E> Ultrasonic<TRIG, ECHO, CLK, D>
where
    TRIG: OutputPin<Error = E>,
    ECHO: InputPin<Error = E>,
    E: Debug,
    CLK: Clock,
    D: DelayNs,
{
    pub fn new(trigger: TRIG, echo: ECHO, clock: CLK, delay: D, settings: RangingSettings) -> Self {
        Ultrasonic { trigger, echo, clock, delay, settings }
    }

    pub fn settings(&self) -> &RangingSettings {
        &self.settings
    }

    /// Gives the pins back.
    pub fn release(self) -> (TRIG, ECHO) {
        (self.trigger, self.echo)
    }

    /// Fires one ping and converts the echo width to a distance.
    pub fn measure(&mut self) -> Result<Distance, SensorError<E>> {
        self.fire_trigger()?;

        let start = self.clock.now_us();
        // A previous ping may still be holding the line high.
        self.wait_for_level(false, start, SensorError::EchoTooLong)?;
        let rise = self.wait_for_level(true, start, SensorError::NoEcho)?;
        let fall = self.wait_for_level(false, rise, SensorError::EchoTooLong)?;

        let width = Duration::from_micros(fall.saturating_sub(rise));
        Ok(Distance::from_echo(width, self.settings.speed_of_sound))
    }

    fn fire_trigger(&mut self) -> Result<(), SensorError<E>> {
        self.trigger.set_low()?;
        block_for(&mut self.delay, timing::TRIGGER_SETUP);
        self.trigger.set_high()?;
        block_for(&mut self.delay, self.settings.trigger_pulse);
        self.trigger.set_low()?;
        Ok(())
    }

    /// Polls the echo line until it reads `high`, returning the timestamp of
    /// the first matching sample.
    fn wait_for_level(
        &mut self,
        high: bool,
        since_us: u64,
        on_timeout: SensorError<E>,
    ) -> Result<u64, SensorError<E>> {
        let timeout_us = self.settings.echo_timeout.as_micros() as u64;
        loop {
            let now = self.clock.now_us();
            if self.echo.is_high()? == high {
                return Ok(now);
            }
            if now.saturating_sub(since_us) >= timeout_us {
                return Err(on_timeout);
            }
            self.delay.delay_us(timing::ECHO_POLL_INTERVAL_US);
        }
    }
}

impl<TRIG, ECHO, CLK, D, E> DistanceSensor for Ultrasonic<TRIG, ECHO, CLK, D>
where
    TRIG: OutputPin<Error = E>,
    ECHO: InputPin<Error = E>,
    E: Debug,
    CLK: Clock,
    D: DelayNs,
{
    type Error = SensorError<E>;

    fn prepare(&mut self) -> Result<(), Self::Error> {
        self.trigger.set_low()?;
        Ok(())
    }

    fn measure_distance(&mut self) -> Result<Distance, Self::Error> {
        self.measure()
    }
}
