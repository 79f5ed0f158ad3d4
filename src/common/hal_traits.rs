// src/common/hal_traits.rs

use super::{address::PeerAddress, types::WakeCause};
use core::fmt::Debug;
use core::time::Duration;

/// Monotonic time source shared by every phase of a cycle.
///
/// Must keep counting through low-power sleep: the wake clock subtracts a
/// timestamp taken before sleep from one taken after the restart.
pub trait Clock {
    /// Microseconds since an arbitrary, sleep-surviving epoch.
    fn now_us(&self) -> u64;

    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }

    fn elapsed_since(&self, start_us: u64) -> Duration {
        Duration::from_micros(self.now_us().saturating_sub(start_us))
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Primitive operations of a short-range peer-to-peer radio
/// (ESP-NOW over a station-mode WiFi interface on the reference board).
///
/// `Radio` sequences these into bring-up, send and bring-down.
pub trait RadioLink {
    /// Associated error type for link failures.
    type Error: Debug;

    /// Starts the wireless subsystem in station (non-AP) mode.
    fn start_station(&mut self) -> Result<(), Self::Error>;

    /// Applies the maximum transmit power, in dBm.
    fn set_tx_power(&mut self, dbm: i8) -> Result<(), Self::Error>;

    /// Initializes the peer-to-peer messaging layer.
    fn init_messaging(&mut self) -> Result<(), Self::Error>;

    /// Registers a unicast peer on the current channel, unencrypted.
    fn add_peer(&mut self, peer: &PeerAddress) -> Result<(), Self::Error>;

    /// Hands one frame to the link.
    ///
    /// Returns `Err(nb::Error::WouldBlock)` while the link is busy and the frame
    /// was not accepted. Other failures are `Err(nb::Error::Other(_))`.
    fn transmit(&mut self, peer: &PeerAddress, payload: &[u8]) -> nb::Result<(), Self::Error>;

    /// Tears down messaging (dropping every registered peer) and switches the
    /// wireless subsystem off.
    fn shutdown(&mut self) -> Result<(), Self::Error>;
}

/// Timed wake source and low-power sleep entry.
pub trait PowerControl {
    /// Associated error type for power-management failures.
    type Error: Debug;

    /// Reports what started this cycle.
    fn wake_cause(&self) -> WakeCause;

    /// Arms the hardware timer that restarts the node after `after`.
    fn arm_timer_wakeup(&mut self, after: Duration) -> Result<(), Self::Error>;

    /// Suspends the processor. Execution resumes only through a full restart.
    fn enter_deep_sleep(&mut self) -> !;

    /// Software reset, used when no wake source could be armed.
    fn restart(&mut self) -> !;
}
