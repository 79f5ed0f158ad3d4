// src/radio/mod.rs

//! Best-effort status transport over a peer-to-peer radio link.
//!
//! [`Radio`] turns the primitive [`RadioLink`] operations into the three
//! phases a cycle uses: bring the link up with one registered peer, send one
//! status frame, and bring the link down again. Nothing is acknowledged or
//! retransmitted; every failure is returned for the caller to log and ignore.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{debug, warn};
use nb::Result as NbResult;

use crate::common::{
    config::NodeConfig,
    error::RadioError,
    hal_traits::{Clock, RadioLink},
    payload,
    timing::{self, block_for},
    types::OccupancyStatus,
    PeerAddress,
};

/// Power and timing knobs for the radio phases.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RadioSettings {
    pub tx_power_dbm: i8,
    pub up_settle: Duration,
    pub down_settle: Duration,
    pub send_timeout: Duration,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            tx_power_dbm: timing::TX_POWER_DBM,
            up_settle: timing::RADIO_UP_SETTLE,
            down_settle: timing::RADIO_DOWN_SETTLE,
            send_timeout: timing::SEND_TIMEOUT,
        }
    }
}

impl From<&NodeConfig> for RadioSettings {
    fn from(config: &NodeConfig) -> Self {
        Self {
            tx_power_dbm: config.tx_power_dbm,
            up_settle: config.radio_up_settle,
            down_settle: config.radio_down_settle,
            send_timeout: config.send_timeout,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RadioState {
    /// Link shut down; nothing registered.
    Off,
    /// Link started and the peer registered.
    Up(PeerAddress),
    /// Bring-up stopped part way; the link may hold partial state.
    Faulted,
}

/// Radio transport for one cycle.
#[derive(Debug)]
pub struct Radio<L, CLK, D> {
    link: L,
    clock: CLK,
    delay: D,
    settings: RadioSettings,
    state: RadioState,
}

impl<L, CLK, D> Radio<L, CLK, D>
where
    L: RadioLink,
    CLK: Clock,
    D: DelayNs,
{
    pub fn new(link: L, clock: CLK, delay: D, settings: RadioSettings) -> Self {
        Radio { link, clock, delay, settings, state: RadioState::Off }
    }

    pub fn state(&self) -> RadioState {
        self.state
    }

    pub fn is_up(&self) -> bool {
        matches!(self.state, RadioState::Up(_))
    }

    /// Starts the link in station mode at the configured power, registers
    /// `peer` and waits for the hardware to settle.
    ///
    /// The settle delay runs whether or not configuration succeeded. A failed
    /// transmit-power change is logged and does not fail the bring-up.
    pub fn bring_up(&mut self, peer: PeerAddress) -> Result<(), RadioError<L::Error>> {
        if self.state != RadioState::Off {
            // Never stack a second registration on top of a live one.
            if let Err(e) = self.link.shutdown() {
                debug!("radio: shutdown before bring-up failed: {:?}", e);
            }
        }

        self.state = RadioState::Faulted;
        let result = self.configure(&peer);
        block_for(&mut self.delay, self.settings.up_settle);

        if result.is_ok() {
            self.state = RadioState::Up(peer);
            debug!("radio: up, peer {} registered", peer);
        }
        result
    }

    fn configure(&mut self, peer: &PeerAddress) -> Result<(), RadioError<L::Error>> {
        self.link.start_station().map_err(RadioError::Init)?;

        if let Err(e) = self.link.set_tx_power(self.settings.tx_power_dbm) {
            warn!("radio: could not set tx power to {} dBm: {:?}", self.settings.tx_power_dbm, e);
        }

        self.link.init_messaging().map_err(RadioError::Messaging)?;
        self.link.add_peer(peer).map_err(RadioError::PeerRegistration)?;
        Ok(())
    }

    /// Sends `status` to the registered peer, fire-and-forget.
    ///
    /// Skipped with [`RadioError::NotUp`] when bring-up did not complete.
    pub fn send(&mut self, status: OccupancyStatus) -> Result<(), RadioError<L::Error>> {
        let peer = match self.state {
            RadioState::Up(peer) => peer,
            _ => return Err(RadioError::NotUp),
        };

        let frame = payload::encode(status);
        let timeout = self.settings.send_timeout;
        self.execute_blocking_io_with_timeout(timeout, |link| link.transmit(&peer, &frame))
    }

    /// Switches the link off and waits for the hardware to power down.
    pub fn bring_down(&mut self) {
        if let Err(e) = self.link.shutdown() {
            warn!("radio: shutdown reported {:?}", e);
        }
        self.state = RadioState::Off;
        block_for(&mut self.delay, self.settings.down_settle);
    }

    // --- Timeout Helper ---

    /// Repeats a non-blocking link operation while it reports `WouldBlock`,
    /// up to `timeout`.
    fn execute_blocking_io_with_timeout<FN, T>(
        &mut self,
        timeout: Duration,
        mut f: FN,
    ) -> Result<T, RadioError<L::Error>>
    where
        FN: FnMut(&mut L) -> NbResult<T, L::Error>,
    {
        let start = self.clock.now_us();

        loop {
            match f(&mut self.link) {
                Ok(result) => return Ok(result),
                Err(nb::Error::WouldBlock) => {
                    if self.clock.elapsed_since(start) >= timeout {
                        return Err(RadioError::SendTimeout);
                    }
                    self.delay.delay_us(timing::SEND_POLL_INTERVAL_US);
                }
                Err(nb::Error::Other(e)) => return Err(RadioError::Send(e)),
            }
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{LinkFault, SimClock, SimDelay, SimLink};

    fn radio() -> (Radio<SimLink, SimClock, SimDelay>, SimLink, SimClock) {
        let clock = SimClock::default();
        let link = SimLink::default();
        let radio = Radio::new(link.clone(), clock.clone(), SimDelay(clock.clone()), RadioSettings::default());
        (radio, link, clock)
    }

    fn peer() -> PeerAddress {
        PeerAddress::REFERENCE
    }

    #[test]
    fn test_bring_up_configures_link() {
        let (mut r, link, clock) = radio();
        r.bring_up(peer()).unwrap();

        let s = link.state();
        assert!(s.started && s.messaging);
        assert_eq!(s.tx_power_dbm, Some(2));
        assert_eq!(s.peers.as_slice(), &[peer()]);
        assert_eq!(r.state(), RadioState::Up(peer()));
        assert_eq!(clock.now_us(), 500_000);
    }

    #[test]
    fn test_send_puts_terminated_text_on_the_air() {
        let (mut r, link, _) = radio();
        r.bring_up(peer()).unwrap();
        r.send(OccupancyStatus::Occupied).unwrap();
        r.send(OccupancyStatus::Free).unwrap();

        let s = link.state();
        assert_eq!(s.sent.len(), 2);
        assert_eq!(s.sent[0].0, peer());
        assert_eq!(s.sent[0].1.as_slice(), b"OCCUPIED\0");
        assert_eq!(s.sent[1].1.as_slice(), b"FREE\0");
    }

    #[test]
    fn test_bring_down_switches_off_and_settles() {
        let (mut r, link, clock) = radio();
        r.bring_up(peer()).unwrap();
        r.bring_down();

        assert_eq!(r.state(), RadioState::Off);
        assert!(!link.state().started);
        assert_eq!(clock.now_us(), 1_500_000);
    }

    #[test]
    fn test_repeated_cycles_do_not_accumulate_peers() {
        let (mut r, link, _) = radio();
        for _ in 0..5 {
            r.bring_up(peer()).unwrap();
            assert_eq!(link.state().peers.len(), 1);
            r.bring_down();
            assert_eq!(r.state(), RadioState::Off);
            assert!(link.state().peers.is_empty());
        }
        assert_eq!(link.state().shutdowns, 5);
    }

    #[test]
    fn test_bring_up_twice_replaces_registration() {
        let (mut r, link, _) = radio();
        r.bring_up(peer()).unwrap();
        r.bring_up(peer()).unwrap();
        assert_eq!(link.state().peers.len(), 1);
    }

    #[test]
    fn test_init_failure_blocks_send() {
        let (mut r, link, clock) = radio();
        link.state_mut().fail_start = true;

        assert!(matches!(r.bring_up(peer()), Err(RadioError::Init(LinkFault::StartFailed))));
        assert_eq!(r.state(), RadioState::Faulted);
        // Settle delay still runs.
        assert_eq!(clock.now_us(), 500_000);

        assert!(matches!(r.send(OccupancyStatus::Free), Err(RadioError::NotUp)));
        assert!(link.state().sent.is_empty());

        r.bring_down();
        assert_eq!(r.state(), RadioState::Off);
    }

    #[test]
    fn test_tx_power_failure_is_not_fatal() {
        let (mut r, link, _) = radio();
        link.state_mut().fail_tx_power = true;
        r.bring_up(peer()).unwrap();
        assert!(r.is_up());
        assert_eq!(link.state().tx_power_dbm, None);
    }

    #[test]
    fn test_send_failure_is_reported() {
        let (mut r, link, _) = radio();
        r.bring_up(peer()).unwrap();
        link.state_mut().fail_transmit = true;
        assert!(matches!(
            r.send(OccupancyStatus::Occupied),
            Err(RadioError::Send(LinkFault::TxFailed))
        ));
    }

    #[test]
    fn test_busy_link_is_polled_until_accepted() {
        let (mut r, link, _) = radio();
        r.bring_up(peer()).unwrap();
        link.state_mut().busy_polls = 3;
        r.send(OccupancyStatus::Free).unwrap();
        assert_eq!(link.state().sent.len(), 1);
    }

    #[test]
    fn test_busy_link_times_out() {
        let (mut r, link, clock) = radio();
        r.bring_up(peer()).unwrap();
        link.state_mut().busy_polls = u32::MAX;

        let before = clock.now_us();
        assert!(matches!(r.send(OccupancyStatus::Free), Err(RadioError::SendTimeout)));
        let spent = clock.now_us() - before;
        assert!(spent >= 50_000 && spent < 51_000, "spent {} us", spent);
        assert!(link.state().sent.is_empty());
    }
}
