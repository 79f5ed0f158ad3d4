// src/testing.rs
//
// Shared test doubles. Every double that needs to observe time holds a clone of
// the same `SimClock`, so delays issued by one component are seen by all.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::time::Duration;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::common::{
    hal_traits::{Clock, PowerControl, RadioLink},
    PeerAddress, WakeCause,
};

// --- Clock and delay ---

#[derive(Clone, Default, Debug)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn starting_at_ms(ms: u64) -> Self {
        let clock = Self::default();
        clock.set_us(ms * 1000);
        clock
    }

    pub fn set_us(&self, us: u64) {
        self.0.set(us);
    }

    pub fn advance_us(&self, us: u64) {
        self.0.set(self.0.get().saturating_add(us));
    }
}

impl Clock for SimClock {
    fn now_us(&self) -> u64 {
        self.0.get()
    }
}

#[derive(Clone, Debug)]
pub struct SimDelay(pub SimClock);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance_us((ns as u64).div_ceil(1000));
    }
}

// --- Ultrasonic transducer ---

/// What the transducer does after the next trigger pulse.
#[derive(Copy, Clone, Debug)]
pub enum Echo {
    /// Echo line goes high after `SimEcho::LATENCY_US` for this long.
    Width(Duration),
    /// Echo line never goes high.
    Missing,
    /// Echo line goes high and stays high.
    StuckHigh,
}

#[derive(Debug)]
struct EchoState {
    plan: Echo,
    window: Option<(u64, u64)>,
    pulses: u32,
}

/// Trigger and echo halves of one simulated transducer.
#[derive(Clone, Debug)]
pub struct SimTransducer {
    clock: SimClock,
    state: Rc<RefCell<EchoState>>,
}

impl SimTransducer {
    pub fn new(clock: &SimClock, plan: Echo) -> Self {
        Self {
            clock: clock.clone(),
            state: Rc::new(RefCell::new(EchoState { plan, window: None, pulses: 0 })),
        }
    }

    pub fn set_plan(&self, plan: Echo) {
        self.state.borrow_mut().plan = plan;
    }

    pub fn pulses(&self) -> u32 {
        self.state.borrow().pulses
    }

    pub fn trigger(&self) -> SimTrigger {
        SimTrigger { transducer: self.clone(), high: false }
    }

    pub fn echo(&self) -> SimEcho {
        SimEcho { transducer: self.clone() }
    }
}

pub struct SimTrigger {
    transducer: SimTransducer,
    high: bool,
}

impl ErrorType for SimTrigger {
    type Error = Infallible;
}

impl OutputPin for SimTrigger {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            // Falling edge of the trigger pulse starts a ping.
            let now = self.transducer.clock.now_us();
            let mut state = self.transducer.state.borrow_mut();
            let rise = now + SimEcho::LATENCY_US;
            state.window = match state.plan {
                Echo::Width(width) => Some((rise, rise + width.as_micros() as u64)),
                Echo::Missing => None,
                Echo::StuckHigh => Some((rise, u64::MAX)),
            };
            state.pulses += 1;
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

pub struct SimEcho {
    transducer: SimTransducer,
}

impl SimEcho {
    pub const LATENCY_US: u64 = 450;
}

impl ErrorType for SimEcho {
    type Error = Infallible;
}

impl InputPin for SimEcho {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let now = self.transducer.clock.now_us();
        Ok(match self.transducer.state.borrow().window {
            Some((rise, fall)) => rise <= now && now < fall,
            None => false,
        })
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

// --- Indicator ---

#[derive(Clone, Default, Debug)]
pub struct SimLed(Rc<Cell<Option<bool>>>);

impl SimLed {
    /// `None` until the pin is first driven.
    pub fn level(&self) -> Option<bool> {
        self.0.get()
    }
}

impl ErrorType for SimLed {
    type Error = Infallible;
}

impl OutputPin for SimLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(Some(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(Some(true));
        Ok(())
    }
}

// --- Radio link ---

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkFault {
    StartFailed,
    NotStarted,
    NotInitialized,
    PeerExists,
    PeerNotFound,
    TxFailed,
}

pub type Frame = (PeerAddress, heapless::Vec<u8, 16>);

#[derive(Default, Debug)]
pub struct LinkState {
    pub started: bool,
    pub messaging: bool,
    pub tx_power_dbm: Option<i8>,
    pub peers: heapless::Vec<PeerAddress, 8>,
    pub sent: heapless::Vec<Frame, 8>,
    pub shutdowns: u32,
    // fault injection
    pub fail_start: bool,
    pub fail_tx_power: bool,
    pub fail_transmit: bool,
    pub busy_polls: u32,
}

#[derive(Clone, Default, Debug)]
pub struct SimLink(pub Rc<RefCell<LinkState>>);

impl SimLink {
    pub fn state(&self) -> std::cell::Ref<'_, LinkState> {
        self.0.borrow()
    }

    pub fn state_mut(&self) -> std::cell::RefMut<'_, LinkState> {
        self.0.borrow_mut()
    }
}

impl RadioLink for SimLink {
    type Error = LinkFault;

    fn start_station(&mut self) -> Result<(), LinkFault> {
        let mut s = self.0.borrow_mut();
        if s.fail_start {
            return Err(LinkFault::StartFailed);
        }
        s.started = true;
        Ok(())
    }

    fn set_tx_power(&mut self, dbm: i8) -> Result<(), LinkFault> {
        let mut s = self.0.borrow_mut();
        if !s.started || s.fail_tx_power {
            return Err(LinkFault::NotStarted);
        }
        s.tx_power_dbm = Some(dbm);
        Ok(())
    }

    fn init_messaging(&mut self) -> Result<(), LinkFault> {
        let mut s = self.0.borrow_mut();
        if !s.started {
            return Err(LinkFault::NotStarted);
        }
        s.messaging = true;
        Ok(())
    }

    fn add_peer(&mut self, peer: &PeerAddress) -> Result<(), LinkFault> {
        let mut s = self.0.borrow_mut();
        if !s.messaging {
            return Err(LinkFault::NotInitialized);
        }
        if s.peers.contains(peer) {
            return Err(LinkFault::PeerExists);
        }
        s.peers.push(*peer).map_err(|_| LinkFault::PeerExists)
    }

    fn transmit(&mut self, peer: &PeerAddress, payload: &[u8]) -> nb::Result<(), LinkFault> {
        let mut s = self.0.borrow_mut();
        if !s.peers.contains(peer) {
            return Err(nb::Error::Other(LinkFault::PeerNotFound));
        }
        if s.busy_polls > 0 {
            s.busy_polls -= 1;
            return Err(nb::Error::WouldBlock);
        }
        if s.fail_transmit {
            return Err(nb::Error::Other(LinkFault::TxFailed));
        }
        let frame = heapless::Vec::from_slice(payload).map_err(|_| nb::Error::Other(LinkFault::TxFailed))?;
        s.sent.push((*peer, frame)).map_err(|_| nb::Error::Other(LinkFault::TxFailed))
    }

    fn shutdown(&mut self) -> Result<(), LinkFault> {
        let mut s = self.0.borrow_mut();
        s.peers.clear();
        s.messaging = false;
        s.started = false;
        s.tx_power_dbm = None;
        s.shutdowns += 1;
        Ok(())
    }
}

// --- Power control ---

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ArmRefused;

#[derive(Debug)]
pub struct PowerState {
    pub cause: WakeCause,
    pub armed: Option<Duration>,
    pub refuse_arm: bool,
    /// When set, arming and sleep entry are stamped with this clock.
    pub clock: Option<SimClock>,
    pub armed_at_us: Option<u64>,
    pub slept_at_us: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct SimPower(pub Rc<RefCell<PowerState>>);

impl SimPower {
    pub fn new(cause: WakeCause) -> Self {
        Self(Rc::new(RefCell::new(PowerState {
            cause,
            armed: None,
            refuse_arm: false,
            clock: None,
            armed_at_us: None,
            slept_at_us: None,
        })))
    }

    pub fn with_clock(cause: WakeCause, clock: &SimClock) -> Self {
        let power = Self::new(cause);
        power.0.borrow_mut().clock = Some(clock.clone());
        power
    }

    pub fn armed(&self) -> Option<Duration> {
        self.0.borrow().armed
    }
}

impl PowerControl for SimPower {
    type Error = ArmRefused;

    fn wake_cause(&self) -> WakeCause {
        self.0.borrow().cause
    }

    fn arm_timer_wakeup(&mut self, after: Duration) -> Result<(), ArmRefused> {
        let mut s = self.0.borrow_mut();
        if s.refuse_arm {
            return Err(ArmRefused);
        }
        s.armed = Some(after);
        s.armed_at_us = s.clock.as_ref().map(Clock::now_us);
        Ok(())
    }

    fn enter_deep_sleep(&mut self) -> ! {
        {
            let mut s = self.0.borrow_mut();
            s.slept_at_us = s.clock.as_ref().map(Clock::now_us);
        }
        panic!("entered deep sleep");
    }

    fn restart(&mut self) -> ! {
        panic!("restarted");
    }
}
