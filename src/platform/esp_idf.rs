// src/platform/esp_idf.rs

use core::mem::MaybeUninit;
use core::ptr::addr_of_mut;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use embedded_hal::delay::DelayNs;
use esp_idf_svc::espnow::{EspNow, PeerInfo};
use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::sys::{self, esp, esp_err_t, EspError};
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{debug, info};

use crate::common::{
    hal_traits::{Clock, PowerControl, RadioLink},
    types::WakeCause,
    PeerAddress,
};
use crate::node::WakeClockState;

// --- Clock ---

/// Wall clock kept by the RTC, which keeps running through deep sleep.
#[derive(Debug, Default, Copy, Clone)]
pub struct EspClock;

impl Clock for EspClock {
    fn now_us(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or_default()
    }
}

// --- Delay ---

/// Yields to the scheduler for whole ticks and busy-waits below that.
#[derive(Debug, Default, Copy, Clone)]
pub struct EspDelay;

impl EspDelay {
    // One FreeRTOS tick at the default 100 Hz.
    const YIELD_THRESHOLD_MS: u32 = 10;
}

impl DelayNs for EspDelay {
    fn delay_ns(&mut self, ns: u32) {
        Ets::delay_us(ns.div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        Ets::delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        if ms >= Self::YIELD_THRESHOLD_MS {
            FreeRtos::delay_ms(ms);
        } else {
            Ets::delay_ms(ms);
        }
    }
}

// --- ESP-NOW link ---

/// ESP-NOW on top of a station-mode WiFi driver.
///
/// Messaging is initialized by taking the `EspNow` singleton and torn down by
/// dropping it, which also forgets every registered peer.
pub struct EspNowLink {
    wifi: BlockingWifi<EspWifi<'static>>,
    espnow: Option<EspNow<'static>>,
}

impl EspNowLink {
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self { wifi, espnow: None }
    }

    fn espnow(&self) -> Result<&EspNow<'static>, EspError> {
        self.espnow
            .as_ref()
            .ok_or_else(EspError::from_infallible::<{ sys::ESP_ERR_INVALID_STATE as esp_err_t }>)
    }
}

impl RadioLink for EspNowLink {
    type Error = EspError;

    fn start_station(&mut self) -> Result<(), EspError> {
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
        self.wifi.start()?;
        debug!("wifi: station started");
        Ok(())
    }

    fn set_tx_power(&mut self, dbm: i8) -> Result<(), EspError> {
        // Driver units are 0.25 dBm.
        let quarter_dbm = dbm.saturating_mul(4);
        esp!(unsafe { sys::esp_wifi_set_max_tx_power(quarter_dbm) })
    }

    fn init_messaging(&mut self) -> Result<(), EspError> {
        if self.espnow.is_none() {
            self.espnow = Some(EspNow::take()?);
        }
        Ok(())
    }

    fn add_peer(&mut self, peer: &PeerAddress) -> Result<(), EspError> {
        let info = PeerInfo {
            peer_addr: peer.octets(),
            channel: 0,
            encrypt: false,
            ..Default::default()
        };
        self.espnow()?.add_peer(info)
    }

    fn transmit(&mut self, peer: &PeerAddress, payload: &[u8]) -> nb::Result<(), EspError> {
        let espnow = self.espnow().map_err(nb::Error::Other)?;
        match espnow.send(peer.octets(), payload) {
            Ok(()) => Ok(()),
            // Transmit queue full.
            Err(e) if e.code() == sys::ESP_ERR_ESPNOW_NO_MEM as esp_err_t => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn shutdown(&mut self) -> Result<(), EspError> {
        self.espnow = None;
        if self.wifi.is_started()? {
            self.wifi.stop()?;
        }
        debug!("wifi: stopped");
        Ok(())
    }
}

// --- Power ---

/// Timer wakeup and deep sleep through the ESP-IDF sleep API.
#[derive(Debug, Default)]
pub struct DeepSleep;

impl PowerControl for DeepSleep {
    type Error = EspError;

    fn wake_cause(&self) -> WakeCause {
        let reason = unsafe { sys::esp_reset_reason() };
        match reason {
            sys::esp_reset_reason_t_ESP_RST_POWERON => WakeCause::ColdBoot,
            sys::esp_reset_reason_t_ESP_RST_DEEPSLEEP => {
                let source = unsafe { sys::esp_sleep_get_wakeup_cause() };
                if source == sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER {
                    WakeCause::Timer
                } else {
                    WakeCause::Other
                }
            }
            _ => WakeCause::Other,
        }
    }

    fn arm_timer_wakeup(&mut self, after: Duration) -> Result<(), EspError> {
        let micros = after.as_micros().min(u64::MAX as u128) as u64;
        esp!(unsafe { sys::esp_sleep_enable_timer_wakeup(micros) })
    }

    fn enter_deep_sleep(&mut self) -> ! {
        info!("entering deep sleep");
        log::logger().flush();
        unsafe { sys::esp_deep_sleep_start() }
    }

    fn restart(&mut self) -> ! {
        log::logger().flush();
        unsafe { sys::esp_restart() }
    }
}

// --- Retained wake clock ---

// RTC slow memory survives deep sleep and is not zeroed at start-up. Any bit
// pattern is a valid `WakeClockState`; `reconcile` sorts out garbage.
#[link_section = ".rtc_noinit"]
static mut RETAINED_WAKE_CLOCK: MaybeUninit<WakeClockState> = MaybeUninit::uninit();

static RETAINED_TAKEN: AtomicBool = AtomicBool::new(false);

/// Hands out the retained wake-clock record. Returns `None` after the first
/// call.
pub fn take_retained_wake_clock() -> Option<&'static mut WakeClockState> {
    if RETAINED_TAKEN.swap(true, Ordering::AcqRel) {
        return None;
    }
    // SAFETY: the guard above makes this the only reference ever created, and
    // every bit pattern of the plain-integer record is initialized data.
    unsafe { Some((*addr_of_mut!(RETAINED_WAKE_CLOCK)).assume_init_mut()) }
}
