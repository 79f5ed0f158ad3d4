// src/bin/occupancy_node.rs

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::EspError;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{error, info, warn};

use occupancy_node::common::hal_traits::PowerControl;
use occupancy_node::platform::{take_retained_wake_clock, DeepSleep, EspClock, EspDelay, EspNowLink};
use occupancy_node::sensor::RangingSettings;
use occupancy_node::{Board, NodeConfig, OccupancyNode, Ultrasonic, WakeClockState};

/// Build-time overrides, e.g. `OCCUPANCY_PEER=24:6F:28:01:02:03 cargo build`.
const OVERRIDES: [(&str, Option<&str>); 6] = [
    ("peer", option_env!("OCCUPANCY_PEER")),
    ("threshold_cm", option_env!("OCCUPANCY_THRESHOLD_CM")),
    ("wake_interval_s", option_env!("OCCUPANCY_WAKE_INTERVAL_S")),
    ("tx_power_dbm", option_env!("OCCUPANCY_TX_POWER_DBM")),
    ("pre_sleep_delay_ms", option_env!("OCCUPANCY_PRE_SLEEP_DELAY_MS")),
    ("echo_timeout_us", option_env!("OCCUPANCY_ECHO_TIMEOUT_US")),
];

fn load_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    for (key, value) in OVERRIDES {
        if let Some(value) = value {
            if let Err(e) = config.apply(key, value) {
                warn!("config: ignoring {}={:?}: {}", key, value, e);
            }
        }
    }
    if let Err(e) = config.validate() {
        warn!("config: {}, falling back to defaults", e);
        config = NodeConfig::default();
    }
    config
}

fn start(config: NodeConfig, wake_clock: &'static mut WakeClockState) -> Result<(), EspError> {
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    let trigger = PinDriver::output(pins.gpio26)?;
    let echo = PinDriver::input(pins.gpio33)?;
    let indicator = PinDriver::output(pins.gpio2)?;

    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;

    let sensor = Ultrasonic::new(trigger, echo, EspClock, EspDelay, RangingSettings::from(&config));
    let board = Board {
        sensor,
        link: EspNowLink::new(wifi),
        clock: EspClock,
        delay: EspDelay,
        indicator,
        power: DeepSleep,
    };

    OccupancyNode::new(config, board, wake_clock).run()
}

fn main() {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let config = load_config();
    info!("occupancy node: peer {}, threshold {} cm", config.peer, config.threshold_cm);

    let wake_interval = config.wake_interval;
    match take_retained_wake_clock() {
        Some(wake_clock) => {
            if let Err(e) = start(config, wake_clock) {
                error!("board setup failed: {}", e);
            }
        }
        None => error!("retained wake clock already in use"),
    }

    // Setup failed; try again after one wake interval.
    let mut power = DeepSleep;
    match power.arm_timer_wakeup(wake_interval) {
        Ok(()) => power.enter_deep_sleep(),
        Err(e) => {
            error!("could not arm wake timer: {}", e);
            power.restart()
        }
    }
}
