// src/platform/mod.rs

// Board support for the ESP32 reference node.
mod esp_idf;

pub use esp_idf::{take_retained_wake_clock, DeepSleep, EspClock, EspDelay, EspNowLink};
