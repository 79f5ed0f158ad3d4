// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod address;
pub mod config;
pub mod crc;
pub mod error;
pub mod hal_traits;
pub mod payload;
pub mod timing;
pub mod types;

// --- Re-export key types/traits/functions for easier access ---

// From address.rs
pub use address::PeerAddress;

// From config.rs
pub use config::NodeConfig;

// From error.rs
pub use error::{ConfigError, PayloadError, RadioError, SensorError};

// From hal_traits.rs
pub use hal_traits::{Clock, PowerControl, RadioLink};

// From payload.rs
pub use payload::{decode as decode_payload, encode as encode_payload, PayloadBuffer};

// From types.rs
pub use types::{CycleTimings, Distance, OccupancyStatus, WakeCause};

// timing.rs constants stay namespaced: common::timing::WAKE_INTERVAL etc.
