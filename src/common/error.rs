// src/common/error.rs

/// Errors from the ultrasonic ranging driver.
#[derive(Debug, thiserror::Error)]
pub enum SensorError<E = ()>
where
    E: core::fmt::Debug,
{
    /// Underlying pin error from the HAL implementation.
    #[error("pin error: {0:?}")]
    Pin(E),

    /// The echo line never went high before the echo timeout.
    #[error("no echo received")]
    NoEcho,

    /// The echo line went high but did not fall again before the echo timeout.
    #[error("echo pulse exceeded the timeout")]
    EchoTooLong,
}

impl<E: core::fmt::Debug> From<E> for SensorError<E> {
    fn from(e: E) -> Self {
        SensorError::Pin(e)
    }
}

/// Errors from the radio transport. None of these are fatal to a cycle.
#[derive(Debug, thiserror::Error)]
pub enum RadioError<E = ()>
where
    E: core::fmt::Debug,
{
    /// Wireless subsystem failed to start in station mode.
    #[error("radio init failed: {0:?}")]
    Init(E),

    /// Peer-to-peer messaging layer failed to initialize.
    #[error("messaging init failed: {0:?}")]
    Messaging(E),

    /// The fixed peer could not be registered.
    #[error("peer registration failed: {0:?}")]
    PeerRegistration(E),

    /// A send was attempted while the radio was not up.
    #[error("radio is not up")]
    NotUp,

    /// The link reported a transmit failure.
    #[error("send failed: {0:?}")]
    Send(E),

    /// The link stayed busy past the send timeout.
    #[error("send timed out")]
    SendTimeout,
}

/// Errors found while building or overriding a `NodeConfig`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Peer address text is not six hex octets.
    #[error("invalid peer address")]
    InvalidPeerAddress,

    /// Peer address has the group bit set; only unicast peers are allowed.
    #[error("peer address is multicast")]
    MulticastPeer,

    /// Distance threshold is not a finite, positive number.
    #[error("invalid distance threshold")]
    InvalidThreshold,

    /// Value for a numeric key could not be parsed.
    #[error("invalid number for '{0}'")]
    InvalidNumber(&'static str),

    /// Override key is not recognized.
    #[error("unknown config key")]
    UnknownKey,

    /// Echo timeout would cut off out-of-range or beyond-threshold echoes,
    /// turning far readings into the near sentinel.
    #[error("echo timeout too short")]
    EchoTimeoutTooShort,

    /// A zero wake interval would leave the node asleep with no wake source.
    #[error("wake interval must be non-zero")]
    ZeroWakeInterval,
}

/// Errors decoding a status payload on the receiving side.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum PayloadError {
    /// Zero-length payload.
    #[error("empty payload")]
    Empty,

    /// Payload is not null-terminated.
    #[error("payload is missing the null terminator")]
    MissingTerminator,

    /// Payload text is neither status literal.
    #[error("unknown status text")]
    UnknownStatus,
}
