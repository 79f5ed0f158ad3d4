// src/common/payload.rs

//! Status payload codec.
//!
//! The payload is the status text followed by a single NUL byte, nothing else:
//! `b"OCCUPIED\0"` (9 bytes) or `b"FREE\0"` (5 bytes).

use arrayvec::ArrayVec;

use super::{error::PayloadError, types::OccupancyStatus};

/// Longest encoded payload, `"OCCUPIED\0"`.
pub const MAX_PAYLOAD_LEN: usize = 9;

pub type PayloadBuffer = ArrayVec<u8, MAX_PAYLOAD_LEN>;

/// Encodes `status` as null-terminated ASCII.
pub fn encode(status: OccupancyStatus) -> PayloadBuffer {
    let mut buf = PayloadBuffer::new();
    let written =
        buf.try_extend_from_slice(status.as_str().as_bytes()).is_ok() && buf.try_push(0).is_ok();
    debug_assert!(written, "status text does not fit MAX_PAYLOAD_LEN");
    buf
}

/// Decodes a received payload back into a status.
///
/// Exactly one trailing NUL is required; case and spelling must match.
pub fn decode(payload: &[u8]) -> Result<OccupancyStatus, PayloadError> {
    let (last, text) = payload.split_last().ok_or(PayloadError::Empty)?;
    if *last != 0 {
        return Err(PayloadError::MissingTerminator);
    }
    match text {
        b"OCCUPIED" => Ok(OccupancyStatus::Occupied),
        b"FREE" => Ok(OccupancyStatus::Free),
        _ => Err(PayloadError::UnknownStatus),
    }
}
