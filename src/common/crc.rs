// src/common/crc.rs

use crc::{Algorithm, Crc};

/// CRC-16/ARC, used to tell a valid retained wake-clock record from the
/// random contents of retained RAM after power-up.
/// Polynomial: 0x8005, reflected in and out, no final XOR.
/// Check Value: 0xBB3D (for "123456789")
pub const RETAINED_CRC: Algorithm<u16> = Algorithm {
    poly: 0x8005,
    init: 0x0000,
    refin: true,
    refout: true,
    xorout: 0x0000,
    check: 0xBB3D,
    width: 16,
    residue: 0x0000,
};

const CRC_COMPUTER: Crc<u16> = Crc::<u16>::new(&RETAINED_CRC);

/// Checksum over a retained record's marker and timestamp.
#[inline]
pub fn record_checksum(marker: u32, timestamp_ms: u64) -> u16 {
    let mut digest = CRC_COMPUTER.digest();
    digest.update(&marker.to_le_bytes());
    digest.update(&timestamp_ms.to_le_bytes());
    digest.finalize()
}
