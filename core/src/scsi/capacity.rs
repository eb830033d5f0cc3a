//! READ CAPACITY(16).

use super::opcode;
use crate::codec;

/// CDB length
pub const CDB_LEN: usize = 16;

/// Service action selecting READ CAPACITY(16)
pub const SERVICE_ACTION: u8 = 0x10;

/// Reply length requested from the device
pub const REPLY_LEN: usize = 32;

/// READ CAPACITY(16) command
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadCapacity16;

impl ReadCapacity16 {
    /// Encode the CDB
    pub fn cdb(&self) -> [u8; CDB_LEN] {
        let mut cdb = [0u8; CDB_LEN];
        cdb[0] = opcode::SERVICE_ACTION_IN_16;
        cdb[1] = SERVICE_ACTION;
        codec::put(&mut cdb, 10, REPLY_LEN as u32);
        cdb
    }
}

/// Geometry reported by READ CAPACITY(16)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    /// Address of the last logical block
    pub last_block_address: u64,
    /// Logical block length in bytes
    pub sector_size: u32,
}

impl CapacityReport {
    /// Decode a reply
    pub fn decode(reply: &[u8; REPLY_LEN]) -> Self {
        Self {
            last_block_address: codec::get(reply, 0),
            sector_size: codec::get(reply, 8),
        }
    }

    /// Encode as a device would (used by fake devices)
    pub fn encode(&self) -> [u8; REPLY_LEN] {
        let mut reply = [0u8; REPLY_LEN];
        codec::put(&mut reply, 0, self.last_block_address);
        codec::put(&mut reply, 8, self.sector_size);
        reply
    }

    /// Device size in bytes, `None` if it does not fit in 64 bits
    pub fn device_size(&self) -> Option<u64> {
        self.last_block_address
            .checked_add(1)?
            .checked_mul(u64::from(self.sector_size))
    }
}
