//! INQUIRY for the Block Limits VPD page (0xB0).

use super::opcode;
use crate::codec;

/// CDB length
pub const CDB_LEN: usize = 6;

/// Block Limits VPD page code
pub const PAGE_CODE: u8 = 0xB0;

/// Reply length requested from the device
pub const REPLY_LEN: usize = 64;

/// Enable vital product data
const EVPD: u8 = 0x01;

/// INQUIRY command for the Block Limits page
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockLimitsInquiry;

impl BlockLimitsInquiry {
    /// Encode the CDB
    pub fn cdb(&self) -> [u8; CDB_LEN] {
        let mut cdb = [0u8; CDB_LEN];
        cdb[0] = opcode::INQUIRY;
        cdb[1] = EVPD;
        cdb[2] = PAGE_CODE;
        codec::put(&mut cdb, 3, REPLY_LEN as u16);
        cdb
    }
}

/// Transfer and unmap limits from the Block Limits page
///
/// All counts are in logical blocks except the descriptor count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockLimits {
    /// Largest transfer a single command may request
    pub maximum_transfer_length: u32,
    /// Preferred transfer size
    pub optimal_transfer_length: u32,
    /// Largest block count per UNMAP command, 0 if UNMAP is unsupported
    pub maximum_unmap_lba_count: u32,
    /// Largest number of descriptors per UNMAP parameter list
    pub maximum_unmap_block_descriptor_count: u32,
    /// Preferred unmap granularity
    pub optimal_unmap_granularity: u32,
}

impl BlockLimits {
    /// Decode a reply
    pub fn decode(reply: &[u8; REPLY_LEN]) -> Self {
        if reply[1] != PAGE_CODE {
            log::debug!("block limits reply carries page code {:#04x}", reply[1]);
        }
        Self {
            maximum_transfer_length: codec::get(reply, 8),
            optimal_transfer_length: codec::get(reply, 12),
            maximum_unmap_lba_count: codec::get(reply, 20),
            maximum_unmap_block_descriptor_count: codec::get(reply, 24),
            optimal_unmap_granularity: codec::get(reply, 28),
        }
    }

    /// Encode as a device would (used by fake devices)
    pub fn encode(&self) -> [u8; REPLY_LEN] {
        let mut reply = [0u8; REPLY_LEN];
        reply[1] = PAGE_CODE;
        codec::put(&mut reply, 2, (REPLY_LEN - 4) as u16);
        codec::put(&mut reply, 8, self.maximum_transfer_length);
        codec::put(&mut reply, 12, self.optimal_transfer_length);
        codec::put(&mut reply, 20, self.maximum_unmap_lba_count);
        codec::put(&mut reply, 24, self.maximum_unmap_block_descriptor_count);
        codec::put(&mut reply, 28, self.optimal_unmap_granularity);
        reply
    }

    /// UNMAP is supported at all
    #[inline]
    pub fn supports_unmap(&self) -> bool {
        self.maximum_unmap_lba_count != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdb_layout() {
        assert_eq!(BlockLimitsInquiry.cdb(), [0x12, 0x01, 0xB0, 0x00, 0x40, 0x00]);
    }

    #[test]
    fn test_decode_offsets() {
        let mut reply = [0u8; REPLY_LEN];
        reply[1] = PAGE_CODE;
        reply[8..12].copy_from_slice(&0x0000_FFFFu32.to_be_bytes());
        reply[12..16].copy_from_slice(&0x0000_0800u32.to_be_bytes());
        reply[16..20].copy_from_slice(&0xDEAD_BEEFu32.to_be_bytes()); // not a limit we read
        reply[20..24].copy_from_slice(&0x0040_0000u32.to_be_bytes());
        reply[24..28].copy_from_slice(&1u32.to_be_bytes());
        reply[28..32].copy_from_slice(&8u32.to_be_bytes());

        let limits = BlockLimits::decode(&reply);
        assert_eq!(limits.maximum_transfer_length, 0xFFFF);
        assert_eq!(limits.optimal_transfer_length, 0x800);
        assert_eq!(limits.maximum_unmap_lba_count, 0x40_0000);
        assert_eq!(limits.maximum_unmap_block_descriptor_count, 1);
        assert_eq!(limits.optimal_unmap_granularity, 8);
        assert!(limits.supports_unmap());
    }

    #[test]
    fn test_zero_count_means_unsupported() {
        let limits = BlockLimits::decode(&[0u8; REPLY_LEN]);
        assert!(!limits.supports_unmap());
    }
}
