//! UNMAP command and its parameter list.
//!
//! ```text
//! Parameter list (24 bytes)
//!  0..2   UNMAP DATA LENGTH             (n - 2 = 22)
//!  2..4   BLOCK DESCRIPTOR DATA LENGTH  (16)
//!  4..8   reserved
//!  8..16  UNMAP LOGICAL BLOCK ADDRESS
//! 16..20  NUMBER OF LOGICAL BLOCKS
//! 20..24  reserved
//! ```

use super::opcode;
use crate::codec;
use static_assertions::const_assert_eq;

/// CDB length
pub const CDB_LEN: usize = 10;

/// Parameter list header length
pub const HEADER_LEN: usize = 8;

/// One block descriptor
pub const BLOCK_DESCRIPTOR_LEN: usize = 16;

/// Parameter list carrying a single descriptor
pub const PARAMETER_LEN: usize = HEADER_LEN + BLOCK_DESCRIPTOR_LEN;

const_assert_eq!(PARAMETER_LEN, 24);

/// One UNMAP block descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmapDescriptor {
    /// First logical block
    pub offset_lba: u64,
    /// Number of logical blocks
    pub length_lba: u32,
}

impl UnmapDescriptor {
    /// Create a descriptor
    pub const fn new(offset_lba: u64, length_lba: u32) -> Self {
        Self { offset_lba, length_lba }
    }

    /// One past the last block covered
    #[inline]
    pub fn end_lba(&self) -> u64 {
        self.offset_lba + u64::from(self.length_lba)
    }

    /// Wrap into a command
    #[inline]
    pub fn command(self) -> UnmapCommand {
        UnmapCommand { descriptor: self }
    }
}

/// UNMAP with a single-descriptor parameter list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmapCommand {
    /// The range to unmap
    pub descriptor: UnmapDescriptor,
}

impl UnmapCommand {
    /// Encode the CDB
    pub fn cdb(&self) -> [u8; CDB_LEN] {
        let mut cdb = [0u8; CDB_LEN];
        cdb[0] = opcode::UNMAP;
        codec::put(&mut cdb, 7, PARAMETER_LEN as u16);
        cdb
    }

    /// Encode the outbound parameter list
    pub fn parameter_list(&self) -> [u8; PARAMETER_LEN] {
        let mut param = [0u8; PARAMETER_LEN];
        codec::put(&mut param, 0, (PARAMETER_LEN - 2) as u16);
        codec::put(&mut param, 2, BLOCK_DESCRIPTOR_LEN as u16);
        codec::put(&mut param, 8, self.descriptor.offset_lba);
        codec::put(&mut param, 16, self.descriptor.length_lba);
        param
    }

    /// Decode a parameter list produced by [`Self::parameter_list`]
    ///
    /// Returns `None` if the header lengths do not describe exactly one
    /// descriptor.
    pub fn from_parameter_list(param: &[u8]) -> Option<Self> {
        if param.len() != PARAMETER_LEN
            || codec::get::<u16>(param, 0) as usize != PARAMETER_LEN - 2
            || codec::get::<u16>(param, 2) as usize != BLOCK_DESCRIPTOR_LEN
        {
            return None;
        }
        Some(UnmapDescriptor::new(codec::get(param, 8), codec::get(param, 16)).command())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdb_layout() {
        let cdb = UnmapDescriptor::new(0, 1).command().cdb();
        assert_eq!(cdb, [0x42, 0, 0, 0, 0, 0, 0, 0x00, 0x18, 0]);
    }

    #[test]
    fn test_parameter_list_layout() {
        let cmd = UnmapDescriptor::new(0x0102_0304_0506_0708, 0x0A0B_0C0D).command();
        let param = cmd.parameter_list();

        assert_eq!(&param[0..2], &[0x00, 0x16]);
        assert_eq!(&param[2..4], &[0x00, 0x10]);
        assert_eq!(&param[4..8], &[0; 4]);
        assert_eq!(&param[8..16], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&param[16..20], &[0x0A, 0x0B, 0x0C, 0x0D]);
        assert_eq!(&param[20..24], &[0; 4]);
    }

    #[test]
    fn test_from_parameter_list() {
        let cmd = UnmapDescriptor::new(2048, 77).command();
        assert_eq!(UnmapCommand::from_parameter_list(&cmd.parameter_list()), Some(cmd));

        let mut bad = cmd.parameter_list();
        bad[3] = 32;
        assert_eq!(UnmapCommand::from_parameter_list(&bad), None);
        assert_eq!(UnmapCommand::from_parameter_list(&bad[..20]), None);
    }

    #[test]
    fn test_end_lba() {
        assert_eq!(UnmapDescriptor::new(100, 28).end_lba(), 128);
    }
}
