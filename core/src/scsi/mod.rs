//! # SCSI Wire Structures
//!
//! The three commands this crate speaks, encoded bit-exactly:
//!
//! | Command                | Opcode | CDB | Data            |
//! |------------------------|--------|-----|-----------------|
//! | READ CAPACITY(16)      | 0x9E   | 16  | 32 bytes in     |
//! | INQUIRY, VPD page 0xB0 | 0x12   | 6   | 64 bytes in     |
//! | UNMAP                  | 0x42   | 10  | 24 bytes out    |

pub mod capacity;
pub mod inquiry;
pub mod unmap;

use core::time::Duration;

pub use capacity::{CapacityReport, ReadCapacity16};
pub use inquiry::{BlockLimits, BlockLimitsInquiry};
pub use unmap::{UnmapCommand, UnmapDescriptor};

/// Timeout applied to every command
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Operation codes
pub mod opcode {
    /// INQUIRY
    pub const INQUIRY: u8 = 0x12;
    /// UNMAP
    pub const UNMAP: u8 = 0x42;
    /// SERVICE ACTION IN(16), carrying READ CAPACITY(16)
    pub const SERVICE_ACTION_IN_16: u8 = 0x9E;
}
