//! # sgdiscard HAL - Device Control Abstraction
//!
//! This crate defines the transport used to exchange SCSI commands with a
//! block device. Everything above it (probing, planning, unmap issuance) talks
//! to hardware only through [`DeviceControl`].
//!
//! ## Design Philosophy
//!
//! The HAL is designed to be:
//! - **Minimal**: one request/response primitive, nothing else
//! - **Synchronous**: every command is a blocking round trip
//! - **Substitutable**: tests drive the core through [`mock::ScriptedTransport`]
//!
//! ## Transports
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │               DeviceControl                   │
//! ├───────────────────────┬───────────────────────┤
//! │  arch::linux::SgDevice│  mock::Scripted...    │
//! │  (SG_IO ioctl)        │  (recorded, in-memory)│
//! └───────────────────────┴───────────────────────┘
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod arch;
pub mod sense;

#[cfg(feature = "alloc")]
pub mod mock;

use arrayvec::ArrayVec;
use core::fmt;
use core::time::Duration;

pub use sense::{SenseData, SenseKey};

// =============================================================================
// Command Descriptor Blocks
// =============================================================================

/// Longest command descriptor block accepted by any transport
pub const MAX_CDB_LEN: usize = 16;

/// Owned command descriptor block
pub type Cdb = ArrayVec<u8, MAX_CDB_LEN>;

/// Copy a command into a [`Cdb`], rejecting empty or oversized commands
pub fn cdb_from_slice(command: &[u8]) -> HalResult<Cdb> {
    if command.is_empty() {
        return Err(TransportError::InvalidRequest {
            reason: "empty command descriptor block",
        });
    }
    let mut cdb = Cdb::new();
    cdb.try_extend_from_slice(command)
        .map_err(|_| TransportError::InvalidRequest {
            reason: "command descriptor block longer than 16 bytes",
        })?;
    Ok(cdb)
}

// =============================================================================
// Data Transfer
// =============================================================================

/// Direction of the data phase of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// No data phase
    None,
    /// Host to device (parameter lists)
    ToDevice,
    /// Device to host (replies)
    FromDevice,
}

/// Data buffer attached to a command
#[derive(Debug)]
pub enum DataTransfer<'a> {
    /// Command carries no data
    None,
    /// Outbound buffer sent to the device
    ToDevice(&'a [u8]),
    /// Inbound buffer filled by the device
    FromDevice(&'a mut [u8]),
}

impl DataTransfer<'_> {
    /// Direction of this transfer
    #[inline]
    pub fn direction(&self) -> Direction {
        match self {
            Self::None => Direction::None,
            Self::ToDevice(_) => Direction::ToDevice,
            Self::FromDevice(_) => Direction::FromDevice,
        }
    }

    /// Buffer length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::ToDevice(buf) => buf.len(),
            Self::FromDevice(buf) => buf.len(),
        }
    }

    /// Check if the transfer moves no bytes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Successful command completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Completion {
    /// Bytes of the data buffer the device did not transfer
    pub residual: u32,
}

impl Completion {
    /// Bytes actually transferred out of `requested`
    #[inline]
    pub fn transferred(&self, requested: usize) -> usize {
        requested.saturating_sub(self.residual as usize)
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Result type for transport operations
pub type HalResult<T> = Result<T, TransportError>;

/// Failure of a single device-control round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be expressed to the transport
    InvalidRequest {
        /// What was wrong with it
        reason: &'static str,
    },
    /// The operating system refused the passthrough call
    Os {
        /// Raw errno value
        errno: i32,
    },
    /// The command did not complete before its timeout
    Timeout,
    /// The command completed with a non-GOOD status
    Status {
        /// SCSI status byte
        status: u8,
        /// Host adapter status
        host_status: u16,
        /// Driver status
        driver_status: u16,
        /// Decoded sense data, if the device returned any
        sense: Option<SenseData>,
    },
}

/// SCSI status byte values
pub mod status {
    /// Command completed
    pub const GOOD: u8 = 0x00;
    /// Sense data is available
    pub const CHECK_CONDITION: u8 = 0x02;
    /// Logical unit busy
    pub const BUSY: u8 = 0x08;
    /// Reserved by another initiator
    pub const RESERVATION_CONFLICT: u8 = 0x18;
    /// Task set full
    pub const TASK_SET_FULL: u8 = 0x28;
    /// Task aborted
    pub const TASK_ABORTED: u8 = 0x40;

    /// Human readable name of a status byte
    pub fn name(status: u8) -> &'static str {
        match status {
            GOOD => "GOOD",
            CHECK_CONDITION => "CHECK CONDITION",
            BUSY => "BUSY",
            RESERVATION_CONFLICT => "RESERVATION CONFLICT",
            TASK_SET_FULL => "TASK SET FULL",
            TASK_ABORTED => "TASK ABORTED",
            _ => "UNKNOWN",
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest { reason } => write!(f, "invalid request: {}", reason),
            Self::Os { errno } => write!(f, "passthrough call failed (errno {})", errno),
            Self::Timeout => write!(f, "command timed out"),
            Self::Status { status, host_status, driver_status, sense } => {
                write!(
                    f,
                    "status {:#04x} ({}), host {:#06x}, driver {:#06x}",
                    status,
                    status::name(*status),
                    host_status,
                    driver_status
                )?;
                if let Some(sense) = sense {
                    write!(f, ", sense: {}", sense)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

// =============================================================================
// Transport Trait
// =============================================================================

/// Synchronous SCSI command passthrough
///
/// Implementations issue exactly one attempt per call. Taking `&mut self`
/// keeps a device handle with a single mutator for the whole session.
pub trait DeviceControl {
    /// Execute `cdb` with an optional data buffer, blocking up to `timeout`
    fn execute(
        &mut self,
        cdb: &[u8],
        transfer: DataTransfer<'_>,
        timeout: Duration,
    ) -> HalResult<Completion>;
}

impl<T: DeviceControl + ?Sized> DeviceControl for &mut T {
    #[inline]
    fn execute(
        &mut self,
        cdb: &[u8],
        transfer: DataTransfer<'_>,
        timeout: Duration,
    ) -> HalResult<Completion> {
        (**self).execute(cdb, transfer, timeout)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdb_from_slice() {
        let cdb = cdb_from_slice(&[0x12, 0x01, 0xb0, 0x00, 0x40, 0x00]).unwrap();
        assert_eq!(cdb.len(), 6);
        assert_eq!(cdb[2], 0xb0);

        assert!(matches!(
            cdb_from_slice(&[]),
            Err(TransportError::InvalidRequest { .. })
        ));
        assert!(matches!(
            cdb_from_slice(&[0u8; 17]),
            Err(TransportError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_data_transfer_direction() {
        let mut reply = [0u8; 32];
        let transfer = DataTransfer::FromDevice(&mut reply);
        assert_eq!(transfer.direction(), Direction::FromDevice);
        assert_eq!(transfer.len(), 32);

        assert!(DataTransfer::None.is_empty());
        assert_eq!(DataTransfer::ToDevice(&[1, 2, 3]).direction(), Direction::ToDevice);
    }

    #[test]
    fn test_completion_transferred() {
        let completion = Completion { residual: 8 };
        assert_eq!(completion.transferred(64), 56);
        assert_eq!(completion.transferred(4), 0);
    }

    #[test]
    fn test_status_display() {
        let err = TransportError::Status {
            status: status::CHECK_CONDITION,
            host_status: 0,
            driver_status: 0x08,
            sense: None,
        };
        let text = format!("{}", err);
        assert!(text.contains("CHECK CONDITION"));
    }
}
