//! # Error Types
//!
//! One error enum per stage of a discard session. All of them are terminal:
//! nothing in this crate retries, and a failure stops the remaining plan.

use core::fmt;
use sgdiscard_hal::TransportError;

// =============================================================================
// Size Parsing
// =============================================================================

/// Failure to parse a size string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Empty, negative, unparsable, or with an unknown suffix
    InvalidFormat,
    /// Does not fit in 64 bits
    OutOfRange,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "invalid size format"),
            Self::OutOfRange => write!(f, "size out of range"),
        }
    }
}

/// Result type for size parsing
pub type ParseResult<T> = Result<T, ParseError>;

// =============================================================================
// Probing
// =============================================================================

/// Failure while discovering device capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeError {
    /// A probe command failed at the transport level
    TransportFailed {
        /// Command that failed
        command: &'static str,
        /// Underlying transport status
        error: TransportError,
    },
    /// (last_block_address + 1) * sector_size does not fit in 64 bits
    Overflow {
        /// Reported last block address
        last_block_address: u64,
        /// Reported sector size
        sector_size: u32,
    },
    /// The device reported a geometry that cannot be addressed
    InvalidGeometry {
        /// What was wrong with it
        reason: &'static str,
    },
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportFailed { command, error } => {
                write!(f, "{} failed: {}", command, error)
            }
            Self::Overflow { last_block_address, sector_size } => {
                write!(
                    f,
                    "device size overflows: last LBA {} with {}-byte sectors",
                    last_block_address, sector_size
                )
            }
            Self::InvalidGeometry { reason } => write!(f, "invalid device geometry: {}", reason),
        }
    }
}

/// Result type for probing
pub type ProbeResult<T> = Result<T, ProbeError>;

// =============================================================================
// Planning
// =============================================================================

/// Request field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Start offset
    Offset,
    /// Length (or step, when one is given)
    Length,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset => write!(f, "offset"),
            Self::Length => write!(f, "length"),
        }
    }
}

/// Request invalid against the device geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    /// Value is not a multiple of the sector size
    Misaligned {
        /// Which value
        field: Field,
        /// The value in bytes
        value: u64,
        /// Device sector size
        sector_size: u32,
    },
    /// Offset lies beyond the end of the device
    OutOfBounds {
        /// Requested offset
        offset: u64,
        /// Device size in bytes
        device_size: u64,
    },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Misaligned { field, value, sector_size } => {
                write!(
                    f,
                    "{} {} is not aligned to sector size {}",
                    field, value, sector_size
                )
            }
            Self::OutOfBounds { offset, device_size } => {
                write!(
                    f,
                    "offset {} is greater than device size {}",
                    offset, device_size
                )
            }
        }
    }
}

/// Result type for planning
pub type PlanResult<T> = Result<T, PlanError>;

// =============================================================================
// Unmap
// =============================================================================

/// Failure while issuing UNMAP commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmapError {
    /// The device reports a maximum unmap LBA count of zero
    Unsupported,
    /// The device (or transport) rejected an UNMAP command
    DeviceRejected {
        /// First LBA of the rejected descriptor
        offset_lba: u64,
        /// Block count of the rejected descriptor
        length_lba: u32,
        /// Underlying transport status
        error: TransportError,
    },
}

impl UnmapError {
    /// Explanation derived from the sense data of a rejected command
    pub fn hint(&self) -> Option<&'static str> {
        let Self::DeviceRejected { error: TransportError::Status { sense: Some(sense), .. }, .. } =
            self
        else {
            return None;
        };
        if sense.is_invalid_opcode() {
            Some("device does not implement UNMAP")
        } else if sense.is_invalid_parameter() {
            Some("device rejected the UNMAP block descriptor")
        } else {
            None
        }
    }
}

impl fmt::Display for UnmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "device does not support unmap"),
            Self::DeviceRejected { offset_lba, length_lba, error } => {
                write!(
                    f,
                    "unmap of {} blocks at LBA {} rejected: {}",
                    length_lba, offset_lba, error
                )
            }
        }
    }
}

/// Result type for unmap issuance
pub type UnmapResult<T> = Result<T, UnmapError>;

// =============================================================================
// Session
// =============================================================================

/// Any failure of a discard session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardError {
    /// Capability discovery failed
    Probe(ProbeError),
    /// Request was invalid
    Plan(PlanError),
    /// Device rejected a command
    Unmap(UnmapError),
}

impl From<ProbeError> for DiscardError {
    fn from(e: ProbeError) -> Self {
        Self::Probe(e)
    }
}

impl From<PlanError> for DiscardError {
    fn from(e: PlanError) -> Self {
        Self::Plan(e)
    }
}

impl From<UnmapError> for DiscardError {
    fn from(e: UnmapError) -> Self {
        Self::Unmap(e)
    }
}

impl DiscardError {
    /// Explanation derived from device sense data, if any
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Unmap(e) => e.hint(),
            _ => None,
        }
    }
}

impl fmt::Display for DiscardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probe(e) => e.fmt(f),
            Self::Plan(e) => e.fmt(f),
            Self::Unmap(e) => e.fmt(f),
        }
    }
}

/// Result type for a discard session
pub type DiscardResult<T> = Result<T, DiscardError>;

// =============================================================================
// std integration
// =============================================================================

#[cfg(feature = "std")]
mod std_impls {
    use super::*;

    impl std::error::Error for ParseError {}

    impl std::error::Error for ProbeError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                Self::TransportFailed { error, .. } => Some(error),
                _ => None,
            }
        }
    }

    impl std::error::Error for PlanError {}

    impl std::error::Error for UnmapError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                Self::DeviceRejected { error, .. } => Some(error),
                Self::Unsupported => None,
            }
        }
    }

    impl std::error::Error for DiscardError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                Self::Probe(e) => Some(e),
                Self::Plan(e) => Some(e),
                Self::Unmap(e) => Some(e),
            }
        }
    }
}
