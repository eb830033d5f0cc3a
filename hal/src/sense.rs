//! # Sense Data
//!
//! Decoding of the sense buffer a device returns with CHECK CONDITION.
//! Both fixed-format (0x70/0x71) and descriptor-format (0x72/0x73)
//! responses are understood; only the key and additional sense code are kept.

use core::fmt;

/// Sense key (low nibble of the key byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SenseKey {
    /// No specific sense key
    NoSense = 0x0,
    /// Command completed with recovery action
    RecoveredError = 0x1,
    /// Logical unit not accessible
    NotReady = 0x2,
    /// Unrecovered medium error
    MediumError = 0x3,
    /// Non-recoverable hardware failure
    HardwareError = 0x4,
    /// Illegal parameter in the command or parameter list
    IllegalRequest = 0x5,
    /// Unit attention condition
    UnitAttention = 0x6,
    /// Medium is write protected
    DataProtect = 0x7,
    /// Blank or non-blank medium encountered
    BlankCheck = 0x8,
    /// Vendor specific
    VendorSpecific = 0x9,
    /// Copy operation aborted
    CopyAborted = 0xA,
    /// Command aborted by the device
    AbortedCommand = 0xB,
    /// Obsolete
    Reserved = 0xC,
    /// Buffered device reached end of partition
    VolumeOverflow = 0xD,
    /// Source data did not match
    Miscompare = 0xE,
    /// Completed sense data
    Completed = 0xF,
}

impl SenseKey {
    /// Decode from the raw key nibble
    pub fn from_raw(v: u8) -> Self {
        match v & 0x0F {
            0x0 => Self::NoSense,
            0x1 => Self::RecoveredError,
            0x2 => Self::NotReady,
            0x3 => Self::MediumError,
            0x4 => Self::HardwareError,
            0x5 => Self::IllegalRequest,
            0x6 => Self::UnitAttention,
            0x7 => Self::DataProtect,
            0x8 => Self::BlankCheck,
            0x9 => Self::VendorSpecific,
            0xA => Self::CopyAborted,
            0xB => Self::AbortedCommand,
            0xC => Self::Reserved,
            0xD => Self::VolumeOverflow,
            0xE => Self::Miscompare,
            _ => Self::Completed,
        }
    }

    /// Key name as printed in kernel logs
    pub fn name(self) -> &'static str {
        match self {
            Self::NoSense => "NO SENSE",
            Self::RecoveredError => "RECOVERED ERROR",
            Self::NotReady => "NOT READY",
            Self::MediumError => "MEDIUM ERROR",
            Self::HardwareError => "HARDWARE ERROR",
            Self::IllegalRequest => "ILLEGAL REQUEST",
            Self::UnitAttention => "UNIT ATTENTION",
            Self::DataProtect => "DATA PROTECT",
            Self::BlankCheck => "BLANK CHECK",
            Self::VendorSpecific => "VENDOR SPECIFIC",
            Self::CopyAborted => "COPY ABORTED",
            Self::AbortedCommand => "ABORTED COMMAND",
            Self::Reserved => "RESERVED",
            Self::VolumeOverflow => "VOLUME OVERFLOW",
            Self::Miscompare => "MISCOMPARE",
            Self::Completed => "COMPLETED",
        }
    }
}

/// Decoded sense information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenseData {
    /// Sense key
    pub key: SenseKey,
    /// Additional sense code
    pub asc: u8,
    /// Additional sense code qualifier
    pub ascq: u8,
}

impl SenseData {
    /// Parse a sense buffer as written by the device
    ///
    /// Returns `None` for an empty buffer or an unknown response code.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        let response_code = buf.first()? & 0x7F;
        let byte = |i: usize| buf.get(i).copied().unwrap_or(0);

        match response_code {
            // Fixed format
            0x70 | 0x71 => Some(Self {
                key: SenseKey::from_raw(byte(2)),
                asc: byte(12),
                ascq: byte(13),
            }),
            // Descriptor format
            0x72 | 0x73 => Some(Self {
                key: SenseKey::from_raw(byte(1)),
                asc: byte(2),
                ascq: byte(3),
            }),
            _ => None,
        }
    }

    /// Invalid command operation code (ASC 0x20)
    #[inline]
    pub fn is_invalid_opcode(&self) -> bool {
        self.key == SenseKey::IllegalRequest && self.asc == 0x20
    }

    /// Invalid field in the parameter list (ASC 0x26)
    #[inline]
    pub fn is_invalid_parameter(&self) -> bool {
        self.key == SenseKey::IllegalRequest && self.asc == 0x26
    }
}

impl fmt::Display for SenseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (asc {:#04x}, ascq {:#04x})",
            self.key.name(),
            self.asc,
            self.ascq
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_format() {
        let mut buf = [0u8; 18];
        buf[0] = 0xF0; // valid bit set
        buf[2] = 0x05;
        buf[12] = 0x20;
        buf[13] = 0x00;

        let sense = SenseData::parse(&buf).unwrap();
        assert_eq!(sense.key, SenseKey::IllegalRequest);
        assert!(sense.is_invalid_opcode());
        assert!(!sense.is_invalid_parameter());
    }

    #[test]
    fn test_descriptor_format() {
        let buf = [0x72, 0x05, 0x26, 0x01, 0, 0, 0, 0];
        let sense = SenseData::parse(&buf).unwrap();
        assert_eq!(sense.key, SenseKey::IllegalRequest);
        assert_eq!(sense.asc, 0x26);
        assert_eq!(sense.ascq, 0x01);
        assert!(sense.is_invalid_parameter());
    }

    #[test]
    fn test_short_and_unknown() {
        assert!(SenseData::parse(&[]).is_none());
        assert!(SenseData::parse(&[0x00, 0x05]).is_none());

        // Truncated fixed-format sense still yields the key
        let sense = SenseData::parse(&[0x70, 0x00, 0x02]).unwrap();
        assert_eq!(sense.key, SenseKey::NotReady);
        assert_eq!(sense.asc, 0);
    }
}
