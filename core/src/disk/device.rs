//! Device capabilities and discard statistics.
//!
//! A [`DeviceCapabilities`] value is the combined answer of READ CAPACITY(16)
//! and the Block Limits VPD page. It is validated once at construction and is
//! read-only afterwards.

use crate::error::{ProbeError, ProbeResult};
use crate::scsi::{BlockLimits, CapacityReport};

// ============================================================================
// Capabilities
// ============================================================================

/// Geometry and unmap limits of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    last_block_address: u64,
    sector_size: u32,
    device_size: u64,
    limits: BlockLimits,
}

impl DeviceCapabilities {
    /// Combine probe replies into a capability record.
    ///
    /// Fails if the sector size is zero or the device size does not fit in
    /// 64 bits.
    pub fn new(capacity: CapacityReport, limits: BlockLimits) -> ProbeResult<Self> {
        if capacity.sector_size == 0 {
            return Err(ProbeError::InvalidGeometry { reason: "sector size is zero" });
        }

        let device_size = capacity.device_size().ok_or(ProbeError::Overflow {
            last_block_address: capacity.last_block_address,
            sector_size: capacity.sector_size,
        })?;

        Ok(Self {
            last_block_address: capacity.last_block_address,
            sector_size: capacity.sector_size,
            device_size,
            limits,
        })
    }

    /// Address of the last logical block
    #[inline]
    pub fn last_block_address(&self) -> u64 {
        self.last_block_address
    }

    /// Logical block size in bytes (never zero)
    #[inline]
    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }

    /// Device size in bytes
    #[inline]
    pub fn device_size(&self) -> u64 {
        self.device_size
    }

    /// Raw Block Limits page values
    #[inline]
    pub fn limits(&self) -> &BlockLimits {
        &self.limits
    }

    /// Largest transfer per command, in blocks
    #[inline]
    pub fn maximum_transfer_length(&self) -> u32 {
        self.limits.maximum_transfer_length
    }

    /// Preferred transfer size, in blocks
    #[inline]
    pub fn optimal_transfer_length(&self) -> u32 {
        self.limits.optimal_transfer_length
    }

    /// Largest block count per UNMAP command
    #[inline]
    pub fn maximum_unmap_lba_count(&self) -> u32 {
        self.limits.maximum_unmap_lba_count
    }

    /// Largest descriptor count per UNMAP parameter list
    #[inline]
    pub fn maximum_unmap_block_descriptor_count(&self) -> u32 {
        self.limits.maximum_unmap_block_descriptor_count
    }

    /// Preferred unmap granularity, in blocks
    #[inline]
    pub fn optimal_unmap_granularity(&self) -> u32 {
        self.limits.optimal_unmap_granularity
    }

    /// Device accepts UNMAP
    #[inline]
    pub fn supports_unmap(&self) -> bool {
        self.limits.supports_unmap()
    }

    /// `bytes` is a whole number of sectors
    #[inline]
    pub fn is_aligned(&self, bytes: u64) -> bool {
        bytes % u64::from(self.sector_size) == 0
    }

    /// Convert a byte count to blocks (truncating)
    #[inline]
    pub fn bytes_to_blocks(&self, bytes: u64) -> u64 {
        bytes / u64::from(self.sector_size)
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Running totals of a discard session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscardStats {
    /// UNMAP commands completed
    pub commands: u64,
    /// Logical blocks discarded
    pub blocks: u64,
    /// Bytes discarded
    pub bytes: u64,
    /// Planned ranges completed
    pub ranges: u64,
}

impl DiscardStats {
    /// Create empty stats
    pub const fn new() -> Self {
        Self { commands: 0, blocks: 0, bytes: 0, ranges: 0 }
    }

    /// Record a completed range
    #[inline]
    pub fn record_range(&mut self, commands: u64, bytes: u64, sector_size: u32) {
        self.commands += commands;
        self.blocks += bytes / u64::from(sector_size);
        self.bytes += bytes;
        self.ranges += 1;
    }

    /// Average blocks per command
    pub fn avg_blocks_per_command(&self) -> u64 {
        if self.commands == 0 {
            0
        } else {
            self.blocks / self.commands
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_unmap: u32) -> BlockLimits {
        BlockLimits { maximum_unmap_lba_count: max_unmap, ..BlockLimits::default() }
    }

    #[test]
    fn test_capabilities_from_reports() {
        let capacity = CapacityReport { last_block_address: 2047, sector_size: 512 };
        let caps = DeviceCapabilities::new(capacity, limits(1024)).unwrap();

        assert_eq!(caps.last_block_address(), 2047);
        assert_eq!(caps.sector_size(), 512);
        assert_eq!(caps.device_size(), 1024 * 1024);
        assert_eq!(caps.maximum_unmap_lba_count(), 1024);
        assert!(caps.supports_unmap());
        assert!(caps.is_aligned(4096));
        assert!(!caps.is_aligned(4097));
        assert_eq!(caps.bytes_to_blocks(4096), 8);
    }

    #[test]
    fn test_zero_sector_size() {
        let capacity = CapacityReport { last_block_address: 10, sector_size: 0 };
        assert_eq!(
            DeviceCapabilities::new(capacity, limits(1)),
            Err(ProbeError::InvalidGeometry { reason: "sector size is zero" })
        );
    }

    #[test]
    fn test_size_overflow() {
        let capacity = CapacityReport { last_block_address: u64::MAX, sector_size: 512 };
        assert_eq!(
            DeviceCapabilities::new(capacity, limits(1)),
            Err(ProbeError::Overflow { last_block_address: u64::MAX, sector_size: 512 })
        );
    }

    #[test]
    fn test_unsupported_unmap() {
        let capacity = CapacityReport { last_block_address: 7, sector_size: 4096 };
        let caps = DeviceCapabilities::new(capacity, limits(0)).unwrap();
        assert!(!caps.supports_unmap());
    }

    #[test]
    fn test_stats() {
        let mut stats = DiscardStats::new();
        assert_eq!(stats.avg_blocks_per_command(), 0);

        stats.record_range(3, 512 * 30, 512);
        stats.record_range(1, 512 * 2, 512);
        assert_eq!(stats.commands, 4);
        assert_eq!(stats.blocks, 32);
        assert_eq!(stats.bytes, 512 * 32);
        assert_eq!(stats.ranges, 2);
        assert_eq!(stats.avg_blocks_per_command(), 8);
    }
}
