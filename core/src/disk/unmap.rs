//! UNMAP issuance.
//!
//! A [`DiscardRange`] is converted to blocks and sent as one or more
//! single-descriptor UNMAP commands, each no larger than the device's
//! maximum unmap LBA count. The first rejected command aborts the range.

use super::device::DeviceCapabilities;
use crate::error::{UnmapError, UnmapResult};
use crate::plan::DiscardRange;
use crate::scsi::{UnmapDescriptor, COMMAND_TIMEOUT};
use core::time::Duration;
use sgdiscard_hal::{DataTransfer, DeviceControl};

/// Sends UNMAP commands for ranges on one device
#[derive(Debug, Clone, Copy)]
pub struct UnmapIssuer<'a> {
    capabilities: &'a DeviceCapabilities,
    timeout: Duration,
}

impl<'a> UnmapIssuer<'a> {
    /// Create an issuer with the default command timeout
    pub fn new(capabilities: &'a DeviceCapabilities) -> Self {
        Self { capabilities, timeout: COMMAND_TIMEOUT }
    }

    /// Override the per-command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Descriptors covering `range`, in increasing LBA order.
    ///
    /// Yields nothing for an empty range or when unmap is unsupported.
    pub fn descriptors(&self, range: &DiscardRange) -> Descriptors {
        Descriptors {
            next_lba: self.capabilities.bytes_to_blocks(range.offset),
            remaining: self.capabilities.bytes_to_blocks(range.length),
            max_count: self.capabilities.maximum_unmap_lba_count(),
        }
    }

    /// Unmap `range`, returning the number of commands issued
    pub fn issue<T: DeviceControl + ?Sized>(
        &self,
        transport: &mut T,
        range: &DiscardRange,
    ) -> UnmapResult<u64> {
        if !self.capabilities.supports_unmap() {
            return Err(UnmapError::Unsupported);
        }

        let mut issued = 0;
        for descriptor in self.descriptors(range) {
            let command = descriptor.command();
            let cdb = command.cdb();
            let param = command.parameter_list();

            log::debug!(
                "UNMAP lba {} count {}",
                descriptor.offset_lba,
                descriptor.length_lba
            );
            transport
                .execute(&cdb, DataTransfer::ToDevice(&param), self.timeout)
                .map_err(|error| {
                    log::error!(
                        "UNMAP of {} blocks at LBA {} failed: {}",
                        descriptor.length_lba,
                        descriptor.offset_lba,
                        error
                    );
                    UnmapError::DeviceRejected {
                        offset_lba: descriptor.offset_lba,
                        length_lba: descriptor.length_lba,
                        error,
                    }
                })?;
            issued += 1;
        }

        Ok(issued)
    }
}

/// Iterator splitting a block range by the maximum unmap count
#[derive(Debug, Clone)]
pub struct Descriptors {
    next_lba: u64,
    remaining: u64,
    max_count: u32,
}

impl Iterator for Descriptors {
    type Item = UnmapDescriptor;

    fn next(&mut self) -> Option<UnmapDescriptor> {
        if self.remaining == 0 || self.max_count == 0 {
            return None;
        }

        // Bounded by max_count, so it fits in u32.
        let count = self.remaining.min(u64::from(self.max_count)) as u32;
        let descriptor = UnmapDescriptor::new(self.next_lba, count);
        self.next_lba = descriptor.end_lba();
        self.remaining -= u64::from(count);
        Some(descriptor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.max_count == 0 {
            return (0, Some(0));
        }
        let n = self.remaining.div_ceil(u64::from(self.max_count));
        match usize::try_from(n) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl core::iter::FusedIterator for Descriptors {}

/// Unmap `range` with default settings
pub fn issue<T: DeviceControl + ?Sized>(
    transport: &mut T,
    capabilities: &DeviceCapabilities,
    range: &DiscardRange,
) -> UnmapResult<()> {
    UnmapIssuer::new(capabilities).issue(transport, range).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scsi::{opcode, BlockLimits, CapacityReport, UnmapCommand};
    use sgdiscard_hal::mock::ScriptedTransport;
    use sgdiscard_hal::{Direction, TransportError};

    const SECTOR: u64 = 512;

    fn caps(max_unmap: u32) -> DeviceCapabilities {
        let capacity = CapacityReport { last_block_address: (1 << 24) - 1, sector_size: 512 };
        let limits = BlockLimits { maximum_unmap_lba_count: max_unmap, ..BlockLimits::default() };
        DeviceCapabilities::new(capacity, limits).unwrap()
    }

    fn sent(dev: &ScriptedTransport) -> Vec<UnmapDescriptor> {
        dev.commands_with_opcode(opcode::UNMAP)
            .map(|cmd| UnmapCommand::from_parameter_list(&cmd.data_out).unwrap().descriptor)
            .collect()
    }

    #[test]
    fn test_split_on_maximum_count() {
        let n = 1000u32;
        let caps = caps(n);
        let range = DiscardRange { offset: 64 * SECTOR, length: (2 * u64::from(n) + 5) * SECTOR };
        let mut dev = ScriptedTransport::new();

        let issued = UnmapIssuer::new(&caps).issue(&mut dev, &range).unwrap();
        assert_eq!(issued, 3);
        assert_eq!(
            sent(&dev),
            vec![
                UnmapDescriptor::new(64, n),
                UnmapDescriptor::new(64 + 1000, n),
                UnmapDescriptor::new(64 + 2000, 5),
            ]
        );

        for cmd in dev.commands() {
            assert_eq!(cmd.cdb.as_slice(), &[0x42, 0, 0, 0, 0, 0, 0, 0, 24, 0]);
            assert_eq!(cmd.direction, Direction::ToDevice);
            assert_eq!(cmd.timeout, COMMAND_TIMEOUT);
        }
    }

    #[test]
    fn test_exact_multiple() {
        let caps = caps(8);
        let range = DiscardRange { offset: 0, length: 16 * SECTOR };
        let mut dev = ScriptedTransport::new();

        issue(&mut dev, &caps, &range).unwrap();
        assert_eq!(sent(&dev), vec![UnmapDescriptor::new(0, 8), UnmapDescriptor::new(8, 8)]);
    }

    #[test]
    fn test_empty_range_sends_nothing() {
        let caps = caps(8);
        let mut dev = ScriptedTransport::new();
        let issued = UnmapIssuer::new(&caps)
            .issue(&mut dev, &DiscardRange { offset: 4096, length: 0 })
            .unwrap();
        assert_eq!(issued, 0);
        assert!(dev.commands().is_empty());
    }

    #[test]
    fn test_unsupported() {
        let caps = caps(0);
        let mut dev = ScriptedTransport::new();
        assert_eq!(
            issue(&mut dev, &caps, &DiscardRange { offset: 0, length: SECTOR }),
            Err(UnmapError::Unsupported)
        );
        assert!(dev.commands().is_empty());
    }

    #[test]
    fn test_failure_aborts() {
        let caps = caps(4);
        let range = DiscardRange { offset: 0, length: 12 * SECTOR };
        let mut dev = ScriptedTransport::new();
        dev.push_ok().push_error(TransportError::Timeout).push_ok();

        assert_eq!(
            issue(&mut dev, &caps, &range),
            Err(UnmapError::DeviceRejected {
                offset_lba: 4,
                length_lba: 4,
                error: TransportError::Timeout,
            })
        );
        assert_eq!(dev.commands().len(), 2);
        assert_eq!(dev.pending_replies(), 1);
    }

    #[test]
    fn test_large_count_fits_descriptor() {
        let caps = caps(u32::MAX);
        let blocks = u64::from(u32::MAX) + 10;
        let issuer = UnmapIssuer::new(&caps);
        let descs: Vec<_> =
            issuer.descriptors(&DiscardRange { offset: 0, length: blocks * SECTOR }).collect();
        assert_eq!(
            descs,
            vec![UnmapDescriptor::new(0, u32::MAX), UnmapDescriptor::new(u64::from(u32::MAX), 10)]
        );
    }

    #[test]
    fn test_descriptor_size_hint() {
        let caps = caps(10);
        let issuer = UnmapIssuer::new(&caps);
        let descs = issuer.descriptors(&DiscardRange { offset: 0, length: 25 * SECTOR });
        assert_eq!(descs.size_hint(), (3, Some(3)));
        assert_eq!(descs.count(), 3);
    }

    #[test]
    fn test_custom_timeout() {
        let caps = caps(10);
        let mut dev = ScriptedTransport::new();
        UnmapIssuer::new(&caps)
            .with_timeout(Duration::from_secs(5))
            .issue(&mut dev, &DiscardRange { offset: 0, length: SECTOR })
            .unwrap();
        assert_eq!(dev.commands()[0].timeout, Duration::from_secs(5));
    }
}
