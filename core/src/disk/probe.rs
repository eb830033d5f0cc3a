//! Capability discovery.
//!
//! Two read-only commands, each a single blocking attempt:
//! READ CAPACITY(16) for geometry, then INQUIRY for the Block Limits page.

use super::device::DeviceCapabilities;
use crate::error::{ProbeError, ProbeResult};
use crate::scsi::{
    capacity, inquiry, BlockLimits, BlockLimitsInquiry, CapacityReport, ReadCapacity16,
    COMMAND_TIMEOUT,
};
use sgdiscard_hal::{DataTransfer, DeviceControl, TransportError};

/// Query geometry and unmap limits
pub fn probe<T: DeviceControl + ?Sized>(transport: &mut T) -> ProbeResult<DeviceCapabilities> {
    let capacity = read_capacity(transport)?;
    let limits = inquire_block_limits(transport)?;

    let caps = DeviceCapabilities::new(capacity, limits)?;
    log::info!(
        "device: {} sectors of {} bytes ({} bytes), max unmap {} blocks, granularity {}",
        caps.last_block_address().saturating_add(1),
        caps.sector_size(),
        caps.device_size(),
        caps.maximum_unmap_lba_count(),
        caps.optimal_unmap_granularity(),
    );
    Ok(caps)
}

/// Issue READ CAPACITY(16)
pub fn read_capacity<T: DeviceControl + ?Sized>(transport: &mut T) -> ProbeResult<CapacityReport> {
    let mut reply = [0u8; capacity::REPLY_LEN];
    let cdb = ReadCapacity16.cdb();

    log::debug!("READ CAPACITY(16): {:02x?}", cdb);
    let completion = transport
        .execute(&cdb, DataTransfer::FromDevice(&mut reply), COMMAND_TIMEOUT)
        .map_err(|error| failed("READ CAPACITY(16)", error))?;
    let received = completion.transferred(reply.len());
    if received < reply.len() {
        log::debug!("READ CAPACITY(16): short reply, {} of {} bytes", received, reply.len());
    }

    Ok(CapacityReport::decode(&reply))
}

/// Issue INQUIRY for the Block Limits VPD page
pub fn inquire_block_limits<T: DeviceControl + ?Sized>(
    transport: &mut T,
) -> ProbeResult<BlockLimits> {
    let mut reply = [0u8; inquiry::REPLY_LEN];
    let cdb = BlockLimitsInquiry.cdb();

    log::debug!("INQUIRY VPD 0xb0: {:02x?}", cdb);
    let completion = transport
        .execute(&cdb, DataTransfer::FromDevice(&mut reply), COMMAND_TIMEOUT)
        .map_err(|error| failed("INQUIRY", error))?;
    let received = completion.transferred(reply.len());
    if received < reply.len() {
        log::debug!("INQUIRY VPD 0xb0: short reply, {} of {} bytes", received, reply.len());
    }

    Ok(BlockLimits::decode(&reply))
}

fn failed(command: &'static str, error: TransportError) -> ProbeError {
    log::error!("{} failed: {}", command, error);
    ProbeError::TransportFailed { command, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scsi::opcode;
    use sgdiscard_hal::mock::ScriptedTransport;
    use sgdiscard_hal::Direction;

    fn script(capacity: CapacityReport, limits: BlockLimits) -> ScriptedTransport {
        let mut dev = ScriptedTransport::new();
        dev.push_data(&capacity.encode()).push_data(&limits.encode());
        dev
    }

    #[test]
    fn test_probe_commands() {
        let capacity = CapacityReport { last_block_address: 0xFFFF, sector_size: 4096 };
        let limits = BlockLimits {
            maximum_transfer_length: 256,
            optimal_transfer_length: 64,
            maximum_unmap_lba_count: 8192,
            maximum_unmap_block_descriptor_count: 1,
            optimal_unmap_granularity: 1,
        };
        let mut dev = script(capacity, limits);

        let caps = probe(&mut dev).unwrap();
        assert_eq!(caps.sector_size(), 4096);
        assert_eq!(caps.device_size(), 0x10000 * 4096);
        assert_eq!(*caps.limits(), limits);

        let cmds = dev.commands();
        assert_eq!(cmds.len(), 2);

        assert_eq!(cmds[0].opcode(), opcode::SERVICE_ACTION_IN_16);
        assert_eq!(cmds[0].cdb.len(), 16);
        assert_eq!(cmds[0].direction, Direction::FromDevice);
        assert_eq!(cmds[0].data_in_len, 32);
        assert_eq!(cmds[0].timeout, COMMAND_TIMEOUT);

        assert_eq!(cmds[1].cdb.as_slice(), &[0x12, 0x01, 0xB0, 0x00, 0x40, 0x00]);
        assert_eq!(cmds[1].data_in_len, 64);
        assert_eq!(cmds[1].timeout.as_secs(), 60);
    }

    #[test]
    fn test_capacity_failure_stops_probe() {
        let mut dev = ScriptedTransport::new();
        dev.push_error(TransportError::Os { errno: 5 });

        assert_eq!(
            probe(&mut dev),
            Err(ProbeError::TransportFailed {
                command: "READ CAPACITY(16)",
                error: TransportError::Os { errno: 5 },
            })
        );
        assert_eq!(dev.commands().len(), 1);
    }

    #[test]
    fn test_inquiry_failure() {
        let capacity = CapacityReport { last_block_address: 99, sector_size: 512 };
        let mut dev = ScriptedTransport::new();
        dev.push_data(&capacity.encode()).push_error(TransportError::Timeout);

        match probe(&mut dev) {
            Err(ProbeError::TransportFailed { command, error }) => {
                assert_eq!(command, "INQUIRY");
                assert_eq!(error, TransportError::Timeout);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_zero_sector_size_rejected() {
        let capacity = CapacityReport { last_block_address: 99, sector_size: 0 };
        let mut dev = script(capacity, BlockLimits::default());
        assert!(matches!(probe(&mut dev), Err(ProbeError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_overflowing_size_rejected() {
        let capacity = CapacityReport { last_block_address: u64::MAX - 1, sector_size: 512 };
        let mut dev = script(capacity, BlockLimits::default());
        assert!(matches!(probe(&mut dev), Err(ProbeError::Overflow { .. })));
    }
}
