//! SG_IO ioctl transport.

use crate::{cdb_from_slice, sense::SenseData, Completion, DataTransfer, DeviceControl, HalResult, TransportError};
use bitflags::bitflags;
use core::ffi::c_void;
use core::ptr;
use core::time::Duration;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::Path;

// =============================================================================
// Kernel ABI
// =============================================================================

/// `SG_IO` request number from `<scsi/sg.h>`
const SG_IO: u32 = 0x2285;

/// Sense buffer offered to the kernel for every command
pub const SENSE_BUFFER_LEN: usize = u8::MAX as usize;

const SG_INTERFACE_ID: i32 = b'S' as i32;
const SG_DXFER_NONE: i32 = -1;
const SG_DXFER_TO_DEV: i32 = -2;
const SG_DXFER_FROM_DEV: i32 = -3;

/// Host adapter reported a timeout
const DID_TIME_OUT: u16 = 0x03;
/// Driver reported a timeout (low nibble of driver_status)
const DRIVER_TIMEOUT: u16 = 0x06;
/// Driver status bits that only announce sense data
const DRIVER_SENSE: u16 = 0x08;

bitflags! {
    /// `info` field of the completed header
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SgInfo: u32 {
        /// Something other than GOOD came back
        const CHECK = 0x1;
        /// Transfer used direct IO
        const DIRECT_IO = 0x2;
        /// Transfer mixed direct and indirect IO
        const MIXED_IO = 0x4;
    }
}

/// `struct sg_io_hdr` (interface 'S')
#[repr(C)]
#[derive(Debug)]
struct SgIoHdr {
    interface_id: i32,
    dxfer_direction: i32,
    cmd_len: u8,
    mx_sb_len: u8,
    iovec_count: u16,
    dxfer_len: u32,
    dxferp: *mut c_void,
    cmdp: *const u8,
    sbp: *mut u8,
    timeout: u32,
    flags: u32,
    pack_id: i32,
    usr_ptr: *mut c_void,
    status: u8,
    masked_status: u8,
    msg_status: u8,
    sb_len_wr: u8,
    host_status: u16,
    driver_status: u16,
    resid: i32,
    duration: u32,
    info: u32,
}

#[cfg(target_pointer_width = "64")]
static_assertions::assert_eq_size!(SgIoHdr, [u8; 88]);
#[cfg(target_pointer_width = "32")]
static_assertions::assert_eq_size!(SgIoHdr, [u8; 64]);

nix::ioctl_readwrite_bad!(sg_io, SG_IO, SgIoHdr);

// =============================================================================
// Device
// =============================================================================

/// Block or sg device driven through SG_IO
#[derive(Debug)]
pub struct SgDevice {
    file: File,
}

impl SgDevice {
    /// Wrap an already opened device node
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// Open `path` read-write, exclusively unless `exclusive` is false
    ///
    /// Exclusive open fails with `EBUSY` while the device is mounted or held
    /// by another exclusive opener.
    pub fn open(path: &Path, exclusive: bool) -> io::Result<Self> {
        let mut options = OpenOptions::new();
        options.read(true).write(true);
        if exclusive {
            options.custom_flags(nix::fcntl::OFlag::O_EXCL.bits());
        }
        let file = options.open(path)?;
        Ok(Self::new(file))
    }

    /// Check that the node is a block device
    pub fn is_block_device(&self) -> io::Result<bool> {
        Ok(self.file.metadata()?.file_type().is_block_device())
    }

    /// Underlying file, for plain reads
    #[inline]
    pub fn file(&self) -> &File {
        &self.file
    }
}

impl DeviceControl for SgDevice {
    fn execute(
        &mut self,
        cdb: &[u8],
        transfer: DataTransfer<'_>,
        timeout: Duration,
    ) -> HalResult<Completion> {
        let cdb = cdb_from_slice(cdb)?;
        let mut sense = [0u8; SENSE_BUFFER_LEN];

        let (dxfer_direction, dxferp, len) = match transfer {
            DataTransfer::None => (SG_DXFER_NONE, ptr::null_mut(), 0),
            // The kernel only reads from a TO_DEV buffer
            DataTransfer::ToDevice(buf) => (SG_DXFER_TO_DEV, buf.as_ptr() as *mut c_void, buf.len()),
            DataTransfer::FromDevice(buf) => (SG_DXFER_FROM_DEV, buf.as_mut_ptr().cast(), buf.len()),
        };
        let dxfer_len = u32::try_from(len).map_err(|_| TransportError::InvalidRequest {
            reason: "data buffer larger than 4 GiB",
        })?;
        let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);

        let mut hdr = SgIoHdr {
            interface_id: SG_INTERFACE_ID,
            dxfer_direction,
            cmd_len: cdb.len() as u8,
            mx_sb_len: SENSE_BUFFER_LEN as u8,
            iovec_count: 0,
            dxfer_len,
            dxferp,
            cmdp: cdb.as_ptr(),
            sbp: sense.as_mut_ptr(),
            timeout: timeout_ms,
            flags: 0,
            pack_id: 0,
            usr_ptr: ptr::null_mut(),
            status: 0,
            masked_status: 0,
            msg_status: 0,
            sb_len_wr: 0,
            host_status: 0,
            driver_status: 0,
            resid: 0,
            duration: 0,
            info: 0,
        };

        log::trace!(
            "SG_IO opcode {:#04x}, cdb {:02x?}, {} data bytes",
            cdb[0],
            cdb.as_slice(),
            dxfer_len
        );

        // SAFETY: every pointer in `hdr` refers to a buffer that outlives the
        // ioctl and is at least as long as the length recorded next to it.
        unsafe { sg_io(self.file.as_raw_fd(), &mut hdr) }
            .map_err(|errno| TransportError::Os { errno: errno as i32 })?;

        let info = SgInfo::from_bits_truncate(hdr.info);
        log::trace!(
            "SG_IO done: status {:#04x}, host {:#06x}, driver {:#06x}, resid {}, {} ms",
            hdr.status,
            hdr.host_status,
            hdr.driver_status,
            hdr.resid,
            hdr.duration
        );

        if hdr.host_status == DID_TIME_OUT || hdr.driver_status & 0x0F == DRIVER_TIMEOUT {
            return Err(TransportError::Timeout);
        }
        if info.contains(SgInfo::CHECK)
            && (hdr.status != 0 || hdr.host_status != 0 || hdr.driver_status & !DRIVER_SENSE != 0)
        {
            let written = usize::from(hdr.sb_len_wr).min(SENSE_BUFFER_LEN);
            return Err(TransportError::Status {
                status: hdr.status,
                host_status: hdr.host_status,
                driver_status: hdr.driver_status,
                sense: SenseData::parse(&sense[..written]),
            });
        }

        Ok(Completion {
            residual: u32::try_from(hdr.resid).unwrap_or(0),
        })
    }
}
