//! # Linux Transport
//!
//! SCSI generic passthrough through the `SG_IO` ioctl. Works on `/dev/sg*`
//! nodes and on any block device whose driver accepts SG_IO (sd, virtio-scsi,
//! most USB bridges).

mod sg_io;

pub use sg_io::{SgDevice, SgInfo, SENSE_BUFFER_LEN};
