//! Device layer for sgdiscard.
//!
//! Capability discovery and UNMAP issuance against a [`DeviceControl`]
//! transport.
//!
//! [`DeviceControl`]: sgdiscard_hal::DeviceControl

pub mod device;
pub mod probe;
pub mod unmap;

pub use device::*;
pub use probe::*;
pub use unmap::*;
