//! # sgdiscard core - Discard Planning and SCSI UNMAP
//!
//! This crate turns a user request ("discard `length` bytes at `offset`, in
//! steps of `step`") into a sequence of SCSI UNMAP commands that a device
//! will accept.
//!
//! ## Pipeline
//!
//! ```text
//! "1GiB", "4MiB"           READ CAPACITY(16)      INQUIRY VPD 0xB0
//!       │                         │                      │
//!       ▼                         └──────────┬───────────┘
//! ┌─────────────┐                            ▼
//! │ size::parse │                 ┌─────────────────────┐
//! └──────┬──────┘                 │ DeviceCapabilities  │
//!        │                        └──────────┬──────────┘
//!        ▼                                   │
//! ┌──────────────┐  DiscardRange  ┌──────────▼──────────┐  UNMAP  ┌────────┐
//! │ plan::plan   │ ─────────────▶ │    UnmapIssuer      │ ──────▶ │ device │
//! └──────────────┘                └─────────────────────┘         └────────┘
//! ```
//!
//! Every step is synchronous and single-attempt. Any failure aborts the
//! remaining plan; ranges already discarded stay discarded.

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

// ============================================================================
// Module Exports
// ============================================================================

pub mod codec;
pub mod disk;
pub mod error;
pub mod plan;
pub mod scsi;
pub mod session;
pub mod size;

// Re-exports for convenience
pub use crate::disk::device::{DeviceCapabilities, DiscardStats};
pub use crate::disk::probe::probe;
pub use crate::disk::unmap::{issue, UnmapIssuer};
pub use crate::error::{
    DiscardError, DiscardResult, Field, ParseError, ParseResult, PlanError, PlanResult,
    ProbeError, ProbeResult, UnmapError, UnmapResult,
};
pub use crate::plan::{plan, DiscardPlan, DiscardRange};
pub use crate::session::{DiscardSession, ProgressSink};
pub use crate::size::{parse, ByteQuantity};

pub use sgdiscard_hal::{DeviceControl, TransportError};
