//! # Discard Planning
//!
//! Validates a byte request against the device geometry and turns it into a
//! lazy sequence of contiguous, sector-aligned ranges.
//!
//! ```text
//! offset                                                    end_offset
//!   │◀── chunk ──▶│◀── chunk ──▶│◀── chunk ──▶│◀─ remainder ─▶│
//! ```
//!
//! `end_offset` is `offset + length` clamped to the device size. Without a
//! step the whole request is a single range.

use crate::disk::device::DeviceCapabilities;
use crate::error::{Field, PlanError, PlanResult};
use core::iter::FusedIterator;

/// A sector-aligned byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscardRange {
    /// First byte
    pub offset: u64,
    /// Length in bytes
    pub length: u64,
}

impl DiscardRange {
    /// One past the last byte
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }

    /// Range is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// A validated discard request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscardPlan {
    start: u64,
    end_offset: u64,
    chunk: u64,
    clamped: bool,
}

impl DiscardPlan {
    /// First byte
    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// One past the last byte
    #[inline]
    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    /// Bytes covered
    #[inline]
    pub fn total_bytes(&self) -> u64 {
        self.end_offset - self.start
    }

    /// Maximum range length
    #[inline]
    pub fn chunk(&self) -> u64 {
        self.chunk
    }

    /// The requested end was beyond the device and was clamped
    #[inline]
    pub fn was_clamped(&self) -> bool {
        self.clamped
    }

    /// Ranges in increasing offset order. Can be called repeatedly.
    pub fn iter(&self) -> DiscardRanges {
        DiscardRanges { next: self.start, end: self.end_offset, chunk: self.chunk }
    }
}

impl IntoIterator for &DiscardPlan {
    type Item = DiscardRange;
    type IntoIter = DiscardRanges;

    fn into_iter(self) -> DiscardRanges {
        self.iter()
    }
}

/// Iterator over the ranges of a [`DiscardPlan`]
#[derive(Debug, Clone)]
pub struct DiscardRanges {
    next: u64,
    end: u64,
    chunk: u64,
}

impl Iterator for DiscardRanges {
    type Item = DiscardRange;

    fn next(&mut self) -> Option<DiscardRange> {
        if self.next >= self.end || self.chunk == 0 {
            return None;
        }
        let length = self.chunk.min(self.end - self.next);
        let range = DiscardRange { offset: self.next, length };
        self.next += length;
        Some(range)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = if self.next >= self.end || self.chunk == 0 {
            0
        } else {
            (self.end - self.next).div_ceil(self.chunk)
        };
        match usize::try_from(n) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl FusedIterator for DiscardRanges {}

/// Validate a request and build its plan.
///
/// `length` of `None` means to the end of the device. A `step` of `None` or
/// zero means a single range.
pub fn plan(
    capabilities: &DeviceCapabilities,
    offset: u64,
    length: Option<u64>,
    step: Option<u64>,
) -> PlanResult<DiscardPlan> {
    let sector_size = capabilities.sector_size();
    let device_size = capabilities.device_size();

    if !capabilities.is_aligned(offset) {
        return Err(PlanError::Misaligned { field: Field::Offset, value: offset, sector_size });
    }
    if offset > device_size {
        return Err(PlanError::OutOfBounds { offset, device_size });
    }

    let requested_end = match length {
        Some(length) => offset.checked_add(length),
        None => Some(device_size),
    };
    let (end_offset, clamped) = match requested_end {
        Some(end) if end <= device_size => (end, false),
        _ => (device_size, true),
    };
    if clamped {
        log::info!(
            "range end clamped to device size {} (requested offset {} length {:?})",
            device_size,
            offset,
            length
        );
    }

    let chunk = match step {
        Some(step) if step != 0 => step,
        _ => end_offset - offset,
    };
    if !capabilities.is_aligned(chunk) {
        return Err(PlanError::Misaligned { field: Field::Length, value: chunk, sector_size });
    }

    Ok(DiscardPlan { start: offset, end_offset, chunk, clamped })
}
