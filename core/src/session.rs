//! # Discard Session
//!
//! Drives a [`DiscardPlan`] through the [`UnmapIssuer`], one range at a time,
//! and reports each completed range to a [`ProgressSink`]. The first failure
//! stops the session; ranges already reported stay discarded.

use crate::disk::device::{DeviceCapabilities, DiscardStats};
use crate::disk::probe::probe;
use crate::disk::unmap::UnmapIssuer;
use crate::error::{DiscardResult, UnmapError};
use crate::plan::{DiscardPlan, DiscardRange};
use sgdiscard_hal::DeviceControl;

/// Receives completed ranges
pub trait ProgressSink {
    /// `range` has been discarded
    fn range_discarded(&mut self, range: &DiscardRange);
}

impl ProgressSink for () {
    fn range_discarded(&mut self, _range: &DiscardRange) {}
}

impl<F: FnMut(&DiscardRange)> ProgressSink for F {
    fn range_discarded(&mut self, range: &DiscardRange) {
        self(range)
    }
}

/// Exclusive owner of a device for the duration of a discard
#[derive(Debug)]
pub struct DiscardSession<T: DeviceControl> {
    transport: T,
    capabilities: DeviceCapabilities,
    stats: DiscardStats,
}

impl<T: DeviceControl> DiscardSession<T> {
    /// Start a session with already known capabilities
    pub fn new(transport: T, capabilities: DeviceCapabilities) -> Self {
        Self { transport, capabilities, stats: DiscardStats::new() }
    }

    /// Probe the device and start a session
    pub fn open(mut transport: T) -> DiscardResult<Self> {
        let capabilities = probe(&mut transport)?;
        Ok(Self::new(transport, capabilities))
    }

    /// Device capabilities
    #[inline]
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Totals so far
    #[inline]
    pub fn stats(&self) -> DiscardStats {
        self.stats
    }

    /// Underlying transport
    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Discard every range of `plan`, returning the totals for this run
    pub fn run<S: ProgressSink + ?Sized>(
        &mut self,
        plan: &DiscardPlan,
        sink: &mut S,
    ) -> DiscardResult<DiscardStats> {
        if !self.capabilities.supports_unmap() {
            return Err(UnmapError::Unsupported.into());
        }

        let issuer = UnmapIssuer::new(&self.capabilities);
        let sector_size = self.capabilities.sector_size();
        let mut run = DiscardStats::new();

        for range in plan.iter() {
            let commands = issuer.issue(&mut self.transport, &range)?;
            run.record_range(commands, range.length, sector_size);
            self.stats.record_range(commands, range.length, sector_size);
            sink.range_discarded(&range);
        }

        log::debug!(
            "discarded {} bytes in {} ranges with {} commands",
            run.bytes,
            run.ranges,
            run.commands
        );
        Ok(run)
    }
}
