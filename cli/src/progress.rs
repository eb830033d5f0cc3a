//! Throttled progress lines.
//!
//! Completed ranges are accumulated and printed as
//! `<path>: Discarded <n> bytes from the offset <o>`, at most once per
//! second while stepping, plus one final line for whatever is left.

use sgdiscard_core::{DiscardRange, ProgressSink};
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Minimum time between two periodic lines
pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Prints discard progress for one device
#[derive(Debug)]
pub struct ProgressPrinter<W: Write> {
    out: W,
    path: String,
    verbose: bool,
    periodic: bool,
    start_offset: u64,
    pending: u64,
    last_report: Instant,
    error: Option<io::Error>,
}

impl<W: Write> ProgressPrinter<W> {
    /// Create a printer.
    ///
    /// Nothing is printed unless `verbose`. Periodic lines additionally need
    /// `stepping`.
    pub fn new(out: W, path: impl Into<String>, start_offset: u64, verbose: bool, stepping: bool) -> Self {
        Self::started_at(out, path, start_offset, verbose, stepping, Instant::now())
    }

    fn started_at(
        out: W,
        path: impl Into<String>,
        start_offset: u64,
        verbose: bool,
        stepping: bool,
        now: Instant,
    ) -> Self {
        Self {
            out,
            path: path.into(),
            verbose,
            periodic: verbose && stepping,
            start_offset,
            pending: 0,
            last_report: now,
            error: None,
        }
    }

    /// Account a range completed at `now`
    pub fn record_at(&mut self, range: &DiscardRange, now: Instant) {
        self.pending += range.length;

        if self.periodic && now.duration_since(self.last_report) >= REPORT_INTERVAL {
            self.print_pending();
            self.last_report = now;
        }
    }

    /// Print the remainder and report the first write failure
    pub fn finish(mut self) -> io::Result<W> {
        if self.verbose && self.pending != 0 {
            self.print_pending();
        }
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn print_pending(&mut self) {
        let res = writeln!(
            self.out,
            "{}: Discarded {} bytes from the offset {}",
            self.path, self.pending, self.start_offset
        );
        if let Err(err) = res {
            self.error.get_or_insert(err);
        }
        self.start_offset += self.pending;
        self.pending = 0;
    }
}

impl<W: Write> ProgressSink for ProgressPrinter<W> {
    fn range_discarded(&mut self, range: &DiscardRange) {
        self.record_at(range, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1 << 20;

    fn range(i: u64) -> DiscardRange {
        DiscardRange { offset: i * MIB, length: MIB }
    }

    fn lines(out: Vec<u8>) -> Vec<String> {
        String::from_utf8(out).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_throttled_lines() {
        let t0 = Instant::now();
        let mut p = ProgressPrinter::started_at(Vec::new(), "/dev/sdb", 0, true, true, t0);

        p.record_at(&range(0), t0 + Duration::from_millis(200));
        p.record_at(&range(1), t0 + Duration::from_millis(900));
        p.record_at(&range(2), t0 + Duration::from_millis(1100));
        p.record_at(&range(3), t0 + Duration::from_millis(1500));
        p.record_at(&range(4), t0 + Duration::from_millis(2200));
        p.record_at(&range(5), t0 + Duration::from_millis(2300));

        assert_eq!(
            lines(p.finish().unwrap()),
            vec![
                format!("/dev/sdb: Discarded {} bytes from the offset 0", 3 * MIB),
                format!("/dev/sdb: Discarded {} bytes from the offset {}", 2 * MIB, 3 * MIB),
                format!("/dev/sdb: Discarded {} bytes from the offset {}", MIB, 5 * MIB),
            ]
        );
    }

    #[test]
    fn test_final_line_without_step() {
        let t0 = Instant::now();
        let mut p = ProgressPrinter::started_at(Vec::new(), "/dev/sdb", 4096, true, false, t0);
        p.record_at(&DiscardRange { offset: 4096, length: 8192 }, t0 + Duration::from_secs(5));

        assert_eq!(
            lines(p.finish().unwrap()),
            vec!["/dev/sdb: Discarded 8192 bytes from the offset 4096".to_string()]
        );
    }

    #[test]
    fn test_quiet() {
        let t0 = Instant::now();
        let mut p = ProgressPrinter::started_at(Vec::new(), "/dev/sdb", 0, false, true, t0);
        p.record_at(&range(0), t0 + Duration::from_secs(3));
        assert!(p.finish().unwrap().is_empty());
    }

    #[test]
    fn test_nothing_discarded() {
        let p = ProgressPrinter::new(Vec::new(), "/dev/sdb", 0, true, true);
        assert!(p.finish().unwrap().is_empty());
    }
}
