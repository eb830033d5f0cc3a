//! Command-line options.

use anyhow::{anyhow, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Discard the content of sectors on a device.
#[derive(Parser, Debug)]
#[command(
    name = "sgblkdiscard",
    version,
    about = "Discard the content of sectors on a device.",
    after_help = "Arguments:\n <num> arguments may be followed by the suffixes for\n   GiB, TiB, PiB, EiB, ZiB, and YiB (the \"iB\" is optional)\n   or by KB, MB, GB, TB, PB, EB, ZB and YB"
)]
pub struct Args {
    /// disable all checking
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub force: bool,

    /// interactive mode
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub interactive: bool,

    /// offset in bytes to discard from
    #[arg(short, long, value_name = "num")]
    pub offset: Option<String>,

    /// length of bytes to discard from the offset
    #[arg(short, long, value_name = "num")]
    pub length: Option<String>,

    /// size of the discard iterations within the offset
    #[arg(short = 'p', long, value_name = "num")]
    pub step: Option<String>,

    /// print progress and device details (repeat for debug output)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// block device to discard
    #[arg(value_name = "device")]
    pub device: PathBuf,
}

/// Validated run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardOptions {
    /// Device node
    pub device: PathBuf,
    /// First byte to discard
    pub offset: u64,
    /// Bytes to discard, `None` for the rest of the device
    pub length: Option<u64>,
    /// Bytes per iteration, `None` for a single iteration
    pub step: Option<u64>,
    /// Skip safety checks and the exclusive open
    pub force: bool,
    /// Ask before destructive operations
    pub interactive: bool,
    /// Verbosity level
    pub verbose: u8,
}

impl DiscardOptions {
    /// Print progress lines
    #[inline]
    pub fn reports_progress(&self) -> bool {
        self.verbose > 0
    }
}

impl TryFrom<Args> for DiscardOptions {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        let offset = size_arg("offset", args.offset.as_deref())?.unwrap_or(0);
        let length = size_arg("length", args.length.as_deref())?;
        let step = size_arg("step", args.step.as_deref())?;

        Ok(Self {
            device: args.device,
            offset,
            length,
            step,
            force: args.force,
            // Forcing disables every question
            interactive: args.interactive && !args.force,
            verbose: args.verbose,
        })
    }
}

/// Exit status for a command line that did not parse.
///
/// Help and version requests succeed, every usage error exits with 1.
pub fn usage_exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn size_arg(field: &str, text: Option<&str>) -> Result<Option<u64>> {
    text.map(|text| {
        sgdiscard_core::size::parse(text)
            .map_err(|_| anyhow!("failed to parse {}: '{}'", field, text))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn options(argv: &[&str]) -> Result<DiscardOptions> {
        DiscardOptions::try_from(Args::try_parse_from(argv)?)
    }

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let opts = options(&["sgblkdiscard", "/dev/sdb1"]).unwrap();
        assert_eq!(
            opts,
            DiscardOptions {
                device: PathBuf::from("/dev/sdb1"),
                offset: 0,
                length: None,
                step: None,
                force: false,
                interactive: false,
                verbose: 0,
            }
        );
        assert!(!opts.reports_progress());
    }

    #[test]
    fn test_sizes() {
        let opts = options(&[
            "sgblkdiscard", "-o", "1MiB", "--length", "0x100000", "-p", "4K", "-vv", "/dev/sdc",
        ])
        .unwrap();
        assert_eq!(opts.offset, 1 << 20);
        assert_eq!(opts.length, Some(1 << 20));
        assert_eq!(opts.step, Some(4096));
        assert_eq!(opts.verbose, 2);
    }

    #[test]
    fn test_force_disables_interactive() {
        let opts = options(&["sgblkdiscard", "-f", "-i", "/dev/sdb"]).unwrap();
        assert!(opts.force);
        assert!(!opts.interactive);

        let opts = options(&["sgblkdiscard", "-i", "/dev/sdb"]).unwrap();
        assert!(opts.interactive);
    }

    #[test]
    fn test_parse_failure_message() {
        let err = options(&["sgblkdiscard", "-o", "1.5", "/dev/sdb"]).unwrap_err();
        assert_eq!(err.to_string(), "failed to parse offset: '1.5'");

        let err = options(&["sgblkdiscard", "-p", "-4096", "/dev/sdb"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_usage_exit_codes() {
        let kind = |argv: &[&str]| Args::try_parse_from(argv).map(|_| ()).unwrap_err().kind();

        assert_eq!(usage_exit_code(kind(&["sgblkdiscard", "--help"])), 0);
        assert_eq!(usage_exit_code(kind(&["sgblkdiscard", "-V"])), 0);
        assert_eq!(usage_exit_code(kind(&["sgblkdiscard"])), 1);
        assert_eq!(usage_exit_code(kind(&["sgblkdiscard", "--bogus", "/dev/sdb"])), 1);
        assert_eq!(usage_exit_code(kind(&["sgblkdiscard", "/dev/a", "/dev/b"])), 1);
    }

    #[test]
    fn test_device_required() {
        assert!(Args::try_parse_from(["sgblkdiscard"]).is_err());
        assert!(Args::try_parse_from(["sgblkdiscard", "/dev/a", "/dev/b"]).is_err());
    }
}
