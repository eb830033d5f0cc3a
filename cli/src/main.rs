//! # sgblkdiscard
//!
//! Discards a byte range of a block device with SCSI UNMAP sent through
//! SG_IO, for devices whose kernel driver does not expose discard.
//!
//! ```text
//! sgblkdiscard [options] <device>
//! ```

mod logger;
mod options;
mod progress;
mod prompt;
mod signature;

use crate::logger::{LoggerConfig, StderrLogger};
use crate::options::{Args, DiscardOptions};
use crate::progress::ProgressPrinter;
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use sgdiscard_core::{plan, DiscardSession};
use sgdiscard_hal::arch::current::SgDevice;
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

/// Name used as the prefix of diagnostics
pub const PROGRAM: &str = "sgblkdiscard";

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(options::usage_exit_code(err.kind()));
        }
    };

    let mut config = LoggerConfig::from_verbosity(args.verbose);
    config.colors = std::io::stderr().is_terminal();
    if let Err(err) = StderrLogger::install(config) {
        eprintln!("{}: cannot install logger: {}", PROGRAM, err);
    }

    match DiscardOptions::try_from(args).and_then(|opts| run(&opts)) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}: {:#}", PROGRAM, err);
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &DiscardOptions) -> Result<ExitCode> {
    let path = opts.device.as_path();
    let name = path.display();

    let device = SgDevice::open(path, !opts.force)
        .with_context(|| format!("cannot open {}", name))?;
    if !device
        .is_block_device()
        .with_context(|| format!("stat of {} failed", name))?
    {
        bail!("{}: not a block device", name);
    }

    let mut session = DiscardSession::open(device)
        .with_context(|| format!("{}: failed to get device info", name))?;
    let caps = *session.capabilities();
    if !caps.supports_unmap() {
        bail!("{}: not support unmap", name);
    }

    let plan = plan(&caps, opts.offset, opts.length, opts.step)
        .map_err(|err| anyhow!("{}: {}", name, err))?;
    log::info!(
        "{}: aligned offset {} length {} ({} bytes per iteration)",
        name,
        plan.start(),
        plan.total_bytes(),
        plan.chunk()
    );

    if is_whole_disk(path) && !opts.force {
        const MSG: &str = "Operation is applied to disk instead of partition.";
        if !opts.interactive {
            bail!("{} Use the -f option to override.", MSG);
        }
        if !prompt::confirm(&format!("{} Continue?", MSG))? {
            return Ok(ExitCode::FAILURE);
        }
    }

    if opts.force {
        log::warn!("Operation forced, data will be lost!");
    } else if let Some(sig) = signature::probe(session.transport().file())
        .context("Failed to probe the device.")?
    {
        log::warn!("{} contains {}.", name, sig);

        const MSG: &str = "This is destructive operation, data will be lost!";
        if !opts.interactive {
            bail!("{} Use the -f option to override.", MSG);
        }
        if !prompt::confirm(&format!("{} Continue?", MSG))? {
            return Ok(ExitCode::FAILURE);
        }
    }

    let mut progress = ProgressPrinter::new(
        std::io::stdout().lock(),
        name.to_string(),
        plan.start(),
        opts.reports_progress(),
        opts.step.is_some_and(|step| step != 0),
    );
    let stats = session.run(&plan, &mut progress).map_err(|err| {
        let context = match err.hint() {
            Some(hint) => format!("{}: unmap failed ({})", name, hint),
            None => format!("{}: unmap failed", name),
        };
        anyhow::Error::new(err).context(context)
    })?;
    progress.finish().context("cannot write progress")?;

    log::info!(
        "{}: {} commands, {} blocks, average {} blocks per command",
        name,
        stats.commands,
        stats.blocks,
        stats.avg_blocks_per_command()
    );
    Ok(ExitCode::SUCCESS)
}

/// Device names ending in a digit are taken as whole disks
fn is_whole_disk(path: &Path) -> bool {
    path.to_string_lossy()
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_disk_check() {
        assert!(is_whole_disk(Path::new("/dev/sdb1")));
        assert!(is_whole_disk(Path::new("/dev/nvme0n1")));
        assert!(!is_whole_disk(Path::new("/dev/sdb")));
        assert!(!is_whole_disk(Path::new("")));
    }
}
