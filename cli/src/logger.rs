//! Stderr backend for the `log` facade.
//!
//! Lines look like `sgblkdiscard: [WARN ] message`, optionally colored and
//! tagged with the emitting module.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;

/// Logger configuration
#[derive(Debug, Clone, Copy)]
pub struct LoggerConfig {
    /// Minimum level emitted
    pub max_level: LevelFilter,
    /// ANSI colors
    pub colors: bool,
    /// Prefix with the emitting module
    pub show_source: bool,
}

impl LoggerConfig {
    /// Configuration for a `-v` count: warnings by default, then info,
    /// debug and trace
    pub fn from_verbosity(verbose: u8) -> Self {
        let max_level = match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        Self { max_level, colors: false, show_source: verbose >= 2 }
    }
}

/// Writes records to stderr
#[derive(Debug)]
pub struct StderrLogger {
    config: LoggerConfig,
}

impl StderrLogger {
    /// Create a logger
    pub const fn new(config: LoggerConfig) -> Self {
        Self { config }
    }

    /// Install as the global logger
    pub fn install(config: LoggerConfig) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(config)))?;
        log::set_max_level(config.max_level);
        Ok(())
    }

    fn format(&self, record: &Record<'_>) -> String {
        let level = record.level();
        let mut line = String::with_capacity(96);

        line.push_str(crate::PROGRAM);
        line.push_str(": ");
        if self.config.colors {
            line.push_str(ansi_fg(level));
        }
        line.push('[');
        line.push_str(short_name(level));
        line.push(']');
        if self.config.colors {
            line.push_str("\x1b[0m");
        }
        if self.config.show_source {
            if let Some(module) = record.module_path() {
                line.push(' ');
                line.push_str(module);
                if let Some(l) = record.line() {
                    line.push(':');
                    line.push_str(&l.to_string());
                }
            }
        }
        line.push(' ');
        line.push_str(&record.args().to_string());
        line
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.config.max_level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format(record);
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn short_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN ",
        Level::Info => "INFO ",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

fn ansi_fg(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[31m",
        Level::Warn => "\x1b[33m",
        Level::Info => "\x1b[32m",
        Level::Debug => "\x1b[36m",
        Level::Trace => "\x1b[90m",
    }
}
