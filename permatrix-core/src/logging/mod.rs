//! Logging backend for the standard `log` facade
//!
//! The crate itself only ever uses `log::info!`, `log::warn!` and friends. Hosts that
//! want permatrix's own output format call [`init_logging`] once at startup; hosts that
//! already install a logger can ignore this module entirely.
//!
//! ```rust,no_run
//! use permatrix_core::logging::{init_logging, LoggingConfig};
//!
//! init_logging(&LoggingConfig::development()).unwrap();
//! log::info!("Loaded {} roles", 5);
//! ```

pub mod config;
pub mod formatter;

pub use config::{LogLevel, LogOutput, LoggingConfig};
pub use formatter::{LogEntry, LogFormat};

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the permatrix logger as the global `log` backend
///
/// Safe to call more than once; only the first call has any effect.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = install(config);
    });
    result
}

fn install(config: &LoggingConfig) -> anyhow::Result<()> {
    let writer: Box<dyn LogWriter> = match config.output {
        LogOutput::Stdout => Box::new(StdoutWriter),
        LogOutput::Stderr => Box::new(StderrWriter),
    };
    let logger = PermatrixLogger { config: config.clone(), writer };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(config.level.to_level_filter());
    Ok(())
}

struct PermatrixLogger {
    config: LoggingConfig,
    writer: Box<dyn LogWriter>,
}

impl log::Log for PermatrixLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::from(self.config.level)
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record);
        let _ = self.writer.write_line(&self.config.format.format_entry(&entry));
    }

    fn flush(&self) {
        let _ = self.writer.flush();
    }
}

trait LogWriter: Send + Sync {
    fn write_line(&self, line: &str) -> std::io::Result<()>;
    fn flush(&self) -> std::io::Result<()>;
}

struct StdoutWriter;

impl LogWriter for StdoutWriter {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        use std::io::Write;
        writeln!(std::io::stdout().lock(), "{}", line)
    }

    fn flush(&self) -> std::io::Result<()> {
        use std::io::Write;
        std::io::stdout().flush()
    }
}

/// Default for the CLI, so stdout stays machine-readable
struct StderrWriter;

impl LogWriter for StderrWriter {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        use std::io::Write;
        writeln!(std::io::stderr().lock(), "{}", line)
    }

    fn flush(&self) -> std::io::Result<()> {
        use std::io::Write;
        std::io::stderr().flush()
    }
}
