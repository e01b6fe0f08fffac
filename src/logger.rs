use std::io::Write;
use std::time::Instant;

use log::{Level, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

use crate::theme::{self, Painter};

struct BookforgeLogger {
    painter: Painter,
    file: Option<Mutex<std::fs::File>>,
    filter: log::LevelFilter,
    start: Instant,
}

impl Log for BookforgeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let tag = format!("[{}]", level_tag(record.level()));
        eprintln!(
            "{} {}",
            self.painter.paint(level_style(record.level()), &tag),
            record.args()
        );

        if let Some(ref file) = self.file {
            let elapsed = self.start.elapsed().as_secs_f64();
            let _ = writeln!(
                file.lock(),
                "[{elapsed:.3}s] [{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Short lowercase tag printed in front of every message.
#[must_use]
pub fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warn",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

fn level_style(level: Level) -> anstyle::Style {
    match level {
        Level::Error => theme::FAILURE,
        Level::Warn => theme::WARNING,
        Level::Info => theme::INFO,
        Level::Debug | Level::Trace => theme::DIM,
    }
}

/// Initialize the global logger. Level comes from `RUST_LOG`, defaulting to `info`.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger was already installed.
pub fn init(log_file: Option<std::fs::File>) -> Result<(), SetLoggerError> {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(log::LevelFilter::Info);

    let logger = BookforgeLogger {
        painter: Painter::stderr(),
        file: log_file.map(Mutex::new),
        filter,
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_tags() {
        assert_eq!(level_tag(Level::Warn), "warn");
        assert_eq!(level_tag(Level::Error), "error");
    }
}
