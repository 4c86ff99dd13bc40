//! Diagnostics of the generator itself, written to standard error.
//!
//! This backend for the [log](https://docs.rs/log/latest/log/) facade is kept apart from the
//! generated file, which only ever receives emitted records.

use std::io::{stderr, Write};

use log::{LevelFilter, Metadata, Record, SetLoggerError};

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

struct Console {
    level: LevelFilter,
}

/// Install the stderr logger as the global `log` backend.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(Console { level })).map(|()| log::set_max_level(level))
}

fn format_line(record: &Record<'_>) -> String {
    let now = chrono::Local::now().naive_local();
    format!(
        "[{} {}] {}{}",
        now.format("%F %H:%M:%S%.3f"),
        record.level(),
        record.args(),
        LINE_ENDING
    )
}

impl log::Log for Console {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let _ = stderr().write_all(format_line(record).as_bytes());
        }
    }

    fn flush(&self) {
        let _ = stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use log::{Level, Log};
    use regex::Regex;

    use super::*;

    #[test]
    fn line_format() {
        let line = format_line(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("writer for {} did not answer", "combined.log"))
                .build(),
        );
        let re = Regex::new(
            r"^\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3} WARN\] writer for combined.log did not answer\r?\n$",
        )
        .unwrap();
        assert!(re.is_match(&line), "{:?}", line);
    }

    #[test]
    fn filters_below_level() {
        let console = Console {
            level: LevelFilter::Warn,
        };
        let meta = |level| Metadata::builder().level(level).build();
        assert!(console.enabled(&meta(Level::Error)));
        assert!(!console.enabled(&meta(Level::Info)));
    }
}
