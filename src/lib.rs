//! # synthlog
//!
//! A synthetic log generator. It emits one structured record right away and then one every
//! interval (30 seconds by default), walking through the levels `info`, `warn`, `error` and
//! picking a random message from a fixed catalog. Records are written as newline-delimited JSON
//! to a single append-only file, `combined.log` by default, so downstream shippers, parsers
//! and dashboards have realistic traffic to chew on.
//!
//! ```json
//! {"level":"error","message":"Disk space low","service":"svc-a","iteration":2,"error":{"message":"Disk space low","stack":"Error: Disk space low\n    at ...","name":"Error"},"timestamp":"2024-05-01T12:00:00.000Z"}
//! ```
//!
//! # Usage
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use synthlog::{schedule, shutdown_channel, Emitter, FileSink, FileSinkOptions, Generator};
//!
//! let sink = Arc::new(FileSink::open(FileSinkOptions::new("logs/combined.log")).unwrap());
//! let generator = Generator::new(Emitter::new(sink, Some("svc-a".to_string())));
//!
//! // Hand the handle to whatever decides when to stop, eg. a signal handler.
//! let (handle, shutdown) = shutdown_channel();
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(120));
//!     handle.request();
//! });
//!
//! // Emits now and every 30 seconds, then flushes and closes the file.
//! generator.run(schedule(synthlog::DEFAULT_INTERVAL), shutdown);
//! ```

pub mod catalog;
pub mod config;
pub mod console;
pub mod crash;
pub mod emitter;
pub mod error;
pub mod file_sink;
pub mod generator;
pub mod level;
pub mod record;
pub mod sink;

pub use catalog::MESSAGES;
pub use config::Config;
pub use emitter::Emitter;
pub use error::{Error, Result};
pub use file_sink::{FileSink, FileSinkOptions};
pub use generator::{schedule, shutdown_channel, Generator, ShutdownHandle, State, DEFAULT_INTERVAL};
pub use level::{Level, LEVEL_CYCLE};
pub use record::{ErrorDetail, LogRecord, ProcessInfo};
pub use sink::{MemorySink, Sink};
