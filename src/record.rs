use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::level::Level;

/// One generated event, as handed to a [`Sink`](crate::Sink).
///
/// The timestamp is not part of the record; sinks assign it when they write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    /// Set on records describing a crash of the generator itself.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exception: bool,
    /// Local wall-clock time of a crash, in the `Wed May 01 2024 12:00:00 GMT+0000` style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessInfo>,
}

/// Error-shaped payload attached to error level records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub stack: String,
    pub name: String,
}

/// The crashing process, as seen from inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub cwd: String,
    pub argv: Vec<String>,
}

#[derive(Serialize)]
struct Stamped<'a> {
    #[serde(flatten)]
    record: &'a LogRecord,
    timestamp: String,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogRecord {
            level,
            message: message.into(),
            service: None,
            iteration: None,
            error: None,
            exception: false,
            date: None,
            process: None,
        }
    }

    pub fn with_service(mut self, service: Option<String>) -> Self {
        self.service = service;
        self
    }

    pub fn with_iteration(mut self, iteration: u64) -> Self {
        self.iteration = Some(iteration);
        self
    }

    pub fn with_error(mut self, error: ErrorDetail) -> Self {
        self.error = Some(error);
        self
    }

    /// Renders the record as a single JSON line stamped with `at`.
    ///
    /// The returned string ends with `\n` and contains no other newline.
    pub fn to_json_line(&self, at: DateTime<Utc>) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(&Stamped {
            record: self,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        })?;
        line.push('\n');
        Ok(line)
    }
}
