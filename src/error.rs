use std::{io, path::PathBuf};

use log::SetLoggerError;
use thiserror::Error;

/// Errors raised while setting the generator up.
///
/// Once running, nothing here is returned to the emitter: write failures are
/// reported by the sink itself through the `log` facade.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("dir {} is not readable", .0.display())]
    NotReadable(PathBuf),

    #[error("dir {} is not writable", .0.display())]
    NotWritable(PathBuf),

    #[error("invalid archive name pattern: {0}")]
    ArchivePattern(#[from] regex::Error),

    #[error("failed to install the diagnostics logger: {0}")]
    SetLogger(#[from] SetLoggerError),

    #[error("failed to install the termination signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
