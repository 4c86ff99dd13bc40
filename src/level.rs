use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a generated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// Order in which emissions walk through the levels.
pub const LEVEL_CYCLE: [Level; 3] = [Level::Info, Level::Warn, Level::Error];

impl Level {
    /// The level used for the `iteration`-th emission.
    pub fn for_iteration(iteration: u64) -> Level {
        LEVEL_CYCLE[(iteration % LEVEL_CYCLE.len() as u64) as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_info_warn_error() {
        for i in 0..300u64 {
            let expected = [Level::Info, Level::Warn, Level::Error][(i % 3) as usize];
            assert_eq!(Level::for_iteration(i), expected);
        }
        assert_eq!(Level::for_iteration(u64::MAX), Level::Info);
    }

    #[test]
    fn renders_lowercase() {
        assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"warn\"");
        assert_eq!(Level::Error.to_string(), "error");
    }
}
