//! Process configuration, read from environment variables.

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use log::LevelFilter;

use crate::{
    error::{Error, Result},
    file_sink::FileSinkOptions,
    generator::DEFAULT_INTERVAL,
};

pub const DEFAULT_LOG_FILE: &str = "combined.log";

/// Snapshot of the settings the generator runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `SERVICE_NAME`; attached to every record when set.
    pub service: Option<String>,
    /// `LOG_FILE`
    pub log_file: PathBuf,
    /// `LOG_INTERVAL_SECS`
    pub interval: Duration,
    /// `LOG_BUFFER_SIZE`
    pub buffer_size: usize,
    /// `LOG_ROTATE_SIZE`
    pub rotate_size: Option<usize>,
    /// `LOG_RETAIN`
    pub retain: usize,
    /// `LOG_STDOUT`
    pub stdout: bool,
    /// `LOG_LEVEL`, for the generator's own diagnostics on stderr.
    pub diagnostics: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            interval: DEFAULT_INTERVAL,
            buffer_size: 8 * 1024,
            rotate_size: None,
            retain: 10,
            stdout: false,
            diagnostics: LevelFilter::Info,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset and empty values fall back to defaults,
    /// except `SERVICE_NAME` which is passed through as set, empty included.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        config.service = lookup("SERVICE_NAME");
        if let Some(path) = get("LOG_FILE") {
            config.log_file = PathBuf::from(path);
        }
        if let Some(v) = get("LOG_INTERVAL_SECS") {
            let secs: u64 = parse("LOG_INTERVAL_SECS", &v)?;
            if secs == 0 {
                return Err(invalid("LOG_INTERVAL_SECS", v, "must be greater than zero"));
            }
            config.interval = Duration::from_secs(secs);
        }
        if let Some(v) = get("LOG_BUFFER_SIZE") {
            config.buffer_size = parse("LOG_BUFFER_SIZE", &v)?;
        }
        if let Some(v) = get("LOG_ROTATE_SIZE") {
            let size: usize = parse("LOG_ROTATE_SIZE", &v)?;
            if size == 0 {
                return Err(invalid("LOG_ROTATE_SIZE", v, "must be greater than zero"));
            }
            config.rotate_size = Some(size);
        }
        if let Some(v) = get("LOG_RETAIN") {
            let retain: usize = parse("LOG_RETAIN", &v)?;
            if retain == 0 {
                return Err(invalid("LOG_RETAIN", v, "must be greater than zero"));
            }
            config.retain = retain;
        }
        if let Some(v) = get("LOG_STDOUT") {
            config.stdout = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid("LOG_STDOUT", v, "expected a boolean")),
            };
        }
        if let Some(v) = get("LOG_LEVEL") {
            config.diagnostics = parse("LOG_LEVEL", &v)?;
        }
        Ok(config)
    }

    pub fn sink_options(&self) -> FileSinkOptions {
        let mut options = FileSinkOptions::new(&self.log_file);
        options.buffer_size = self.buffer_size;
        options.rotate_size = self.rotate_size;
        options.retain = self.retain;
        options.stdout = self.stdout;
        options
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, value.to_string(), "not a valid value"))
}

fn invalid(key: &'static str, value: String, reason: &'static str) -> Error {
    Error::InvalidConfig { key, value, reason }
}
