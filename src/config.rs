//! Configuration.
//!
//! `Config` is plain serde data so host applications can embed it in their own
//! configuration files. [`Config::from_env`] layers environment overrides on
//! top of the defaults.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding [`Config::interval_ms`].
pub const ENV_INTERVAL_MS: &str = "STATIC_TEXT_INTERVAL_MS";

/// Environment variable overriding [`Config::output`] (`stdout` or `stderr`).
pub const ENV_OUTPUT: &str = "STATIC_TEXT_OUTPUT";

/// Redraw period used when nothing else is configured.
pub const DEFAULT_INTERVAL_MS: u64 = 60;

/// Stream the persistent block is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    Stdout,
    #[default]
    Stderr,
}

impl FromStr for OutputTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(OutputTarget::Stdout),
            "stderr" => Ok(OutputTarget::Stderr),
            other => Err(Error::Config(format!(
                "unknown output target `{other}` (expected `stdout` or `stderr`)"
            ))),
        }
    }
}

/// Static text configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Render interval period in milliseconds.
    pub interval_ms: u64,
    /// Leave the cursor at column 0 after every draw.
    pub keep_cursor_zero_column: bool,
    /// Stream to draw on.
    pub output: OutputTarget,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            keep_cursor_zero_column: true,
            output: OutputTarget::default(),
        }
    }
}

impl Config {
    /// Defaults with overrides from `STATIC_TEXT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply overrides looked up by environment variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = lookup(ENV_INTERVAL_MS) {
            self.interval_ms = value.trim().parse().map_err(|err| {
                Error::Config(format!("{ENV_INTERVAL_MS}=`{value}`: {err}"))
            })?;
        }
        if let Some(value) = lookup(ENV_OUTPUT) {
            self.output = value.parse()?;
        }
        Ok(self)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

// =============================================================================
// Tests
// =============================================================================
