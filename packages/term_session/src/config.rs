use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::TermError;

// =============================================================================
// Session config (figment-deserialized from defaults / TOML file / env vars)
// =============================================================================
//
//   session.toml:    poll_interval_ms = 250
//
//   env var:         TERM_SESSION_POLL_INTERVAL_MS=250

/// Ctrl-]
pub const DEFAULT_EXIT_RUNE: char = '\u{1d}';

/// Tunables for a terminal session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermConfig {
    /// How often the console size is polled
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Character that ends the session when it starts an input chunk
    #[serde(default = "default_exit_rune")]
    pub exit_rune: char,
    /// Size of each read from the console
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
    /// Pending size updates buffered for the subscriber
    #[serde(default = "default_size_channel_capacity")]
    pub size_channel_capacity: usize,
    /// Upper bound on how long the input pump waits for readiness before
    /// re-checking for close
    #[serde(default = "default_input_wait_ms")]
    pub input_wait_ms: u64,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            exit_rune: default_exit_rune(),
            read_chunk_size: default_read_chunk_size(),
            size_channel_capacity: default_size_channel_capacity(),
            input_wait_ms: default_input_wait_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}
fn default_exit_rune() -> char {
    DEFAULT_EXIT_RUNE
}
fn default_read_chunk_size() -> usize {
    512
}
fn default_size_channel_capacity() -> usize {
    1
}
fn default_input_wait_ms() -> u64 {
    100
}

impl TermConfig {
    /// Build a figment that layers: defaults → TOML file (if given) → TERM_SESSION_* env vars.
    pub fn figment(file: Option<&Path>) -> figment::Figment {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(TermConfig::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("TERM_SESSION_"))
    }

    /// Extract and validate a config from `figment`.
    pub fn from_figment(figment: &figment::Figment) -> Result<Self, TermError> {
        let config: TermConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from defaults, an optional TOML file and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, TermError> {
        Self::from_figment(&Self::figment(file))
    }

    pub fn validate(&self) -> Result<(), TermError> {
        if self.poll_interval_ms == 0 {
            return Err(TermError::InvalidConfig("poll_interval_ms must be > 0".into()));
        }
        if self.read_chunk_size == 0 {
            return Err(TermError::InvalidConfig("read_chunk_size must be > 0".into()));
        }
        if self.size_channel_capacity == 0 {
            return Err(TermError::InvalidConfig(
                "size_channel_capacity must be > 0".into(),
            ));
        }
        if self.input_wait_ms == 0 {
            return Err(TermError::InvalidConfig("input_wait_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn input_wait(&self) -> Duration {
        Duration::from_millis(self.input_wait_ms)
    }
}
