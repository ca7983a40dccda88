//! Runtime Configuration
//!
//! Configuration is per thread, like the rest of the runtime state. A host
//! installs it once with [`configure`] before creating watchers; everything
//! else reads it through [`current`].
//!
//! ```rust
//! use trellis_core::config::{RuntimeConfig, TickMode};
//!
//! let config = RuntimeConfig::from_json(r#"{ "tick": "manual", "max_flush_rounds": 16 }"#)
//!     .expect("valid config");
//! assert_eq!(config.tick, TickMode::Manual);
//! trellis_core::config::configure(config);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::reactive::runtime::Runtime;

/// Default round limit for [`crate::reactive::scheduler::run_until_idle`].
pub const DEFAULT_MAX_FLUSH_ROUNDS: usize = 100;

/// How the scheduler's deferred flush is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickMode {
    /// The host calls [`crate::reactive::scheduler::tick`] (or
    /// `run_until_idle`) at the end of each synchronous block.
    #[default]
    Manual,

    /// Every tick request spawns a flush task with
    /// `tokio::task::spawn_local`. Watchers must then be driven from inside
    /// a `tokio::task::LocalSet`.
    Tokio,
}

/// Per-thread runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Tick driver for batched flushes.
    pub tick: TickMode,

    /// Maximum number of flush rounds `run_until_idle` executes before
    /// reporting a runaway update loop.
    pub max_flush_rounds: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick: TickMode::default(),
            max_flush_rounds: DEFAULT_MAX_FLUSH_ROUNDS,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration document. Missing fields take their defaults.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Builder-style override of the tick mode.
    pub fn with_tick(mut self, tick: TickMode) -> Self {
        self.tick = tick;
        self
    }

    /// Builder-style override of the flush round limit.
    pub fn with_max_flush_rounds(mut self, rounds: usize) -> Self {
        self.max_flush_rounds = rounds;
        self
    }
}

/// Install `config` for the current thread.
pub fn configure(config: RuntimeConfig) {
    tracing::debug!(?config, "runtime configured");
    Runtime::with(|rt| *rt.config.borrow_mut() = config);
}

/// The configuration active on the current thread.
pub fn current() -> RuntimeConfig {
    Runtime::with(|rt| rt.config.borrow().clone())
}
