//! Typed error hierarchy for texpulse.
//!
//! Two top-level enums cover the two failure classes:
//! - `EngineError` — misuse of the build monitor's lifecycle (programmer errors)
//! - `ConfigError` — invalid configuration, caught at read time
//!
//! Malformed build output is never an error: the classifier treats it as
//! "no signal" (see `classify`).

use thiserror::Error;

/// Lifecycle misuse of the build monitor. These fail immediately and are
/// never retried.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no build session is running; call start() before per-session operations")]
    NotStarted,

    #[error("a build session is already running; call end() before starting another")]
    AlreadyRunning,
}

/// Invalid configuration values. Raised while reading configuration, never
/// from inside the rendering path.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "unknown progress bar style '{0}'. Valid values: none, block-width, block-shade, block-quadrant"
    )]
    UnknownBarStyle(String),

    #[error("unknown icon set '{0}'. Valid values: digits, letters, none")]
    UnknownIconSet(String),

    #[error("bar width must be at least 1 (got {0})")]
    InvalidBarWidth(usize),

    #[error("failed to read config file at {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file at {path}: {source}")]
    ParseFailed {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
