//! GLD-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, GlowdError>;

/// Top-level error type for glowd.
#[derive(Debug, Error)]
pub enum GlowdError {
    #[error("[GLD-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[GLD-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[GLD-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[GLD-2001] another instance already holds {path}")]
    AlreadyRunning { path: PathBuf },

    #[error("[GLD-2002] activity counter already destroyed")]
    CounterDestroyed,

    #[error("[GLD-2101] no keyboard-capable device found under {dir} (probed {probed} candidates)")]
    DeviceProbe { dir: PathBuf, probed: u32 },

    #[error("[GLD-2102] filesystem watch failure for {path}: {details}")]
    Watch { path: PathBuf, details: String },

    #[error("[GLD-3001] actuator failure at {path}: {details}")]
    Actuator { path: PathBuf, details: String },

    #[error("[GLD-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[GLD-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[GLD-3101] failed to spawn {worker} worker: {details}")]
    Spawn {
        worker: &'static str,
        details: String,
    },

    #[error("[GLD-3102] privilege drop to {uid}:{gid} failed: {details}")]
    PrivilegeDrop { uid: u32, gid: u32, details: String },

    #[error("[GLD-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl GlowdError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "GLD-1001",
            Self::MissingConfig { .. } => "GLD-1002",
            Self::ConfigParse { .. } => "GLD-1003",
            Self::AlreadyRunning { .. } => "GLD-2001",
            Self::CounterDestroyed => "GLD-2002",
            Self::DeviceProbe { .. } => "GLD-2101",
            Self::Watch { .. } => "GLD-2102",
            Self::Actuator { .. } => "GLD-3001",
            Self::Io { .. } => "GLD-3002",
            Self::ChannelClosed { .. } => "GLD-3003",
            Self::Spawn { .. } => "GLD-3101",
            Self::PrivilegeDrop { .. } => "GLD-3102",
            Self::Runtime { .. } => "GLD-3900",
        }
    }

    /// Whether the failure costs only a single sample or control cycle.
    ///
    /// Skippable errors are absorbed by the loop that hit them; everything
    /// else is fatal to the daemon.
    #[must_use]
    pub const fn is_skippable(&self) -> bool {
        matches!(self, Self::CounterDestroyed)
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<toml::de::Error> for GlowdError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<notify::Error> for GlowdError {
    fn from(value: notify::Error) -> Self {
        Self::Watch {
            path: value
                .paths
                .first()
                .cloned()
                .unwrap_or_else(|| PathBuf::from("<watch>")),
            details: value.to_string(),
        }
    }
}
