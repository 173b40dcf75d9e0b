//! Console error types
//!
//! Interaction handlers never surface errors to the page; these cover setup
//! (configuration) and the replay tooling, plus document errors bubbled up from
//! `cpm-core`.

use std::path::PathBuf;

use cpm_core::CoreError;

/// Errors raised while configuring or driving a console.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`ConsoleConfig`](crate::ConsoleConfig).
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config parsed but a value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Which field is wrong and why
        reason: String,
    },

    /// A document operation failed.
    #[error(transparent)]
    Document(#[from] CoreError),

    /// A scenario file could not be read.
    #[error("failed to read scenario {path}: {source}")]
    ScenarioRead {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A scenario file is not valid scenario JSON.
    #[error("failed to parse scenario: {0}")]
    ScenarioParse(#[from] serde_json::Error),

    /// A scenario step referred to something the page does not have.
    #[error("scenario step {step}: {reason}")]
    Scenario {
        /// Zero-based step index
        step: usize,
        /// What went wrong
        reason: String,
    },
}

impl ConsoleError {
    /// Shorthand for [`ConsoleError::InvalidConfig`].
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ConsoleError::Scenario`].
    pub fn scenario(step: usize, reason: impl Into<String>) -> Self {
        Self::Scenario {
            step,
            reason: reason.into(),
        }
    }
}

/// Result alias for console operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;
