//! Error types shared across SocialCue crates.

use std::path::PathBuf;

/// Top-level error type for SocialCue operations.
///
/// The per-tick pipeline never produces these; they surface only at the
/// edges (configuration, scene files, log output).
#[derive(Debug, thiserror::Error)]
pub enum SocialCueError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Scene error: {message}")]
    Scene { message: String },

    #[error("Simulation error: {message}")]
    Simulation { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using SocialCueError.
pub type SocialCueResult<T> = Result<T, SocialCueError>;

impl SocialCueError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene {
            message: msg.into(),
        }
    }

    pub fn simulation(msg: impl Into<String>) -> Self {
        Self::Simulation {
            message: msg.into(),
        }
    }
}
