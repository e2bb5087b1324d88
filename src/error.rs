//! Error types for configuration loading
//!
//! The simulation itself has no failure paths; negative outcomes such as a
//! refused shot are ordinary return values. Only building an engine from
//! external level data can fail.

use std::path::PathBuf;

/// Errors raised while reading or validating a level config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config JSON did not match the expected layout
    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Playfield must have a positive area
    #[error("Invalid playfield size {width}x{height}")]
    InvalidPlayfield { width: f64, height: f64 },

    /// Player must start alive
    #[error("Player must start with at least one life (got {lives})")]
    InvalidPlayer { lives: i32 },
}

/// Result type alias for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;
