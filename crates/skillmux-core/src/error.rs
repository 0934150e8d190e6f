//! Error types for skillmux.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for skillmux operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for skillmux operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem operation failed on a specific path.
    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An existing config file could not be parsed as JSON.
    #[error("Failed to parse JSON config {}: {source}", path.display())]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON document root is not an object.
    #[error("Expected JSON object at root: {}", .0.display())]
    NotAnObject(PathBuf),

    /// A field expected to hold a server mapping holds something else.
    #[error("Expected '{key}' to be a JSON object in {}", path.display())]
    InvalidServersField { key: String, path: PathBuf },

    /// Settings file could not be parsed.
    #[error("Failed to parse settings {}: {source}", path.display())]
    ParseSettings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A SKILL.md file has no usable frontmatter.
    #[error("Invalid skill {}: {reason}", path.display())]
    InvalidSkill { path: PathBuf, reason: String },

    /// Serialization of generated content failed.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML frontmatter serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Agent identifier is not in the supported table.
    #[error("Unknown agent type: {0}")]
    UnknownAgent(String),

    /// Agent has no config location on this platform.
    #[error("Agent '{agent}' is not supported on platform '{platform}'")]
    UnsupportedPlatform {
        agent: &'static str,
        platform: &'static str,
    },

    /// Target path exists as a directory.
    #[error("Refusing to write config: path is a directory: {}", .0.display())]
    PathIsDirectory(PathBuf),

    /// Home directory could not be determined.
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Required parameter has no value and prompting is disabled.
    #[error("Missing required parameter '{parameter}' for MCP server '{server}'")]
    MissingParameter { server: String, parameter: String },

    /// User cancelled an interactive prompt.
    #[error("Setup cancelled")]
    Cancelled,

    /// Prompt backend failed for a reason other than cancellation.
    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl Error {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a user cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
