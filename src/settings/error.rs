use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors produced while loading, merging or querying settings.
///
/// The type is `Clone` because a load failure is sticky: every later
/// [`Settings::get`](super::Settings::get) hands back the same error.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("failed to read settings source '{path}': {source}")]
    Io {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },

    #[error("failed to parse settings source '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: Arc<ParseError>,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} is not a table")]
    NotATree(String),

    #[error("failed to deserialize '{path}': {source}")]
    Deserialize {
        path: String,
        source: Arc<serde_json::Error>,
    },

    #[error("settings worker exited before completing its operation")]
    WorkerLost,
}

impl SettingsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Whether this error came from an operation (and is therefore sticky)
    /// rather than from resolving a path.
    pub fn is_sticky(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Parse { .. } | Self::WorkerLost)
    }
}

/// Failure to turn raw bytes into a [`SettingsTree`](super::SettingsTree).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("document root must be a table, found {found}")]
    NotATable { found: &'static str },

    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

pub type Result<T, E = SettingsError> = std::result::Result<T, E>;
