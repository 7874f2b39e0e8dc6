use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop the launcher before the first frame is drawn.
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no usable text font (searched {} locations)", searched.len())]
    NoTextFont { searched: Vec<PathBuf> },

    #[error("cannot start metrics sampler: {0}")]
    Sampler(#[source] std::io::Error),

    #[error("display runtime failed: {0}")]
    Ui(#[from] iced::Error),
}
