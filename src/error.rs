use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a rendering [`Config`](crate::Config).
///
/// Building and rendering documents never fails; only configuration input
/// coming from outside the process can.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
