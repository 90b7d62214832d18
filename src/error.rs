use std::{io, path::PathBuf};

/// Failure of a single analysis or plotting call.
///
/// Nothing is retried; the caller decides whether to move on to the next figure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("i/o failure on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to render figure: {0}")]
    Render(String),

    #[cfg(feature = "netcdf")]
    #[error("netcdf error")]
    Netcdf(#[from] netcdf::error::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
