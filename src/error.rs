//! Error types for typing-config

use crate::config::{SchemaError, ValueRangeError};
use crate::dataset::FetchError;
use crate::registry::TypeResolutionError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Type resolution error: {0}")]
    TypeResolution(#[from] TypeResolutionError),

    #[error("Value range error: {0}")]
    ValueRange(#[from] ValueRangeError),

    #[error("Resource fetch error: {0}")]
    ResourceFetch(#[from] FetchError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
