use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures while reading the retailer CSV.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open dataset {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("dataset has already been loaded")]
    AlreadyLoaded,
}

/// Query-time failures. An empty result is never an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("retailer dataset is not loaded")]
    NotReady,
}
