use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single persist strategy. The pipeline logs these and moves
/// on to the next strategy.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch share handler `{program}`: {source}")]
    ShareLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("directory picker failed: {0}")]
    Picker(#[source] std::io::Error),
}

/// Failure reading or writing the persisted session state.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read state file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write state file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode session state: {0}")]
    Encode(#[from] prost::EncodeError),
}
