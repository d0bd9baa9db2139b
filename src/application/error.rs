//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::TreeError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] TreeError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no node with id {id} in {path}")]
    UnknownNode { id: String, path: PathBuf },

    #[error("cannot place node {0} beside itself")]
    SelfPlacement(String),

    #[error("invalid assignment `{0}`: expected key=value")]
    InvalidAssignment(String),

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
