use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Mutation rejected: {0}")]
    MutationRejected(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ReconError>;
