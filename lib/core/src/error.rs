use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Invalid top pool size: {0} (must be at least 1)")]
    InvalidPoolSize(usize),

    #[error("Invalid search limit: k must be at least 1")]
    InvalidK,

    #[error("Invalid confidence threshold: {0}")]
    InvalidThreshold(f32),

    #[error("Invalid tie epsilon: {0}")]
    InvalidEpsilon(f32),

    #[error("Invalid search template: {0}")]
    InvalidTemplate(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
