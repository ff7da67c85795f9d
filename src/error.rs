use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Variant '{variant}' of task '{task}' is system-owned and cannot be deleted")]
    ProtectedVariant { task: String, variant: String },

    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("Unknown structured variant: {0}")]
    UnknownVariant(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Rate limit reached for {key}: {message}")]
    RateLimited { key: String, message: String },

    #[error("Language model call failed: {0}")]
    ModelFailed(String),

    #[error("Invalid model response: {0}")]
    InvalidModelResponse(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, JournalError>;
