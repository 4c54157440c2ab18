use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to lock store: {0}")]
    Lock(String),

    #[error("Corrupt value under key '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}
