use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Cannot load config {path}: {reason}")]
    ConfigLoad { path: String, reason: String },

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Data file error in {path}: {reason}")]
    DataFile { path: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
