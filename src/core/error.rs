use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not find config directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, MapleError>;
