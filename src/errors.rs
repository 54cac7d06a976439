use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("STORAGE_FAILURE: {0}")]
    Storage(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("SERIALIZATION_FAILURE: {0}")]
    Serialization(String),
    #[error("ENGINE_STOPPED: {0}")]
    EngineStopped(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<std::io::Error> for EngineError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
