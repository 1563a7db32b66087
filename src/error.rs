use thiserror::Error;

/// Library error types
#[derive(Error, Debug)]
pub enum LearnerError {
    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Predictor strategy errors
    #[error("Predictor error: {0}")]
    Predictor(String),

    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LearnerError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            LearnerError::NotFound(_) => "NOT_FOUND",
            LearnerError::Validation(_) => "VALIDATION_ERROR",
            LearnerError::Predictor(_) => "PREDICTOR_ERROR",
            LearnerError::Storage(_) => "STORAGE_ERROR",
            LearnerError::Serialization(_) => "SERIALIZATION_ERROR",
            LearnerError::Configuration(_) => "CONFIGURATION_ERROR",
            LearnerError::Io(_) => "IO_ERROR",
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for LearnerError {
    fn from(err: serde_json::Error) -> Self {
        LearnerError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for LearnerError {
    fn from(err: validator::ValidationErrors) -> Self {
        LearnerError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for LearnerError {
    fn from(err: config::ConfigError) -> Self {
        LearnerError::Configuration(err.to_string())
    }
}

/// Conversion from sled::Error
impl From<sled::Error> for LearnerError {
    fn from(err: sled::Error) -> Self {
        LearnerError::Storage(err.to_string())
    }
}

/// Conversion from bincode::Error
impl From<bincode::Error> for LearnerError {
    fn from(err: bincode::Error) -> Self {
        LearnerError::Serialization(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, LearnerError>;
