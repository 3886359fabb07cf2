use crate::retrieval::RetrievalError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the job search crate
///
/// Only [`JobSearchError::InvalidInput`] and [`JobSearchError::RetrievalUnavailable`]
/// ever leave the search pipeline. Oracle failures are absorbed into fallbacks
/// before they reach this type.
#[derive(Error, Debug)]
pub enum JobSearchError {
    /// Request rejected before pipeline entry
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Retrieval engine failed; the pipeline cannot produce results
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(#[from] RetrievalError),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JobSearchError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Stable classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::RetrievalUnavailable(_) => ErrorKind::RetrievalUnavailable,
            Self::Config(_)
            | Self::ConfigValidation { .. }
            | Self::ConfigNotFound { .. }
            | Self::InvalidConfigValue { .. }
            | Self::Toml(_)
            | Self::TomlSerialization(_) => ErrorKind::Configuration,
            Self::Io { .. } | Self::Json { .. } | Self::Other(_) => ErrorKind::Internal,
        }
    }
}

/// Stable error kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller sent a bad request (client error)
    InvalidInput,
    /// Retrieval engine unreachable or broken (service unavailable)
    RetrievalUnavailable,
    /// Configuration could not be loaded or is invalid
    Configuration,
    /// Anything else
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::RetrievalUnavailable => "retrieval_unavailable",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Internal => "internal",
        }
    }

    /// Whether the caller, not the service, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, ErrorKind::InvalidInput)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for job search operations
pub type Result<T> = std::result::Result<T, JobSearchError>;
