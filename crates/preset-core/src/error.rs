use std::io;
use thiserror::Error;

/// Custom result type for preset operations
pub type PresetResult<T> = Result<T, PresetError>;

/// Custom error type for preset operations
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl PresetError {
    /// Create a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        PresetError::Network(msg.into())
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        PresetError::Parse(msg.into())
    }

    /// Create a new settings error
    pub fn settings<S: Into<String>>(msg: S) -> Self {
        PresetError::Settings(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PresetError::Config(msg.into())
    }

    /// Create a new unknown error
    pub fn unknown<S: Into<String>>(msg: S) -> Self {
        PresetError::Unknown(msg.into())
    }
}

impl From<serde_json::Error> for PresetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PresetError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PresetError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<io::Error> for PresetError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
