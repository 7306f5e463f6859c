//! Error types for routergen

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutergenError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Command execution failed
    #[error("Command '{cmd}' failed: {stderr}")]
    CommandFailed {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Interface not found
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Parse error
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Not supported
    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl From<serde_json::Error> for RoutergenError {
    fn from(error: serde_json::Error) -> Self {
        RoutergenError::ParseError(error.to_string())
    }
}

pub type RoutergenResult<T> = Result<T, RoutergenError>;
