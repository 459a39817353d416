//! Error types shared across the pipeline
//!
//! Service-level failures are described by [`BackendError`]; they are absorbed per
//! entry by the analysis layer. [`PipelineError`] carries the structural failures that
//! abort a run.

use crate::archive::ArchiveError;
use crate::bibliography::BibliographyError;
use crate::latex::AssembleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while talking to the analysis service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackendError {
    /// API request failed with the given message
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// Invalid or malformed response from the LLM
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// Backend configuration is invalid
    ConfigurationError { message: String },

    /// Network connectivity issue
    NetworkError { message: String },

    /// Other unspecified error
    Other { message: String },
}

impl BackendError {
    /// Whether the failure came from the per-request deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::TimeoutError { .. })
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            BackendError::InvalidResponse { message, .. } => {
                write!(f, "Invalid response from LLM: {}", message)
            }
            BackendError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            BackendError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            BackendError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// Fatal failures that abort a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Bibliography(#[from] BibliographyError),

    #[error("Input path does not exist: {0}")]
    InputNotFound(std::path::PathBuf),
}
