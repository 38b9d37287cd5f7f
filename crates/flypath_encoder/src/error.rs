// SPDX-License-Identifier: MIT OR Apache-2.0
//! Service errors and their HTTP mapping.

use actix_web::http::StatusCode;
use actix_web::ResponseError;
use thiserror::Error;

/// Errors raised while serving export sessions
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Required header missing or unparsable
    #[error("Missing or invalid header `{0}`")]
    BadHeader(&'static str),

    /// No session registered under this token
    #[error("Unknown export session `{0}`")]
    UnknownSession(String),

    /// Frame index past the announced frame count
    #[error("Frame index {index} out of range for {frames} frames")]
    IndexOutOfRange {
        /// Received index
        index: u32,
        /// Frames announced at start
        frames: u32,
    },

    /// Request path contains an unsafe component
    #[error("Invalid path component")]
    InvalidPath,

    /// Requested artifact does not exist
    #[error("Not found")]
    NotFound,

    /// Frames did not all arrive in time
    #[error("Timed out waiting for frames of `{0}`")]
    FinishTimeout(String),

    /// ffmpeg could not be run or exited with an error
    #[error("Encoding failed: {0}")]
    Encoder(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be read
    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadHeader(_) | Self::IndexOutOfRange { .. } | Self::InvalidPath => {
                StatusCode::BAD_REQUEST
            }
            Self::UnknownSession(_) | Self::NotFound => StatusCode::NOT_FOUND,
            Self::FinishTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Encoder(_) | Self::Io(_) | Self::Settings(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
