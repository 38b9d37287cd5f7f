// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export errors.

use thiserror::Error;

/// Failure talking to the encoding service
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service rejected or could not serve the request
    #[error("Service error: {0}")]
    Service(String),
}

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    /// Start call failed, no frames were sent
    #[error("Failed to start export session: {0}")]
    Start(#[source] TransportError),

    /// A frame upload failed
    #[error("Failed to upload frame {index}: {source}")]
    FrameUpload {
        /// Frame index
        index: u32,
        /// Underlying failure
        #[source]
        source: TransportError,
    },

    /// Finish call failed
    #[error("Failed to finish export: {0}")]
    Finish(#[source] TransportError),

    /// Fetching the encoded video failed
    #[error("Failed to download exported video: {0}")]
    Download(#[source] TransportError),

    /// Frame could not be encoded as PNG
    #[error("Failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),

    /// Upload task panicked or was aborted
    #[error("Upload task failed: {0}")]
    UploadTask(#[from] tokio::task::JoinError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings error
    #[error("Invalid export settings: {0}")]
    Settings(String),

    /// Path spans more frames than an export accepts
    #[error("Path of {span:.1}s is too long to export")]
    PathTooLong {
        /// Seconds between the first and last keyframe
        span: f64,
    },

    /// Export was cancelled
    #[error("Export cancelled")]
    Cancelled,
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;
