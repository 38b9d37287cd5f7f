// SPDX-License-Identifier: MIT OR Apache-2.0
//! Encoding service for flypath exports.
//!
//! Collects PNG frames uploaded by an export session, encodes them into an
//! MP4 with ffmpeg once every frame has arrived, and serves the result.

pub mod error;
pub mod ffmpeg;
pub mod routes;
pub mod sessions;
pub mod settings;

pub use error::{Result, ServiceError};
pub use routes::{configure, isolation_headers, AppState};
pub use sessions::{FrameSlot, SessionRegistry};
pub use settings::{EncoderSettings, ENCODER_SETTINGS_FILE};
