// SPDX-License-Identifier: MIT OR Apache-2.0
//! Video export for flypath camera paths.
//!
//! Export walks the path at a fixed frame rate, renders each frame off-screen
//! through a [`RenderViewer`], and streams the frames to an encoding service:
//! 1. `start` announces the session token and frame count
//! 2. `frame` uploads each PNG tagged with its index
//! 3. `finish` returns the location of the encoded video, which is then
//!    downloaded to the configured output path

pub mod error;
pub mod orchestrator;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod transport;

pub use error::{ExportError, Result, TransportError};
pub use orchestrator::{ExportCancel, ExportOrchestrator, ExportOutcome, ExportStatus};
pub use render::{encode_png, RenderViewer};
pub use scheduler::{FrameScheduler, ImmediateScheduler, IntervalScheduler};
pub use session::{frame_count, ExportPhase, ExportSession, MAX_EXPORT_FRAMES};
pub use settings::ExportSettings;
pub use transport::{EncoderTransport, HttpTransport};
