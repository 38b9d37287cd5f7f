// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera path timeline for flypath.
//!
//! This crate provides the authoring core of a camera fly-through:
//! - Ordered keyframe storage with single selection
//! - Pose interpolation (Catmull-Rom position, slerp orientation)
//! - Playback and scrubbing over a virtual clock
//! - Path file load/save
//!
//! ## Architecture
//!
//! The timeline is built on:
//! - [`KeyframeStore`] owning every [`Frame`], always sorted by timestamp
//! - [`interpolation::pose`], a pure function of the store and a time
//! - [`PlaybackController`] driving a [`Viewer`] from that function
//! - [`Timeline`], the session object tying the pieces together

pub mod frame;
pub mod interpolation;
pub mod path_file;
pub mod playback;
pub mod store;
pub mod timeline;
pub mod viewer;

pub use frame::{CameraPose, Frame, KeyframeId, Quat, Vec3};
pub use interpolation::{pose, Interpolation};
pub use path_file::{PathEntry, PathFileError};
pub use playback::{PlaybackController, PlaybackState};
pub use store::{KeyframeStore, StoreEvent};
pub use timeline::{Timeline, NUDGE_STEP};
pub use viewer::Viewer;
