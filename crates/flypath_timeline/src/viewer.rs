// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera host abstraction.

use crate::frame::CameraPose;

/// Something holding a camera the timeline can read and drive.
///
/// Implemented by the host renderer. Applying a pose is expected to also
/// retarget any orbit controls at [`CameraPose::look_target`].
pub trait Viewer {
    /// Current camera pose
    fn pose(&self) -> CameraPose;

    /// Move the camera to a pose
    fn apply_pose(&mut self, pose: &CameraPose);
}
