// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe records and camera poses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 3D vector (x, y, z)
pub type Vec3 = [f32; 3];

/// Rotation quaternion (x, y, z, w)
pub type Quat = [f32; 4];

/// Identity rotation
pub const IDENTITY: Quat = [0.0, 0.0, 0.0, 1.0];

/// Unique identifier for a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyframeId(pub Uuid);

impl KeyframeId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyframeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A recorded camera pose tagged with a point in time along the path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique keyframe ID
    pub id: KeyframeId,
    /// Time in seconds (not required to be unique)
    pub timestamp: f64,
    /// Camera position
    pub position: Vec3,
    /// Camera orientation, unit quaternion
    pub orientation: Quat,
}

impl Frame {
    /// Create a new keyframe
    pub fn new(timestamp: f64, position: Vec3, orientation: Quat) -> Self {
        Self {
            id: KeyframeId::new(),
            timestamp,
            position,
            orientation,
        }
    }

    /// The pose stored in this keyframe
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            orientation: self.orientation,
        }
    }
}

/// Camera position and orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Camera position
    pub position: Vec3,
    /// Camera orientation, unit quaternion
    pub orientation: Quat,
}

impl CameraPose {
    /// Create a pose from a position and orientation
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Viewing direction: -Z rotated by the orientation
    pub fn forward(&self) -> Vec3 {
        rotate(self.orientation, [0.0, 0.0, -1.0])
    }

    /// Point one unit ahead of the camera, used as the orbit target
    pub fn look_target(&self) -> Vec3 {
        let f = self.forward();
        [
            self.position[0] + f[0],
            self.position[1] + f[1],
            self.position[2] + f[2],
        ]
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::new([0.0; 3], IDENTITY)
    }
}

/// Rotate a vector by a unit quaternion
pub fn rotate(q: Quat, v: Vec3) -> Vec3 {
    let [x, y, z, w] = q;

    // t = 2 * cross(q.xyz, v)
    let tx = 2.0 * (y * v[2] - z * v[1]);
    let ty = 2.0 * (z * v[0] - x * v[2]);
    let tz = 2.0 * (x * v[1] - y * v[0]);

    [
        v[0] + w * tx + (y * tz - z * ty),
        v[1] + w * ty + (z * tx - x * tz),
        v[2] + w * tz + (x * ty - y * tx),
    ]
}

/// Normalize a quaternion, `None` for a zero-length input
pub fn normalize(q: Quat) -> Option<Quat> {
    let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if !len.is_finite() || len <= f32::EPSILON {
        return None;
    }
    Some([q[0] / len, q[1] / len, q[2] / len, q[3] / len])
}
