// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera pose interpolation along the keyframe path.
//!
//! Position follows a Catmull-Rom spline through the keyframes (linear with
//! only two), orientation is slerped between the bracketing keyframes, and
//! both are driven by a smoothstep-eased segment parameter.

use crate::frame::{CameraPose, Frame, Quat, Vec3};
use crate::store::KeyframeStore;

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Interpolate Vec3
    pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
        ]
    }

    /// Smoothstep easing, `u*u*(3-2u)`
    pub fn smoothstep(u: f64) -> f64 {
        u * u * (3.0 - 2.0 * u)
    }

    /// Uniform Catmull-Rom segment between `p1` and `p2`
    pub fn catmull_rom(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
        let t2 = t * t;
        let t3 = t2 * t;

        0.5 * ((2.0 * p1)
            + (-p0 + p2) * t
            + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
            + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
    }

    /// Catmull-Rom for Vec3
    pub fn catmull_rom_vec3(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
        [
            Self::catmull_rom(p0[0], p1[0], p2[0], p3[0], t),
            Self::catmull_rom(p0[1], p1[1], p2[1], p3[1], t),
            Self::catmull_rom(p0[2], p1[2], p2[2], p3[2], t),
        ]
    }

    /// Spherical linear interpolation for quaternions
    pub fn slerp(a: Quat, b: Quat, t: f32) -> Quat {
        let mut dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3];

        // Take the short way round
        let mut b = b;
        if dot < 0.0 {
            b = [-b[0], -b[1], -b[2], -b[3]];
            dot = -dot;
        }

        // Nearly parallel: normalized lerp avoids dividing by sin(~0)
        if dot > 0.9995 {
            let result = [
                Self::lerp(a[0], b[0], t),
                Self::lerp(a[1], b[1], t),
                Self::lerp(a[2], b[2], t),
                Self::lerp(a[3], b[3], t),
            ];
            let len = (result[0] * result[0]
                + result[1] * result[1]
                + result[2] * result[2]
                + result[3] * result[3])
                .sqrt();
            return [result[0] / len, result[1] / len, result[2] / len, result[3] / len];
        }

        let theta_0 = dot.acos();
        let sin_theta_0 = theta_0.sin();
        let s0 = ((1.0 - t) * theta_0).sin() / sin_theta_0;
        let s1 = (t * theta_0).sin() / sin_theta_0;

        [
            a[0] * s0 + b[0] * s1,
            a[1] * s0 + b[1] * s1,
            a[2] * s0 + b[2] * s1,
            a[3] * s0 + b[3] * s1,
        ]
    }
}

/// Locate the adjacent pair `(last, next)` with `last.timestamp <= t < next.timestamp`.
///
/// At exactly the final timestamp the last non-degenerate pair is returned so
/// the path closes on its final keyframe. Pairs sharing a timestamp are never
/// returned, so the segment parameter never divides by zero.
pub fn bracket(frames: &[Frame], t: f64) -> Option<(usize, usize)> {
    let (first, last) = (frames.first()?, frames.last()?);
    if frames.len() < 2 || !(t >= first.timestamp && t <= last.timestamp) {
        return None;
    }

    let upper = frames.partition_point(|f| f.timestamp <= t);
    if upper < frames.len() {
        return Some((upper - 1, upper));
    }

    let next = frames.partition_point(|f| f.timestamp < t);
    (next > 0).then(|| (next - 1, next))
}

/// Whether a height rounds to zero (round half up)
fn rounds_to_zero(y: f32) -> bool {
    (-0.5..0.5).contains(&y)
}

/// Interpolated camera pose at time `t`, `None` if nothing should be rendered.
///
/// `None` is returned with fewer than two keyframes or when `t` lies outside
/// the path's span.
pub fn pose(store: &KeyframeStore, t: f64) -> Option<CameraPose> {
    let frames = store.frames();
    let (last, next) = bracket(frames, t)?;
    let (a, b) = (&frames[last], &frames[next]);

    let u = ((t - a.timestamp) / (b.timestamp - a.timestamp)).clamp(0.0, 1.0);
    let eased = Interpolation::smoothstep(u) as f32;

    let mut position = if frames.len() >= 3 {
        let p0 = frames[last.saturating_sub(1)].position;
        let p3 = frames[(next + 1).min(frames.len() - 1)].position;
        Interpolation::catmull_rom_vec3(p0, a.position, b.position, p3, eased)
    } else {
        Interpolation::lerp_vec3(a.position, b.position, eased)
    };

    // Ground-level paths must not drift vertically
    if rounds_to_zero(a.position[1]) && rounds_to_zero(b.position[1]) {
        position[1] = 0.0;
    }

    let orientation = Interpolation::slerp(a.orientation, b.orientation, eased);
    Some(CameraPose::new(position, orientation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::IDENTITY;

    const EPS: f32 = 1e-4;

    fn assert_vec3(a: Vec3, b: Vec3) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < EPS, "{a:?} != {b:?}");
        }
    }

    fn assert_quat(a: Quat, b: Quat) {
        for i in 0..4 {
            assert!((a[i] - b[i]).abs() < EPS, "{a:?} != {b:?}");
        }
    }

    fn yaw(angle: f32) -> Quat {
        let half = angle * 0.5;
        [0.0, half.sin(), 0.0, half.cos()]
    }

    fn curved_store() -> KeyframeStore {
        let mut store = KeyframeStore::new();
        store.insert(0.0, [0.0, 2.0, 0.0], yaw(0.0));
        store.insert(2.0, [4.0, 3.0, 1.0], yaw(0.4));
        store.insert(5.0, [6.0, 1.0, -3.0], yaw(0.9));
        store.insert(6.0, [9.0, 2.5, -2.0], yaw(1.3));
        store
    }

    #[test]
    fn test_fewer_than_two_frames() {
        let mut store = KeyframeStore::new();
        assert!(pose(&store, 0.0).is_none());
        store.insert(0.0, [1.0; 3], IDENTITY);
        assert!(pose(&store, 0.0).is_none());
    }

    #[test]
    fn test_no_extrapolation() {
        let store = curved_store();
        assert!(pose(&store, -0.01).is_none());
        assert!(pose(&store, 6.01).is_none());
        assert!(pose(&store, f64::NAN).is_none());
    }

    #[test]
    fn test_two_frame_midpoint_is_linear() {
        let mut store = KeyframeStore::new();
        store.insert(0.0, [0.0, 0.0, 0.0], IDENTITY);
        store.insert(10.0, [10.0, 0.0, 0.0], IDENTITY);

        assert_eq!(Interpolation::smoothstep(0.5), 0.5);
        let p = pose(&store, 5.0).unwrap();
        assert_vec3(p.position, [5.0, 0.0, 0.0]);
    }

    #[test]
    fn test_two_frame_is_eased() {
        let mut store = KeyframeStore::new();
        store.insert(0.0, [0.0, 4.0, 0.0], IDENTITY);
        store.insert(10.0, [10.0, 4.0, 0.0], IDENTITY);

        // smoothstep(0.25) = 0.15625
        let p = pose(&store, 2.5).unwrap();
        assert_vec3(p.position, [1.5625, 4.0, 0.0]);
    }

    #[test]
    fn test_hits_every_keyframe() {
        let store = curved_store();
        for frame in store.frames() {
            let p = pose(&store, frame.timestamp).unwrap();
            assert_vec3(p.position, frame.position);
            assert_quat(p.orientation, frame.orientation);
        }
    }

    #[test]
    fn test_catmull_rom_is_c1_at_interior_keyframes() {
        let pts = [0.0_f32, 4.0, 6.0, 9.0, 2.0];
        let h = 1e-2_f32;

        // Segment i spans pts[i]..pts[i + 1] with clamped neighbours
        let seg = |i: usize, t: f32| {
            let p0 = pts[i.saturating_sub(1)];
            let p3 = pts[(i + 2).min(pts.len() - 1)];
            Interpolation::catmull_rom(p0, pts[i], pts[i + 1], p3, t)
        };

        for i in 0..pts.len() - 2 {
            assert!((seg(i, 1.0) - seg(i + 1, 0.0)).abs() < EPS);

            // Second-order one-sided differences
            let left = (3.0 * seg(i, 1.0) - 4.0 * seg(i, 1.0 - h) + seg(i, 1.0 - 2.0 * h)) / (2.0 * h);
            let right = (-3.0 * seg(i + 1, 0.0) + 4.0 * seg(i + 1, h) - seg(i + 1, 2.0 * h)) / (2.0 * h);
            assert!((left - right).abs() < 0.05, "{left} vs {right} at {i}");
        }
    }

    #[test]
    fn test_slerp_halfway() {
        let q = Interpolation::slerp(yaw(0.0), yaw(1.0), 0.5);
        assert_quat(q, yaw(0.5));
    }

    #[test]
    fn test_slerp_takes_short_arc() {
        let a = yaw(0.2);
        let b = yaw(0.6);
        let neg_b = [-b[0], -b[1], -b[2], -b[3]];
        assert_quat(Interpolation::slerp(a, neg_b, 0.5), yaw(0.4));
    }

    #[test]
    fn test_walking_mode_snaps_height() {
        let mut store = KeyframeStore::new();
        store.insert(0.0, [0.0, 3.0, 0.0], IDENTITY);
        store.insert(1.0, [1.0, 0.2, 0.0], IDENTITY);
        store.insert(2.0, [2.0, -0.3, 0.0], IDENTITY);
        store.insert(3.0, [3.0, 4.0, 0.0], IDENTITY);

        // Raw spline overshoots in the ground bracket
        let raw = Interpolation::catmull_rom(3.0, 0.2, -0.3, 4.0, 0.5);
        assert!(raw.abs() > 0.01);

        for step in 0..20 {
            let t = 1.0 + f64::from(step) * 0.05;
            let p = pose(&store, t).unwrap();
            assert_eq!(p.position[1], 0.0, "at t={t}");
        }

        // Brackets off the ground keep their height
        assert!(pose(&store, 0.5).unwrap().position[1] > 0.5);
    }

    #[test]
    fn test_rounding_boundary() {
        assert!(rounds_to_zero(-0.5));
        assert!(rounds_to_zero(0.49));
        assert!(!rounds_to_zero(0.5));
        assert!(!rounds_to_zero(-0.51));
    }

    #[test]
    fn test_equal_timestamps_skip_degenerate_bracket() {
        let mut store = KeyframeStore::new();
        let a = store.insert(0.0, [0.0, 2.0, 0.0], IDENTITY);
        store.insert(2.0, [2.0, 2.0, 0.0], IDENTITY);
        store.insert(2.0, [5.0, 2.0, 0.0], IDENTITY);
        store.insert(4.0, [8.0, 2.0, 0.0], IDENTITY);

        for step in 0..=40 {
            let p = pose(&store, f64::from(step) * 0.1).unwrap();
            assert!(p.position.iter().all(|c| c.is_finite()));
            assert!(p.orientation.iter().all(|c| c.is_finite()));
        }

        // The later of the tied frames starts the next bracket
        assert_eq!(bracket(store.frames(), 2.0), Some((2, 3)));
        assert_eq!(store.index_of(a), Some(0));
    }

    #[test]
    fn test_all_frames_share_timestamp() {
        let mut store = KeyframeStore::new();
        store.insert(3.0, [0.0; 3], IDENTITY);
        store.insert(3.0, [1.0; 3], IDENTITY);
        assert!(pose(&store, 3.0).is_none());
    }

    #[test]
    fn test_end_of_path_uses_final_keyframe() {
        let mut store = KeyframeStore::new();
        store.insert(0.0, [0.0, 2.0, 0.0], IDENTITY);
        store.insert(1.0, [1.0, 2.0, 0.0], IDENTITY);
        store.insert(1.0, [7.0, 2.0, 0.0], IDENTITY);

        // The later insertion sorts ahead of the earlier equal frame
        let end = store.frames()[1].position;
        assert_vec3(pose(&store, 1.0).unwrap().position, end);
    }
}
