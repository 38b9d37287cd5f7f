// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export session bookkeeping.

use uuid::Uuid;

/// Phase of an export session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ExportPhase {
    /// Nothing sent yet
    #[default]
    Idle,
    /// Service accepted the session
    Started,
    /// Frames are being rendered and uploaded
    Sending,
    /// Video encoded and saved
    Finished,
}

/// One export run against the encoding service
#[derive(Debug, Clone)]
pub struct ExportSession {
    /// Opaque token scoping every request of this run
    pub token: String,
    /// Number of frames that will be sent
    pub frame_count: u32,
    /// Index of the next frame to send
    pub next_index: u32,
    /// Current phase
    pub phase: ExportPhase,
}

impl ExportSession {
    /// Create a session with a fresh token
    pub fn new(frame_count: u32) -> Self {
        Self {
            token: Uuid::new_v4().simple().to_string(),
            frame_count,
            next_index: 0,
            phase: ExportPhase::Idle,
        }
    }

    /// Move to a later phase. Phases never go backwards.
    pub fn advance(&mut self, phase: ExportPhase) {
        if phase > self.phase {
            tracing::debug!(token = %self.token, ?phase, "export phase");
            self.phase = phase;
        }
    }

    /// Claim the next frame index
    pub fn claim_index(&mut self) -> u32 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Fraction of frames sent
    pub fn progress(&self) -> f32 {
        if self.frame_count == 0 {
            return 1.0;
        }
        self.next_index as f32 / self.frame_count as f32
    }
}

/// Longest export accepted, one hour at 60 fps
pub const MAX_EXPORT_FRAMES: u32 = 60 * 60 * 60;

/// Number of `1/fps` steps needed to advance from `start` to at least `end`.
///
/// Accumulates the step the same way the frame loop does, so the count always
/// matches the number of frames rendered. Returns `None` if the span is not
/// finite or would need more than [`MAX_EXPORT_FRAMES`] frames.
pub fn frame_count(start: f64, end: f64, fps: u32) -> Option<u32> {
    let fps = f64::from(fps.max(1));
    let span = end - start;
    if !span.is_finite() {
        return None;
    }
    if (span * fps).ceil() > f64::from(MAX_EXPORT_FRAMES) + 1.0 {
        return None;
    }

    let step = 1.0 / fps;
    let mut time = start;
    let mut count = 0;
    while time < end {
        time += step;
        count += 1;
    }
    (count <= MAX_EXPORT_FRAMES).then_some(count)
}
