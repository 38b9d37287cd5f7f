// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback over the keyframe path.

use crate::interpolation::pose;
use crate::store::KeyframeStore;
use crate::viewer::Viewer;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped
    #[default]
    Stopped,
    /// Playing forward, one pass
    Playing,
    /// User is dragging the time control
    Scrubbing,
}

/// Virtual clock driving the viewer along the path
#[derive(Debug, Clone)]
pub struct PlaybackController {
    /// Current playback time
    pub current_time: f64,
    /// Playback state
    pub state: PlaybackState,
    /// Playback speed multiplier
    pub speed: f64,
}

impl PlaybackController {
    /// Create a new playback controller
    pub fn new() -> Self {
        Self {
            current_time: 0.0,
            state: PlaybackState::Stopped,
            speed: 1.0,
        }
    }

    /// Start or stop playback.
    ///
    /// Does nothing on an empty store. Entering playback clamps the clock up
    /// to the first keyframe.
    pub fn toggle_play(&mut self, store: &KeyframeStore) {
        let Some(first) = store.first() else {
            return;
        };

        match self.state {
            PlaybackState::Playing => {
                self.state = PlaybackState::Stopped;
                tracing::debug!(time = self.current_time, "playback paused");
            }
            PlaybackState::Stopped | PlaybackState::Scrubbing => {
                self.current_time = self.current_time.max(first.timestamp);
                self.state = PlaybackState::Playing;
                tracing::debug!(time = self.current_time, "playback started");
            }
        }
    }

    /// Advance the clock by `delta` seconds and render.
    ///
    /// Reaching the last keyframe rewinds to the first and stops.
    pub fn tick<V: Viewer + ?Sized>(&mut self, store: &KeyframeStore, viewer: &mut V, delta: f64) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some((start, end)) = store.span() else {
            self.state = PlaybackState::Stopped;
            return;
        };

        self.current_time += delta * self.speed;
        self.render_current(store, viewer);

        if self.current_time >= end {
            self.current_time = start;
            self.state = PlaybackState::Stopped;
            tracing::debug!("playback reached end of path");
        }
    }

    /// Jump to `time`, cancelling playback, and render immediately
    pub fn scrub<V: Viewer + ?Sized>(&mut self, store: &KeyframeStore, viewer: &mut V, time: f64) {
        self.state = PlaybackState::Scrubbing;
        self.current_time = time;

        if store.len() > 1 {
            self.render_current(store, viewer);
        }
    }

    /// Release the time control
    pub fn end_scrub(&mut self) {
        if self.state == PlaybackState::Scrubbing {
            self.state = PlaybackState::Stopped;
        }
    }

    /// Apply the pose at the current time, returns whether anything was drawn
    pub fn render_current<V: Viewer + ?Sized>(&self, store: &KeyframeStore, viewer: &mut V) -> bool {
        match pose(store, self.current_time) {
            Some(pose) => {
                viewer.apply_pose(&pose);
                true
            }
            None => false,
        }
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::IDENTITY;
    use crate::viewer::testing::RecordingViewer;

    fn store() -> KeyframeStore {
        let mut store = KeyframeStore::new();
        store.insert(1.0, [0.0, 1.0, 0.0], IDENTITY);
        store.insert(2.0, [1.0, 1.0, 0.0], IDENTITY);
        store.insert(3.0, [2.0, 1.0, 0.0], IDENTITY);
        store
    }

    #[test]
    fn test_toggle_on_empty_store_is_noop() {
        let mut playback = PlaybackController::new();
        playback.toggle_play(&KeyframeStore::new());
        assert_eq!(playback.state, PlaybackState::Stopped);
    }

    #[test]
    fn test_play_clamps_to_first_keyframe() {
        let store = store();
        let mut playback = PlaybackController::new();

        playback.toggle_play(&store);
        assert!(playback.is_playing());
        assert_eq!(playback.current_time, 1.0);

        playback.toggle_play(&store);
        assert_eq!(playback.state, PlaybackState::Stopped);
    }

    #[test]
    fn test_play_keeps_later_time() {
        let store = store();
        let mut playback = PlaybackController::new();
        playback.current_time = 2.5;
        playback.toggle_play(&store);
        assert_eq!(playback.current_time, 2.5);
    }

    #[test]
    fn test_tick_only_while_playing() {
        let store = store();
        let mut viewer = RecordingViewer::default();
        let mut playback = PlaybackController::new();

        playback.tick(&store, &mut viewer, 0.5);
        assert_eq!(playback.current_time, 0.0);
        assert!(viewer.applied.is_empty());
    }

    #[test]
    fn test_single_pass_then_stop() {
        let store = store();
        let mut viewer = RecordingViewer::default();
        let mut playback = PlaybackController::new();
        playback.toggle_play(&store);

        let mut ticks = 0;
        while playback.is_playing() {
            playback.tick(&store, &mut viewer, 0.25);
            ticks += 1;
            assert!(ticks < 100);
        }

        assert_eq!(ticks, 8);
        assert_eq!(playback.state, PlaybackState::Stopped);
        assert_eq!(playback.current_time, 1.0);
        assert_eq!(viewer.applied.len(), 8);

        // No auto-loop
        playback.tick(&store, &mut viewer, 0.25);
        assert_eq!(viewer.applied.len(), 8);
    }

    #[test]
    fn test_speed_scales_delta() {
        let store = store();
        let mut viewer = RecordingViewer::default();
        let mut playback = PlaybackController::new();
        playback.speed = 2.0;
        playback.toggle_play(&store);

        playback.tick(&store, &mut viewer, 0.25);
        assert_eq!(playback.current_time, 1.5);
    }

    #[test]
    fn test_scrub_cancels_playback() {
        let store = store();
        let mut viewer = RecordingViewer::default();
        let mut playback = PlaybackController::new();
        playback.toggle_play(&store);

        playback.scrub(&store, &mut viewer, 2.0);
        assert_eq!(playback.state, PlaybackState::Scrubbing);
        assert_eq!(playback.current_time, 2.0);
        assert_eq!(viewer.current.position, [1.0, 1.0, 0.0]);

        playback.tick(&store, &mut viewer, 0.5);
        assert_eq!(playback.current_time, 2.0);

        playback.end_scrub();
        assert_eq!(playback.state, PlaybackState::Stopped);
    }

    #[test]
    fn test_scrub_with_single_frame_does_not_render() {
        let mut store = KeyframeStore::new();
        store.insert(0.0, [0.0; 3], IDENTITY);
        let mut viewer = RecordingViewer::default();
        let mut playback = PlaybackController::new();

        playback.scrub(&store, &mut viewer, 0.0);
        assert!(viewer.applied.is_empty());
        assert_eq!(playback.state, PlaybackState::Scrubbing);
    }

    #[test]
    fn test_emptied_store_stops_playback() {
        let mut store = store();
        let mut viewer = RecordingViewer::default();
        let mut playback = PlaybackController::new();
        playback.toggle_play(&store);

        store.replace_all(Vec::new());
        playback.tick(&store, &mut viewer, 0.1);
        assert_eq!(playback.state, PlaybackState::Stopped);
    }
}
