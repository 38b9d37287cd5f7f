// SPDX-License-Identifier: MIT OR Apache-2.0
//! Authoring session tying keyframes, playback and the viewer together.
//!
//! A [`Timeline`] is one independent camera path: it owns the keyframe
//! store and the playback clock, and implements the editing shortcuts a
//! host wires to its buttons, keys and drag handles.

use std::path::Path;

use crate::frame::KeyframeId;
use crate::path_file::{self, PathEntry, PathFileError};
use crate::playback::{PlaybackController, PlaybackState};
use crate::store::{KeyframeStore, StoreEvent};
use crate::viewer::Viewer;

/// Seconds a keyboard nudge moves the selected keyframe
pub const NUDGE_STEP: f64 = 0.3;

/// Default length of the time control in seconds
pub const DEFAULT_DURATION: f64 = 20.0;

/// One camera path being authored
#[derive(Debug, Clone)]
pub struct Timeline {
    store: KeyframeStore,
    /// Playback controller
    pub playback: PlaybackController,
    /// Length of the time control; dragged keyframes are clamped to it
    pub duration: f64,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self {
            store: KeyframeStore::new(),
            playback: PlaybackController::new(),
            duration: DEFAULT_DURATION,
        }
    }

    /// Keyframes on this timeline
    pub fn store(&self) -> &KeyframeStore {
        &self.store
    }

    /// Mutable access to the keyframes
    pub fn store_mut(&mut self) -> &mut KeyframeStore {
        &mut self.store
    }

    /// Current playback time
    pub fn current_time(&self) -> f64 {
        self.playback.current_time
    }

    /// Capture the viewer's pose as a keyframe at the current time
    pub fn add_keyframe<V: Viewer + ?Sized>(&mut self, viewer: &V) -> KeyframeId {
        let pose = viewer.pose();
        let id = self
            .store
            .insert(self.playback.current_time, pose.position, pose.orientation);
        tracing::info!(time = self.playback.current_time, "added keyframe");
        id
    }

    /// Select a keyframe, or deselect it if already selected
    pub fn toggle_select(&mut self, id: KeyframeId) {
        self.store.toggle_selection(id);
    }

    /// Drag a keyframe to a new time on the time control.
    ///
    /// Refused while playing. Returns whether the keyframe moved.
    pub fn drag_keyframe(&mut self, id: KeyframeId, time: f64) -> bool {
        if self.input_blocked() {
            return false;
        }
        self.store.retime(id, time.clamp(0.0, self.duration))
    }

    /// Shift the selected keyframe by `delta` seconds and re-render
    pub fn nudge_selected<V: Viewer + ?Sized>(&mut self, viewer: &mut V, delta: f64) -> bool {
        let Some(frame) = self.store.selected() else {
            return false;
        };
        let (id, timestamp) = (frame.id, frame.timestamp);

        self.store.retime(id, timestamp + delta);
        self.playback.render_current(&self.store, viewer);
        true
    }

    /// Delete the selected keyframe and re-render
    pub fn delete_selected<V: Viewer + ?Sized>(&mut self, viewer: &mut V) -> bool {
        let Some(id) = self.store.selected_id() else {
            return false;
        };

        let removed = self.store.delete(id).is_some();
        self.playback.render_current(&self.store, viewer);
        removed
    }

    /// Start or stop playback
    pub fn toggle_play(&mut self) {
        self.playback.toggle_play(&self.store);
    }

    /// Advance playback by one display tick
    pub fn tick<V: Viewer + ?Sized>(&mut self, viewer: &mut V, delta: f64) {
        self.playback.tick(&self.store, viewer, delta);
    }

    /// Move the time control
    pub fn scrub<V: Viewer + ?Sized>(&mut self, viewer: &mut V, time: f64) {
        self.playback.scrub(&self.store, viewer, time);
    }

    /// Release the time control
    pub fn end_scrub(&mut self) {
        self.playback.end_scrub();
    }

    /// Drain keyframe changes since the last call.
    ///
    /// Hosts presenting keyframe markers call this once per frame; events
    /// accumulate until drained.
    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        self.store.take_events()
    }

    /// Pointer edits are ignored during playback
    pub fn input_blocked(&self) -> bool {
        self.playback.state == PlaybackState::Playing
    }

    /// Replace every keyframe with already validated path entries
    pub fn load_path(&mut self, entries: Vec<PathEntry>) -> usize {
        let count = entries.len();
        self.store
            .replace_all(entries.into_iter().map(PathEntry::into_parts));
        count
    }

    /// Replace the path with the contents of a path file.
    ///
    /// The store is untouched unless the whole file parses.
    pub fn load_path_file(&mut self, path: &Path) -> Result<usize, PathFileError> {
        let count = self.load_path(path_file::load(path)?);
        tracing::info!("Loaded {} keyframes from {:?}", count, path);
        Ok(count)
    }

    /// Write the path to a path file
    pub fn save_path_file(&self, path: &Path) -> Result<(), PathFileError> {
        path_file::save(&self.store, path)?;
        tracing::info!("Saved {} keyframes to {:?}", self.store.len(), path);
        Ok(())
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{CameraPose, IDENTITY};
    use crate::viewer::testing::RecordingViewer;

    fn viewer_at(position: [f32; 3]) -> RecordingViewer {
        RecordingViewer {
            current: CameraPose::new(position, IDENTITY),
            applied: Vec::new(),
        }
    }

    #[test]
    fn test_add_keyframe_captures_viewer_at_current_time() {
        let mut timeline = Timeline::new();
        timeline.playback.current_time = 4.0;

        let id = timeline.add_keyframe(&viewer_at([1.0, 2.0, 3.0]));
        let frame = timeline.store().get(id).unwrap();
        assert_eq!(frame.timestamp, 4.0);
        assert_eq!(frame.position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_drag_is_clamped_and_blocked_while_playing() {
        let mut timeline = Timeline::new();
        let viewer = viewer_at([0.0; 3]);
        let a = timeline.add_keyframe(&viewer);
        timeline.playback.current_time = 5.0;
        timeline.add_keyframe(&viewer);

        assert!(timeline.drag_keyframe(a, 99.0));
        assert_eq!(timeline.store().get(a).unwrap().timestamp, DEFAULT_DURATION);
        assert_eq!(timeline.store().index_of(a), Some(1));

        timeline.toggle_play();
        assert!(timeline.input_blocked());
        assert!(!timeline.drag_keyframe(a, 1.0));
        assert_eq!(timeline.store().get(a).unwrap().timestamp, DEFAULT_DURATION);
    }

    #[test]
    fn test_nudge_keeps_render_consistent() {
        let mut timeline = Timeline::new();
        let mut viewer = viewer_at([0.0, 1.0, 0.0]);
        timeline.add_keyframe(&viewer);
        timeline.playback.current_time = 1.0;
        viewer.current.position = [10.0, 1.0, 0.0];
        let b = timeline.add_keyframe(&viewer);
        timeline.playback.current_time = 0.5;

        assert!(!timeline.nudge_selected(&mut viewer, NUDGE_STEP));

        timeline.toggle_select(b);
        assert!(timeline.nudge_selected(&mut viewer, -0.5));
        assert_eq!(timeline.store().get(b).unwrap().timestamp, 0.5);

        // Current time now sits on the nudged keyframe
        assert_eq!(viewer.applied.last().unwrap().position, [10.0, 1.0, 0.0]);
    }

    #[test]
    fn test_delete_selected() {
        let mut timeline = Timeline::new();
        let mut viewer = viewer_at([0.0; 3]);
        let a = timeline.add_keyframe(&viewer);

        assert!(!timeline.delete_selected(&mut viewer));
        timeline.toggle_select(a);
        assert!(timeline.delete_selected(&mut viewer));
        assert!(timeline.store().is_empty());
        assert!(timeline.store().selected().is_none());
    }

    #[test]
    fn test_path_file_round_trip_through_timeline() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pathfile.json");

        let mut timeline = Timeline::new();
        let mut viewer = viewer_at([1.0, 0.0, 0.0]);
        timeline.add_keyframe(&viewer);
        timeline.playback.current_time = 2.0;
        viewer.current.position = [3.0, 0.0, 0.0];
        timeline.add_keyframe(&viewer);
        timeline.save_path_file(&file).unwrap();

        let mut loaded = Timeline::new();
        assert_eq!(loaded.load_path_file(&file).unwrap(), 2);
        assert_eq!(loaded.store().span(), Some((0.0, 2.0)));
        assert_eq!(loaded.store().frames()[1].position, [3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bad_path_file_leaves_store_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.json");
        std::fs::write(&file, r#"{"timestamp": 1}"#).unwrap();

        let mut timeline = Timeline::new();
        timeline.add_keyframe(&viewer_at([0.0; 3]));

        assert!(timeline.load_path_file(&file).is_err());
        assert_eq!(timeline.store().len(), 1);
    }

    #[test]
    fn test_load_path_entries() {
        let entries = path_file::parse(
            r#"[
                {"timestamp": 2.0, "pos": {"x": 1, "y": 0, "z": 0}, "quat": [0, 0, 0, 1]},
                {"timestamp": 0.5, "pos": {"x": 0, "y": 0, "z": 0}, "quat": [0, 0, 0, 1]}
            ]"#,
        )
        .unwrap();

        let mut timeline = Timeline::new();
        assert_eq!(timeline.load_path(entries), 2);
        assert_eq!(timeline.store().span(), Some((0.5, 2.0)));
    }

    #[test]
    fn test_take_events_drains_store_changes() {
        let mut timeline = Timeline::new();
        let mut viewer = viewer_at([0.0; 3]);
        let id = timeline.add_keyframe(&viewer);
        timeline.toggle_select(id);
        timeline.delete_selected(&mut viewer);

        assert_eq!(
            timeline.take_events(),
            vec![
                StoreEvent::Inserted(id),
                StoreEvent::SelectionChanged(Some(id)),
                StoreEvent::Removed(id),
                StoreEvent::SelectionChanged(None),
            ]
        );
        assert!(timeline.take_events().is_empty());
    }
}
