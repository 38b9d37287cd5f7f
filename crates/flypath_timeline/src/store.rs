// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ordered keyframe storage.
//!
//! The store is the only owner of [`Frame`] records. Every mutation leaves
//! the frames sorted ascending by timestamp before returning, so readers
//! (bracket lookup, playback, export) can rely on ordering.
//!
//! Presentation layers do not hang off the frames themselves. Instead they
//! drain [`StoreEvent`]s with [`KeyframeStore::take_events`] and update
//! their own markers. Events accumulate until drained, so hosts should
//! drain them once per frame.

use crate::frame::{Frame, KeyframeId, Quat, Vec3};

/// A mutation observed on the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// A keyframe was inserted
    Inserted(KeyframeId),
    /// A keyframe's timestamp changed
    Retimed(KeyframeId),
    /// A keyframe was deleted
    Removed(KeyframeId),
    /// Every keyframe was dropped by a bulk replace
    Cleared,
    /// The selection changed
    SelectionChanged(Option<KeyframeId>),
}

/// Timestamp-ordered collection of keyframes with a single selection
#[derive(Debug, Clone, Default)]
pub struct KeyframeStore {
    frames: Vec<Frame>,
    selected: Option<KeyframeId>,
    pending_events: Vec<StoreEvent>,
}

impl KeyframeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyframe before the first entry whose timestamp is not
    /// smaller, so a new frame lands ahead of existing equal timestamps.
    pub fn insert(&mut self, timestamp: f64, position: Vec3, orientation: Quat) -> KeyframeId {
        let frame = Frame::new(timestamp, position, orientation);
        let id = frame.id;

        let idx = self
            .frames
            .iter()
            .position(|f| f.timestamp >= timestamp)
            .unwrap_or(self.frames.len());
        self.frames.insert(idx, frame);

        tracing::trace!(?id, timestamp, idx, "inserted keyframe");
        self.pending_events.push(StoreEvent::Inserted(id));
        id
    }

    /// Move a keyframe to a new time, then re-sort the whole collection.
    ///
    /// Returns `false` if the keyframe is not in the store.
    pub fn retime(&mut self, id: KeyframeId, timestamp: f64) -> bool {
        let Some(frame) = self.frames.iter_mut().find(|f| f.id == id) else {
            return false;
        };
        frame.timestamp = timestamp;
        self.sort_frames();

        self.pending_events.push(StoreEvent::Retimed(id));
        true
    }

    /// Remove a keyframe, clearing the selection if it pointed at it.
    ///
    /// Returns the removed frame, `None` if it was not present.
    pub fn delete(&mut self, id: KeyframeId) -> Option<Frame> {
        let idx = self.frames.iter().position(|f| f.id == id)?;
        let frame = self.frames.remove(idx);

        self.pending_events.push(StoreEvent::Removed(id));
        if self.selected == Some(id) {
            self.set_selection(None);
        }
        Some(frame)
    }

    /// Drop every keyframe, then insert the given entries in order.
    pub fn replace_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (f64, Vec3, Quat)>,
    {
        self.frames.clear();
        self.pending_events.push(StoreEvent::Cleared);
        if self.selected.is_some() {
            self.set_selection(None);
        }

        for (timestamp, position, orientation) in entries {
            self.insert(timestamp, position, orientation);
        }
        self.sort_frames();

        tracing::debug!(count = self.frames.len(), "replaced all keyframes");
    }

    /// Stable sort by timestamp
    fn sort_frames(&mut self) {
        self.frames.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }

    /// All keyframes in timestamp order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Get keyframe by ID
    pub fn get(&self, id: KeyframeId) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == id)
    }

    /// Index of a keyframe in timestamp order
    pub fn index_of(&self, id: KeyframeId) -> Option<usize> {
        self.frames.iter().position(|f| f.id == id)
    }

    /// Earliest keyframe
    pub fn first(&self) -> Option<&Frame> {
        self.frames.first()
    }

    /// Latest keyframe
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// First and last timestamps
    pub fn span(&self) -> Option<(f64, f64)> {
        Some((self.first()?.timestamp, self.last()?.timestamp))
    }

    /// Get keyframe count
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the store has no keyframes
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Currently selected keyframe, if it still exists
    pub fn selected(&self) -> Option<&Frame> {
        self.selected.and_then(|id| self.get(id))
    }

    /// ID of the selected keyframe
    pub fn selected_id(&self) -> Option<KeyframeId> {
        self.selected
    }

    /// Select a keyframe. Unknown IDs leave the selection unchanged.
    pub fn select(&mut self, id: KeyframeId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if self.selected != Some(id) {
            self.set_selection(Some(id));
        }
        true
    }

    /// Clear the selection
    pub fn deselect(&mut self) {
        if self.selected.is_some() {
            self.set_selection(None);
        }
    }

    /// Select the keyframe, or deselect it if it is already selected
    pub fn toggle_selection(&mut self, id: KeyframeId) {
        if self.selected == Some(id) {
            self.deselect();
        } else {
            self.select(id);
        }
    }

    fn set_selection(&mut self, selected: Option<KeyframeId>) {
        self.selected = selected;
        self.pending_events.push(StoreEvent::SelectionChanged(selected));
    }

    /// Get pending mutation events and clear them
    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
