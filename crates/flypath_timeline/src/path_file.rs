// SPDX-License-Identifier: MIT OR Apache-2.0
//! Path file load/save.
//!
//! A path file is a JSON array of keyframes:
//!
//! ```json
//! [{ "timestamp": 0.0, "pos": { "x": 0, "y": 1, "z": 2 }, "quat": [0, 0, 0, 1] }]
//! ```
//!
//! Entries need not be sorted; the store orders them on ingest.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame::{normalize, Quat, Vec3};
use crate::store::KeyframeStore;

/// Path file errors
#[derive(Debug, Error)]
pub enum PathFileError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Not parseable JSON or wrong entry shape
    #[error("Invalid path file: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level value is not an array
    #[error("Invalid path file: expected a JSON array of keyframes")]
    NotAnArray,

    /// An entry has unusable values
    #[error("Invalid keyframe {index}: {reason}")]
    InvalidEntry {
        /// Position of the entry in the file
        index: usize,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Result type for path file operations
pub type Result<T> = std::result::Result<T, PathFileError>;

/// Position as stored in a path file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPosition {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
    /// Z coordinate
    pub z: f32,
}

/// One keyframe as stored in a path file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEntry {
    /// Time in seconds
    pub timestamp: f64,
    /// Camera position
    pub pos: PathPosition,
    /// Camera orientation (x, y, z, w)
    pub quat: Quat,
}

impl PathEntry {
    /// Split into store insert arguments
    pub fn into_parts(self) -> (f64, Vec3, Quat) {
        (self.timestamp, [self.pos.x, self.pos.y, self.pos.z], self.quat)
    }

    fn validate(mut self, index: usize) -> Result<Self> {
        if !self.timestamp.is_finite() {
            return Err(PathFileError::InvalidEntry {
                index,
                reason: "timestamp is not a finite number",
            });
        }
        if ![self.pos.x, self.pos.y, self.pos.z].iter().all(|c| c.is_finite()) {
            return Err(PathFileError::InvalidEntry {
                index,
                reason: "position is not finite",
            });
        }
        self.quat = normalize(self.quat).ok_or(PathFileError::InvalidEntry {
            index,
            reason: "quaternion has zero length",
        })?;
        Ok(self)
    }
}

/// Parse path file contents. Nothing is returned unless every entry is valid.
pub fn parse(text: &str) -> Result<Vec<PathEntry>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_array() {
        return Err(PathFileError::NotAnArray);
    }

    let entries: Vec<PathEntry> = serde_json::from_value(value)?;
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| entry.validate(index))
        .collect()
}

/// Serialize the store's keyframes in timestamp order
pub fn to_string(store: &KeyframeStore) -> Result<String> {
    let entries: Vec<PathEntry> = store
        .frames()
        .iter()
        .map(|f| PathEntry {
            timestamp: f.timestamp,
            pos: PathPosition {
                x: f.position[0],
                y: f.position[1],
                z: f.position[2],
            },
            quat: f.orientation,
        })
        .collect();

    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Read and parse a path file
pub fn load(path: &Path) -> Result<Vec<PathEntry>> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Write the store to a path file
pub fn save(store: &KeyframeStore, path: &Path) -> Result<()> {
    std::fs::write(path, to_string(store)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unsorted_entries() {
        let text = r#"[
            { "timestamp": 3.0, "pos": { "x": 3, "y": 0, "z": 0 }, "quat": [0, 0, 0, 1] },
            { "timestamp": 1.0, "pos": { "x": 1, "y": 0, "z": 0 }, "quat": [0, 0, 0, 1] }
        ]"#;
        let entries = parse(text).unwrap();
        assert_eq!(entries.len(), 2);

        let mut store = KeyframeStore::new();
        store.replace_all(entries.into_iter().map(PathEntry::into_parts));
        assert_eq!(store.span(), Some((1.0, 3.0)));
        assert_eq!(store.frames()[0].position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_quaternion_is_normalized() {
        let text = r#"[{ "timestamp": 0, "pos": { "x": 0, "y": 0, "z": 0 }, "quat": [0, 0, 0, 4] }]"#;
        assert_eq!(parse(text).unwrap()[0].quat, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(matches!(parse(r#"{"frames": []}"#), Err(PathFileError::NotAnArray)));
        assert!(matches!(parse("42"), Err(PathFileError::NotAnArray)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(parse("[{"), Err(PathFileError::Json(_))));
        assert!(matches!(parse(r#"[{"timestamp": 1}]"#), Err(PathFileError::Json(_))));
    }

    #[test]
    fn test_rejects_zero_quaternion() {
        let text = r#"[
            { "timestamp": 0, "pos": { "x": 0, "y": 0, "z": 0 }, "quat": [0, 0, 0, 1] },
            { "timestamp": 1, "pos": { "x": 0, "y": 0, "z": 0 }, "quat": [0, 0, 0, 0] }
        ]"#;
        assert!(matches!(
            parse(text),
            Err(PathFileError::InvalidEntry { index: 1, .. })
        ));
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(parse("[]").unwrap().is_empty());
    }

    #[test]
    fn test_saved_layout() {
        let mut store = KeyframeStore::new();
        store.insert(0.5, [1.0, 2.0, 3.0], [0.0, 0.0, 0.0, 1.0]);

        let value: serde_json::Value = serde_json::from_str(&to_string(&store).unwrap()).unwrap();
        assert_eq!(value[0]["timestamp"], 0.5);
        assert_eq!(value[0]["pos"]["y"], 2.0);
        assert_eq!(value[0]["quat"][3], 1.0);
    }
}
