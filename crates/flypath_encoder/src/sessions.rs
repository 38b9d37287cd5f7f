// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of in-flight export sessions.
//!
//! A frame index is claimed under the lock before its file is written and
//! only counted once the write succeeds, so `wait_complete` never returns
//! while a frame file is still being written.
//!
//! Sessions are reclaimed after a period without activity, not a fixed time
//! after start. Every `start` gets a new generation, so a cleanup task left
//! over from an earlier run of the same token never removes a newer one.
//! A finished session stays registered (refusing frames) until it has been
//! idle long enough for the client to download the video.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{Result, ServiceError};

/// Frames expected and received for one token
#[derive(Debug)]
struct Session {
    dir: PathBuf,
    generation: u64,
    frames: u32,
    claimed: HashSet<u32>,
    written: u32,
    finished: bool,
    last_activity: Instant,
    /// Cloned while finish is waiting or encoding; the session is not idle
    /// while any clone is alive
    busy: Arc<()>,
    notify: Arc<Notify>,
}

impl Session {
    fn is_complete(&self) -> bool {
        self.written >= self.frames
    }

    fn is_busy(&self) -> bool {
        Arc::strong_count(&self.busy) > 1
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

/// Where an accepted frame should be written
#[derive(Debug, Clone, PartialEq)]
pub enum FrameSlot {
    /// First upload of this index
    Write(PathBuf),
    /// Index already received, upload ignored
    Duplicate,
}

/// A session whose frames have all arrived.
///
/// The session counts as busy until this is dropped.
#[derive(Debug)]
pub struct Completed {
    /// Directory holding the frames
    pub dir: PathBuf,
    /// Generation of the finished session
    pub generation: u64,
    _busy: Arc<()>,
}

/// Outcome of an idle check
#[derive(Debug, Clone, PartialEq)]
pub enum Expiry {
    /// Still in use, check again after the given delay
    Pending(Duration),
    /// Removed from the registry; its directory should be deleted
    Expired(PathBuf),
    /// The token was restarted or is gone, nothing to do
    Superseded,
}

/// Sessions keyed by token
#[derive(Debug)]
pub struct SessionRegistry {
    root: PathBuf,
    sessions: Mutex<HashMap<String, Session>>,
    next_generation: AtomicU64,
}

/// Tokens name directories, so only plain names are accepted
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl SessionRegistry {
    /// Create a registry storing session directories under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sessions: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Output root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a token
    pub fn session_dir(&self, token: &str) -> PathBuf {
        self.root.join(token)
    }

    /// Register a session expecting `frames` frames and create its
    /// directory. Returns the session's generation.
    pub async fn start(&self, token: &str, frames: u32) -> Result<u64> {
        if !is_safe_component(token) {
            return Err(ServiceError::BadHeader("token"));
        }
        let dir = self.session_dir(token);
        tokio::fs::create_dir_all(&dir).await?;

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let previous = self.sessions.lock().insert(
            token.to_string(),
            Session {
                dir,
                generation,
                frames,
                claimed: HashSet::new(),
                written: 0,
                finished: false,
                last_activity: Instant::now(),
                busy: Arc::new(()),
                notify: Arc::new(Notify::new()),
            },
        );
        if previous.is_some() {
            tracing::warn!(token, "Restarted existing export session");
        }
        tracing::info!(token, frames, generation, "Export session started");
        Ok(generation)
    }

    /// Claim a frame index for writing
    pub fn claim_frame(&self, token: &str, index: u32) -> Result<FrameSlot> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(token)
            .filter(|s| !s.finished)
            .ok_or_else(|| ServiceError::UnknownSession(token.to_string()))?;
        session.touch();

        if index >= session.frames {
            return Err(ServiceError::IndexOutOfRange {
                index,
                frames: session.frames,
            });
        }
        if !session.claimed.insert(index) {
            tracing::debug!(token, index, "duplicate frame ignored");
            return Ok(FrameSlot::Duplicate);
        }
        Ok(FrameSlot::Write(session.dir.join(format!("frame_{index}.png"))))
    }

    /// Count a claimed frame as received
    pub fn frame_written(&self, token: &str, index: u32) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get_mut(token).filter(|s| !s.finished) {
            session.written += 1;
            session.touch();
            tracing::debug!(token, index, written = session.written, "frame received");
            if session.is_complete() {
                session.notify.notify_one();
            }
        }
    }

    /// Give up a claim whose write failed so the frame can be resent
    pub fn release_frame(&self, token: &str, index: u32) {
        if let Some(session) = self.sessions.lock().get_mut(token) {
            session.claimed.remove(&index);
            session.touch();
        }
    }

    /// Record activity on a session, if `generation` is still current
    pub fn touch(&self, token: &str, generation: u64) {
        if let Some(session) = self.sessions.lock().get_mut(token) {
            if session.generation == generation {
                session.touch();
            }
        }
    }

    /// Wait until every frame of `token` has been written, then mark the
    /// session finished.
    ///
    /// On timeout the session is kept so finish can be retried.
    pub async fn wait_complete(&self, token: &str, timeout: Duration) -> Result<Completed> {
        let deadline = Instant::now() + timeout;
        let mut busy = None;
        loop {
            let notify = {
                let mut sessions = self.sessions.lock();
                let session = sessions
                    .get_mut(token)
                    .filter(|s| !s.finished)
                    .ok_or_else(|| ServiceError::UnknownSession(token.to_string()))?;
                let busy = busy.get_or_insert_with(|| Arc::clone(&session.busy));

                if session.is_complete() {
                    session.finished = true;
                    session.touch();
                    return Ok(Completed {
                        dir: session.dir.clone(),
                        generation: session.generation,
                        _busy: Arc::clone(busy),
                    });
                }
                Arc::clone(&session.notify)
            };

            // notify_one stores a permit, so a frame landing between the
            // check above and this await is not missed
            if tokio::time::timeout_at(deadline, notify.notified())
                .await
                .is_err()
            {
                if let Some(session) = self.sessions.lock().get_mut(token) {
                    session.touch();
                }
                return Err(ServiceError::FinishTimeout(token.to_string()));
            }
        }
    }

    /// Remove the session if it has been idle for `idle`
    pub fn expire(&self, token: &str, generation: u64, idle: Duration) -> Expiry {
        let mut sessions = self.sessions.lock();
        let Some(session) = sessions.get(token).filter(|s| s.generation == generation) else {
            return Expiry::Superseded;
        };
        if session.is_busy() {
            return Expiry::Pending(idle);
        }
        let elapsed = session.last_activity.elapsed();
        if elapsed < idle {
            return Expiry::Pending(idle - elapsed);
        }

        let dir = session.dir.clone();
        sessions.remove(token);
        Expiry::Expired(dir)
    }

    /// Whether an unfinished session is registered
    pub fn contains(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .get(token)
            .is_some_and(|s| !s.finished)
    }
}

/// Reclaim a session and its directory once it has been idle for `idle`
pub fn schedule_cleanup(
    registry: Arc<SessionRegistry>,
    token: String,
    generation: u64,
    idle: Duration,
) {
    tokio::spawn(async move {
        let mut wait = idle;
        loop {
            tokio::time::sleep(wait).await;
            match registry.expire(&token, generation, idle) {
                Expiry::Pending(remaining) => wait = remaining,
                Expiry::Superseded => return,
                Expiry::Expired(dir) => {
                    match tokio::fs::remove_dir_all(&dir).await {
                        Ok(()) => tracing::debug!(token, "session directory removed"),
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => tracing::warn!(token, "Failed to remove {dir:?}: {e}"),
                    }
                    return;
                }
            }
        }
    });
}
