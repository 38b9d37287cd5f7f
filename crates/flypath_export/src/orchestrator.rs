// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export orchestration.
//!
//! Drives a fixed-rate walk over the keyframe path and the three-phase
//! session with the encoding service. Ordering guarantees:
//! - `start` completes before the first frame is rendered
//! - every frame upload has completed before `finish` is issued
//!
//! Uploads are spawned as they are produced and may complete in any order;
//! the service buffers by index.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use flypath_timeline::{pose, KeyframeStore};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::error::{ExportError, Result};
use crate::render::{encode_png, RenderViewer};
use crate::scheduler::FrameScheduler;
use crate::session::{frame_count, ExportPhase, ExportSession};
use crate::settings::ExportSettings;
use crate::transport::{EncoderTransport, HttpTransport};

/// Snapshot of a running export
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExportStatus {
    /// Current phase
    pub phase: ExportPhase,
    /// Frames rendered and handed to the uploader
    pub frames_sent: u32,
    /// Total frames in this export
    pub frame_count: u32,
}

impl ExportStatus {
    /// Fraction of frames sent, 0 to 1
    pub fn progress(&self) -> f32 {
        if self.frame_count == 0 {
            return 0.0;
        }
        self.frames_sent as f32 / self.frame_count as f32
    }
}

/// Result of a completed export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    /// Session token used for the run
    pub token: String,
    /// Frames sent
    pub frame_count: u32,
    /// Location the service reported for the video
    pub url: String,
    /// Where the video was saved
    pub output_path: PathBuf,
    /// Size of the saved video in bytes
    pub size: usize,
}

/// Handle for cancelling a running export between frames
#[derive(Debug, Clone, Default)]
pub struct ExportCancel(Arc<AtomicBool>);

impl ExportCancel {
    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Renders a keyframe path and drives the encoding service
pub struct ExportOrchestrator<T: EncoderTransport> {
    transport: T,
    settings: ExportSettings,
    status: watch::Sender<ExportStatus>,
    cancel: ExportCancel,
}

impl<T: EncoderTransport> ExportOrchestrator<T> {
    /// Create an orchestrator
    pub fn new(transport: T, settings: ExportSettings) -> Self {
        let (status, _) = watch::channel(ExportStatus::default());
        Self {
            transport,
            settings,
            status,
            cancel: ExportCancel::default(),
        }
    }

    /// Export settings
    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Watch export progress
    pub fn subscribe(&self) -> watch::Receiver<ExportStatus> {
        self.status.subscribe()
    }

    /// Handle that cancels the export in progress
    pub fn cancel_handle(&self) -> ExportCancel {
        self.cancel.clone()
    }

    fn publish(&self, session: &ExportSession) {
        self.status.send_replace(ExportStatus {
            phase: session.phase,
            frames_sent: session.next_index,
            frame_count: session.frame_count,
        });
    }

    /// Render the path and produce a video.
    ///
    /// Returns `Ok(None)` if there is nothing to render: fewer than two
    /// keyframes, or keyframes that all share one timestamp. The viewer's
    /// output size and overlay visibility are restored afterwards whether or
    /// not the export succeeded.
    pub async fn export<V, S>(
        &self,
        store: &KeyframeStore,
        viewer: &mut V,
        scheduler: &mut S,
    ) -> Result<Option<ExportOutcome>>
    where
        V: RenderViewer + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        self.settings.validate()?;
        let Some((start, end)) = store.span().filter(|_| store.len() >= 2) else {
            tracing::debug!("Nothing to export, need at least two keyframes");
            return Ok(None);
        };
        let frames = frame_count(start, end, self.settings.fps)
            .ok_or(ExportError::PathTooLong { span: end - start })?;
        if frames == 0 {
            tracing::debug!("Nothing to export, path has zero length");
            return Ok(None);
        }
        self.cancel.reset();

        let mut session = ExportSession::new(frames);
        self.publish(&session);
        tracing::info!(
            token = %session.token,
            frames = session.frame_count,
            "Exporting path {start:.2}s..{end:.2}s"
        );

        let saved_size = viewer.output_size();
        let saved_overlays = viewer.overlays_visible();
        viewer.set_output_size(self.settings.width, self.settings.height);
        viewer.set_overlays_visible(false);

        let result = self
            .run(&mut session, store, viewer, scheduler, start, end)
            .await;

        viewer.set_output_size(saved_size.0, saved_size.1);
        viewer.set_overlays_visible(saved_overlays);

        match &result {
            Ok(outcome) => tracing::info!("Export saved to {:?}", outcome.output_path),
            Err(e) => tracing::error!(token = %session.token, "Export failed: {e}"),
        }
        result.map(Some)
    }

    async fn run<V, S>(
        &self,
        session: &mut ExportSession,
        store: &KeyframeStore,
        viewer: &mut V,
        scheduler: &mut S,
        start: f64,
        end: f64,
    ) -> Result<ExportOutcome>
    where
        V: RenderViewer + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        self.transport
            .start(&session.token, session.frame_count)
            .await
            .map_err(ExportError::Start)?;
        session.advance(ExportPhase::Started);
        self.publish(session);

        let step = self.settings.frame_step();
        let mut time = start;
        let mut uploads = JoinSet::new();

        while session.next_index < session.frame_count {
            if self.cancel.is_cancelled() {
                tracing::warn!(token = %session.token, "Export cancelled");
                uploads.abort_all();
                return Err(ExportError::Cancelled);
            }

            time += step;
            if let Some(pose) = pose(store, time.min(end)) {
                viewer.apply_pose(&pose);
            }
            viewer.render();
            scheduler.next_frame().await;
            let png = encode_png(&viewer.capture())?;

            let index = session.claim_index();
            let transport = self.transport.clone();
            let token = session.token.clone();
            uploads.spawn(async move {
                transport
                    .send_frame(&token, index, png)
                    .await
                    .map_err(|source| ExportError::FrameUpload { index, source })
            });

            session.advance(ExportPhase::Sending);
            self.publish(session);
            tracing::debug!(index, time, "frame queued");
        }

        // Dropping the set on error aborts the remaining uploads
        while let Some(joined) = uploads.join_next().await {
            joined??;
        }

        let url = self
            .transport
            .finish(&session.token)
            .await
            .map_err(ExportError::Finish)?;
        let video = self
            .transport
            .download(&url)
            .await
            .map_err(ExportError::Download)?;
        tokio::fs::write(&self.settings.output_path, &video).await?;

        session.advance(ExportPhase::Finished);
        self.publish(session);

        Ok(ExportOutcome {
            token: session.token.clone(),
            frame_count: session.frame_count,
            url,
            output_path: self.settings.output_path.clone(),
            size: video.len(),
        })
    }
}

impl ExportOrchestrator<HttpTransport> {
    /// Create an orchestrator talking HTTP to the configured service
    pub fn from_settings(settings: ExportSettings) -> Self {
        Self::new(HttpTransport::from_settings(&settings), settings)
    }
}
