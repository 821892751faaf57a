use super::state::PipelineState;
use crate::auth::SessionProvider;
use crate::camera::FrameCapture;
use crate::error::{ClosetError, Result};
use crate::events::{ClosetEvent, EventBus, NotificationLevel};
use crate::preprocess::ImagePreprocessor;
use crate::storage::{StorageService, UploadRequest, UploadResponse};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Message shown once a garment is stored
pub const SAVED_MESSAGE: &str = "Saved!";

/// Tags for the garment about to be captured
#[derive(Debug, Clone, Default)]
pub struct CaptureRequest {
    pub category: Option<String>,
    pub season: Option<String>,
}

/// Collaborators shared between the coordinator and its run task
struct Pipeline {
    capture: Arc<AsyncMutex<FrameCapture>>,
    preprocessor: Arc<ImagePreprocessor>,
    storage: Arc<dyn StorageService>,
    session: Arc<dyn SessionProvider>,
    event_bus: Arc<EventBus>,
    state: watch::Sender<PipelineState>,
}

/// Owns the capture → process → upload state machine.
///
/// At most one run exists at a time. Each run is a task owned by the
/// coordinator; dropping the coordinator cancels it, and a cancelled run never
/// publishes its outcome.
pub struct UploadCoordinator {
    pipeline: Arc<Pipeline>,
    cancellation_token: CancellationToken,
    current_run: Mutex<Option<JoinHandle<()>>>,
}

impl UploadCoordinator {
    pub fn new(
        capture: Arc<AsyncMutex<FrameCapture>>,
        preprocessor: Arc<ImagePreprocessor>,
        storage: Arc<dyn StorageService>,
        session: Arc<dyn SessionProvider>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            pipeline: Arc::new(Pipeline {
                capture,
                preprocessor,
                storage,
                session,
                event_bus,
                state,
            }),
            cancellation_token: CancellationToken::new(),
            current_run: Mutex::new(None),
        }
    }

    /// Begin a pipeline run; refused unless the coordinator is idle
    pub fn start_capture(&self, request: CaptureRequest) -> Result<String> {
        let mut refused_in = None;
        let accepted = self.pipeline.state.send_if_modified(|state| {
            if state.is_idle() {
                *state = PipelineState::Capturing;
                true
            } else {
                refused_in = Some(state.to_string());
                false
            }
        });

        if !accepted {
            let state = refused_in.unwrap_or_default();
            debug!("Capture refused while {}", state);
            return Err(ClosetError::Busy { state });
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Pipeline run {} started", run_id);
        self.pipeline.event_bus.publish(ClosetEvent::PipelineStateChanged {
            run_id: run_id.clone(),
            state: PipelineState::Capturing,
        });

        let run = PipelineRun {
            pipeline: Arc::clone(&self.pipeline),
            run_id: run_id.clone(),
            request,
            cancellation_token: self.cancellation_token.child_token(),
        };
        *self.current_run.lock() = Some(tokio::spawn(run.execute()));

        Ok(run_id)
    }

    pub fn state(&self) -> PipelineState {
        self.pipeline.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.pipeline.state.borrow().is_busy()
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.pipeline.state.subscribe()
    }

    /// Dismiss a terminal outcome, returning to `Idle`.
    ///
    /// Returns false (and changes nothing) if no outcome is pending.
    pub fn acknowledge(&self) -> bool {
        let acknowledged = self.pipeline.state.send_if_modified(|state| {
            if state.is_terminal() {
                *state = PipelineState::Idle;
                true
            } else {
                false
            }
        });
        if acknowledged {
            debug!("Pipeline outcome acknowledged");
        }
        acknowledged
    }

    /// Wait until the current run reaches `Succeeded` or `Failed`.
    ///
    /// Returns `Idle` straight away when no run is pending.
    pub async fn wait_for_terminal(&self) -> Result<PipelineState> {
        let mut receiver = self.pipeline.state.subscribe();
        let state = receiver
            .wait_for(|state| state.is_terminal() || state.is_idle())
            .await
            .map_err(|_| ClosetError::System {
                message: "Pipeline state channel closed".to_string(),
            })?
            .clone();
        Ok(state)
    }
}

impl Drop for UploadCoordinator {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
        if let Some(handle) = self.current_run.lock().take() {
            if !handle.is_finished() {
                debug!("Coordinator discarded with a run in flight");
            }
        }
    }
}

struct PipelineRun {
    pipeline: Arc<Pipeline>,
    run_id: String,
    request: CaptureRequest,
    cancellation_token: CancellationToken,
}

impl PipelineRun {
    async fn execute(self) {
        let started = Instant::now();
        let outcome = self.run_stages().await;

        if self.cancellation_token.is_cancelled() {
            info!(
                "Pipeline run {} discarded after {:?}; outcome not published",
                self.run_id,
                started.elapsed()
            );
            return;
        }

        match outcome {
            Ok(Some(response)) => {
                info!(
                    "Pipeline run {} succeeded in {:?} ({})",
                    self.run_id,
                    started.elapsed(),
                    response.url.as_deref().unwrap_or("no url")
                );
                self.transition(PipelineState::Succeeded);
                self.notify(NotificationLevel::Info, SAVED_MESSAGE);
            }
            Ok(None) => {}
            Err(e) => {
                error!("Pipeline run {} failed: {}", self.run_id, e);
                self.transition(PipelineState::Failed(e.failure_reason()));
                self.notify(NotificationLevel::Error, e.user_message());
            }
        }
    }

    /// Run every stage in order; `None` means the run was cancelled
    async fn run_stages(&self) -> Result<Option<UploadResponse>> {
        let frame = {
            let mut capture = self.pipeline.capture.lock().await;
            capture.capture().await?
        };
        debug!(
            "Run {} captured frame {} ({}x{}, {} degrees)",
            self.run_id,
            frame.id,
            frame.width,
            frame.height,
            frame.rotation.degrees()
        );

        if !self.advance(PipelineState::Processing) {
            return Ok(None);
        }
        let processed = self.pipeline.preprocessor.process(frame).await?;

        if !self.advance(PipelineState::Uploading) {
            return Ok(None);
        }
        let request = UploadRequest::new(
            self.pipeline.session.upload_user_id(),
            processed.encoded.base64,
        )
        .with_category(self.request.category.clone())
        .with_season(self.request.season.clone());

        let response = self.pipeline.storage.upload(&request).await?;
        Ok(Some(response))
    }

    /// Move to the next stage unless the run has been cancelled
    fn advance(&self, next: PipelineState) -> bool {
        if self.cancellation_token.is_cancelled() {
            warn!("Pipeline run {} cancelled before {}", self.run_id, next);
            return false;
        }
        self.transition(next);
        true
    }

    fn transition(&self, next: PipelineState) {
        debug!("Pipeline run {} -> {}", self.run_id, next);
        self.pipeline.state.send_replace(next.clone());
        self.pipeline.event_bus.publish(ClosetEvent::PipelineStateChanged {
            run_id: self.run_id.clone(),
            state: next,
        });
    }

    fn notify<S: Into<String>>(&self, level: NotificationLevel, message: S) {
        self.pipeline
            .event_bus
            .publish(ClosetEvent::notification(level, message));
    }
}
