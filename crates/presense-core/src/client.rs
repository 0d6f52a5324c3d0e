//! The attendance client — camera controls, single-shot verify, and the
//! live verification loop, wired behind the actions the embedding
//! surface exposes. The surface itself only observes the status and
//! presentation feeds.

use crate::api::ApiClient;
use crate::capture::FrameEncoder;
use crate::live::LiveSession;
use crate::outcome::VerificationOutcome;
use crate::presentation::{
    FullscreenSurface, PresentationController, PresentationMode, TransitionStrategy,
};
use crate::session::CameraSession;
use crate::status::{Status, StatusModel};
use presense_hw::{CameraProvider, Facing};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy)]
pub struct ClientOptions {
    pub initial_facing: Facing,
    pub jpeg_quality: u8,
    pub strategy: TransitionStrategy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            initial_facing: Facing::Front,
            jpeg_quality: 85,
            strategy: TransitionStrategy::Overlay,
        }
    }
}

/// The session and its encoder share one lock: they are the only shared
/// mutable resources, and every path that attaches a stream goes
/// through here.
struct CaptureStage {
    session: CameraSession,
    encoder: FrameEncoder,
}

pub struct AttendanceClient {
    capture: Arc<Mutex<CaptureStage>>,
    api: ApiClient,
    presentation: Arc<PresentationController>,
    status: StatusModel,
    live: LiveSession,
}

impl AttendanceClient {
    pub fn new(
        provider: Arc<dyn CameraProvider>,
        api: ApiClient,
        surface: Option<Arc<dyn FullscreenSurface>>,
        options: ClientOptions,
    ) -> Self {
        let (status, _) = StatusModel::new();
        Self {
            capture: Arc::new(Mutex::new(CaptureStage {
                session: CameraSession::new(provider, options.initial_facing),
                encoder: FrameEncoder::new(options.jpeg_quality),
            })),
            api,
            presentation: Arc::new(PresentationController::new(options.strategy, surface)),
            status,
            live: LiveSession::new(),
        }
    }

    pub fn status(&self) -> Status {
        self.status.current()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Status> {
        self.status.subscribe()
    }

    pub fn presentation_mode(&self) -> PresentationMode {
        self.presentation.mode()
    }

    pub fn subscribe_presentation(&self) -> watch::Receiver<PresentationMode> {
        self.presentation.subscribe()
    }

    pub fn camera_active(&self) -> bool {
        self.stage().session.active()
    }

    pub fn facing(&self) -> Facing {
        self.stage().session.facing()
    }

    pub fn live_running(&self) -> bool {
        self.live.running()
    }

    /// Start (or restart) the camera at the current facing mode.
    pub fn start_camera(&self) -> bool {
        let mut stage = self.stage();
        let facing = stage.session.facing();
        let result = stage.session.start(facing);
        drop(stage);
        self.report_start(result)
    }

    /// Stop the camera and release the device handle.
    pub fn stop_camera(&self) {
        self.stage().session.stop();
        self.status.set("Camera stopped", false);
    }

    /// Toggle between the front and back camera.
    pub fn switch_camera(&self) -> bool {
        self.status.set("Switching camera...", self.status.current().ok);
        let mut stage = self.stage();
        let result = stage.session.switch_facing();
        drop(stage);
        self.report_start(result)
    }

    /// Single-shot capture-and-verify against the match endpoint.
    ///
    /// Deliberately unguarded against overlap: a second call while a
    /// previous upload is still in flight proceeds, and the
    /// later-resolving response wins in the status model.
    pub async fn verify(&self) -> VerificationOutcome {
        if !self.ensure_camera() {
            return VerificationOutcome::failure(self.status.current().message);
        }
        self.presentation.enter().await;

        let jpeg = {
            let mut stage = self.stage();
            let frame = match stage.session.grab() {
                Ok(frame) => frame,
                Err(e) => return self.fail(e.to_string()),
            };
            match stage.encoder.encode_mirrored(&frame) {
                Ok(jpeg) => jpeg,
                Err(e) => return self.fail(e.to_string()),
            }
        };

        self.status.set("Verifying...", false);
        let outcome = self.api.submit_match(jpeg).await;
        self.status.set(outcome.message.clone(), outcome.success);
        outcome
    }

    /// Start the recurring live verification loop.
    ///
    /// Ensures the camera and fullscreen first; the timer itself is
    /// registered only when no handle exists (a second call is a
    /// silent no-op past that point).
    pub async fn start_live(&mut self) {
        if !self.ensure_camera() {
            return;
        }
        self.presentation.enter().await;

        let capture = self.capture.clone();
        let api = self.api.clone();
        let status = self.status.clone();
        let registered = self.live.start(move || {
            live_tick(capture.clone(), api.clone(), status.clone())
        });
        if registered {
            self.status.set("Live verification started", true);
        }
    }

    /// Cancel the live loop, release the camera, and leave fullscreen.
    ///
    /// The only path guaranteed to fully release camera hardware while
    /// live mode was active. Idempotent. Work already in flight from a
    /// tick that fired just before cancellation is not aborted and may
    /// still update the status afterwards.
    pub async fn stop_live(&mut self) {
        self.live.stop();
        self.stage().session.stop();
        self.presentation.exit().await;
        self.status.set("Live verification stopped", false);
    }

    fn stage(&self) -> MutexGuard<'_, CaptureStage> {
        match self.capture.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn ensure_camera(&self) -> bool {
        let mut stage = self.stage();
        if stage.session.active() {
            return true;
        }
        let facing = stage.session.facing();
        let result = stage.session.start(facing);
        drop(stage);
        self.report_start(result)
    }

    fn report_start(&self, result: Result<Facing, crate::session::SessionError>) -> bool {
        match result {
            Ok(resolved) => {
                tracing::info!(facing = %resolved, "camera running");
                self.status.set("Camera started", true);
                true
            }
            Err(e) => {
                self.status.set(format!("Failed to start camera: {e}"), false);
                false
            }
        }
    }

    fn fail(&self, message: String) -> VerificationOutcome {
        let outcome = VerificationOutcome::failure(message);
        self.status.set(outcome.message.clone(), false);
        outcome
    }
}

impl Drop for AttendanceClient {
    fn drop(&mut self) {
        // Teardown safety net: cancel the schedule and release the
        // camera even when live mode was never explicitly stopped.
        self.live.stop();
        self.stage().session.stop();
    }
}

/// One live tick: capture, encode, upload, fold the outcome into the
/// status model. A frame that is not yet available skips the tick
/// quietly; transport and parse failures surface as failure outcomes.
async fn live_tick(capture: Arc<Mutex<CaptureStage>>, api: ApiClient, status: StatusModel) {
    let jpeg = {
        let mut stage = match capture.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let frame = match stage.session.grab() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "live tick skipped: no frame");
                return;
            }
        };
        match stage.encoder.encode_mirrored(&frame) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                tracing::debug!(error = %e, "live tick skipped: encode failed");
                return;
            }
        }
    };

    let outcome = api.submit_stream(jpeg).await;
    status.set(outcome.message.clone(), outcome.success);
}
