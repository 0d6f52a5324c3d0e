//! Camera session lifecycle — acquisition with facing-mode fallback,
//! idempotent teardown, facing switch.

use presense_hw::{CameraError, CameraProvider, CameraStream, Facing, FacingRequest, RawFrame};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// All three acquisition fallback steps failed. Recoverable: the
    /// user may retry.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(#[source] CameraError),
    #[error("no active camera session")]
    NotActive,
    #[error("capture failed: {0}")]
    Capture(#[from] CameraError),
}

/// Owns the single attached camera stream (the shared video sink).
///
/// Every path that attaches a new stream stops whatever is currently
/// attached first, tolerating the case where nothing is.
pub struct CameraSession {
    provider: Arc<dyn CameraProvider>,
    stream: Option<Box<dyn CameraStream>>,
    facing: Facing,
}

impl CameraSession {
    pub fn new(provider: Arc<dyn CameraProvider>, initial_facing: Facing) -> Self {
        Self {
            provider,
            stream: None,
            facing: initial_facing,
        }
    }

    /// Acquire a stream for the requested facing mode.
    ///
    /// Fallback chain: exact match, then ideal match, then any device;
    /// each step runs only when the previous one failed. Returns the
    /// resolved facing mode, which may differ from the request.
    pub fn start(&mut self, facing: Facing) -> Result<Facing, SessionError> {
        self.stop();

        let stream = self
            .provider
            .acquire(FacingRequest::Exact(facing))
            .or_else(|e| {
                tracing::debug!(facing = %facing, error = %e, "exact acquisition failed; trying ideal");
                self.provider.acquire(FacingRequest::Ideal(facing))
            })
            .or_else(|e| {
                tracing::debug!(facing = %facing, error = %e, "ideal acquisition failed; trying any device");
                self.provider.acquire(FacingRequest::Any)
            })
            .map_err(SessionError::CameraUnavailable)?;

        let resolved = stream.facing().unwrap_or(facing);
        tracing::info!(requested = %facing, resolved = %resolved, "camera session started");
        self.facing = resolved;
        self.stream = Some(stream);
        Ok(resolved)
    }

    /// Stop all tracks and detach the stream. Safe when none exists.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::info!("camera session stopped");
        }
    }

    /// Toggle the facing mode and re-acquire. The fallback chain in
    /// [`start`](Self::start) means a failed switch degrades to any
    /// available camera rather than leaving no feed.
    pub fn switch_facing(&mut self) -> Result<Facing, SessionError> {
        self.start(self.facing.toggled())
    }

    /// Grab the current frame from the attached stream.
    pub fn grab(&mut self) -> Result<RawFrame, SessionError> {
        match self.stream.as_mut() {
            Some(stream) => Ok(stream.grab()?),
            None => Err(SessionError::NotActive),
        }
    }

    pub fn active(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_live())
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stop();
    }
}
