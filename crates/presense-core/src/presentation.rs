//! Fullscreen presentation transitions.
//!
//! Two strategies exist for the same `Normal → Transitioning →
//! Fullscreen` state machine: an overlay that changes layout only, and
//! a platform request through the optional [`FullscreenSurface`]
//! capability. The controller only gates presentation; it never blocks
//! capture or verification, and a denied platform request is logged and
//! ignored rather than surfaced.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const OVERLAY_ENTER: Duration = Duration::from_millis(300);
const OVERLAY_EXIT: Duration = Duration::from_millis(200);
/// Pre-delay before the platform request, letting layout settle.
const PLATFORM_PRE_DELAY: Duration = Duration::from_millis(50);
/// The transition flag clears after this long regardless of whether the
/// platform granted the request.
const PLATFORM_SETTLE: Duration = Duration::from_millis(500);
const OOB_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    Normal,
    Transitioning,
    Fullscreen,
}

/// The platform refused or cannot perform a fullscreen change.
#[derive(Debug, thiserror::Error)]
#[error("fullscreen request denied: {0}")]
pub struct SurfaceDenied(pub String);

/// Optional platform fullscreen capability. A headless target simply
/// provides none and runs the overlay strategy.
pub trait FullscreenSurface: Send + Sync {
    fn request_fullscreen(&self) -> Result<(), SurfaceDenied>;
    fn exit_fullscreen(&self) -> Result<(), SurfaceDenied>;
    /// Current OS-level state, polled to catch out-of-band exits.
    fn is_fullscreen(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionStrategy {
    /// Layout-only pseudo-fullscreen with fixed delays.
    Overlay,
    /// OS fullscreen request with settle delay and out-of-band exit
    /// detection.
    Platform,
}

pub struct PresentationController {
    mode: Arc<watch::Sender<PresentationMode>>,
    strategy: TransitionStrategy,
    surface: Option<Arc<dyn FullscreenSurface>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl PresentationController {
    pub fn new(strategy: TransitionStrategy, surface: Option<Arc<dyn FullscreenSurface>>) -> Self {
        let (tx, _) = watch::channel(PresentationMode::Normal);
        Self {
            mode: Arc::new(tx),
            strategy,
            surface,
            watcher: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> PresentationMode {
        *self.mode.borrow()
    }

    /// Observer feed for the external renderer.
    pub fn subscribe(&self) -> watch::Receiver<PresentationMode> {
        self.mode.subscribe()
    }

    /// Transition to fullscreen. Returns false when already fullscreen
    /// or while another transition is in flight (transitions are
    /// monotonic, never reentrant).
    pub async fn enter(&self) -> bool {
        if !self.begin(PresentationMode::Fullscreen) {
            return false;
        }

        match self.strategy {
            TransitionStrategy::Overlay => {
                tokio::time::sleep(OVERLAY_ENTER).await;
            }
            TransitionStrategy::Platform => {
                tokio::time::sleep(PLATFORM_PRE_DELAY).await;
                if let Some(surface) = &self.surface {
                    if let Err(e) = surface.request_fullscreen() {
                        tracing::debug!(error = %e, "platform fullscreen denied; continuing");
                    }
                }
                tokio::time::sleep(PLATFORM_SETTLE).await;
            }
        }

        self.mode.send_replace(PresentationMode::Fullscreen);
        tracing::debug!(strategy = ?self.strategy, "entered fullscreen");
        if self.strategy == TransitionStrategy::Platform {
            self.spawn_watcher();
        }
        true
    }

    /// Transition back to normal. Returns false when already normal or
    /// mid-transition.
    pub async fn exit(&self) -> bool {
        self.abort_watcher();
        if !self.begin(PresentationMode::Normal) {
            return false;
        }

        match self.strategy {
            TransitionStrategy::Overlay => {
                tokio::time::sleep(OVERLAY_EXIT).await;
            }
            TransitionStrategy::Platform => {
                tokio::time::sleep(PLATFORM_PRE_DELAY).await;
                if let Some(surface) = &self.surface {
                    if let Err(e) = surface.exit_fullscreen() {
                        tracing::debug!(error = %e, "platform fullscreen exit denied; continuing");
                    }
                }
                tokio::time::sleep(PLATFORM_SETTLE).await;
            }
        }

        self.mode.send_replace(PresentationMode::Normal);
        tracing::debug!(strategy = ?self.strategy, "exited fullscreen");
        true
    }

    /// Atomically claim the transition. Refuses while transitioning and
    /// when the target mode is already current.
    fn begin(&self, target: PresentationMode) -> bool {
        self.mode.send_if_modified(|mode| {
            if *mode == PresentationMode::Transitioning || *mode == target {
                false
            } else {
                *mode = PresentationMode::Transitioning;
                true
            }
        })
    }

    /// Poll the platform surface for an exit this controller never
    /// requested (hardware escape, OS gesture) and resynchronize.
    fn spawn_watcher(&self) {
        let Some(surface) = self.surface.clone() else {
            return;
        };
        let mode = self.mode.clone();
        let Ok(mut guard) = self.watcher.lock() else {
            return;
        };
        if let Some(old) = guard.take() {
            old.abort();
        }
        *guard = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(OOB_POLL);
            interval.tick().await;
            loop {
                interval.tick().await;
                if !surface.is_fullscreen() {
                    let resynced = mode.send_if_modified(|m| {
                        if *m == PresentationMode::Fullscreen {
                            *m = PresentationMode::Normal;
                            true
                        } else {
                            false
                        }
                    });
                    if resynced {
                        tracing::info!("out-of-band fullscreen exit; presentation resynchronized");
                    }
                    break;
                }
            }
        }));
    }

    fn abort_watcher(&self) {
        if let Ok(mut guard) = self.watcher.lock() {
            if let Some(watcher) = guard.take() {
                watcher.abort();
            }
        }
    }
}

impl Drop for PresentationController {
    fn drop(&mut self) {
        self.abort_watcher();
    }
}
