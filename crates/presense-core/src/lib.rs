//! presense-core — the capture/verification state machine.
//!
//! Camera session lifecycle with facing-mode fallback, the mirrored
//! frame capture/encode path, the single-shot verification pipeline,
//! the recurring live-verification loop, the fullscreen presentation
//! controller, and the status model the embedding surface observes.

pub mod api;
pub mod capture;
pub mod client;
pub mod live;
pub mod outcome;
pub mod presentation;
pub mod session;
pub mod status;

pub use api::{ApiClient, ApiError};
pub use capture::{EncodeError, FrameEncoder};
pub use client::{AttendanceClient, ClientOptions};
pub use live::{LiveSession, LIVE_INTERVAL};
pub use outcome::VerificationOutcome;
pub use presentation::{
    FullscreenSurface, PresentationController, PresentationMode, SurfaceDenied,
    TransitionStrategy,
};
pub use session::{CameraSession, SessionError};
pub use status::{Status, StatusModel};
