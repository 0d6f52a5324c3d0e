//! presense-hw — Hardware abstraction for camera capture.
//!
//! Provides V4L2-based camera access, YUYV→RGB frame conversion, and
//! the facing-mode acquisition traits the session layer builds on.

pub mod camera;
pub mod frame;
pub mod provider;

pub use camera::{Camera, CameraError, DeviceInfo};
pub use frame::RawFrame;
pub use provider::{
    CameraProvider, CameraStream, DeviceMap, Facing, FacingRequest, V4lProvider,
};
