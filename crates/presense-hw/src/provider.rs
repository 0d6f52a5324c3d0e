//! Camera acquisition seams — facing modes, the provider/stream traits,
//! and the V4L2-backed implementation.
//!
//! The session layer above talks only to [`CameraProvider`] and
//! [`CameraStream`], so a headless target or a test can substitute a
//! fake camera without touching the acquisition logic.

use crate::camera::{Camera, CameraError, DeviceInfo};
use crate::frame::RawFrame;
use serde::{Deserialize, Serialize};

/// Which physical camera is requested: front ("user"-facing) or back
/// ("environment"-facing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Front,
    Back,
}

impl Facing {
    /// The other facing mode.
    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
        }
    }
}

/// One step of the acquisition fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingRequest {
    /// Only the device backing this facing mode is acceptable.
    Exact(Facing),
    /// Prefer this facing mode, but accept another device.
    Ideal(Facing),
    /// Any available video capture device.
    Any,
}

/// An acquired camera stream. Owns the underlying device handle until
/// [`stop`](CameraStream::stop) releases it.
pub trait CameraStream: Send {
    /// The facing mode this stream resolved to, when known.
    fn facing(&self) -> Option<Facing>;
    /// Grab the current frame. Fails once the stream is stopped or
    /// while the device is still negotiating.
    fn grab(&mut self) -> Result<RawFrame, CameraError>;
    /// Stop all tracks and release the device handle. Idempotent.
    fn stop(&mut self);
    /// Whether the stream still holds a live device handle.
    fn is_live(&self) -> bool;
}

/// Acquires camera streams for facing-mode requests.
pub trait CameraProvider: Send + Sync {
    fn acquire(&self, request: FacingRequest) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// Facing-mode to device-path mapping for the V4L2 provider.
///
/// Unmapped facing modes can still be served through the `Ideal` and
/// `Any` fallback steps, which scan `/dev/video*`.
#[derive(Debug, Clone, Default)]
pub struct DeviceMap {
    pub front: Option<String>,
    pub back: Option<String>,
}

impl DeviceMap {
    fn path_for(&self, facing: Facing) -> Option<&str> {
        match facing {
            Facing::Front => self.front.as_deref(),
            Facing::Back => self.back.as_deref(),
        }
    }
}

/// V4L2-backed provider resolving facing requests against a [`DeviceMap`].
pub struct V4lProvider {
    map: DeviceMap,
}

impl V4lProvider {
    pub fn new(map: DeviceMap) -> Self {
        Self { map }
    }

    fn open_stream(path: &str, facing: Option<Facing>) -> Result<Box<dyn CameraStream>, CameraError> {
        let camera = Camera::open(path)?;
        Ok(Box::new(V4lStream {
            camera: Some(camera),
            facing,
        }))
    }

    fn open_any(&self) -> Result<Box<dyn CameraStream>, CameraError> {
        for info in Camera::list_devices() {
            // A scanned device that happens to be mapped still resolves
            // its facing mode.
            let facing = if Some(info.path.as_str()) == self.map.front.as_deref() {
                Some(Facing::Front)
            } else if Some(info.path.as_str()) == self.map.back.as_deref() {
                Some(Facing::Back)
            } else {
                None
            };
            match Self::open_stream(&info.path, facing) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    tracing::debug!(device = %info.path, error = %e, "device skipped during scan");
                }
            }
        }
        Err(CameraError::NoMatchingDevice)
    }
}

impl CameraProvider for V4lProvider {
    fn acquire(&self, request: FacingRequest) -> Result<Box<dyn CameraStream>, CameraError> {
        match request {
            FacingRequest::Exact(facing) => {
                let path = self
                    .map
                    .path_for(facing)
                    .ok_or(CameraError::NoMatchingDevice)?;
                Self::open_stream(path, Some(facing))
            }
            FacingRequest::Ideal(facing) => match self.map.path_for(facing) {
                Some(path) => {
                    Self::open_stream(path, Some(facing)).or_else(|_| self.open_any())
                }
                None => self.open_any(),
            },
            FacingRequest::Any => self.open_any(),
        }
    }
}

struct V4lStream {
    camera: Option<Camera>,
    facing: Option<Facing>,
}

impl CameraStream for V4lStream {
    fn facing(&self) -> Option<Facing> {
        self.facing
    }

    fn grab(&mut self) -> Result<RawFrame, CameraError> {
        match self.camera.as_ref() {
            Some(camera) => camera.capture_frame(),
            None => Err(CameraError::StreamStopped),
        }
    }

    fn stop(&mut self) {
        if let Some(camera) = self.camera.take() {
            tracing::debug!(device = %camera.device_path, "camera stream stopped");
            // Dropping the handle releases the device.
            drop(camera);
        }
    }

    fn is_live(&self) -> bool {
        self.camera.is_some()
    }
}

/// Re-export for diagnostics listings.
pub fn list_capture_devices() -> Vec<DeviceInfo> {
    Camera::list_devices()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_toggled() {
        assert_eq!(Facing::Front.toggled(), Facing::Back);
        assert_eq!(Facing::Back.toggled(), Facing::Front);
    }

    #[test]
    fn test_facing_serde_lowercase() {
        let facing: Facing = serde_json::from_str("\"front\"").unwrap();
        assert_eq!(facing, Facing::Front);
        assert_eq!(serde_json::to_string(&Facing::Back).unwrap(), "\"back\"");
    }

    #[test]
    fn test_device_map_lookup() {
        let map = DeviceMap {
            front: Some("/dev/video0".into()),
            back: None,
        };
        assert_eq!(map.path_for(Facing::Front), Some("/dev/video0"));
        assert_eq!(map.path_for(Facing::Back), None);
    }

    #[test]
    fn test_exact_unmapped_facing_is_no_match() {
        let provider = V4lProvider::new(DeviceMap::default());
        let result = provider.acquire(FacingRequest::Exact(Facing::Back));
        assert!(matches!(result, Err(CameraError::NoMatchingDevice)));
    }
}
