//! Capture source manager.
//!
//! Produces one `ImageArtifact` per capture attempt from one of two
//! mutually exclusive sources:
//! - upload: a file read from disk and decoded
//! - camera: a frame grabbed from an acquired camera stream
//!
//! The camera device is released on every exit from `Active`.

pub mod artifact;
pub mod camera;

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use crate::error::CaptureError;
use artifact::{ImageArtifact, SourceTag};
use camera::{Camera, CameraDevice, CameraRequest, CameraState, CameraStream, Resolution};

/// Snapshot of the capture side, for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureStatus {
    pub source: Option<SourceTag>,
    pub camera: CameraState,
}

pub struct CaptureManager {
    source: Option<SourceTag>,
    camera: Camera,
    max_upload_bytes: u64,
}

impl CaptureManager {
    pub fn new(max_upload_bytes: u64) -> Self {
        CaptureManager {
            source: None,
            camera: Camera::new(),
            max_upload_bytes,
        }
    }

    pub fn status(&self) -> CaptureStatus {
        CaptureStatus {
            source: self.source,
            camera: self.camera.state(),
        }
    }

    pub fn source(&self) -> Option<SourceTag> {
        self.source
    }

    pub fn camera_state(&self) -> CameraState {
        self.camera.state()
    }

    pub fn holds_camera(&self) -> bool {
        self.camera.holds_device()
    }

    pub fn select_upload_source(&mut self) {
        self.camera.stop();
        self.source = Some(SourceTag::Upload);
    }

    /// Read and decode a file. On failure nothing changes.
    pub fn submit_file(&mut self, path: &Path) -> Result<ImageArtifact, CaptureError> {
        let read_error = |e: std::io::Error| CaptureError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let size = fs::metadata(path).map_err(read_error)?.len();
        if size > self.max_upload_bytes {
            return Err(CaptureError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_upload_bytes,
            });
        }

        let bytes = fs::read(path).map_err(read_error)?;
        self.submit_bytes(path, bytes)
    }

    /// Decode already-loaded file contents. `name` labels errors.
    pub fn submit_bytes(&mut self, name: &Path, bytes: Vec<u8>) -> Result<ImageArtifact, CaptureError> {
        let size = bytes.len() as u64;
        if size > self.max_upload_bytes {
            return Err(CaptureError::TooLarge {
                path: name.to_path_buf(),
                size,
                limit: self.max_upload_bytes,
            });
        }

        let artifact = ImageArtifact::from_upload(name, bytes)?;
        self.select_upload_source();
        info!(
            "uploaded {} ({}x{}, {})",
            name.display(),
            artifact.width,
            artifact.height,
            artifact.mime
        );
        Ok(artifact)
    }

    /// Switch to the camera and start an acquisition. Returns `None` if the
    /// camera is already live or a request is pending.
    pub fn select_camera_source(&mut self) -> Option<CameraRequest> {
        self.source = Some(SourceTag::Camera);
        self.camera.request()
    }

    /// Deliver the outcome of an acquisition started by `select_camera_source`
    /// or `retry_camera`. A denial falls back to the upload source.
    pub fn resolve_camera(
        &mut self,
        request: CameraRequest,
        outcome: Result<Box<dyn CameraStream>, CaptureError>,
    ) -> Result<Resolution, CaptureError> {
        match self.camera.resolve(request, outcome) {
            Resolution::Denied => {
                self.source = Some(SourceTag::Upload);
                Err(CaptureError::PermissionDenied)
            }
            resolution => Ok(resolution),
        }
    }

    /// Select the camera and open `device` in one step. An already live
    /// camera is kept; a pending request must be resolved first.
    pub fn acquire_camera(&mut self, device: &mut dyn CameraDevice) -> Result<(), CaptureError> {
        let Some(request) = self.select_camera_source() else {
            return match self.camera.state() {
                CameraState::Active => {
                    debug!("camera already active");
                    Ok(())
                }
                _ => Err(CaptureError::CameraPending),
            };
        };
        debug!("opening camera device '{}'", device.name());
        self.resolve_camera(request, device.open()).map(|_| ())
    }

    /// PermissionDenied -> RequestingPermission.
    pub fn retry_camera(&mut self) -> Option<CameraRequest> {
        if self.camera.state() != CameraState::PermissionDenied {
            return None;
        }
        self.select_camera_source()
    }

    /// PermissionDenied -> Off, back on the upload source.
    pub fn cancel_camera(&mut self) {
        if self.camera.state() == CameraState::PermissionDenied {
            self.select_upload_source();
        }
    }

    pub fn stop_camera(&mut self) {
        self.camera.stop();
    }

    /// Snapshot the live stream. The device is released whether or not the
    /// grab succeeds.
    pub fn capture_frame(&mut self) -> Result<ImageArtifact, CaptureError> {
        let frame = match self.camera.capture() {
            Ok(frame) => frame,
            Err(CaptureError::PermissionDenied) => {
                self.source = Some(SourceTag::Upload);
                return Err(CaptureError::PermissionDenied);
            }
            Err(e) => return Err(e),
        };
        let artifact = ImageArtifact::from_frame(&frame)?;
        info!("captured camera frame ({}x{})", artifact.width, artifact.height);
        Ok(artifact)
    }

    /// Back to the no-source state, releasing the camera if held.
    pub fn reset(&mut self) {
        self.camera.stop();
        self.source = None;
    }
}
