//! Camera devices and the permission/stream sub-state machine.
//!
//! Acquisition is an event pair: `request` hands out a `CameraRequest`
//! stamped with the current epoch, and the caller later delivers the
//! device outcome through `resolve`. Anything that leaves `Active` or
//! invalidates a pending request bumps the epoch, so late outcomes are
//! recognized as stale and their streams released on the spot.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{debug, warn};
use serde::Serialize;

use crate::error::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraState {
    Off,
    RequestingPermission,
    Active,
    PermissionDenied,
}

/// A source of camera streams.
pub trait CameraDevice {
    fn name(&self) -> &str;
    fn open(&mut self) -> Result<Box<dyn CameraStream>, CaptureError>;
}

/// A live stream holding the device lock until `stop` is called.
pub trait CameraStream {
    fn grab_frame(&mut self) -> Result<DynamicImage, CaptureError>;
    fn stop(&mut self);
}

/// Owns an open stream and stops it exactly once, on release or drop.
pub struct CameraLease {
    stream: Option<Box<dyn CameraStream>>,
}

impl CameraLease {
    fn new(stream: Box<dyn CameraStream>) -> Self {
        CameraLease { stream: Some(stream) }
    }

    fn grab_frame(&mut self) -> Result<DynamicImage, CaptureError> {
        match self.stream.as_mut() {
            Some(stream) => stream.grab_frame(),
            None => Err(CaptureError::CameraInactive),
        }
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        self.release();
    }
}

/// Ticket for one pending acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRequest {
    epoch: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    Active,
    Denied,
    /// The request was superseded; any stream it carried has been released.
    Stale,
}

pub struct Camera {
    state: CameraState,
    epoch: u64,
    lease: Option<CameraLease>,
}

impl Camera {
    pub fn new() -> Self {
        Camera {
            state: CameraState::Off,
            epoch: 0,
            lease: None,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn holds_device(&self) -> bool {
        self.lease.is_some()
    }

    /// Off or PermissionDenied -> RequestingPermission. Returns `None` when
    /// a request is already pending or the stream is already live.
    pub fn request(&mut self) -> Option<CameraRequest> {
        match self.state {
            CameraState::Active | CameraState::RequestingPermission => None,
            CameraState::Off | CameraState::PermissionDenied => {
                self.epoch += 1;
                self.transition(CameraState::RequestingPermission);
                Some(CameraRequest { epoch: self.epoch })
            }
        }
    }

    pub fn resolve(
        &mut self,
        request: CameraRequest,
        outcome: Result<Box<dyn CameraStream>, CaptureError>,
    ) -> Resolution {
        if request.epoch != self.epoch || self.state != CameraState::RequestingPermission {
            debug!("discarding stale camera acquisition (epoch {})", request.epoch);
            // dropping the lease stops the stream
            if let Ok(stream) = outcome {
                drop(CameraLease::new(stream));
            }
            return Resolution::Stale;
        }

        match outcome {
            Ok(stream) => {
                self.lease = Some(CameraLease::new(stream));
                self.transition(CameraState::Active);
                Resolution::Active
            }
            Err(e) => {
                warn!("camera unavailable: {e}");
                self.transition(CameraState::PermissionDenied);
                Resolution::Denied
            }
        }
    }

    /// Grab one frame and release the device. Capture consumes the acquisition.
    pub fn capture(&mut self) -> Result<DynamicImage, CaptureError> {
        if self.state != CameraState::Active {
            return Err(CaptureError::CameraInactive);
        }
        let Some(mut lease) = self.lease.take() else {
            return Err(CaptureError::CameraInactive);
        };

        let frame = lease.grab_frame();
        lease.release();
        self.epoch += 1;

        match frame {
            Ok(frame) => {
                self.transition(CameraState::Off);
                Ok(frame)
            }
            Err(e) => {
                warn!("camera frame grab failed: {e}");
                self.transition(CameraState::PermissionDenied);
                Err(CaptureError::PermissionDenied)
            }
        }
    }

    /// Return to Off from any state, releasing the stream if one is held.
    pub fn stop(&mut self) {
        if let Some(mut lease) = self.lease.take() {
            lease.release();
        }
        if self.state != CameraState::Off {
            self.epoch += 1;
            self.transition(CameraState::Off);
        }
    }

    fn transition(&mut self, next: CameraState) {
        debug!("camera: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Serves a fixed image file as its video feed.
///
/// Stands in for a real device: the file must exist and decode when the
/// stream opens, otherwise access is denied.
pub struct StillCamera {
    frame_path: PathBuf,
}

impl StillCamera {
    pub fn new(frame_path: impl Into<PathBuf>) -> Self {
        StillCamera { frame_path: frame_path.into() }
    }

    pub fn frame_path(&self) -> &Path {
        &self.frame_path
    }
}

impl CameraDevice for StillCamera {
    fn name(&self) -> &str {
        "still"
    }

    fn open(&mut self) -> Result<Box<dyn CameraStream>, CaptureError> {
        let frame = image::open(&self.frame_path).map_err(|e| {
            debug!("still camera {} failed to open: {e}", self.frame_path.display());
            CaptureError::PermissionDenied
        })?;
        Ok(Box::new(StillStream { frame: Some(frame) }))
    }
}

struct StillStream {
    frame: Option<DynamicImage>,
}

impl CameraStream for StillStream {
    fn grab_frame(&mut self) -> Result<DynamicImage, CaptureError> {
        self.frame.clone().ok_or(CaptureError::CameraInactive)
    }

    fn stop(&mut self) {
        self.frame = None;
    }
}

/// A device that is never available.
pub struct NoCamera;

impl CameraDevice for NoCamera {
    fn name(&self) -> &str {
        "none"
    }

    fn open(&mut self) -> Result<Box<dyn CameraStream>, CaptureError> {
        Err(CaptureError::PermissionDenied)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Counts opens and stops so tests can check the device is never leaked.
    #[derive(Clone, Default)]
    pub struct FakeCamera {
        pub deny: bool,
        pub opened: Rc<Cell<usize>>,
        pub stopped: Rc<Cell<usize>>,
    }

    impl FakeCamera {
        pub fn live(&self) -> usize {
            self.opened.get() - self.stopped.get()
        }
    }

    impl CameraDevice for FakeCamera {
        fn name(&self) -> &str {
            "fake"
        }

        fn open(&mut self) -> Result<Box<dyn CameraStream>, CaptureError> {
            if self.deny {
                return Err(CaptureError::PermissionDenied);
            }
            self.opened.set(self.opened.get() + 1);
            Ok(Box::new(FakeStream { stopped: self.stopped.clone() }))
        }
    }

    struct FakeStream {
        stopped: Rc<Cell<usize>>,
    }

    impl CameraStream for FakeStream {
        fn grab_frame(&mut self) -> Result<DynamicImage, CaptureError> {
            Ok(DynamicImage::ImageRgb8(image::RgbImage::new(4, 4)))
        }

        fn stop(&mut self) {
            self.stopped.set(self.stopped.get() + 1);
        }
    }
}
