//! The command surface the presentation layer talks to.
//!
//! `Session` owns the capture manager, the orchestrator and the history
//! store, and routes artifacts from the first into the second. Readers get
//! a serializable `SessionSnapshot`; every mutation goes through a command.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::capture::artifact::ImageArtifact;
use crate::capture::camera::{CameraDevice, CameraRequest, CameraStream, Resolution};
use crate::capture::{CaptureManager, CaptureStatus};
use crate::config::Config;
use crate::error::{AnalysisError, CaptureError, SessionError};
use crate::scan::analysis::Analyzer;
use crate::scan::result::{Analysis, ScanResult};
use crate::scan::{AnalysisTicket, Completion, Orchestrator, Phase, Tick};
use crate::store::HistoryStore;

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub progress: u8,
    pub capture: CaptureStatus,
    pub preview: Option<ImageArtifact>,
    pub current: Option<Arc<ScanResult>>,
    pub history: Vec<Arc<ScanResult>>,
}

pub struct Session {
    capture: CaptureManager,
    orchestrator: Orchestrator,
    history: HistoryStore,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        let history = if config.seed_history {
            HistoryStore::seeded()
        } else {
            HistoryStore::new()
        };
        Session::with_parts(
            CaptureManager::new(config.max_upload_bytes),
            Orchestrator::new(config.progress_step),
            history,
        )
    }

    pub fn with_parts(capture: CaptureManager, orchestrator: Orchestrator, history: HistoryStore) -> Self {
        Session {
            capture,
            orchestrator,
            history,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.orchestrator.phase(),
            progress: self.orchestrator.progress(),
            capture: self.capture.status(),
            preview: self.orchestrator.artifact().cloned(),
            current: self.orchestrator.current_result().cloned(),
            history: self.history.to_vec(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.orchestrator.phase()
    }

    pub fn progress(&self) -> u8 {
        self.orchestrator.progress()
    }

    pub fn current_result(&self) -> Option<&Arc<ScanResult>> {
        self.orchestrator.current_result()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn capture_status(&self) -> CaptureStatus {
        self.capture.status()
    }

    pub fn holds_camera(&self) -> bool {
        self.capture.holds_camera()
    }

    pub fn select_upload_source(&mut self) {
        self.capture.select_upload_source();
    }

    pub fn submit_file(&mut self, path: &Path) -> Result<(), SessionError> {
        self.ensure_idle_pipeline()?;
        let artifact = self.capture.submit_file(path)?;
        self.orchestrator.preview(artifact);
        Ok(())
    }

    pub fn submit_bytes(&mut self, name: &Path, bytes: Vec<u8>) -> Result<(), SessionError> {
        self.ensure_idle_pipeline()?;
        let artifact = self.capture.submit_bytes(name, bytes)?;
        self.orchestrator.preview(artifact);
        Ok(())
    }

    /// Start a camera acquisition; deliver the device outcome with `resolve_camera`.
    pub fn select_camera_source(&mut self) -> Result<Option<CameraRequest>, SessionError> {
        self.ensure_idle_pipeline()?;
        Ok(self.capture.select_camera_source())
    }

    pub fn resolve_camera(
        &mut self,
        request: CameraRequest,
        outcome: Result<Box<dyn CameraStream>, CaptureError>,
    ) -> Result<Resolution, SessionError> {
        Ok(self.capture.resolve_camera(request, outcome)?)
    }

    /// Select the camera and open `device` in one step.
    pub fn acquire_camera(&mut self, device: &mut dyn CameraDevice) -> Result<(), SessionError> {
        self.ensure_idle_pipeline()?;
        Ok(self.capture.acquire_camera(device)?)
    }

    /// Retry after a denial by opening `device` again.
    pub fn retry_camera(&mut self, device: &mut dyn CameraDevice) -> Result<(), SessionError> {
        self.ensure_idle_pipeline()?;
        match self.capture.retry_camera() {
            Some(request) => self.resolve_camera(request, device.open()).map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn cancel_camera(&mut self) {
        self.capture.cancel_camera();
    }

    pub fn stop_camera(&mut self) {
        self.capture.stop_camera();
    }

    pub fn capture_frame(&mut self) -> Result<(), SessionError> {
        self.ensure_idle_pipeline()?;
        let artifact = self.capture.capture_frame()?;
        self.orchestrator.preview(artifact);
        Ok(())
    }

    /// No-op without a previewed image or while already scanning.
    pub fn start_scan(&mut self) -> bool {
        self.orchestrator.start_scan()
    }

    pub fn tick(&mut self) -> Tick {
        self.orchestrator.tick()
    }

    pub fn ticket_artifact(&self, ticket: AnalysisTicket) -> Option<&ImageArtifact> {
        self.orchestrator.ticket_artifact(ticket)
    }

    pub fn complete_analysis(
        &mut self,
        ticket: AnalysisTicket,
        outcome: Result<Analysis, AnalysisError>,
    ) -> Result<Completion, SessionError> {
        Ok(self.orchestrator.complete_analysis(ticket, outcome, &mut self.history)?)
    }

    pub fn run_analysis(
        &mut self,
        ticket: AnalysisTicket,
        analyzer: &mut dyn Analyzer,
    ) -> Result<Completion, SessionError> {
        Ok(self.orchestrator.run_analysis(ticket, analyzer, &mut self.history)?)
    }

    /// Discard image, result and camera; cancels a running scan.
    pub fn reset(&mut self) {
        self.orchestrator.reset();
        self.capture.reset();
    }

    pub fn select_history_entry(&mut self, id: &str) -> bool {
        self.orchestrator.select_history_entry(id, &self.history)
    }

    /// Returns whether an entry was removed. Missing ids are not an error.
    pub fn delete_history_entry(&mut self, id: &str) -> bool {
        self.history.remove(id).is_some()
    }

    fn ensure_idle_pipeline(&self) -> Result<(), SessionError> {
        if self.orchestrator.is_scanning() {
            return Err(SessionError::ScanInProgress);
        }
        Ok(())
    }
}
