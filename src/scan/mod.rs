//! Scan orchestrator.
//!
//! Drives `Idle -> Previewing -> Scanning -> Complete -> Idle`. Progress
//! advances one fixed step per `tick`; the tick after progress reaches 100
//! hands out an `AnalysisTicket`, and the analysis outcome comes back
//! through `complete_analysis`. Every start, reset and history selection
//! bumps the epoch, so a ticket issued before one of those is stale and
//! its outcome is dropped without touching state or history.

pub mod analysis;
pub mod result;

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;

use crate::capture::artifact::ImageArtifact;
use crate::error::AnalysisError;
use crate::store::HistoryStore;
use analysis::Analyzer;
use result::{Analysis, ImageRef, ScanResult};

pub const DEFAULT_PROGRESS_STEP: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Previewing,
    Scanning,
    Complete,
}

enum State {
    Idle,
    Previewing {
        artifact: ImageArtifact,
    },
    Scanning {
        artifact: ImageArtifact,
        progress: u8,
        dispatched: bool,
    },
    Complete {
        result: Arc<ScanResult>,
    },
}

/// Proof that analysis was requested for a specific scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Nothing is scanning.
    Idle,
    Progress(u8),
    /// Progress is at 100; run the analyzer and report back with the ticket.
    AnalysisDue(AnalysisTicket),
    /// Analysis was dispatched and has not reported back yet.
    Waiting,
}

#[derive(Debug, Clone)]
pub enum Completion {
    Finished(Arc<ScanResult>),
    /// The scan this ticket belonged to was reset or superseded.
    Stale,
}

pub struct Orchestrator {
    state: State,
    epoch: u64,
    step: u8,
    sequence: u64,
}

impl Orchestrator {
    pub fn new(step: u8) -> Self {
        Orchestrator {
            state: State::Idle,
            epoch: 0,
            step: step.clamp(1, 100),
            sequence: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Previewing { .. } => Phase::Previewing,
            State::Scanning { .. } => Phase::Scanning,
            State::Complete { .. } => Phase::Complete,
        }
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.state, State::Scanning { .. })
    }

    /// Current progress. 0 outside a scan, 100 once complete.
    pub fn progress(&self) -> u8 {
        match self.state {
            State::Scanning { progress, .. } => progress,
            State::Complete { .. } => 100,
            State::Idle | State::Previewing { .. } => 0,
        }
    }

    pub fn artifact(&self) -> Option<&ImageArtifact> {
        match &self.state {
            State::Previewing { artifact } | State::Scanning { artifact, .. } => Some(artifact),
            State::Idle | State::Complete { .. } => None,
        }
    }

    pub fn current_result(&self) -> Option<&Arc<ScanResult>> {
        match &self.state {
            State::Complete { result } => Some(result),
            _ => None,
        }
    }

    /// Take ownership of a freshly captured artifact. Refused while scanning.
    pub fn preview(&mut self, artifact: ImageArtifact) -> bool {
        if self.is_scanning() {
            warn!("ignoring new image while a scan is running");
            return false;
        }
        self.transition(State::Previewing { artifact });
        true
    }

    /// Previewing -> Scanning. A no-op from any other phase.
    pub fn start_scan(&mut self) -> bool {
        let artifact = match std::mem::replace(&mut self.state, State::Idle) {
            State::Previewing { artifact } => artifact,
            other => {
                self.state = other;
                debug!("start_scan ignored in {:?}", self.phase());
                return false;
            }
        };

        self.epoch += 1;
        info!("scan started ({} image, epoch {})", artifact.source.as_str(), self.epoch);
        self.transition(State::Scanning {
            artifact,
            progress: 0,
            dispatched: false,
        });
        true
    }

    pub fn tick(&mut self) -> Tick {
        let step = self.step;
        let epoch = self.epoch;
        match &mut self.state {
            State::Scanning { dispatched: true, .. } => Tick::Waiting,
            State::Scanning { progress, dispatched, .. } => {
                if *progress >= 100 {
                    *dispatched = true;
                    debug!("analysis due (epoch {epoch})");
                    Tick::AnalysisDue(AnalysisTicket { epoch })
                } else {
                    *progress = progress.saturating_add(step).min(100);
                    Tick::Progress(*progress)
                }
            }
            _ => Tick::Idle,
        }
    }

    /// The artifact a still-valid ticket refers to.
    pub fn ticket_artifact(&self, ticket: AnalysisTicket) -> Option<&ImageArtifact> {
        match &self.state {
            State::Scanning { artifact, dispatched: true, .. } if ticket.epoch == self.epoch => {
                Some(artifact)
            }
            _ => None,
        }
    }

    /// Run `analyzer` for a ticket and complete with its outcome.
    pub fn run_analysis(
        &mut self,
        ticket: AnalysisTicket,
        analyzer: &mut dyn Analyzer,
        history: &mut HistoryStore,
    ) -> Result<Completion, AnalysisError> {
        let outcome = match self.ticket_artifact(ticket) {
            Some(artifact) => analyzer.analyze(artifact),
            None => return Ok(Completion::Stale),
        };
        self.complete_analysis(ticket, outcome, history)
    }

    /// Deliver an analysis outcome. Success moves to `Complete` and then
    /// prepends the result to `history`. Failure returns to `Previewing`
    /// with the artifact kept. Stale tickets change nothing.
    pub fn complete_analysis(
        &mut self,
        ticket: AnalysisTicket,
        outcome: Result<Analysis, AnalysisError>,
        history: &mut HistoryStore,
    ) -> Result<Completion, AnalysisError> {
        if self.ticket_artifact(ticket).is_none() {
            debug!("dropping stale analysis outcome (epoch {})", ticket.epoch);
            return Ok(Completion::Stale);
        }

        let artifact = match std::mem::replace(&mut self.state, State::Idle) {
            State::Scanning { artifact, .. } => artifact,
            other => {
                self.state = other;
                return Ok(Completion::Stale);
            }
        };

        match outcome {
            Ok(analysis) => {
                let result = Arc::new(self.build_result(artifact, analysis));
                self.transition(State::Complete { result: result.clone() });
                history.add(result.clone());
                info!(
                    "scan {} complete: {} {} ({}/100)",
                    result.id,
                    result.crop_type,
                    result.health_status.as_str(),
                    result.health_score.value()
                );
                Ok(Completion::Finished(result))
            }
            Err(e) => {
                warn!("{e}, image kept for retry");
                self.transition(State::Previewing { artifact });
                Err(e)
            }
        }
    }

    /// Show a history entry without rerunning analysis. Cancels a running scan.
    pub fn select_history_entry(&mut self, id: &str, history: &HistoryStore) -> bool {
        let Some(result) = history.get(id) else {
            debug!("history entry {id} not found");
            return false;
        };
        if self.is_scanning() {
            warn!("cancelling running scan to show {id}");
        }
        self.epoch += 1;
        self.transition(State::Complete { result: result.clone() });
        true
    }

    /// Back to `Idle`, discarding artifact and result. Cancels a running scan.
    pub fn reset(&mut self) {
        if self.is_scanning() {
            info!("scan cancelled at {}%", self.progress());
        }
        self.epoch += 1;
        self.transition(State::Idle);
    }

    fn build_result(&mut self, artifact: ImageArtifact, analysis: Analysis) -> ScanResult {
        self.sequence += 1;
        let timestamp = Utc::now();
        let id = format!("scan-{}-{}", timestamp.timestamp_millis(), self.sequence);
        ScanResult::from_analysis(id, timestamp, ImageRef::Artifact(artifact), analysis)
    }

    fn transition(&mut self, next: State) {
        let from = self.phase();
        self.state = next;
        debug!("orchestrator: {:?} -> {:?}", from, self.phase());
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_STEP)
    }
}
