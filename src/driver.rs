//! Paced execution of one scan.
//!
//! Ticks the session at a fixed interval, reports each progress step and
//! runs the analyzer when the orchestrator asks for it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::debug;

use crate::config::Config;
use crate::error::SessionError;
use crate::scan::analysis::Analyzer;
use crate::scan::result::ScanResult;
use crate::scan::{Completion, Tick};
use crate::session::Session;

#[derive(Debug, Clone, Copy)]
pub struct Pace {
    pub interval: Duration,
}

impl Pace {
    pub fn from_config(config: &Config) -> Self {
        Pace {
            interval: if config.instant { Duration::ZERO } else { config.tick_interval },
        }
    }

    pub fn instant() -> Self {
        Pace { interval: Duration::ZERO }
    }
}

/// Start a scan on the previewed image and drive it to completion.
///
/// `on_progress` sees 0 first and every step up to 100. An analysis
/// failure is returned with the session back in `Previewing`.
pub fn run_scan(
    session: &mut Session,
    analyzer: &mut dyn Analyzer,
    pace: Pace,
    mut on_progress: impl FnMut(u8),
) -> Result<Arc<ScanResult>, SessionError> {
    if !session.start_scan() {
        return Err(SessionError::NoImage);
    }
    on_progress(session.progress());

    loop {
        if !pace.interval.is_zero() {
            thread::sleep(pace.interval);
        }
        match session.tick() {
            Tick::Progress(progress) => on_progress(progress),
            Tick::AnalysisDue(ticket) => {
                return match session.run_analysis(ticket, analyzer)? {
                    Completion::Finished(result) => Ok(result),
                    Completion::Stale => Err(SessionError::Cancelled),
                };
            }
            Tick::Idle | Tick::Waiting => {
                debug!("scan left the pipeline before analysis");
                return Err(SessionError::Cancelled);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::capture::artifact::png_bytes;
    use crate::scan::analysis::fake::FixedAnalyzer;
    use crate::scan::Phase;

    #[test]
    fn drives_to_complete_with_monotonic_progress() {
        let mut session = Session::new(&Config::default());
        session.submit_bytes(Path::new("leaf.png"), png_bytes(4, 4)).unwrap();

        let mut seen = Vec::new();
        let result = run_scan(&mut session, &mut FixedAnalyzer::new(77), Pace::instant(), |p| seen.push(p))
            .unwrap();

        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.len(), 21);
        assert_eq!(session.phase(), Phase::Complete);
        assert_eq!(result.health_score.value(), 77);
    }

    #[test]
    fn nothing_to_scan() {
        let mut session = Session::new(&Config::default());
        let err = run_scan(&mut session, &mut FixedAnalyzer::new(77), Pace::instant(), |_| {}).unwrap_err();
        assert!(matches!(err, SessionError::NoImage));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn analysis_failure_keeps_preview() {
        let mut session = Session::new(&Config::default());
        session.submit_bytes(Path::new("leaf.png"), png_bytes(4, 4)).unwrap();
        let mut analyzer = FixedAnalyzer::new(50);
        analyzer.fail = true;

        let err = run_scan(&mut session, &mut analyzer, Pace::instant(), |_| {}).unwrap_err();
        assert!(matches!(err, SessionError::Analysis(_)));
        assert_eq!(session.phase(), Phase::Previewing);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn pace_respects_instant_flag() {
        let config = Config { instant: true, ..Config::default() };
        assert!(Pace::from_config(&config).interval.is_zero());
        assert_eq!(Pace::from_config(&Config::default()).interval, Duration::from_millis(150));
    }
}
