//! Scan every image under a directory.
//!
//! Each file gets its own upload, scan and history entry. Files that fail
//! to decode are collected as failures and the walk continues.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use walkdir::WalkDir;

use crate::driver::{self, Pace};
use crate::error::SessionError;
use crate::scan::analysis::Analyzer;
use crate::scan::result::ScanResult;
use crate::session::Session;

const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

pub struct BatchReport {
    pub scanned: Vec<Arc<ScanResult>>,
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchReport {
    /// True when every image was scanned. Drives the exit status.
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Image files under `root`, sorted by path.
pub fn find_images(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_image_extension(p))
        .collect();
    paths.sort();
    paths
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

pub fn run(
    session: &mut Session,
    analyzer: &mut dyn Analyzer,
    root: &Path,
    pace: Pace,
    mut on_file: impl FnMut(&Path),
) -> BatchReport {
    let mut report = BatchReport {
        scanned: Vec::new(),
        failures: Vec::new(),
    };

    for path in find_images(root) {
        on_file(&path);
        session.reset();

        if let Err(e) = session.submit_file(&path) {
            warn!("skipping {}: {e}", path.display());
            report.failures.push((path, e.to_string()));
            continue;
        }

        match driver::run_scan(session, analyzer, pace, |p| debug!("{}: {p}%", path.display())) {
            Ok(result) => report.scanned.push(result),
            Err(SessionError::Analysis(e)) => {
                warn!("analysis failed for {}: {e}", path.display());
                report.failures.push((path, e.to_string()));
            }
            Err(e) => report.failures.push((path, e.to_string())),
        }
    }

    session.reset();
    report
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::capture::artifact::png_bytes;
    use crate::config::Config;
    use crate::scan::analysis::fake::FixedAnalyzer;

    #[test]
    fn finds_images_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("field-a")).unwrap();
        fs::write(dir.path().join("one.PNG"), png_bytes(2, 2)).unwrap();
        fs::write(dir.path().join("field-a/two.jpg"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let found = find_images(dir.path());
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.extension().is_some()));
    }

    #[test]
    fn scans_good_files_and_reports_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), png_bytes(3, 3)).unwrap();
        fs::write(dir.path().join("b.png"), png_bytes(5, 5)).unwrap();
        fs::write(dir.path().join("c.png"), b"not really a png").unwrap();

        let config = Config { seed_history: false, ..Config::default() };
        let mut session = Session::new(&config);
        let mut visited = 0;
        let report = run(
            &mut session,
            &mut FixedAnalyzer::new(90),
            dir.path(),
            Pace::instant(),
            |_| visited += 1,
        );

        assert_eq!(visited, 3);
        assert_eq!(report.scanned.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.succeeded());
        assert!(report.failures[0].0.ends_with("c.png"));
        // newest first
        assert_eq!(session.history().ids()[0], report.scanned[1].id);
    }

    #[test]
    fn clean_directory_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), png_bytes(3, 3)).unwrap();

        let mut session = Session::new(&Config::default());
        let report = run(&mut session, &mut FixedAnalyzer::new(70), dir.path(), Pace::instant(), |_| {});
        assert!(report.succeeded());
        assert_eq!(report.scanned.len(), 1);
    }

    #[test]
    fn all_files_failing_is_not_success() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"junk").unwrap();
        fs::write(dir.path().join("b.jpg"), b"").unwrap();

        let mut session = Session::new(&Config::default());
        let report = run(&mut session, &mut FixedAnalyzer::new(70), dir.path(), Pace::instant(), |_| {});
        assert!(report.scanned.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert!(!report.succeeded());
    }
}
