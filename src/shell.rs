//! Line-oriented interactive session.
//!
//! Each input line is one command of the session surface. Output goes to
//! any `Write`, so the loop runs the same against stdout or a buffer.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::capture::camera::{CameraDevice, NoCamera, StillCamera};
use crate::config::Config;
use crate::driver::{self, Pace};
use crate::error::SessionError;
use crate::report::{self, json, table};
use crate::scan::analysis::Analyzer;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Upload(PathBuf),
    UploadSource,
    Camera,
    Retry,
    Cancel,
    Stop,
    Capture,
    Scan,
    Reset,
    Show(String),
    Delete(String),
    History,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  upload <file>   load an image file for scanning
  source upload   switch to the upload source (releases the camera)
  camera          switch to the camera and request access
  retry           retry camera access after a denial
  cancel          give up on the camera and fall back to upload
  stop            stop the camera
  capture         grab a frame from the active camera
  scan            analyze the loaded image
  reset           discard the image and result
  show <id>       display a history entry
  delete <id>     remove a history entry
  history         list past scans
  status          print the session snapshot as json
  help            this text
  quit            leave the session
";

pub fn parse(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    // the argument is the rest of the line so paths may contain spaces
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, Some(rest.trim())),
        None => (line, None),
    };

    let command = match (word, arg) {
        ("upload", Some(path)) => ShellCommand::Upload(PathBuf::from(path)),
        ("upload", None) => return Err("usage: upload <file>".to_string()),
        ("source", Some("upload")) => ShellCommand::UploadSource,
        ("source", Some("camera")) | ("camera", None) => ShellCommand::Camera,
        ("retry", None) => ShellCommand::Retry,
        ("cancel", None) => ShellCommand::Cancel,
        ("stop", None) => ShellCommand::Stop,
        ("capture", None) => ShellCommand::Capture,
        ("scan", None) => ShellCommand::Scan,
        ("reset", None) => ShellCommand::Reset,
        ("show", Some(id)) => ShellCommand::Show(id.to_string()),
        ("delete", Some(id)) => ShellCommand::Delete(id.to_string()),
        ("show" | "delete", None) => return Err(format!("usage: {word} <id>")),
        ("history", None) => ShellCommand::History,
        ("status", None) => ShellCommand::Status,
        ("help" | "?", None) => ShellCommand::Help,
        ("quit" | "exit", None) => ShellCommand::Quit,
        (
            "camera" | "retry" | "cancel" | "stop" | "capture" | "scan" | "reset" | "history"
            | "status" | "help" | "?" | "quit" | "exit",
            Some(_),
        ) => return Err(format!("'{word}' takes no argument")),
        _ => return Err(format!("unknown command '{line}', try 'help'")),
    };
    Ok(Some(command))
}

pub struct Shell<'a> {
    session: Session,
    analyzer: &'a mut dyn Analyzer,
    camera: Box<dyn CameraDevice>,
    pace: Pace,
}

impl<'a> Shell<'a> {
    pub fn new(config: &Config, analyzer: &'a mut dyn Analyzer) -> Self {
        let camera: Box<dyn CameraDevice> = match &config.camera_frame {
            Some(path) => Box::new(StillCamera::new(path.clone())),
            None => Box::new(NoCamera),
        };
        Shell {
            session: Session::new(config),
            analyzer,
            camera,
            pace: Pace::from_config(config),
        }
    }

    pub fn with_camera(mut self, camera: Box<dyn CameraDevice>) -> Self {
        self.camera = camera;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Read commands until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "cropscan session, type 'help' for commands")?;
        for line in input.lines() {
            let line = line?;
            match parse(&line) {
                Ok(None) => continue,
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => self.execute(command, out)?,
                Err(message) => writeln!(out, "{message}")?,
            }
        }
        Ok(())
    }

    pub fn execute(&mut self, command: ShellCommand, out: &mut impl Write) -> io::Result<()> {
        let outcome = match command {
            ShellCommand::Upload(path) => self.session.submit_file(&path).map(|_| {
                "Image uploaded successfully! Run 'scan' to analyze it.".to_string()
            }),
            ShellCommand::UploadSource => {
                self.session.select_upload_source();
                Ok("Upload source selected.".to_string())
            }
            ShellCommand::Camera => self
                .session
                .acquire_camera(self.camera.as_mut())
                .map(|_| "Camera active. Run 'capture' to take a photo.".to_string()),
            ShellCommand::Retry => self
                .session
                .retry_camera(self.camera.as_mut())
                .map(|_| format!("Camera: {:?}", self.session.capture_status().camera)),
            ShellCommand::Cancel => {
                self.session.cancel_camera();
                Ok("Switched to image upload.".to_string())
            }
            ShellCommand::Stop => {
                self.session.stop_camera();
                Ok("Camera stopped.".to_string())
            }
            ShellCommand::Capture => self
                .session
                .capture_frame()
                .map(|_| "Frame captured. Run 'scan' to analyze it.".to_string()),
            ShellCommand::Scan => self.scan(out),
            ShellCommand::Reset => {
                self.session.reset();
                Ok("Ready for a new scan.".to_string())
            }
            ShellCommand::Show(id) => {
                if self.session.select_history_entry(&id) {
                    let view = self.session.current_result().map(|r| report::present(r));
                    Ok(view.map(|v| table::render_result(&v)).unwrap_or_default())
                } else {
                    Ok(format!("No scan with id {id}."))
                }
            }
            ShellCommand::Delete(id) => {
                if self.session.delete_history_entry(&id) {
                    Ok(format!("Deleted {id}."))
                } else {
                    Ok(format!("No scan with id {id}."))
                }
            }
            ShellCommand::History => {
                let rows: Vec<_> = self.session.history().list().map(|r| report::history_row(r)).collect();
                Ok(table::render_history(&rows))
            }
            ShellCommand::Status => Ok(json::to_json(&self.session.snapshot())),
            ShellCommand::Help => Ok(HELP.to_string()),
            ShellCommand::Quit => Ok(String::new()),
        };

        match outcome {
            Ok(text) => writeln!(out, "{}", text.trim_end()),
            Err(SessionError::Capture(e)) if e.is_read_error() => {
                writeln!(out, "error: {e}. Try another file.")
            }
            Err(e) => writeln!(out, "error: {e}"),
        }
    }

    fn scan(&mut self, out: &mut impl Write) -> Result<String, SessionError> {
        let mut last_reported = 0;
        let result = driver::run_scan(&mut self.session, self.analyzer, self.pace, |progress| {
            // report every quarter to keep the transcript short
            if progress == 0 || progress >= last_reported + 25 || progress == 100 {
                last_reported = progress;
                let _ = writeln!(out, "Analyzing your crop... {progress}%");
            }
        })?;
        Ok(table::render_result(&report::present(&result)))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::capture::artifact::png_bytes;
    use crate::capture::camera::fake::FakeCamera;
    use crate::scan::analysis::fake::FixedAnalyzer;
    use crate::scan::Phase;

    fn config() -> Config {
        Config { instant: true, ..Config::default() }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse("  "), Ok(None));
        assert_eq!(parse("upload a.png"), Ok(Some(ShellCommand::Upload("a.png".into()))));
        assert_eq!(parse("show scan-001"), Ok(Some(ShellCommand::Show("scan-001".into()))));
        assert_eq!(parse("source upload"), Ok(Some(ShellCommand::UploadSource)));
        assert!(parse("delete").is_err());
        assert!(parse("dance").is_err());
    }

    #[test]
    fn upload_path_keeps_spaces() {
        assert_eq!(
            parse("upload /tmp/my crop.png"),
            Ok(Some(ShellCommand::Upload("/tmp/my crop.png".into())))
        );
        assert_eq!(
            parse("  upload   field photos/day 1.jpg  "),
            Ok(Some(ShellCommand::Upload("field photos/day 1.jpg".into())))
        );
        assert_eq!(parse("scan now"), Err("'scan' takes no argument".to_string()));
        assert!(parse("source upload please").is_err());
    }

    #[test]
    fn spaced_path_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("my crop.png");
        fs::write(&image, png_bytes(3, 3)).unwrap();

        let mut analyzer = FixedAnalyzer::new(66);
        let mut shell = Shell::new(&config(), &mut analyzer);
        let mut out = Vec::new();
        let command = parse(&format!("upload {}", image.display())).unwrap().unwrap();
        shell.execute(command, &mut out).unwrap();

        assert!(String::from_utf8(out).unwrap().contains("Image uploaded successfully!"));
        assert_eq!(shell.session().phase(), Phase::Previewing);
    }

    #[test]
    fn scripted_session() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("leaf.png");
        fs::write(&image, png_bytes(6, 6)).unwrap();

        let script = format!(
            "upload {}\nscan\ndelete scan-002\nhistory\nquit\nhistory\n",
            image.display()
        );
        let mut analyzer = FixedAnalyzer::new(66);
        let mut shell = Shell::new(&config(), &mut analyzer);
        let mut out = Vec::new();
        shell.run(script.as_bytes(), &mut out).unwrap();

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Image uploaded successfully!"));
        assert!(transcript.contains("Analyzing your crop... 100%"));
        assert!(transcript.contains("Rice [Needs Attention]"));
        assert!(transcript.contains("Deleted scan-002."));
        assert_eq!(shell.session().history().len(), 2);
        assert_eq!(shell.session().phase(), Phase::Complete);
    }

    #[test]
    fn bad_upload_suggests_another_file() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("junk.png");
        fs::write(&junk, b"junk").unwrap();

        let mut analyzer = FixedAnalyzer::new(66);
        let mut shell = Shell::new(&config(), &mut analyzer);
        let mut out = Vec::new();
        shell.execute(ShellCommand::Upload(junk), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Try another file."));
    }

    #[test]
    fn camera_without_device_reports_denial() {
        let mut analyzer = FixedAnalyzer::new(66);
        let mut shell = Shell::new(&config(), &mut analyzer);
        let mut out = Vec::new();
        shell.execute(ShellCommand::Camera, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("camera access denied"));
    }

    #[test]
    fn camera_capture_then_scan() {
        let device = FakeCamera::default();
        let mut analyzer = FixedAnalyzer::new(95);
        let mut shell = Shell::new(&config(), &mut analyzer).with_camera(Box::new(device.clone()));
        let mut out = Vec::new();
        shell.execute(ShellCommand::Camera, &mut out).unwrap();
        shell.execute(ShellCommand::Capture, &mut out).unwrap();
        shell.execute(ShellCommand::Scan, &mut out).unwrap();

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Frame captured."));
        assert!(transcript.contains("[Healthy]"));
        assert_eq!(device.live(), 0);
    }
}
