use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::GlobalArgs;
use crate::error::ConfigError;
use crate::scan::analysis::StatusMode;
use crate::scan::DEFAULT_PROGRESS_STEP;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(150);
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub tick_interval: Duration,
    pub instant: bool,
    pub progress_step: u8,
    pub status_mode: StatusMode,
    pub seed: Option<u64>,
    pub failure_rate: f64,
    pub crop_type: String,
    pub max_upload_bytes: u64,
    pub camera_frame: Option<PathBuf>,
    pub seed_history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tick_interval: DEFAULT_TICK_INTERVAL,
            instant: false,
            progress_step: DEFAULT_PROGRESS_STEP,
            status_mode: StatusMode::default(),
            seed: None,
            failure_rate: 0.0,
            crop_type: "Rice".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            camera_frame: None,
            seed_history: true,
        }
    }
}

// on-disk layout of config.toml, every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    scan: ScanSection,
    analysis: AnalysisSection,
    capture: CaptureSection,
    history: HistorySection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScanSection {
    tick_interval: Option<String>,
    progress_step: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AnalysisSection {
    status_mode: Option<StatusMode>,
    seed: Option<u64>,
    failure_rate: Option<f64>,
    crop_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CaptureSection {
    max_upload_bytes: Option<u64>,
    camera_frame: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct HistorySection {
    seed_examples: Option<bool>,
}

impl Config {
    /// ~/.config/cropscan/config.toml or platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cropscan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`, or from the default location if it exists.
    /// An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Config::default()),
            },
        };

        if !required && !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&contents, &path)
    }

    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Config::default();
        if let Some(value) = file.scan.tick_interval {
            config.tick_interval = parse_duration(&value)?;
        }
        if let Some(step) = file.scan.progress_step {
            config.progress_step = step;
        }
        if let Some(mode) = file.analysis.status_mode {
            config.status_mode = mode;
        }
        config.seed = file.analysis.seed;
        if let Some(rate) = file.analysis.failure_rate {
            config.failure_rate = rate;
        }
        if let Some(crop) = file.analysis.crop_type {
            config.crop_type = crop;
        }
        if let Some(limit) = file.capture.max_upload_bytes {
            config.max_upload_bytes = limit;
        }
        config.camera_frame = file.capture.camera_frame;
        if let Some(seed_examples) = file.history.seed_examples {
            config.seed_history = seed_examples;
        }

        config.validate()?;
        Ok(config)
    }

    /// Command line flags win over file values.
    pub fn apply_args(&mut self, args: &GlobalArgs) -> Result<(), ConfigError> {
        if let Some(tick) = &args.tick {
            self.tick_interval = parse_duration(tick)?;
        }
        if args.instant {
            self.instant = true;
        }
        if args.seed.is_some() {
            self.seed = args.seed;
        }
        if let Some(mode) = args.status_mode {
            self.status_mode = mode;
        }
        if args.no_seed_history {
            self.seed_history = false;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.progress_step) {
            return Err(ConfigError::Invalid(format!(
                "progress_step must be between 1 and 100, got {}",
                self.progress_step
            )));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(ConfigError::Invalid(format!(
                "failure_rate must be between 0 and 1, got {}",
                self.failure_rate
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value).map_err(|source| ConfigError::Duration {
        value: value.to_string(),
        source,
    })
}
