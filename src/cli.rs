use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::scan::analysis::StatusMode;

#[derive(Parser)]
#[command(name = "cropscan")]
#[command(about = "Capture a crop image and scan it for health issues")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Default)]
pub struct GlobalArgs {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logging
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    /// Run progress ticks back to back instead of pacing them
    #[arg(long, global = true, default_value_t = false)]
    pub instant: bool,

    /// Delay between progress ticks, e.g. "150ms"
    #[arg(long, global = true)]
    pub tick: Option<String>,

    /// Seed for reproducible simulated analysis
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// How the simulated health status relates to the score
    #[arg(long, global = true, value_enum)]
    pub status_mode: Option<StatusMode>,

    /// Start with an empty history instead of the example scans
    #[arg(long, global = true, default_value_t = false)]
    pub no_seed_history: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload an image file and scan it
    Scan(ScanArgs),

    /// Capture a frame from the camera and scan it
    Camera(CameraArgs),

    /// Scan every image under a directory
    Batch(BatchArgs),

    /// Show the scan history
    History(HistoryArgs),

    /// Interactive session reading commands from stdin
    Session,
}

#[derive(Parser)]
pub struct ScanArgs {
    /// Image file to analyze
    pub file: PathBuf,

    /// Output as JSON instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct CameraArgs {
    /// Image served as the camera feed (overrides config)
    #[arg(long)]
    pub frame: Option<PathBuf>,

    /// Output as JSON instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct BatchArgs {
    /// Directory to walk for images
    pub dir: PathBuf,

    /// Output as JSON instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct HistoryArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
