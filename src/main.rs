use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use cropscan::batch;
use cropscan::capture::camera::{CameraDevice, NoCamera, StillCamera};
use cropscan::cli::{Cli, Command};
use cropscan::config::Config;
use cropscan::driver::{self, Pace};
use cropscan::error::SessionError;
use cropscan::report::{self, json, table};
use cropscan::scan::analysis::SimulatedAnalyzer;
use cropscan::scan::result::ScanResult;
use cropscan::session::Session;
use cropscan::shell::Shell;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn progress_printer(enabled: bool) -> impl FnMut(u8) {
    move |progress| {
        if enabled {
            eprint!("\rAnalyzing your crop... {progress:>3}%");
            if progress == 100 {
                eprintln!();
            }
        }
    }
}

fn print_result(result: &ScanResult, session: &Session, as_json: bool) {
    if as_json {
        println!("{}", json::render_result(result));
        return;
    }

    print!("{}", table::render_result(&report::present(result)));
    let rows: Vec<_> = session.history().list().map(|r| report::history_row(r)).collect();
    println!();
    print!("{}", table::render_history(&rows));
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("error: {e}");
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let mut config = Config::load(cli.global.config.as_deref()).unwrap_or_else(|e| fail(e));
    if let Err(e) = config.apply_args(&cli.global) {
        fail(e);
    }

    let mut analyzer = SimulatedAnalyzer::new(config.seed, config.status_mode)
        .with_crop_type(config.crop_type.clone())
        .with_failure_rate(config.failure_rate);
    let pace = Pace::from_config(&config);

    match cli.command {
        Command::Scan(args) => {
            let mut session = Session::new(&config);
            if let Err(e) = session.submit_file(&args.file) {
                match e {
                    SessionError::Capture(ref c) if c.is_read_error() => {
                        fail(format!("{c}. Please try another file."))
                    }
                    other => fail(other),
                }
            }

            let result = driver::run_scan(&mut session, &mut analyzer, pace, progress_printer(!args.json))
                .unwrap_or_else(|e| fail(e));
            print_result(&result, &session, args.json);
        }
        Command::Camera(args) => {
            let frame = args.frame.or_else(|| config.camera_frame.clone());
            let mut device: Box<dyn CameraDevice> = match frame {
                Some(path) => Box::new(StillCamera::new(path)),
                None => Box::new(NoCamera),
            };
            log::debug!("using camera device '{}'", device.name());

            let mut session = Session::new(&config);
            if let Err(e) = session.acquire_camera(device.as_mut()) {
                eprintln!("error: {e}");
                eprintln!("Falling back to image upload: run 'cropscan scan <file>' instead.");
                std::process::exit(1);
            }
            session.capture_frame().unwrap_or_else(|e| fail(e));

            let result = driver::run_scan(&mut session, &mut analyzer, pace, progress_printer(!args.json))
                .unwrap_or_else(|e| fail(e));
            print_result(&result, &session, args.json);
        }
        Command::Batch(args) => {
            if !args.dir.is_dir() {
                fail(format!("{} is not a directory", args.dir.display()));
            }

            let mut session = Session::new(&config);
            let quiet = args.json;
            let outcome = batch::run(&mut session, &mut analyzer, &args.dir, pace, |path| {
                if !quiet {
                    eprintln!("scanning {}", path.display());
                }
            });

            if args.json {
                println!("{}", json::render_history(&outcome.scanned));
            } else {
                for result in &outcome.scanned {
                    print!("{}", table::render_result(&report::present(result)));
                }
                println!();
                println!(
                    "{} scanned, {} failed",
                    outcome.scanned.len(),
                    outcome.failures.len()
                );
            }

            if !outcome.succeeded() {
                eprintln!("\nerrors encountered:");
                for (path, reason) in &outcome.failures {
                    eprintln!("  {}: {reason}", path.display());
                }
                std::process::exit(1);
            }
        }
        Command::History(args) => {
            let session = Session::new(&config);
            let entries: Vec<Arc<ScanResult>> = session.history().to_vec();
            if args.json {
                println!("{}", json::render_history(&entries));
            } else {
                let rows: Vec<_> = entries.iter().map(|r| report::history_row(r)).collect();
                print!("{}", table::render_history(&rows));
            }
        }
        Command::Session => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            let mut shell = Shell::new(&config, &mut analyzer);
            if let Err(e) = shell.run(stdin.lock(), &mut stdout) {
                fail(e);
            }
            let _ = stdout.flush();
        }
    }
}
