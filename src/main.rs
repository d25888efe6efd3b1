use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use trackbook::config::{Config, ConfigError};
use trackbook::feed::Feed;
use trackbook::location::Verdict;
use trackbook::session::Session;
use trackbook::web;

#[derive(Parser)]
#[command(name = "trackbook")]
#[command(about = "Movement recorder: location arbitration and track statistics")]
struct Cli {
    /// Configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a fix feed and list its fixes
    Validate { feed: PathBuf },
    /// Replay a fix feed through the arbiter and recorder
    Replay {
        feed: PathBuf,
        /// Also print every waypoint
        #[arg(long)]
        waypoints: bool,
    },
    /// Run the HTTP service
    Serve,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Validate { feed } => validate(&feed),
        Commands::Replay { feed, waypoints } => replay(&feed, &config, waypoints),
        Commands::Serve => match web::run_server(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Server error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn read_feed(path: &Path) -> Result<Feed, String> {
    let yaml = fs::read_to_string(path).map_err(|e| format!("Error reading file: {}", e))?;
    Feed::from_str(&yaml).map_err(|e| format!("Parse error: {}", e))
}

fn validate(path: &Path) -> ExitCode {
    let feed = match read_feed(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Feed is valid ({} fixes, start {})", feed.fixes.len(), feed.start);
    for (i, fix) in feed.fixes.iter().enumerate() {
        let accuracy = match fix.known_accuracy() {
            Some(a) => format!("{:.0} m", a),
            None => "unknown".to_string(),
        };
        println!(
            "  {}: {:.6}, {:.6} ({}, {}) @ {}",
            i + 1,
            fix.latitude,
            fix.longitude,
            fix.provider,
            accuracy,
            fix.timestamp
        );
    }
    ExitCode::SUCCESS
}

fn replay(path: &Path, config: &Config, print_waypoints: bool) -> ExitCode {
    let feed = match read_feed(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut session = Session::new(config.location, config.stopover);
    if let Err(e) = session.start_recording_at(feed.start) {
        eprintln!("Error starting recording: {}", e);
        return ExitCode::FAILURE;
    }

    let mut accepted = 0;
    let mut rejected = 0;
    let mut last_time = feed.start;
    for fix in feed.fixes {
        last_time = last_time.max(fix.timestamp);
        match session.offer(fix).verdict {
            Verdict::Accept(_) => accepted += 1,
            Verdict::Reject(_) => rejected += 1,
        }
    }

    let result = feed
        .steps
        .map_or(Ok(()), |steps| session.set_step_count(steps))
        .and_then(|()| session.set_duration(last_time - feed.start))
        .and_then(|()| session.stop_recording_at(last_time));
    let summary = match result {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error finishing recording: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Fixes: {} accepted, {} rejected", accepted, rejected);
    println!("Track {}", summary.id);
    println!("  waypoints: {}", summary.waypoint_count);
    println!("  stopovers: {}", summary.stopover_count);
    println!("  distance:  {:.1} m", summary.total_distance_m);
    println!("  duration:  {} s", summary.duration_seconds);
    println!("  steps:     {}", summary.step_count);
    println!("  recorded:  {} - {}", summary.recording_start, summary.recording_stop);

    if print_waypoints {
        for (i, waypoint) in session.waypoints().iter().enumerate() {
            println!(
                "  {:>4}: {:.6}, {:.6} {:>9.1} m{}",
                i,
                waypoint.fix.latitude,
                waypoint.fix.longitude,
                waypoint.distance_from_start,
                if waypoint.is_stopover { " (stop)" } else { "" }
            );
        }
    }

    ExitCode::SUCCESS
}
