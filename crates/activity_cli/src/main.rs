//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `activity_core` linkage.
//! - Load an optional seed file and print the most recent activities as JSON.
//!
//! Usage: `activity_cli [seed.json] [limit]`
//! File logging starts when `ACTIVITY_LOG_DIR` names an absolute directory.

use activity_core::{
    default_log_level, init_logging, ActivityRepository, LatencyProfile, NoLatency, Operation,
    SeedSnapshot,
};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var("ACTIVITY_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let mut args = std::env::args().skip(1);
    let seed_path = args.next();
    let limit = match args.next().map(|raw| raw.trim().parse::<i64>()) {
        Some(Ok(limit)) => Some(limit),
        Some(Err(err)) => {
            eprintln!("invalid limit: {err}");
            return ExitCode::FAILURE;
        }
        None => None,
    };

    let seed = match seed_path.as_deref() {
        Some(path) => match SeedSnapshot::from_path(path) {
            Ok(seed) => seed,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => SeedSnapshot::empty(),
    };

    // Smoke runs skip simulated delay.
    let repo = ActivityRepository::new(&seed).with_latency(NoLatency);
    println!("activity_core version={}", activity_core::core_version());
    println!(
        "activity_core seeded={} default_list_all_delay_ms={}",
        seed.len(),
        LatencyProfile::default()
            .delay_for(Operation::ListAll)
            .as_millis()
    );

    let recent = repo.list_recent(limit).await;
    match serde_json::to_string_pretty(&recent) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to encode activities: {err}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
