//! nav-guidance - turn-by-turn guidance state aggregator
//!
//! Runs the navigator against a recorded feed of engine callbacks and UI
//! commands, logging every published snapshot and planning transition.
//!
//! Module structure:
//! - `domain/` - Value types (maneuvers, snapshots, planning sessions)
//! - `io/` - External interfaces (engine link, replay feed)
//! - `services/` - Business logic (Navigator, SnapshotBuilder, planning)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use nav_guidance::domain::ManeuverKind;
use nav_guidance::infra::{Config, Metrics};
use nav_guidance::io::{create_engine_link, start_replay};
use nav_guidance::services::Navigator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Turn-by-turn guidance state aggregator
#[derive(Parser, Debug)]
#[command(name = "nav-guidance", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config/dev.toml")]
    config: String,

    /// Replay feed to play instead of the one named in the config
    #[arg(short, long)]
    feed: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG overrides the default INFO level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("nav-guidance starting");

    let args = Args::parse();

    let mut config = Config::load_from_path(&args.config);
    if let Some(feed) = &args.feed {
        config = config.with_replay_file(feed);
    }

    info!(
        config_file = %config.config_file(),
        completion_tolerance_pct = %config.completion_tolerance_pct(),
        default_router = %config.default_router().as_str(),
        event_buffer = %config.event_buffer(),
        metrics_interval_secs = %config.metrics_interval_secs(),
        replay_file = %config.replay_file(),
        replay_pace_ms = %config.replay_pace_ms(),
        "config_loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let metrics = Arc::new(Metrics::new());

    // Engine requests are drained off the navigator loop
    let (engine_link, engine_worker) = create_engine_link(config.event_buffer());
    tokio::spawn(engine_worker.run());

    let mut navigator = Navigator::new(&config, engine_link, metrics.clone());

    // Presentation stand-in: follow published snapshots
    let mut snapshots = navigator.subscribe_snapshots();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let current = snapshots.borrow_and_update().clone();
            match current {
                Some(snapshot) => info!(
                    completion_percent = %snapshot.completion_percent(),
                    distance_to_turn = %snapshot.distance_to_next_turn(),
                    distance_to_target = %snapshot.distance_to_target(),
                    maneuver = %snapshot.vehicle_maneuver().as_str(),
                    next_maneuver = %snapshot.next_vehicle_maneuver().as_str(),
                    next_street = %snapshot.next_street(),
                    speed_limit_kmh = ?snapshot.speed_limit_kmh(),
                    lanes = %snapshot.lanes().len(),
                    "guidance_update"
                ),
                None => info!("guidance_cleared"),
            }
        }
    });

    // Event channel (bounded for backpressure)
    let (event_tx, event_rx) = mpsc::channel(config.event_buffer());

    let replay_file = config.replay_file().to_string();
    let replay_pace = Duration::from_millis(config.replay_pace_ms());
    let replay_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = start_replay(&replay_file, replay_pace, event_tx, replay_shutdown).await {
            tracing::error!(error = %format!("{e:#}"), "replay_error");
        }
    });

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    // Runs until the feed is exhausted or shutdown is signalled
    navigator.run(event_rx, shutdown_rx).await;

    metrics.report().log();

    let blob = navigator.save();
    info!(
        session_id = %navigator.planning().id,
        state = %navigator.planning().state.as_str(),
        bytes = %blob.len(),
        "panel_state_saved"
    );

    info!("nav-guidance shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    // Single test: the environment is process-wide
    #[test]
    fn test_config_path_resolution() {
        std::env::remove_var("CONFIG_FILE");
        let args = Args::try_parse_from(["nav-guidance"]).unwrap();
        assert_eq!(args.config, "config/dev.toml");
        assert_eq!(args.feed, None);

        std::env::set_var("CONFIG_FILE", "config/walk.toml");
        let args = Args::try_parse_from(["nav-guidance"]).unwrap();
        assert_eq!(args.config, "config/walk.toml");

        let args = Args::try_parse_from([
            "nav-guidance",
            "--config",
            "config/car.toml",
            "-f",
            "feeds/x.jsonl",
        ])
        .unwrap();
        assert_eq!(args.config, "config/car.toml");
        assert_eq!(args.feed.as_deref(), Some("feeds/x.jsonl"));

        std::env::remove_var("CONFIG_FILE");
    }
}
