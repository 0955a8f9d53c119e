//! Replay feed - drives the navigator from a recorded JSONL file
//!
//! Each non-empty line is one JSON object with a `kind` field naming an
//! engine callback or a UI command. Lines starting with `#` are comments.
//! Malformed lines are logged and skipped; the rest of the feed still plays.

use crate::domain::session::BuildFailure;
use crate::domain::types::{RoutePoint, RouterType};
use crate::services::navigator::{EngineEvent, NavEvent, UiCommand};
use crate::services::snapshot_builder::RawTick;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum FeedLine {
    Tick(RawTick),
    BuildProgress { percent: i32, router: RouterType },
    BuildSucceeded,
    BuildFailed { reason: BuildFailure },
    ChooseCustomStart,
    ChooseCurrentLocationStart { lat: f64, lon: f64 },
    PointChosen { point: RoutePoint },
    ShowAddStartFrame,
    ShowAddFinishFrame,
    SetRouter { router: RouterType },
    Cancel,
    Restart,
    Commit,
    Dismiss,
}

impl From<FeedLine> for NavEvent {
    fn from(line: FeedLine) -> Self {
        match line {
            FeedLine::Tick(raw) => NavEvent::Engine(EngineEvent::Tick(Box::new(raw))),
            FeedLine::BuildProgress { percent, router } => {
                NavEvent::Engine(EngineEvent::BuildProgress { percent, router })
            }
            FeedLine::BuildSucceeded => NavEvent::Engine(EngineEvent::BuildResult(Ok(()))),
            FeedLine::BuildFailed { reason } => {
                NavEvent::Engine(EngineEvent::BuildResult(Err(reason)))
            }
            FeedLine::ChooseCustomStart => NavEvent::Ui(UiCommand::ChooseCustomStart),
            FeedLine::ChooseCurrentLocationStart { lat, lon } => NavEvent::Ui(
                UiCommand::ChooseCurrentLocationStart(RoutePoint::my_position(lat, lon)),
            ),
            FeedLine::PointChosen { point } => NavEvent::Ui(UiCommand::PointChosen(point)),
            FeedLine::ShowAddStartFrame => NavEvent::Ui(UiCommand::ShowAddStartFrame),
            FeedLine::ShowAddFinishFrame => NavEvent::Ui(UiCommand::ShowAddFinishFrame),
            FeedLine::SetRouter { router } => NavEvent::Ui(UiCommand::SetRouterType(router)),
            FeedLine::Cancel => NavEvent::Ui(UiCommand::Cancel),
            FeedLine::Restart => NavEvent::Ui(UiCommand::Restart),
            FeedLine::Commit => NavEvent::Ui(UiCommand::Commit),
            FeedLine::Dismiss => NavEvent::Ui(UiCommand::Dismiss),
        }
    }
}

/// Parse one feed line; `Ok(None)` for blank lines and comments
pub fn parse_feed_line(line: &str) -> Result<Option<NavEvent>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let parsed: FeedLine = serde_json::from_str(trimmed)?;
    Ok(Some(parsed.into()))
}

/// Summary of one replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub sent: usize,
    pub skipped: usize,
}

/// Stream a feed file into the navigator channel.
///
/// Stops at end of file, on shutdown, or when the receiver is gone. The
/// sender is dropped on return, which lets the navigator loop finish.
pub async fn start_replay<P: AsRef<Path>>(
    path: P,
    pace: Duration,
    event_tx: mpsc::Sender<NavEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<ReplayStats> {
    let path = path.as_ref();
    let file = File::open(path)
        .await
        .with_context(|| format!("Failed to open replay feed {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut stats = ReplayStats::default();
    let mut line_no = 0usize;

    info!(file = %path.display(), pace_ms = %pace.as_millis(), "replay_started");

    loop {
        let line = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("replay_shutdown");
                    break;
                }
                continue;
            }
            line = lines.next_line() => {
                line.with_context(|| format!("Failed to read {}", path.display()))?
            }
        };
        let Some(line) = line else {
            break;
        };
        line_no += 1;

        let event = match parse_feed_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(line = %line_no, error = %e, "replay_line_skipped");
                stats.skipped += 1;
                continue;
            }
        };

        debug!(line = %line_no, "replay_event");
        if event_tx.send(event).await.is_err() {
            warn!("replay_receiver_closed");
            break;
        }
        stats.sent += 1;

        if !pace.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(pace) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("replay_shutdown");
                        break;
                    }
                }
            }
        }
    }

    info!(sent = %stats.sent, skipped = %stats.skipped, "replay_finished");
    Ok(stats)
}
