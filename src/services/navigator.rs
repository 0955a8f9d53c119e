//! Navigation state aggregator and event orchestration
//!
//! The Navigator is the single owner of guidance state. It coordinates:
//! - Snapshot publishing (engine ticks -> validated `RoutingSnapshot`s)
//! - The planning session (UI commands and engine build callbacks)
//! - Panel state save/restore
//!
//! Engine callbacks and UI commands are funnelled through one channel and
//! applied one at a time by `run`, so no two transitions ever overlap.
//! Readers get snapshots through a `watch` channel as `Arc`s and never see a
//! partially built value.

use crate::domain::maneuver::ManeuverKind;
use crate::domain::session::{BuildFailure, PlanningSession};
use crate::domain::snapshot::RoutingSnapshot;
use crate::domain::types::{RoutePoint, RouterType};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::services::engine::RouteEngine;
use crate::services::planning::{
    CommittedRoute, PlanningSessionController, ProgressUpdate, SessionError,
};
use crate::services::snapshot_builder::{RawTick, SnapshotBuilder};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

/// Callback from the routing/positioning engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Tick(Box<RawTick>),
    BuildProgress { percent: i32, router: RouterType },
    BuildResult(Result<(), BuildFailure>),
}

/// Command from the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    ChooseCustomStart,
    ChooseCurrentLocationStart(RoutePoint),
    PointChosen(RoutePoint),
    ShowAddStartFrame,
    ShowAddFinishFrame,
    SetRouterType(RouterType),
    Cancel,
    Restart,
    Commit,
    Dismiss,
}

impl UiCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiCommand::ChooseCustomStart => "choose_custom_start",
            UiCommand::ChooseCurrentLocationStart(_) => "choose_current_location_start",
            UiCommand::PointChosen(_) => "point_chosen",
            UiCommand::ShowAddStartFrame => "show_add_start_frame",
            UiCommand::ShowAddFinishFrame => "show_add_finish_frame",
            UiCommand::SetRouterType(_) => "set_router_type",
            UiCommand::Cancel => "cancel",
            UiCommand::Restart => "restart",
            UiCommand::Commit => "commit",
            UiCommand::Dismiss => "dismiss",
        }
    }
}

/// Anything the navigator loop consumes
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    Engine(EngineEvent),
    Ui(UiCommand),
}

/// What a successfully applied UI command produced
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Applied,
    /// Result of `cancel`: whether a session was active
    Cancelled(bool),
    Committed(CommittedRoute),
}

/// Shared handle presentation components read snapshots from
pub type SnapshotReceiver = watch::Receiver<Option<Arc<RoutingSnapshot>>>;

/// Central owner of guidance and planning state
pub struct Navigator<E> {
    builder: SnapshotBuilder,
    planning: PlanningSessionController<E>,
    snapshot_tx: watch::Sender<Option<Arc<RoutingSnapshot>>>,
    metrics: Arc<Metrics>,
    metrics_interval_secs: u64,
}

impl<E: RouteEngine> Navigator<E> {
    pub fn new(config: &Config, engine: E, metrics: Arc<Metrics>) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            builder: SnapshotBuilder::from_config(config),
            planning: PlanningSessionController::new(engine, config.default_router()),
            snapshot_tx,
            metrics,
            metrics_interval_secs: config.metrics_interval_secs(),
        }
    }

    /// Consume events until the channel closes or shutdown is signalled
    pub async fn run(
        &mut self,
        mut event_rx: mpsc::Receiver<NavEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let reporting = self.metrics_interval_secs > 0;
        let mut report_interval = interval(Duration::from_secs(self.metrics_interval_secs.max(1)));

        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Some(e) => self.process_event(e),
                        None => break, // Channel closed
                    }
                }
                _ = report_interval.tick(), if reporting => {
                    self.metrics.report().log();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("navigator_shutdown");
                        break;
                    }
                }
            }
        }
    }

    /// Apply a single event
    pub fn process_event(&mut self, event: NavEvent) {
        match event {
            NavEvent::Engine(EngineEvent::Tick(raw)) => {
                self.on_tick(&raw);
            }
            NavEvent::Engine(EngineEvent::BuildProgress { percent, router }) => {
                self.on_build_progress(percent, router);
            }
            NavEvent::Engine(EngineEvent::BuildResult(result)) => {
                self.on_build_result(result);
            }
            NavEvent::Ui(command) => {
                // Rejections are logged and counted by handle_command
                let _ = self.handle_command(command);
            }
        }
    }

    /// Validate a raw tick and publish it; returns false if it was discarded
    pub fn on_tick(&mut self, raw: &RawTick) -> bool {
        let started = Instant::now();
        let result = self.builder.build(raw);
        let latency_us = started.elapsed().as_micros() as u64;

        match result {
            Ok(snapshot) => {
                debug!(
                    completion_percent = %snapshot.completion_percent(),
                    maneuver = %snapshot.vehicle_maneuver().as_str(),
                    distance_to_turn = %snapshot.distance_to_next_turn(),
                    "snapshot_published"
                );
                self.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
                self.metrics.record_tick(true, latency_us);
                true
            }
            Err(e) => {
                warn!(error = %e, reason = %e.as_str(), "tick_rejected");
                self.metrics.record_tick(false, latency_us);
                false
            }
        }
    }

    pub fn on_build_progress(&mut self, percent: i32, router: RouterType) -> ProgressUpdate {
        let update = self.planning.update_build_progress(percent, router);
        self.metrics.record_progress(matches!(update, ProgressUpdate::Applied(_)));
        update
    }

    pub fn on_build_result(&mut self, result: Result<(), BuildFailure>) -> bool {
        let succeeded = result.is_ok();
        let applied = self.planning.on_build_result(result);
        if applied {
            self.metrics.record_build_result(succeeded);
        }
        applied
    }

    /// Apply a presentation command to the planning session
    pub fn handle_command(&mut self, command: UiCommand) -> Result<CommandOutcome, SessionError> {
        let name = command.as_str();
        let result = match command {
            UiCommand::ChooseCustomStart => {
                self.planning.choose_custom_start().map(|_| CommandOutcome::Applied)
            }
            UiCommand::ChooseCurrentLocationStart(point) => self
                .planning
                .choose_current_location_start(point)
                .map(|_| CommandOutcome::Applied),
            UiCommand::PointChosen(point) => {
                self.planning.point_chosen(point).map(|_| CommandOutcome::Applied)
            }
            UiCommand::ShowAddStartFrame => {
                self.planning.show_add_start_frame().map(|_| CommandOutcome::Applied)
            }
            UiCommand::ShowAddFinishFrame => {
                self.planning.show_add_finish_frame();
                Ok(CommandOutcome::Applied)
            }
            UiCommand::SetRouterType(router) => {
                self.planning.set_router_type(router);
                Ok(CommandOutcome::Applied)
            }
            UiCommand::Cancel => Ok(CommandOutcome::Cancelled(self.planning.cancel())),
            UiCommand::Restart => self.planning.restart().map(|_| CommandOutcome::Applied),
            UiCommand::Commit => self.planning.commit().map(|route| {
                // Guidance for the previous route no longer applies
                self.snapshot_tx.send_replace(None);
                CommandOutcome::Committed(route)
            }),
            UiCommand::Dismiss => {
                self.planning.dismiss();
                Ok(CommandOutcome::Applied)
            }
        };

        if let Err(e) = &result {
            debug!(command = %name, error = %e, "ui_command_rejected");
            self.metrics.record_command_rejected();
        }
        result
    }

    /// Back-navigation hook: true when the planning flow consumed the gesture
    pub fn cancel(&mut self) -> bool {
        self.planning.cancel()
    }

    /// Latest snapshot, `None` before the first accepted tick
    pub fn current_snapshot(&self) -> Option<Arc<RoutingSnapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> SnapshotReceiver {
        self.snapshot_tx.subscribe()
    }

    /// Read-only projection of the planning session
    pub fn planning(&self) -> &PlanningSession {
        self.planning.session()
    }

    pub fn planning_controller(&self) -> &PlanningSessionController<E> {
        &self.planning
    }

    pub fn save(&self) -> Vec<u8> {
        self.planning.save()
    }

    /// Restore panel state; returns false when it fell back to Idle
    pub fn restore(&mut self, blob: &[u8]) -> bool {
        let restored = self.planning.restore(blob);
        if !restored {
            self.metrics.record_restore_reset();
        }
        restored
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}
