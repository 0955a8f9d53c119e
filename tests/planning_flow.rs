//! End-to-end tests: replay feeds through the navigator loop

use nav_guidance::domain::maneuver::{LaneWay, VehicleManeuver};
use nav_guidance::domain::session::{BuildFailure, PlanningState};
use nav_guidance::domain::types::{RoutePoint, RouterType};
use nav_guidance::infra::{Config, Metrics};
use nav_guidance::io::{create_engine_link, start_replay};
use nav_guidance::services::{Endpoint, EngineRequest, NavEvent, Navigator, UiCommand};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::{mpsc, watch};

async fn replay_into(
    navigator: &mut Navigator<Vec<EngineRequest>>,
    path: &std::path::Path,
) -> nav_guidance::io::ReplayStats {
    let (event_tx, event_rx) = mpsc::channel(32);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let replay = tokio::spawn(start_replay(
        path.to_path_buf(),
        Duration::ZERO,
        event_tx,
        shutdown_rx.clone(),
    ));
    navigator.run(event_rx, shutdown_rx).await;
    replay.await.unwrap().unwrap()
}

fn create_navigator() -> Navigator<Vec<EngineRequest>> {
    Navigator::new(&Config::default(), Vec::new(), Arc::new(Metrics::new()))
}

#[tokio::test]
async fn test_demo_feed() {
    let mut navigator = create_navigator();
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("feeds/demo.jsonl");

    let stats = replay_into(&mut navigator, &path).await;
    assert_eq!(stats.skipped, 0);

    // Rejected tick left the following ones untouched; last one was clamped
    let snapshot = navigator.current_snapshot().unwrap();
    assert_eq!(snapshot.completion_percent(), 100.0);
    assert_eq!(snapshot.vehicle_maneuver(), VehicleManeuver::ReachedYourDestination);
    assert!(!snapshot.speed_limit_known());

    let metrics = navigator.metrics();
    assert_eq!(metrics.ticks_accepted(), 4);
    assert_eq!(metrics.ticks_rejected(), 1);
    assert_eq!(metrics.progress_ignored(), 2);
    assert_eq!(metrics.commands_rejected(), 0);

    assert_eq!(navigator.planning().state, PlanningState::Idle);
    assert_eq!(navigator.planning().router, RouterType::Pedestrian);

    let requests = navigator.planning_controller().engine();
    assert_eq!(requests.len(), 4);
    assert!(matches!(
        requests[0],
        EngineRequest::Build {
            start: Endpoint::CurrentPosition,
            finish: Endpoint::Point(_),
            router: RouterType::Vehicle,
        }
    ));
    assert!(matches!(requests[2], EngineRequest::Build { router: RouterType::Pedestrian, .. }));
    assert_eq!(requests[3], EngineRequest::Cancel);
}

#[tokio::test]
async fn test_snapshot_subscribers_see_latest() {
    let mut navigator = create_navigator();
    let mut rx = navigator.subscribe_snapshots();

    let mut feed = NamedTempFile::new().unwrap();
    writeln!(
        feed,
        r#"{{"kind":"tick","distance_to_target":{{"value":1.0,"unit":"miles"}},"distance_to_next_turn":{{"value":300.0,"unit":"feet"}},"completion_percent":40.0,"vehicle_ordinal":1,"next_vehicle_ordinal":16,"pedestrian_ordinal":0,"exit_number":3,"total_time_secs":95,"lanes":[{{"ways":[5]}},{{"ways":[6,7],"recommended":true}}],"speed_limit_mps":27.78}}"#
    )
    .unwrap();
    feed.flush().unwrap();

    replay_into(&mut navigator, feed.path()).await;

    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone().unwrap();
    assert_eq!(snapshot.next_vehicle_maneuver(), VehicleManeuver::ExitHighwayToRight);
    // Exit number only applies when the current maneuver is a highway exit
    assert_eq!(snapshot.exit_number(), 0);
    assert_eq!(snapshot.lanes().len(), 2);
    assert_eq!(snapshot.lanes()[1].ways.as_slice(), &[LaneWay::SlightRight, LaneWay::Right]);
    assert!(snapshot.lanes()[1].recommended);
    assert_eq!(snapshot.speed_limit_kmh(), Some(100));
}

#[tokio::test]
async fn test_failure_restart_and_teardown() {
    let mut navigator = create_navigator();

    let mut feed = NamedTempFile::new().unwrap();
    for line in [
        r#"{"kind":"choose_custom_start"}"#,
        r#"{"kind":"point_chosen","point":{"lat":48.85,"lon":2.35}}"#,
        r#"{"kind":"point_chosen","point":{"lat":48.86,"lon":2.29}}"#,
        r#"{"kind":"build_progress","percent":70,"router":"vehicle"}"#,
        r#"{"kind":"build_failed","reason":"need_more_maps"}"#,
        r#"{"kind":"commit"}"#,
    ] {
        writeln!(feed, "{line}").unwrap();
    }
    feed.flush().unwrap();

    replay_into(&mut navigator, feed.path()).await;

    assert_eq!(navigator.planning().state, PlanningState::Failed(BuildFailure::NeedMoreMaps));
    assert_eq!(navigator.metrics().commands_rejected(), 1);

    // Process teardown: the failure survives a save/restore cycle
    let blob = navigator.save();
    let mut revived = create_navigator();
    assert!(revived.restore(&blob));
    assert_eq!(revived.planning().state, PlanningState::Failed(BuildFailure::NeedMoreMaps));

    revived.handle_command(UiCommand::Restart).unwrap();
    assert_eq!(revived.planning().state, PlanningState::Idle);
}

#[tokio::test]
async fn test_restore_garbage_falls_back_to_idle() {
    let mut navigator = create_navigator();
    navigator
        .handle_command(UiCommand::ChooseCurrentLocationStart(RoutePoint::my_position(1.0, 1.0)))
        .unwrap();

    assert!(!navigator.restore(br#"{"v":7,"state":"ready"}"#));
    assert_eq!(navigator.planning().state, PlanningState::Idle);
    assert!(!navigator.planning().has_start());
    assert_eq!(navigator.metrics().restore_resets(), 1);
}

#[tokio::test]
async fn test_engine_link_carries_planning_requests() {
    let (link, worker) = create_engine_link(8);
    let worker = tokio::spawn(worker.run());
    let mut navigator = Navigator::new(&Config::default(), link, Arc::new(Metrics::new()));

    for event in [
        NavEvent::Ui(UiCommand::ChooseCustomStart),
        NavEvent::Ui(UiCommand::PointChosen(RoutePoint::new(1.0, 1.0))),
        NavEvent::Ui(UiCommand::PointChosen(RoutePoint::new(2.0, 2.0))),
        NavEvent::Ui(UiCommand::ShowAddFinishFrame),
    ] {
        navigator.process_event(event);
    }
    assert_eq!(navigator.planning().state, PlanningState::AwaitingFinish);

    // Build request, then the cancel issued when the finish frame reopened
    drop(navigator);
    assert_eq!(worker.await.unwrap(), 2);
}
