//! Route-planning session controller
//!
//! Owns exactly one `PlanningSession` and is the only code that changes its
//! state. Commands that are not valid in the current state are rejected with
//! `SessionError` and leave the session untouched. Engine callbacks that
//! arrive outside a build (late ticks after a cancel) are swallowed.
//!
//! The controller is not internally synchronized; callers serialize access
//! (see `Navigator::run`).

use crate::domain::session::{
    BuildFailure, EndpointSelection, PlanningSession, PlanningState, StateTag,
};
use crate::domain::types::{RoutePoint, RouterType};
use crate::services::engine::{Endpoint, RouteEngine};
use crate::services::panel_state;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Command rejected by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{command} is not valid while {}", .state.as_str())]
    IllegalTransition { state: StateTag, command: &'static str },
}

/// Result of feeding a build progress tick to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Progress stored
    Applied(u8),
    /// Lower than the current progress for the same router; ignored
    Regressed { current: u8 },
    /// No build running; ignored
    Stale,
}

/// Route handed over to active navigation
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedRoute {
    pub session_id: String,
    pub start: EndpointSelection,
    pub finish: EndpointSelection,
    pub router: RouterType,
}

/// Finite-state controller for the planning UI lifecycle
pub struct PlanningSessionController<E> {
    session: PlanningSession,
    engine: E,
    default_router: RouterType,
}

impl<E: RouteEngine> PlanningSessionController<E> {
    pub fn new(engine: E, default_router: RouterType) -> Self {
        Self { session: PlanningSession::new(default_router), engine, default_router }
    }

    /// Read-only view for rendering
    pub fn session(&self) -> &PlanningSession {
        &self.session
    }

    pub fn state(&self) -> PlanningState {
        self.session.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn transition(&mut self, to: PlanningState, command: &'static str) {
        info!(
            session_id = %self.session.id,
            from = %self.session.state.as_str(),
            to = %to.as_str(),
            command = %command,
            "planning_transition"
        );
        self.session.state = to;
    }

    fn reject(&self, command: &'static str) -> SessionError {
        debug!(
            session_id = %self.session.id,
            state = %self.session.state.as_str(),
            command = %command,
            "planning_command_rejected"
        );
        SessionError::IllegalTransition { state: self.session.state.tag(), command }
    }

    /// Idle -> AwaitingStart
    pub fn choose_custom_start(&mut self) -> Result<(), SessionError> {
        match self.session.state {
            PlanningState::Idle => {
                self.transition(PlanningState::AwaitingStart, "choose_custom_start");
                Ok(())
            }
            _ => Err(self.reject("choose_custom_start")),
        }
    }

    /// Idle -> AwaitingFinish, with the current position as start
    pub fn choose_current_location_start(
        &mut self,
        current: RoutePoint,
    ) -> Result<(), SessionError> {
        match self.session.state {
            PlanningState::Idle => {
                self.session.start = EndpointSelection::Selected(current);
                self.transition(PlanningState::AwaitingFinish, "choose_current_location_start");
                Ok(())
            }
            _ => Err(self.reject("choose_current_location_start")),
        }
    }

    /// Idle / AwaitingFinish -> AwaitingStart
    pub fn show_add_start_frame(&mut self) -> Result<(), SessionError> {
        match self.session.state {
            PlanningState::Idle | PlanningState::AwaitingFinish => {
                self.transition(PlanningState::AwaitingStart, "show_add_start_frame");
                Ok(())
            }
            _ => Err(self.reject("show_add_start_frame")),
        }
    }

    /// Any state -> AwaitingFinish; a running build is aborted at the engine
    pub fn show_add_finish_frame(&mut self) {
        if matches!(self.session.state, PlanningState::Building { .. }) {
            self.engine.request_cancel();
        }
        self.session.finish = EndpointSelection::Unselected;
        self.transition(PlanningState::AwaitingFinish, "show_add_finish_frame");
    }

    /// Resolve the endpoint the session is waiting for.
    ///
    /// Choosing the finish point starts a build with the session's router.
    pub fn point_chosen(&mut self, point: RoutePoint) -> Result<(), SessionError> {
        match self.session.state {
            PlanningState::AwaitingStart => {
                self.session.start = EndpointSelection::Selected(point);
                self.transition(PlanningState::AwaitingFinish, "point_chosen");
                Ok(())
            }
            PlanningState::AwaitingFinish => {
                self.session.finish = EndpointSelection::Selected(point);
                self.start_build("point_chosen");
                Ok(())
            }
            _ => Err(self.reject("point_chosen")),
        }
    }

    fn start_build(&mut self, command: &'static str) {
        let router = self.session.router;
        let start = Endpoint::from_selection(&self.session.start);
        let finish = Endpoint::from_selection(&self.session.finish);
        self.engine.request_build(start, finish, router);
        self.transition(PlanningState::Building { progress: 0, router }, command);
    }

    /// Select the router; a running build restarts with the new router
    pub fn set_router_type(&mut self, router: RouterType) {
        let previous = self.session.router;
        self.session.router = router;

        if let PlanningState::Building { router: building, .. } = self.session.state {
            if building != router {
                info!(
                    session_id = %self.session.id,
                    from = %previous.as_str(),
                    to = %router.as_str(),
                    "build_restarted_for_router"
                );
                self.start_build("set_router_type");
            }
        }
    }

    /// Apply a progress tick from the engine.
    ///
    /// Progress is clamped to 0..=100. For the same router it never goes
    /// down: a lower value is reported as `Regressed` and dropped. A tick for
    /// a different router starts a new progression from 0, so its value is
    /// taken as-is and the router is replaced.
    pub fn update_build_progress(&mut self, progress: i32, router: RouterType) -> ProgressUpdate {
        let PlanningState::Building { progress: current, router: current_router } =
            self.session.state
        else {
            debug!(
                session_id = %self.session.id,
                state = %self.session.state.as_str(),
                progress = %progress,
                "build_progress_stale"
            );
            return ProgressUpdate::Stale;
        };

        let progress = progress.clamp(0, 100) as u8;

        if router == current_router && progress < current {
            debug!(
                session_id = %self.session.id,
                current = %current,
                progress = %progress,
                "build_progress_regressed"
            );
            return ProgressUpdate::Regressed { current };
        }

        if router != current_router {
            info!(
                session_id = %self.session.id,
                from = %current_router.as_str(),
                to = %router.as_str(),
                "build_router_changed"
            );
            self.session.router = router;
        }

        self.session.state = PlanningState::Building { progress, router };
        ProgressUpdate::Applied(progress)
    }

    /// Apply the engine's build outcome; returns false when no build was running
    pub fn on_build_result(&mut self, result: Result<(), BuildFailure>) -> bool {
        if !matches!(self.session.state, PlanningState::Building { .. }) {
            debug!(
                session_id = %self.session.id,
                state = %self.session.state.as_str(),
                "build_result_stale"
            );
            return false;
        }

        match result {
            Ok(()) => self.transition(PlanningState::Ready, "build_succeeded"),
            Err(failure) => {
                warn!(
                    session_id = %self.session.id,
                    failure = %failure.as_str(),
                    "route_build_failed"
                );
                self.transition(PlanningState::Failed(failure), "build_failed");
            }
        }
        true
    }

    /// Cancel the session.
    ///
    /// Returns whether there was anything to cancel; the presentation layer
    /// uses this to decide whether to consume a back gesture.
    pub fn cancel(&mut self) -> bool {
        if !self.session.state.is_active() {
            debug!(
                session_id = %self.session.id,
                state = %self.session.state.as_str(),
                "cancel_ignored"
            );
            return false;
        }

        if matches!(self.session.state, PlanningState::Building { .. }) {
            self.engine.request_cancel();
        }
        self.transition(PlanningState::Cancelled, "cancel");
        true
    }

    /// Cancelled / Failed -> Idle with a fresh session
    pub fn restart(&mut self) -> Result<(), SessionError> {
        match self.session.state {
            PlanningState::Cancelled | PlanningState::Failed(_) => {
                self.replace_session("restart");
                Ok(())
            }
            _ => Err(self.reject("restart")),
        }
    }

    /// Hand a built route over to navigation and reset to Idle
    pub fn commit(&mut self) -> Result<CommittedRoute, SessionError> {
        if self.session.state != PlanningState::Ready {
            return Err(self.reject("commit"));
        }

        let route = CommittedRoute {
            session_id: self.session.id.clone(),
            start: std::mem::take(&mut self.session.start),
            finish: std::mem::take(&mut self.session.finish),
            router: self.session.router,
        };
        info!(session_id = %route.session_id, router = %route.router.as_str(), "route_committed");
        self.replace_session("commit");
        Ok(route)
    }

    /// Drop the planning flow entirely, aborting any running build
    pub fn dismiss(&mut self) {
        if matches!(self.session.state, PlanningState::Building { .. }) {
            self.engine.request_cancel();
        }
        self.replace_session("dismiss");
    }

    fn replace_session(&mut self, command: &'static str) {
        let next = PlanningSession::new(self.session.router);
        info!(
            previous_session_id = %self.session.id,
            session_id = %next.id,
            from = %self.session.state.as_str(),
            command = %command,
            "planning_session_reset"
        );
        self.session = next;
    }

    /// Serialize the panel state for process teardown
    pub fn save(&self) -> Vec<u8> {
        panel_state::save(&self.session)
    }

    /// Restore a saved panel state; returns false when it fell back to Idle
    pub fn restore(&mut self, blob: &[u8]) -> bool {
        match panel_state::restore(blob) {
            Ok(session) => {
                info!(
                    session_id = %session.id,
                    state = %session.state.as_str(),
                    router = %session.router.as_str(),
                    "panel_state_restored"
                );
                self.session = session;
                true
            }
            Err(e) => {
                warn!(error = %e, "panel_state_reset");
                self.session = PlanningSession::new(self.default_router);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::engine::EngineRequest;

    type TestController = PlanningSessionController<Vec<EngineRequest>>;

    fn controller() -> TestController {
        PlanningSessionController::new(Vec::new(), RouterType::Vehicle)
    }

    fn start_point() -> RoutePoint {
        RoutePoint::new(52.52, 13.40).with_title("Start")
    }

    fn finish_point() -> RoutePoint {
        RoutePoint::new(52.50, 13.45).with_title("Finish")
    }

    fn building_controller() -> TestController {
        let mut c = controller();
        c.choose_custom_start().unwrap();
        c.point_chosen(start_point()).unwrap();
        c.point_chosen(finish_point()).unwrap();
        c
    }

    #[test]
    fn test_cancel_from_idle() {
        let mut c = controller();
        assert!(!c.cancel());
        assert_eq!(c.state(), PlanningState::Idle);
        assert!(c.engine().is_empty());
    }

    #[test]
    fn test_custom_start_flow_builds_route() {
        let c = building_controller();

        assert_eq!(
            c.state(),
            PlanningState::Building { progress: 0, router: RouterType::Vehicle }
        );
        assert_eq!(c.session().start.point(), Some(&start_point()));
        assert_eq!(
            c.engine(),
            &vec![EngineRequest::Build {
                start: Endpoint::Point(start_point()),
                finish: Endpoint::Point(finish_point()),
                router: RouterType::Vehicle,
            }]
        );
    }

    #[test]
    fn test_current_location_start() {
        let mut c = controller();
        let here = RoutePoint::my_position(52.0, 13.0);

        c.choose_current_location_start(here.clone()).unwrap();

        assert_eq!(c.state(), PlanningState::AwaitingFinish);
        assert_eq!(c.session().start, EndpointSelection::Selected(here));

        c.point_chosen(finish_point()).unwrap();
        assert_eq!(
            c.engine().last(),
            Some(&EngineRequest::Build {
                start: Endpoint::CurrentPosition,
                finish: Endpoint::Point(finish_point()),
                router: RouterType::Vehicle,
            })
        );
    }

    #[test]
    fn test_illegal_commands_rejected() {
        let mut c = controller();

        assert_eq!(
            c.point_chosen(start_point()),
            Err(SessionError::IllegalTransition { state: StateTag::Idle, command: "point_chosen" })
        );
        assert!(c.restart().is_err());
        assert!(c.commit().is_err());

        c.choose_custom_start().unwrap();
        assert!(c.choose_custom_start().is_err());
        assert!(c.choose_current_location_start(start_point()).is_err());
        assert_eq!(c.state(), PlanningState::AwaitingStart);
    }

    #[test]
    fn test_error_message() {
        let err = SessionError::IllegalTransition { state: StateTag::Ready, command: "restart" };
        assert_eq!(err.to_string(), "restart is not valid while ready");
    }

    #[test]
    fn test_show_add_start_frame() {
        let mut c = controller();
        c.show_add_start_frame().unwrap();
        assert_eq!(c.state(), PlanningState::AwaitingStart);

        c.point_chosen(start_point()).unwrap();
        assert_eq!(c.state(), PlanningState::AwaitingFinish);
        c.show_add_start_frame().unwrap();
        assert_eq!(c.state(), PlanningState::AwaitingStart);

        let mut c = building_controller();
        assert!(c.show_add_start_frame().is_err());
    }

    #[test]
    fn test_show_add_finish_frame_from_building_cancels_build() {
        let mut c = building_controller();

        c.show_add_finish_frame();

        assert_eq!(c.state(), PlanningState::AwaitingFinish);
        assert!(!c.session().has_finish());
        assert!(c.session().has_start());
        assert_eq!(c.engine().last(), Some(&EngineRequest::Cancel));
    }

    #[test]
    fn test_show_add_finish_frame_from_any_state() {
        let mut c = controller();
        c.show_add_finish_frame();
        assert_eq!(c.state(), PlanningState::AwaitingFinish);

        c.cancel();
        c.show_add_finish_frame();
        assert_eq!(c.state(), PlanningState::AwaitingFinish);
    }

    #[test]
    fn test_progress_monotonic_same_router() {
        let mut c = building_controller();
        assert_eq!(c.update_build_progress(40, RouterType::Vehicle), ProgressUpdate::Applied(40));

        assert_eq!(c.update_build_progress(55, RouterType::Vehicle), ProgressUpdate::Applied(55));
        assert_eq!(c.state().progress(), Some(55));

        assert_eq!(
            c.update_build_progress(30, RouterType::Vehicle),
            ProgressUpdate::Regressed { current: 55 }
        );
        assert_eq!(
            c.state(),
            PlanningState::Building { progress: 55, router: RouterType::Vehicle }
        );

        assert_eq!(c.update_build_progress(55, RouterType::Vehicle), ProgressUpdate::Applied(55));
    }

    #[test]
    fn test_progress_resets_on_router_change() {
        let mut c = building_controller();
        c.update_build_progress(40, RouterType::Vehicle);

        assert_eq!(
            c.update_build_progress(30, RouterType::Pedestrian),
            ProgressUpdate::Applied(30)
        );
        assert_eq!(
            c.state(),
            PlanningState::Building { progress: 30, router: RouterType::Pedestrian }
        );
        assert_eq!(c.session().router, RouterType::Pedestrian);
    }

    #[test]
    fn test_progress_clamped() {
        let mut c = building_controller();
        assert_eq!(c.update_build_progress(250, RouterType::Vehicle), ProgressUpdate::Applied(100));

        let mut c = building_controller();
        assert_eq!(c.update_build_progress(-7, RouterType::Vehicle), ProgressUpdate::Applied(0));
    }

    #[test]
    fn test_progress_outside_building_is_stale() {
        let mut c = controller();
        assert_eq!(c.update_build_progress(10, RouterType::Vehicle), ProgressUpdate::Stale);
        assert_eq!(c.state(), PlanningState::Idle);
    }

    #[test]
    fn test_late_progress_after_cancel() {
        let mut c = building_controller();
        c.update_build_progress(40, RouterType::Vehicle);

        assert!(c.cancel());
        assert_eq!(c.state(), PlanningState::Cancelled);
        assert_eq!(c.engine().last(), Some(&EngineRequest::Cancel));

        assert_eq!(c.update_build_progress(80, RouterType::Vehicle), ProgressUpdate::Stale);
        assert!(!c.on_build_result(Ok(())));
        assert_eq!(c.state(), PlanningState::Cancelled);
    }

    #[test]
    fn test_build_success_and_commit() {
        let mut c = building_controller();
        let session_id = c.session().id.clone();

        assert!(c.on_build_result(Ok(())));
        assert_eq!(c.state(), PlanningState::Ready);

        let route = c.commit().unwrap();
        assert_eq!(route.session_id, session_id);
        assert_eq!(route.finish.point(), Some(&finish_point()));
        assert_eq!(route.router, RouterType::Vehicle);

        assert_eq!(c.state(), PlanningState::Idle);
        assert_ne!(c.session().id, session_id);
        assert!(!c.session().has_start());
    }

    #[test]
    fn test_build_failure_then_restart() {
        let mut c = building_controller();

        assert!(c.on_build_result(Err(BuildFailure::RouteNotFound)));
        assert_eq!(c.state(), PlanningState::Failed(BuildFailure::RouteNotFound));

        c.restart().unwrap();
        assert_eq!(c.state(), PlanningState::Idle);
        assert!(!c.session().has_finish());
    }

    #[test]
    fn test_cancel_from_every_active_state() {
        let mut c = controller();
        c.choose_custom_start().unwrap();
        assert!(c.cancel());

        let mut c = controller();
        c.choose_current_location_start(start_point()).unwrap();
        assert!(c.cancel());

        let mut c = building_controller();
        c.on_build_result(Ok(()));
        assert!(c.cancel());
        assert!(!c.engine().contains(&EngineRequest::Cancel));

        let mut c = building_controller();
        c.on_build_result(Err(BuildFailure::NeedMoreMaps));
        assert!(c.cancel());

        assert!(!c.cancel());
        c.restart().unwrap();
        assert!(!c.cancel());
    }

    #[test]
    fn test_router_change_during_build_restarts() {
        let mut c = building_controller();
        c.update_build_progress(60, RouterType::Vehicle);

        c.set_router_type(RouterType::Bicycle);

        assert_eq!(
            c.state(),
            PlanningState::Building { progress: 0, router: RouterType::Bicycle }
        );
        assert_eq!(c.engine().len(), 2);
        assert!(matches!(
            c.engine().last(),
            Some(EngineRequest::Build { router: RouterType::Bicycle, .. })
        ));
    }

    #[test]
    fn test_router_change_outside_build() {
        let mut c = controller();
        c.set_router_type(RouterType::Transit);
        assert_eq!(c.session().router, RouterType::Transit);
        assert_eq!(c.state(), PlanningState::Idle);
        assert!(c.engine().is_empty());
    }

    #[test]
    fn test_dismiss_aborts_build() {
        let mut c = building_controller();
        c.dismiss();
        assert_eq!(c.state(), PlanningState::Idle);
        assert_eq!(c.engine().last(), Some(&EngineRequest::Cancel));
    }

    #[test]
    fn test_save_restore_round_trip() {
        let mut c = building_controller();
        c.update_build_progress(70, RouterType::Vehicle);
        let blob = c.save();

        let mut restored = controller();
        assert!(restored.restore(&blob));
        assert_eq!(
            restored.state(),
            PlanningState::Building { progress: 70, router: RouterType::Vehicle }
        );
        assert!(restored.session().has_start());
        assert!(restored.session().has_finish());
    }

    #[test]
    fn test_restored_custom_start_stays_with_engine() {
        let mut c = controller();
        c.choose_custom_start().unwrap();
        c.point_chosen(start_point()).unwrap();
        let blob = c.save();

        let mut restored = controller();
        assert!(restored.restore(&blob));
        assert_eq!(restored.state(), PlanningState::AwaitingFinish);
        restored.point_chosen(finish_point()).unwrap();

        // The custom start must not turn into "route from here"
        assert_eq!(
            restored.engine(),
            &vec![EngineRequest::Build {
                start: Endpoint::EngineHeld,
                finish: Endpoint::Point(finish_point()),
                router: RouterType::Vehicle,
            }]
        );
    }

    #[test]
    fn test_restore_unknown_version_resets() {
        let mut c = building_controller();
        assert!(!c.restore(br#"{"v":99,"state":"ready"}"#));
        assert_eq!(c.state(), PlanningState::Idle);
        assert_eq!(c.session().router, RouterType::Vehicle);
    }
}
