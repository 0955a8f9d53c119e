//! Planning session data model
//!
//! A planning session covers endpoint selection and route building up to the
//! moment a route is committed to active navigation.

use crate::domain::types::{RoutePoint, RouterType};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

/// Why the engine could not build a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum BuildFailure {
    #[error("current position is unknown")]
    NoCurrentPosition,
    #[error("start point is not on a routable road")]
    StartPointNotFound,
    #[error("finish point is not on a routable road")]
    EndPointNotFound,
    #[error("intermediate point is not on a routable road")]
    IntermediatePointNotFound,
    #[error("points are in regions that are not connected")]
    PointsInDifferentRegions,
    #[error("no route between the selected points")]
    RouteNotFound,
    #[error("more map regions must be downloaded")]
    NeedMoreMaps,
    #[error("map data is too old")]
    FileTooOld,
    #[error("no transit route between the selected points")]
    TransitRouteNotFound,
    #[error("internal routing error")]
    InternalError,
}

impl BuildFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildFailure::NoCurrentPosition => "no_current_position",
            BuildFailure::StartPointNotFound => "start_point_not_found",
            BuildFailure::EndPointNotFound => "end_point_not_found",
            BuildFailure::IntermediatePointNotFound => "intermediate_point_not_found",
            BuildFailure::PointsInDifferentRegions => "points_in_different_regions",
            BuildFailure::RouteNotFound => "route_not_found",
            BuildFailure::NeedMoreMaps => "need_more_maps",
            BuildFailure::FileTooOld => "file_too_old",
            BuildFailure::TransitRouteNotFound => "transit_route_not_found",
            BuildFailure::InternalError => "internal_error",
        }
    }
}

/// Planning lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningState {
    Idle,
    AwaitingStart,
    AwaitingFinish,
    Building { progress: u8, router: RouterType },
    Ready,
    Failed(BuildFailure),
    Cancelled,
}

/// Payload-free discriminant of `PlanningState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTag {
    Idle,
    AwaitingStart,
    AwaitingFinish,
    Building,
    Ready,
    Failed,
    Cancelled,
}

impl StateTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateTag::Idle => "idle",
            StateTag::AwaitingStart => "awaiting_start",
            StateTag::AwaitingFinish => "awaiting_finish",
            StateTag::Building => "building",
            StateTag::Ready => "ready",
            StateTag::Failed => "failed",
            StateTag::Cancelled => "cancelled",
        }
    }
}

impl PlanningState {
    #[inline]
    pub fn tag(&self) -> StateTag {
        match self {
            PlanningState::Idle => StateTag::Idle,
            PlanningState::AwaitingStart => StateTag::AwaitingStart,
            PlanningState::AwaitingFinish => StateTag::AwaitingFinish,
            PlanningState::Building { .. } => StateTag::Building,
            PlanningState::Ready => StateTag::Ready,
            PlanningState::Failed(_) => StateTag::Failed,
            PlanningState::Cancelled => StateTag::Cancelled,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.tag().as_str()
    }

    /// Build progress, if a build is running
    pub fn progress(&self) -> Option<u8> {
        match self {
            PlanningState::Building { progress, .. } => Some(*progress),
            _ => None,
        }
    }

    /// Whether a cancel request has something to cancel
    pub fn is_active(&self) -> bool {
        !matches!(self, PlanningState::Idle | PlanningState::Cancelled)
    }
}

/// What is known about one endpoint of the route
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EndpointSelection {
    #[default]
    Unselected,
    Selected(RoutePoint),
    /// Selected before a restore; the geometry lives with the engine
    Restored,
}

impl EndpointSelection {
    pub fn is_selected(&self) -> bool {
        !matches!(self, EndpointSelection::Unselected)
    }

    pub fn point(&self) -> Option<&RoutePoint> {
        match self {
            EndpointSelection::Selected(point) => Some(point),
            _ => None,
        }
    }
}

/// One route-planning flow
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningSession {
    pub id: String,
    pub state: PlanningState,
    pub router: RouterType,
    pub start: EndpointSelection,
    pub finish: EndpointSelection,
}

impl PlanningSession {
    /// Create an idle session for the given router.
    ///
    /// # Example
    ///
    /// ```
    /// use nav_guidance::domain::session::{PlanningSession, PlanningState};
    /// use nav_guidance::domain::types::RouterType;
    ///
    /// let session = PlanningSession::new(RouterType::Pedestrian);
    /// assert_eq!(session.state, PlanningState::Idle);
    /// assert!(!session.start.is_selected());
    /// ```
    pub fn new(router: RouterType) -> Self {
        Self {
            id: new_uuid_v7(),
            state: PlanningState::Idle,
            router,
            start: EndpointSelection::Unselected,
            finish: EndpointSelection::Unselected,
        }
    }

    pub fn has_start(&self) -> bool {
        self.start.is_selected()
    }

    pub fn has_finish(&self) -> bool {
        self.finish.is_selected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = PlanningSession::new(RouterType::Vehicle);
        assert_eq!(session.state, PlanningState::Idle);
        assert_eq!(session.id.len(), 36);
        assert!(!session.has_start());
        assert!(!session.has_finish());
    }

    #[test]
    fn test_session_ids_unique() {
        let a = PlanningSession::new(RouterType::Vehicle);
        let b = PlanningSession::new(RouterType::Vehicle);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_state_tags() {
        let building = PlanningState::Building { progress: 40, router: RouterType::Bicycle };
        assert_eq!(building.tag(), StateTag::Building);
        assert_eq!(building.as_str(), "building");
        assert_eq!(building.progress(), Some(40));
        assert_eq!(PlanningState::Ready.progress(), None);
        assert_eq!(PlanningState::Failed(BuildFailure::RouteNotFound).as_str(), "failed");
    }

    #[test]
    fn test_is_active() {
        assert!(!PlanningState::Idle.is_active());
        assert!(!PlanningState::Cancelled.is_active());
        assert!(PlanningState::AwaitingStart.is_active());
        assert!(PlanningState::Ready.is_active());
        assert!(PlanningState::Failed(BuildFailure::NeedMoreMaps).is_active());
    }

    #[test]
    fn test_endpoint_selection() {
        let point = RoutePoint::new(1.0, 2.0);
        let selected = EndpointSelection::Selected(point.clone());
        assert!(selected.is_selected());
        assert_eq!(selected.point(), Some(&point));
        assert!(EndpointSelection::Restored.is_selected());
        assert_eq!(EndpointSelection::Restored.point(), None);
        assert!(!EndpointSelection::Unselected.is_selected());
    }

    #[test]
    fn test_build_failure_names() {
        assert_eq!(BuildFailure::NeedMoreMaps.as_str(), "need_more_maps");
        let parsed: BuildFailure = serde_json::from_str("\"route_not_found\"").unwrap();
        assert_eq!(parsed, BuildFailure::RouteNotFound);
    }
}
