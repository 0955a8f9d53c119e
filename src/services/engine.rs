//! Outbound interface to the routing engine
//!
//! The core never computes routes itself. It asks the engine to start or
//! abort a build and observes the outcome through progress/result callbacks.

use crate::domain::session::EndpointSelection;
use crate::domain::types::{RoutePoint, RouterType};

/// Which point a build should use for one end of the route
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    /// A point the user picked
    Point(RoutePoint),
    /// Wherever the device is when the engine builds
    CurrentPosition,
    /// Whatever the engine already has for this end; used after a restore,
    /// where the selection survived but its geometry stayed in the engine
    EngineHeld,
}

impl Endpoint {
    pub fn from_selection(selection: &EndpointSelection) -> Self {
        match selection {
            EndpointSelection::Selected(point) if point.my_position => Endpoint::CurrentPosition,
            EndpointSelection::Selected(point) => Endpoint::Point(point.clone()),
            EndpointSelection::Restored => Endpoint::EngineHeld,
            EndpointSelection::Unselected => Endpoint::CurrentPosition,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Point(_) => "point",
            Endpoint::CurrentPosition => "current_position",
            Endpoint::EngineHeld => "engine_held",
        }
    }
}

/// Request sent from the planning controller to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineRequest {
    Build { start: Endpoint, finish: Endpoint, router: RouterType },
    /// Abort the build in flight, if any
    Cancel,
}

impl EngineRequest {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineRequest::Build { .. } => "build",
            EngineRequest::Cancel => "cancel",
        }
    }
}

/// Fire-and-forget sink for engine requests
pub trait RouteEngine {
    fn submit(&mut self, request: EngineRequest);

    fn request_build(&mut self, start: Endpoint, finish: Endpoint, router: RouterType) {
        self.submit(EngineRequest::Build { start, finish, router });
    }

    fn request_cancel(&mut self) {
        self.submit(EngineRequest::Cancel);
    }
}

/// Collects requests in memory; used when no engine is attached and in tests
impl RouteEngine for Vec<EngineRequest> {
    fn submit(&mut self, request: EngineRequest) {
        self.push(request);
    }
}
