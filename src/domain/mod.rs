//! Domain models - navigation value types and the planning session model
//!
//! - `maneuver` - stable tag tables for vehicle/pedestrian maneuvers and lanes
//! - `snapshot` - `RoutingSnapshot`, the immutable per-tick guidance state
//! - `session` - `PlanningSession` and its lifecycle states
//! - `types` - distances, router types, route points

pub mod maneuver;
pub mod session;
pub mod snapshot;
pub mod types;

// Re-export commonly used types at module level
pub use maneuver::{InvalidOrdinal, LaneWay, ManeuverKind, PedestrianManeuver, VehicleManeuver};
pub use session::{BuildFailure, EndpointSelection, PlanningSession, PlanningState, StateTag};
pub use snapshot::{LaneGuidance, RoutingSnapshot};
pub use types::{Distance, DistanceUnit, RoutePoint, RouterType};
