//! Routing snapshot - one tick of turn-by-turn guidance
//!
//! A `RoutingSnapshot` is built once, validated, and never mutated. The next
//! tick produces a new snapshot that replaces it. Construction goes through
//! `SnapshotBuilder`, which is the only place that can assemble one.

use crate::domain::maneuver::{LaneWay, PedestrianManeuver, VehicleManeuver};
use crate::domain::types::Distance;
use serde::Serialize;
use smallvec::SmallVec;

/// Speed limit value reported when the engine has no limit for the road
pub const SPEED_LIMIT_UNKNOWN: f64 = -1.0;

/// Guidance for a single lane
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneGuidance {
    pub ways: SmallVec<[LaneWay; 4]>,
    pub recommended: bool,
}

impl LaneGuidance {
    pub fn new(ways: &[LaneWay], recommended: bool) -> Self {
        Self { ways: SmallVec::from_slice(ways), recommended }
    }
}

/// Immutable guidance state for one positioning tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingSnapshot {
    pub(crate) distance_to_target: Distance,
    pub(crate) distance_to_next_turn: Distance,
    pub(crate) total_time_secs: u32,
    pub(crate) current_street: String,
    pub(crate) next_street: String,
    pub(crate) next_next_street: String,
    pub(crate) completion_percent: f64,
    pub(crate) vehicle_maneuver: VehicleManeuver,
    pub(crate) next_vehicle_maneuver: VehicleManeuver,
    pub(crate) pedestrian_maneuver: PedestrianManeuver,
    pub(crate) exit_number: u32,
    pub(crate) lanes: Vec<LaneGuidance>,
    pub(crate) speed_limit_mps: f64,
    pub(crate) speed_limit_exceeded: bool,
    pub(crate) should_play_warning_signal: bool,
}

impl RoutingSnapshot {
    pub fn distance_to_target(&self) -> Distance {
        self.distance_to_target
    }

    pub fn distance_to_next_turn(&self) -> Distance {
        self.distance_to_next_turn
    }

    pub fn total_time_secs(&self) -> u32 {
        self.total_time_secs
    }

    pub fn current_street(&self) -> &str {
        &self.current_street
    }

    pub fn next_street(&self) -> &str {
        &self.next_street
    }

    pub fn next_next_street(&self) -> &str {
        &self.next_next_street
    }

    /// Route completion, always within [0, 100]
    pub fn completion_percent(&self) -> f64 {
        self.completion_percent
    }

    pub fn vehicle_maneuver(&self) -> VehicleManeuver {
        self.vehicle_maneuver
    }

    pub fn next_vehicle_maneuver(&self) -> VehicleManeuver {
        self.next_vehicle_maneuver
    }

    pub fn pedestrian_maneuver(&self) -> PedestrianManeuver {
        self.pedestrian_maneuver
    }

    /// Exit number; 0 unless the current maneuver is a highway exit
    pub fn exit_number(&self) -> u32 {
        self.exit_number
    }

    pub fn lanes(&self) -> &[LaneGuidance] {
        &self.lanes
    }

    /// Raw speed limit in m/s, negative when unknown
    pub fn speed_limit_mps(&self) -> f64 {
        self.speed_limit_mps
    }

    pub fn speed_limit_known(&self) -> bool {
        self.speed_limit_mps >= 0.0
    }

    /// Speed limit in km/h, rounded, if known
    pub fn speed_limit_kmh(&self) -> Option<u32> {
        self.speed_limit_known().then(|| (self.speed_limit_mps * 3.6).round() as u32)
    }

    pub fn speed_limit_exceeded(&self) -> bool {
        self.speed_limit_exceeded
    }

    pub fn should_play_warning_signal(&self) -> bool {
        self.should_play_warning_signal
    }
}
