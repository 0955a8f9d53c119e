//! Snapshot builder - validates raw engine ticks into `RoutingSnapshot`s
//!
//! Pure transformation with no side effects, so a builder can be cloned onto
//! any thread. Rejections are typed; the caller decides what to log and keeps
//! its previous snapshot.

use crate::domain::maneuver::{
    InvalidOrdinal, LaneWay, ManeuverKind, PedestrianManeuver, VehicleManeuver,
};
use crate::domain::snapshot::{LaneGuidance, RoutingSnapshot, SPEED_LIMIT_UNKNOWN};
use crate::domain::types::Distance;
use crate::infra::config::Config;
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;

/// Default slack allowed around [0, 100] before a completion value is rejected
pub const DEFAULT_COMPLETION_TOLERANCE_PCT: f64 = 0.5;

/// Raw lane record as reported by the engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawLane {
    pub ways: Vec<i32>,
    #[serde(default)]
    pub recommended: bool,
}

/// Raw tick fields as reported by the engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTick {
    pub distance_to_target: Distance,
    pub distance_to_next_turn: Distance,
    #[serde(default)]
    pub current_street: String,
    #[serde(default)]
    pub next_street: String,
    #[serde(default)]
    pub next_next_street: String,
    pub completion_percent: f64,
    pub vehicle_ordinal: i32,
    pub next_vehicle_ordinal: i32,
    pub pedestrian_ordinal: i32,
    #[serde(default)]
    pub exit_number: i32,
    pub total_time_secs: i64,
    #[serde(default)]
    pub lanes: Vec<RawLane>,
    #[serde(default = "unknown_speed_limit")]
    pub speed_limit_mps: f64,
    #[serde(default)]
    pub speed_limit_exceeded: bool,
    #[serde(default)]
    pub should_play_warning_signal: bool,
}

fn unknown_speed_limit() -> f64 {
    SPEED_LIMIT_UNKNOWN
}

/// Why a raw tick was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickError {
    #[error(transparent)]
    InvalidOrdinal(#[from] InvalidOrdinal),
    #[error("completion percent {0} outside [0, 100]")]
    CompletionOutOfRange(f64),
    #[error("negative total time {0}s")]
    NegativeTime(i64),
    #[error("negative exit number {0}")]
    NegativeExitNumber(i32),
}

impl TickError {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickError::InvalidOrdinal(_) => "invalid_ordinal",
            TickError::CompletionOutOfRange(_) => "completion_out_of_range",
            TickError::NegativeTime(_) => "negative_time",
            TickError::NegativeExitNumber(_) => "negative_exit_number",
        }
    }
}

/// Converts raw engine ticks into validated snapshots
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    completion_tolerance_pct: f64,
}

impl SnapshotBuilder {
    pub fn new(completion_tolerance_pct: f64) -> Self {
        let completion_tolerance_pct = if completion_tolerance_pct.is_finite() {
            completion_tolerance_pct.max(0.0)
        } else {
            0.0
        };
        Self { completion_tolerance_pct }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.completion_tolerance_pct())
    }

    pub fn completion_tolerance_pct(&self) -> f64 {
        self.completion_tolerance_pct
    }

    /// Validate one raw tick.
    ///
    /// # Example
    ///
    /// ```
    /// use nav_guidance::domain::types::Distance;
    /// use nav_guidance::services::snapshot_builder::{RawTick, SnapshotBuilder};
    ///
    /// let raw = RawTick {
    ///     distance_to_target: Distance::meters(900.0),
    ///     distance_to_next_turn: Distance::meters(50.0),
    ///     current_street: String::new(),
    ///     next_street: String::new(),
    ///     next_next_street: String::new(),
    ///     completion_percent: 100.0007,
    ///     vehicle_ordinal: 0,
    ///     next_vehicle_ordinal: 2,
    ///     pedestrian_ordinal: 0,
    ///     exit_number: 0,
    ///     total_time_secs: 60,
    ///     lanes: Vec::new(),
    ///     speed_limit_mps: -1.0,
    ///     speed_limit_exceeded: false,
    ///     should_play_warning_signal: false,
    /// };
    /// let snapshot = SnapshotBuilder::default().build(&raw).unwrap();
    /// assert_eq!(snapshot.completion_percent(), 100.0);
    /// ```
    pub fn build(&self, raw: &RawTick) -> Result<RoutingSnapshot, TickError> {
        let vehicle_maneuver = VehicleManeuver::from_tag(raw.vehicle_ordinal)?;
        let next_vehicle_maneuver = VehicleManeuver::from_tag(raw.next_vehicle_ordinal)?;
        let pedestrian_maneuver = PedestrianManeuver::from_tag(raw.pedestrian_ordinal)?;

        let completion_percent = self.normalize_completion(raw.completion_percent)?;

        if raw.total_time_secs < 0 {
            return Err(TickError::NegativeTime(raw.total_time_secs));
        }
        let total_time_secs = u32::try_from(raw.total_time_secs).unwrap_or(u32::MAX);

        if raw.exit_number < 0 {
            return Err(TickError::NegativeExitNumber(raw.exit_number));
        }
        let exit_number =
            if vehicle_maneuver.is_highway_exit() { raw.exit_number as u32 } else { 0 };

        let lanes = raw.lanes.iter().map(build_lane).collect::<Result<Vec<_>, _>>()?;

        let speed_limit_mps = if raw.speed_limit_mps >= 0.0 && raw.speed_limit_mps.is_finite() {
            raw.speed_limit_mps
        } else {
            SPEED_LIMIT_UNKNOWN
        };

        Ok(RoutingSnapshot {
            distance_to_target: raw.distance_to_target,
            distance_to_next_turn: raw.distance_to_next_turn,
            total_time_secs,
            current_street: raw.current_street.clone(),
            next_street: raw.next_street.clone(),
            next_next_street: raw.next_next_street.clone(),
            completion_percent,
            vehicle_maneuver,
            next_vehicle_maneuver,
            pedestrian_maneuver,
            exit_number,
            lanes,
            speed_limit_mps,
            speed_limit_exceeded: raw.speed_limit_exceeded,
            should_play_warning_signal: raw.should_play_warning_signal,
        })
    }

    /// Clamp rounding jitter around [0, 100]; reject anything beyond the tolerance
    fn normalize_completion(&self, raw: f64) -> Result<f64, TickError> {
        if !raw.is_finite() {
            return Err(TickError::CompletionOutOfRange(raw));
        }
        if (0.0..=100.0).contains(&raw) {
            return Ok(raw);
        }

        let overshoot = if raw < 0.0 { -raw } else { raw - 100.0 };
        if overshoot <= self.completion_tolerance_pct {
            Ok(raw.clamp(0.0, 100.0))
        } else {
            Err(TickError::CompletionOutOfRange(raw))
        }
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_TOLERANCE_PCT)
    }
}

fn build_lane(raw: &RawLane) -> Result<LaneGuidance, InvalidOrdinal> {
    let ways =
        raw.ways.iter().map(|&tag| LaneWay::from_tag(tag)).collect::<Result<SmallVec<_>, _>>()?;
    Ok(LaneGuidance { ways, recommended: raw.recommended })
}
