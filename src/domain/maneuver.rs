//! Maneuver catalog - stable tag tables for engine-supplied maneuver ordinals
//!
//! The engine reports maneuvers as plain integers. Each table below maps those
//! integers to a variant through an explicit match, so an unknown value is a
//! typed error instead of an out-of-bounds index.
//!
//! Tags are a wire contract with the engine: never reorder or reuse them, only
//! append new kinds at the end and bump `CATALOG_VERSION`.

use serde::Serialize;
use thiserror::Error;

/// Revision of the tag tables in this module
pub const CATALOG_VERSION: u32 = 1;

/// Engine ordinal that does not resolve in its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid {table} ordinal {tag}")]
pub struct InvalidOrdinal {
    pub table: &'static str,
    pub tag: i32,
}

/// Opaque icon identifier handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IconId(pub &'static str);

impl std::fmt::Display for IconId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Primary icon and the optional "then" icon shown one step ahead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManeuverIcons {
    pub primary: Option<IconId>,
    pub secondary: Option<IconId>,
}

const fn icons(primary: &'static str, secondary: &'static str) -> ManeuverIcons {
    ManeuverIcons { primary: Some(IconId(primary)), secondary: Some(IconId(secondary)) }
}

const fn primary_only(primary: &'static str) -> ManeuverIcons {
    ManeuverIcons { primary: Some(IconId(primary)), secondary: None }
}

const NO_ICONS: ManeuverIcons = ManeuverIcons { primary: None, secondary: None };

/// Shared behaviour of the maneuver tables
pub trait ManeuverKind: Copy + Sized + 'static {
    /// Table name used in errors and logs
    const TABLE: &'static str;
    /// Every kind, in tag order
    const ALL: &'static [Self];

    fn from_tag(tag: i32) -> Result<Self, InvalidOrdinal>;
    fn tag(self) -> u8;
    fn icons(self) -> ManeuverIcons;
    fn as_str(self) -> &'static str;

    /// Whether this kind carries a distinct "then" maneuver hint
    fn has_secondary_maneuver(self) -> bool {
        self.icons().secondary.is_some()
    }
}

/// Vehicle turn directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VehicleManeuver {
    NoTurn = 0,
    GoStraight = 1,
    TurnRight = 2,
    TurnSharpRight = 3,
    TurnSlightRight = 4,
    TurnLeft = 5,
    TurnSharpLeft = 6,
    TurnSlightLeft = 7,
    UTurnLeft = 8,
    UTurnRight = 9,
    EnterRoundAbout = 10,
    LeaveRoundAbout = 11,
    StayOnRoundAbout = 12,
    StartAtEndOfStreet = 13,
    ReachedYourDestination = 14,
    ExitHighwayToLeft = 15,
    ExitHighwayToRight = 16,
}

impl VehicleManeuver {
    /// True exactly for entering, leaving and staying on a roundabout
    pub fn is_roundabout(self) -> bool {
        matches!(
            self,
            VehicleManeuver::EnterRoundAbout
                | VehicleManeuver::LeaveRoundAbout
                | VehicleManeuver::StayOnRoundAbout
        )
    }

    /// Highway exits are the only kinds with a meaningful exit number
    pub fn is_highway_exit(self) -> bool {
        matches!(self, VehicleManeuver::ExitHighwayToLeft | VehicleManeuver::ExitHighwayToRight)
    }
}

impl ManeuverKind for VehicleManeuver {
    const TABLE: &'static str = "vehicle_maneuver";
    const ALL: &'static [Self] = &[
        VehicleManeuver::NoTurn,
        VehicleManeuver::GoStraight,
        VehicleManeuver::TurnRight,
        VehicleManeuver::TurnSharpRight,
        VehicleManeuver::TurnSlightRight,
        VehicleManeuver::TurnLeft,
        VehicleManeuver::TurnSharpLeft,
        VehicleManeuver::TurnSlightLeft,
        VehicleManeuver::UTurnLeft,
        VehicleManeuver::UTurnRight,
        VehicleManeuver::EnterRoundAbout,
        VehicleManeuver::LeaveRoundAbout,
        VehicleManeuver::StayOnRoundAbout,
        VehicleManeuver::StartAtEndOfStreet,
        VehicleManeuver::ReachedYourDestination,
        VehicleManeuver::ExitHighwayToLeft,
        VehicleManeuver::ExitHighwayToRight,
    ];

    fn from_tag(tag: i32) -> Result<Self, InvalidOrdinal> {
        Ok(match tag {
            0 => VehicleManeuver::NoTurn,
            1 => VehicleManeuver::GoStraight,
            2 => VehicleManeuver::TurnRight,
            3 => VehicleManeuver::TurnSharpRight,
            4 => VehicleManeuver::TurnSlightRight,
            5 => VehicleManeuver::TurnLeft,
            6 => VehicleManeuver::TurnSharpLeft,
            7 => VehicleManeuver::TurnSlightLeft,
            8 => VehicleManeuver::UTurnLeft,
            9 => VehicleManeuver::UTurnRight,
            10 => VehicleManeuver::EnterRoundAbout,
            11 => VehicleManeuver::LeaveRoundAbout,
            12 => VehicleManeuver::StayOnRoundAbout,
            13 => VehicleManeuver::StartAtEndOfStreet,
            14 => VehicleManeuver::ReachedYourDestination,
            15 => VehicleManeuver::ExitHighwayToLeft,
            16 => VehicleManeuver::ExitHighwayToRight,
            _ => return Err(InvalidOrdinal { table: Self::TABLE, tag }),
        })
    }

    #[inline]
    fn tag(self) -> u8 {
        self as u8
    }

    fn icons(self) -> ManeuverIcons {
        match self {
            VehicleManeuver::NoTurn | VehicleManeuver::GoStraight => {
                primary_only("ic_turn_straight")
            }
            VehicleManeuver::TurnRight => icons("ic_turn_right", "ic_then_right"),
            VehicleManeuver::TurnSharpRight => icons("ic_turn_right_sharp", "ic_then_right_sharp"),
            VehicleManeuver::TurnSlightRight => {
                icons("ic_turn_right_slight", "ic_then_right_slight")
            }
            VehicleManeuver::TurnLeft => icons("ic_turn_left", "ic_then_left"),
            VehicleManeuver::TurnSharpLeft => icons("ic_turn_left_sharp", "ic_then_left_sharp"),
            VehicleManeuver::TurnSlightLeft => icons("ic_turn_left_slight", "ic_then_left_slight"),
            VehicleManeuver::UTurnLeft => icons("ic_turn_uleft", "ic_then_uleft"),
            VehicleManeuver::UTurnRight => icons("ic_turn_uright", "ic_then_uright"),
            VehicleManeuver::EnterRoundAbout
            | VehicleManeuver::LeaveRoundAbout
            | VehicleManeuver::StayOnRoundAbout => icons("ic_turn_round", "ic_then_round"),
            VehicleManeuver::StartAtEndOfStreet => NO_ICONS,
            VehicleManeuver::ReachedYourDestination => icons("ic_turn_finish", "ic_then_finish"),
            VehicleManeuver::ExitHighwayToLeft => {
                icons("ic_exit_highway_to_left", "ic_then_exit_highway_to_left")
            }
            VehicleManeuver::ExitHighwayToRight => {
                icons("ic_exit_highway_to_right", "ic_then_exit_highway_to_right")
            }
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            VehicleManeuver::NoTurn => "no_turn",
            VehicleManeuver::GoStraight => "go_straight",
            VehicleManeuver::TurnRight => "turn_right",
            VehicleManeuver::TurnSharpRight => "turn_sharp_right",
            VehicleManeuver::TurnSlightRight => "turn_slight_right",
            VehicleManeuver::TurnLeft => "turn_left",
            VehicleManeuver::TurnSharpLeft => "turn_sharp_left",
            VehicleManeuver::TurnSlightLeft => "turn_slight_left",
            VehicleManeuver::UTurnLeft => "u_turn_left",
            VehicleManeuver::UTurnRight => "u_turn_right",
            VehicleManeuver::EnterRoundAbout => "enter_round_about",
            VehicleManeuver::LeaveRoundAbout => "leave_round_about",
            VehicleManeuver::StayOnRoundAbout => "stay_on_round_about",
            VehicleManeuver::StartAtEndOfStreet => "start_at_end_of_street",
            VehicleManeuver::ReachedYourDestination => "reached_your_destination",
            VehicleManeuver::ExitHighwayToLeft => "exit_highway_to_left",
            VehicleManeuver::ExitHighwayToRight => "exit_highway_to_right",
        }
    }
}

/// Pedestrian turn directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PedestrianManeuver {
    NoTurn = 0,
    GoStraight = 1,
    TurnRight = 2,
    TurnLeft = 3,
    ReachedYourDestination = 4,
}

impl ManeuverKind for PedestrianManeuver {
    const TABLE: &'static str = "pedestrian_maneuver";
    const ALL: &'static [Self] = &[
        PedestrianManeuver::NoTurn,
        PedestrianManeuver::GoStraight,
        PedestrianManeuver::TurnRight,
        PedestrianManeuver::TurnLeft,
        PedestrianManeuver::ReachedYourDestination,
    ];

    fn from_tag(tag: i32) -> Result<Self, InvalidOrdinal> {
        Ok(match tag {
            0 => PedestrianManeuver::NoTurn,
            1 => PedestrianManeuver::GoStraight,
            2 => PedestrianManeuver::TurnRight,
            3 => PedestrianManeuver::TurnLeft,
            4 => PedestrianManeuver::ReachedYourDestination,
            _ => return Err(InvalidOrdinal { table: Self::TABLE, tag }),
        })
    }

    #[inline]
    fn tag(self) -> u8 {
        self as u8
    }

    fn icons(self) -> ManeuverIcons {
        match self {
            PedestrianManeuver::NoTurn | PedestrianManeuver::GoStraight => {
                primary_only("ic_turn_straight")
            }
            PedestrianManeuver::TurnRight => icons("ic_turn_right", "ic_then_right"),
            PedestrianManeuver::TurnLeft => icons("ic_turn_left", "ic_then_left"),
            PedestrianManeuver::ReachedYourDestination => {
                icons("ic_turn_finish", "ic_then_finish")
            }
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            PedestrianManeuver::NoTurn => "no_turn",
            PedestrianManeuver::GoStraight => "go_straight",
            PedestrianManeuver::TurnRight => "turn_right",
            PedestrianManeuver::TurnLeft => "turn_left",
            PedestrianManeuver::ReachedYourDestination => "reached_your_destination",
        }
    }
}

/// Direction markings of a single lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LaneWay {
    None = 0,
    Reverse = 1,
    SharpLeft = 2,
    Left = 3,
    SlightLeft = 4,
    Through = 5,
    SlightRight = 6,
    Right = 7,
    SharpRight = 8,
}

impl LaneWay {
    pub const TABLE: &'static str = "lane_way";

    pub fn from_tag(tag: i32) -> Result<Self, InvalidOrdinal> {
        Ok(match tag {
            0 => LaneWay::None,
            1 => LaneWay::Reverse,
            2 => LaneWay::SharpLeft,
            3 => LaneWay::Left,
            4 => LaneWay::SlightLeft,
            5 => LaneWay::Through,
            6 => LaneWay::SlightRight,
            7 => LaneWay::Right,
            8 => LaneWay::SharpRight,
            _ => return Err(InvalidOrdinal { table: Self::TABLE, tag }),
        })
    }

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Resolve a vehicle maneuver ordinal
pub fn lookup_vehicle(tag: i32) -> Result<VehicleManeuver, InvalidOrdinal> {
    VehicleManeuver::from_tag(tag)
}

/// Resolve a pedestrian maneuver ordinal
pub fn lookup_pedestrian(tag: i32) -> Result<PedestrianManeuver, InvalidOrdinal> {
    PedestrianManeuver::from_tag(tag)
}
