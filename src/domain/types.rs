//! Shared value types passed between the engine, the core and the presentation layer

use crate::domain::maneuver::InvalidOrdinal;
use serde::{Deserialize, Serialize};

/// Unit attached to a distance by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Feet,
    Miles,
}

impl DistanceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Feet => "ft",
            DistanceUnit::Miles => "mi",
        }
    }
}

/// Magnitude plus unit, already localized by the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn new(value: f64, unit: DistanceUnit) -> Self {
        Self { value, unit }
    }

    pub fn meters(value: f64) -> Self {
        Self::new(value, DistanceUnit::Meters)
    }
}

impl Default for Distance {
    fn default() -> Self {
        Self::meters(0.0)
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit.as_str())
    }
}

/// Router the engine builds with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RouterType {
    #[default]
    Vehicle = 0,
    Pedestrian = 1,
    Bicycle = 2,
    Transit = 3,
    Ruler = 4,
}

impl RouterType {
    pub const TABLE: &'static str = "router_type";

    pub fn from_tag(tag: i32) -> Result<Self, InvalidOrdinal> {
        Ok(match tag {
            0 => RouterType::Vehicle,
            1 => RouterType::Pedestrian,
            2 => RouterType::Bicycle,
            3 => RouterType::Transit,
            4 => RouterType::Ruler,
            _ => return Err(InvalidOrdinal { table: Self::TABLE, tag }),
        })
    }

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouterType::Vehicle => "vehicle",
            RouterType::Pedestrian => "pedestrian",
            RouterType::Bicycle => "bicycle",
            RouterType::Transit => "transit",
            RouterType::Ruler => "ruler",
        }
    }
}

/// Endpoint reference handed over by the map layer
///
/// Only the coordinates and label travel through the core; the engine owns
/// everything else about the point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub my_position: bool,
}

impl RoutePoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon, title: None, my_position: false }
    }

    /// Point standing for the current device position
    pub fn my_position(lat: f64, lon: f64) -> Self {
        Self { lat, lon, title: None, my_position: true }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_type_tags() {
        for tag in 0..5 {
            assert_eq!(RouterType::from_tag(tag).unwrap().tag() as i32, tag);
        }
        assert_eq!(
            RouterType::from_tag(5),
            Err(InvalidOrdinal { table: "router_type", tag: 5 })
        );
    }

    #[test]
    fn test_router_type_serde_name() {
        let router: RouterType = serde_json::from_str("\"pedestrian\"").unwrap();
        assert_eq!(router, RouterType::Pedestrian);
        assert_eq!(serde_json::to_string(&RouterType::Transit).unwrap(), "\"transit\"");
    }

    #[test]
    fn test_distance_display() {
        assert_eq!(Distance::new(1.5, DistanceUnit::Kilometers).to_string(), "1.5 km");
        assert_eq!(Distance::default().to_string(), "0 m");
    }

    #[test]
    fn test_route_point_builder() {
        let point = RoutePoint::new(52.5, 13.4).with_title("Alexanderplatz");
        assert_eq!(point.title.as_deref(), Some("Alexanderplatz"));
        assert!(!point.my_position);
        assert!(RoutePoint::my_position(0.0, 0.0).my_position);
    }
}
