//! Core data model shared across the pass predictor workspace.
//!
//! Everything in here is plain data plus validation. Orchestration lives in
//! `pass_predict`, persistence in `pass_store`.

pub mod tle;

pub use tle::{TleFormatError, TwoLineElement};

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Limits shared by validation code.
pub mod constants {
    /// Columns in one TLE line, checksum included.
    pub const TLE_LINE_LEN: usize = 69;
    /// Largest forecast horizon accepted from a request.
    pub const MAX_HORIZON_DAYS: u32 = 365;
}

/// A request field that could not be parsed or is out of range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {field}: {reason}")]
pub struct InvalidInput {
    pub field: &'static str,
    pub reason: String,
}

impl InvalidInput {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Satellite designator. Used as the roster key and as the store file stem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SatelliteId(String);

impl SatelliteId {
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidInput> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidInput::new("designator", "must not be empty"));
        }
        if raw.trim() != raw {
            return Err(InvalidInput::new(
                "designator",
                format!("`{raw}` has surrounding whitespace"),
            ));
        }
        if raw.contains(['/', '\\']) || raw.contains("..") {
            return Err(InvalidInput::new(
                "designator",
                format!("`{raw}` contains a path separator"),
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SatelliteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SatelliteId {
    type Error = InvalidInput;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SatelliteId> for String {
    fn from(value: SatelliteId) -> Self {
        value.0
    }
}

impl std::str::FromStr for SatelliteId {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// One roster line: designator plus the name shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteCatalogEntry {
    pub id: SatelliteId,
    pub name: String,
}

/// Designator to display name mapping, loaded once at start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: BTreeMap<SatelliteId, String>,
}

impl Roster {
    pub fn from_entries(entries: impl IntoIterator<Item = SatelliteCatalogEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id, e.name)).collect(),
        }
    }

    pub fn name(&self, id: &SatelliteId) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &SatelliteId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &SatelliteId> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SatelliteId, &str)> {
        self.entries.iter().map(|(id, name)| (id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ground observer on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverLocation {
    /// Geodetic latitude in degrees, north positive.
    pub latitude: f64,
    /// Longitude in degrees, east positive.
    pub longitude: f64,
    /// Height above the ellipsoid in metres.
    pub altitude_m: f64,
}

impl ObserverLocation {
    pub fn new(latitude: f64, longitude: f64, altitude_m: f64) -> Result<Self, InvalidInput> {
        let location = Self {
            latitude,
            longitude,
            altitude_m,
        };
        location.validate()?;
        Ok(location)
    }

    pub fn validate(&self) -> Result<(), InvalidInput> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(InvalidInput::new(
                "latitude",
                format!("{} is outside [-90, 90]", self.latitude),
            ));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(InvalidInput::new(
                "longitude",
                format!("{} is outside [-180, 180]", self.longitude),
            ));
        }
        if !self.altitude_m.is_finite() {
            return Err(InvalidInput::new("altitude", "must be finite"));
        }
        Ok(())
    }
}

/// Minimum elevation and observer-local hour band a pass must meet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityFilter {
    pub min_elevation_deg: f64,
    /// Inclusive lower bound on the local hour of culmination.
    pub min_hour: u32,
    /// Inclusive upper bound; 24 admits every hour.
    pub max_hour: u32,
}

impl VisibilityFilter {
    pub fn new(min_elevation_deg: f64, min_hour: u32, max_hour: u32) -> Result<Self, InvalidInput> {
        let filter = Self {
            min_elevation_deg,
            min_hour,
            max_hour,
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn validate(&self) -> Result<(), InvalidInput> {
        if !self.min_elevation_deg.is_finite() || self.min_elevation_deg > 90.0 {
            return Err(InvalidInput::new(
                "minimum elevation",
                format!("{} is not an elevation in degrees", self.min_elevation_deg),
            ));
        }
        if self.max_hour > 24 {
            return Err(InvalidInput::new(
                "maximum hour",
                format!("{} is past 24", self.max_hour),
            ));
        }
        if self.min_hour > self.max_hour {
            return Err(InvalidInput::new(
                "minimum hour",
                format!("{} is after maximum hour {}", self.min_hour, self.max_hour),
            ));
        }
        Ok(())
    }
}

impl Default for VisibilityFilter {
    fn default() -> Self {
        Self {
            min_elevation_deg: 0.0,
            min_hour: 0,
            max_hour: 24,
        }
    }
}

/// Half-open scan window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PredictionWindow {
    pub fn contains_aos(&self, aos: DateTime<Utc>) -> bool {
        aos < self.end
    }
}

/// A pass tagged with the satellite it belongs to.
///
/// `aos <= max_elevation_time <= aos + duration_seconds` holds for every
/// pass built from a propagator candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub satellite_id: SatelliteId,
    pub aos: DateTime<Utc>,
    pub los: DateTime<Utc>,
    pub max_elevation_time: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub duration_seconds: f64,
}
