use failure::Fail;
use serde::Serialize;
use std::fmt;

/// Which side of the matching a table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Hp,
    Chid,
}

impl Role {
    /// Canonical column names (id, latitude, longitude) for this role.
    pub fn columns(self) -> [&'static str; 3] {
        match self {
            Role::Hp => ["HP", "HP_LAT", "HP_LONG"],
            Role::Chid => ["CHID", "CHID_LAT", "CHID_LONG"],
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.columns()[0]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new<S: Into<String>>(id: S, lat: f64, lon: f64) -> Point {
        Point {
            id: id.into(),
            lat,
            lon,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// geo uses (x, y), that is (longitude, latitude).
    #[inline]
    pub fn to_geo(&self) -> geo::Point<f64> {
        geo::Point::from((self.lon, self.lat))
    }
}

/// Ordered points of one role. Row order is the input order and drives
/// tie-breaking in the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    pub role: Role,
    pub points: Vec<Point>,
}

impl PointSet {
    pub fn new(role: Role, points: Vec<Point>) -> PointSet {
        PointSet { role, points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<Point> {
        self.points.iter()
    }
}

/// A table as read from the input boundary: a header row and untyped cells.
/// Rows may be shorter than the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> RawTable {
        RawTable { headers, rows }
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// One output row. Field names are the exported CSV header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    #[serde(rename = "HP")]
    pub hp_id: String,
    #[serde(rename = "HP_LAT")]
    pub hp_lat: f64,
    #[serde(rename = "HP_LONG")]
    pub hp_lon: f64,
    #[serde(rename = "Nearest_CHID")]
    pub chid_id: String,
    #[serde(rename = "CHID_LAT")]
    pub chid_lat: f64,
    #[serde(rename = "CHID_LONG")]
    pub chid_lon: f64,
    #[serde(rename = "Distance_km")]
    pub distance_km: f64,
}

pub const ASSIGNMENT_COLUMNS: [&str; 7] = [
    "HP",
    "HP_LAT",
    "HP_LONG",
    "Nearest_CHID",
    "CHID_LAT",
    "CHID_LONG",
    "Distance_km",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchStats {
    pub total_hps: usize,
    pub total_chids: usize,
    pub assigned_pairs: usize,
    pub first_pass_pairs: usize,
    pub second_pass_pairs: usize,
    pub unique_chids_used: usize,
    pub skipped_chids: usize,
    pub failed_distances: usize,
}

/// Everything a matching run produces. The caller owns it; the matcher keeps
/// nothing between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub assignments: Vec<Assignment>,
    pub stats: MatchStats,
}

#[derive(Debug, Fail)]
pub enum MatcherError {
    #[fail(display = "Need at least 3 columns in {} table, found {}", role, found)]
    InsufficientColumns { role: Role, found: usize },
    #[fail(display = "No valid rows found in {} table after cleaning", role)]
    EmptyAfterValidation { role: Role },
    #[fail(display = "Cannot calculate distance between {:?} and {:?}", from, to)]
    DistanceComputationFailure { from: (f64, f64), to: (f64, f64) },
}
