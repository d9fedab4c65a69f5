//! Data model of an outing and its segments.

use serde::{Deserialize, Serialize};

use crate::error::CarbonError;
use crate::geo::Coordinate;
use crate::transport::TransportType;

/// Id used when the input row has none.
pub const UNKNOWN_ID: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    /// `"latitude, longitude"` as found in the input, sent verbatim to the
    /// distance provider.
    pub geoloc: String,
}

impl Place {
    pub fn new(name: impl Into<String>, geoloc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geoloc: geoloc.into(),
        }
    }

    pub fn coordinate(&self) -> Result<Coordinate, CarbonError> {
        self.geoloc.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub departure: Place,
    pub arrival: Place,
    pub transport: TransportType,
    pub round_trip: bool,
    /// One-way distance, as resolved.
    pub distance_meters: Option<f64>,
    /// Travelled distance, both ways for a round trip.
    pub distance_km: Option<f64>,
    pub emissions_kg: Option<f64>,
}

impl Segment {
    pub fn new(departure: Place, arrival: Place, transport: TransportType, round_trip: bool) -> Self {
        Self {
            departure,
            arrival,
            transport,
            round_trip,
            distance_meters: None,
            distance_km: None,
            emissions_kg: None,
        }
    }

    /// Records the one-way distance and returns the travelled distance in
    /// meters, doubled for a round trip.
    pub fn set_distance(&mut self, one_way_meters: f64) -> f64 {
        let factor = if self.round_trip { 2.0 } else { 1.0 };
        let travelled = one_way_meters * factor;
        self.distance_meters = Some(one_way_meters);
        self.distance_km = Some(travelled / 1000.0);
        travelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outing {
    pub activity_code: String,
    pub id: String,
    pub title: String,
    pub duration: String,
    pub headcount: String,
    pub segments: Vec<Segment>,
    pub total_distance_km: Option<f64>,
    pub total_emissions_kg: Option<f64>,
    pub status: Status,
    pub error_detail: Option<String>,
    /// The input row, kept in the output for diagnostics.
    #[serde(rename = "_raw", default)]
    pub raw: Vec<String>,
}

impl Outing {
    /// Marks the outing failed and drops any totals.
    pub fn fail(&mut self, detail: Option<String>) {
        self.status = Status::Error;
        self.error_detail = detail;
        self.total_distance_km = None;
        self.total_emissions_kg = None;
    }

    /// Sums the segment values and marks the outing OK.
    ///
    /// Kilometers are rounded to 2 decimals and kilograms to 3. Returns
    /// `false`, leaving the outing untouched, if a segment is unresolved.
    pub fn complete(&mut self) -> bool {
        let distances: Option<Vec<f64>> = self.segments.iter().map(|s| s.distance_km).collect();
        let emissions: Option<Vec<f64>> = self.segments.iter().map(|s| s.emissions_kg).collect();

        let (Some(distances), Some(emissions)) = (distances, emissions) else {
            return false;
        };

        self.total_distance_km = Some(round_to(distances.iter().sum(), 2));
        self.total_emissions_kg = Some(round_to(emissions.iter().sum(), 3));
        self.status = Status::Ok;
        self.error_detail = None;
        true
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
