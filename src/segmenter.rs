//! Reconstructs the segments of an outing from one input row.
//!
//! Row layout:
//!
//! | Columns | Content |
//! |---------|---------|
//! | 0–4     | activity code, outing id, title, duration, headcount |
//! | 5–9     | first segment: departure name, arrival name, arrival geoloc, transport, round trip |
//! | block n | `Tronçon n : départ`, departure geoloc, arrival name, arrival geoloc, transport, round trip |
//!
//! The first segment always departs from the club ([`ORIGIN_GEOLOC`]). Blocks
//! for n ≥ 2 are located by header name once per file, see [`SegmentSchema`].

use csv::StringRecord;
use tracing::debug;

use crate::error::CarbonError;
use crate::geo::ORIGIN_GEOLOC;
use crate::outing::{Place, Segment};
use crate::transport::TransportType;

/// Highest segment number looked up in the header.
pub const MAX_SEGMENTS: usize = 41;

const FIRST_DEPARTURE: usize = 5;
const FIRST_ARRIVAL: usize = 6;
const FIRST_ARRIVAL_GEOLOC: usize = 7;
const FIRST_TRANSPORT: usize = 8;
const FIRST_ROUND_TRIP: usize = 9;

/// Header title of the first column of segment block `n`.
pub fn block_title(n: usize) -> String {
    format!("Tronçon {n} : départ")
}

/// Column offsets of the segment blocks after the first one, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentSchema {
    block_offsets: Vec<usize>,
}

impl SegmentSchema {
    /// Scans the header for `Tronçon 2 : départ`, `Tronçon 3 : départ`, …
    /// and stops at the first missing one.
    pub fn from_header(header: &StringRecord) -> Self {
        let mut block_offsets = Vec::new();
        for n in 2..=MAX_SEGMENTS {
            let title = block_title(n);
            match header.iter().position(|col| col == title) {
                Some(offset) => block_offsets.push(offset),
                None => break,
            }
        }
        debug!(blocks = block_offsets.len() + 1, "Segment schema computed");
        Self { block_offsets }
    }

    /// Maximum number of segments a row can hold.
    pub fn max_segments(&self) -> usize {
        self.block_offsets.len() + 1
    }

    /// Extracts the segments of `record`, in order.
    ///
    /// Extraction stops at the first block whose departure cell is empty.
    /// Missing trailing cells read as empty.
    ///
    /// # Errors
    ///
    /// [`CarbonError::UnknownTransportType`] or
    /// [`CarbonError::InvalidRoundTripMarker`] for the first offending block.
    pub fn extract(&self, record: &StringRecord) -> Result<Vec<Segment>, CarbonError> {
        let cell = |i: usize| record.get(i).unwrap_or("");

        let mut segments = Vec::with_capacity(self.max_segments());
        segments.push(Segment::new(
            Place::new(cell(FIRST_DEPARTURE), ORIGIN_GEOLOC),
            Place::new(cell(FIRST_ARRIVAL), cell(FIRST_ARRIVAL_GEOLOC)),
            TransportType::normalize(cell(FIRST_TRANSPORT))?,
            parse_round_trip(cell(FIRST_ROUND_TRIP))?,
        ));

        for &offset in &self.block_offsets {
            if cell(offset).is_empty() {
                break;
            }
            segments.push(Segment::new(
                Place::new(cell(offset), cell(offset + 1)),
                Place::new(cell(offset + 2), cell(offset + 3)),
                TransportType::normalize(cell(offset + 4))?,
                parse_round_trip(cell(offset + 5))?,
            ));
        }

        Ok(segments)
    }
}

/// `AR` (aller-retour) is a round trip, `AS` (aller simple) a one-way trip.
pub fn parse_round_trip(marker: &str) -> Result<bool, CarbonError> {
    match marker {
        "AR" => Ok(true),
        "AS" => Ok(false),
        other => Err(CarbonError::InvalidRoundTripMarker(other.to_string())),
    }
}
