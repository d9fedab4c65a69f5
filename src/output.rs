//! Output formatting for processed outings.
//!
//! Outings are streamed as a JSON array while the input is processed, one
//! item in memory at a time. A finished JSON file can then be converted to a
//! CSV shaped like the input spreadsheet.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use tracing::debug;

use crate::outing::{Outing, Status};

/// Streams items as a pretty-printed JSON array.
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    count: usize,
}

impl<W: Write> JsonArrayWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, count: 0 }
    }

    pub fn push<T: Serialize>(&mut self, item: &T) -> Result<()> {
        let separator = if self.count == 0 { "[" } else { "," };
        writeln!(self.writer, "{separator}")?;
        serde_json::to_writer_pretty(&mut self.writer, item)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        self.count += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Closes the array and returns the inner writer.
    pub fn finish(mut self) -> Result<W> {
        if self.count == 0 {
            write!(self.writer, "[")?;
        }
        writeln!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Leading columns of the CSV export.
pub const CSV_HEADER: [&str; 8] = [
    "Code activité",
    "Numéro de sortie",
    "Traitement carbone",
    "Titre de la sortie",
    "Durée",
    "Nombre d'inscriptions",
    "Total KM",
    "Total CO2",
];

/// Header of the CSV export for rows of up to `max_segments` segments.
///
/// Place name and geoloc share a merged header cell in the spreadsheet, hence
/// the empty titles.
pub fn csv_header(max_segments: usize) -> Vec<String> {
    let mut header: Vec<String> = CSV_HEADER.iter().map(|s| s.to_string()).collect();
    for n in 1..=max_segments {
        header.extend([
            format!("Tronçon {n} : départ"),
            String::new(),
            format!("T{n} : arrivée"),
            String::new(),
            format!("T{n} : transport"),
            format!("T{n} : AR"),
            format!("T{n} : Distance (totale)"),
            format!("T{n} : Émissions"),
        ]);
    }
    header
}

pub fn csv_row(outing: &Outing) -> Vec<String> {
    let status = match outing.status {
        Status::Ok => "OK",
        Status::Error => "ERREUR",
    };
    let mut row = vec![
        outing.activity_code.clone(),
        outing.id.clone(),
        status.to_string(),
        outing.title.clone(),
        outing.duration.clone(),
        outing.headcount.clone(),
        optional(outing.total_distance_km),
        optional(outing.total_emissions_kg),
    ];
    for segment in &outing.segments {
        row.extend([
            segment.departure.name.clone(),
            segment.departure.geoloc.clone(),
            segment.arrival.name.clone(),
            segment.arrival.geoloc.clone(),
            segment.transport.to_string(),
            if segment.round_trip { "AR" } else { "AS" }.to_string(),
            optional(segment.distance_km),
            optional(segment.emissions_kg),
        ]);
    }
    row
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes `outings` as CSV, every cell quoted.
pub fn write_csv<W: Write>(outings: &[Outing], writer: W) -> Result<()> {
    let max_segments = outings.iter().map(|o| o.segments.len()).max().unwrap_or(0);
    debug!(outings = outings.len(), max_segments, "Writing CSV export");

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .flexible(true)
        .from_writer(writer);

    writer.write_record(csv_header(max_segments))?;
    for outing in outings {
        writer.write_record(csv_row(outing))?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads a JSON array previously written by [`JsonArrayWriter`].
pub fn read_outings<R: Read>(reader: R) -> Result<Vec<Outing>> {
    serde_json::from_reader(reader).context("input is not a JSON array of outings")
}
