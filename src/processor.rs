//! Per-record pipeline: segmentation, distances, emissions, totals.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use csv::{ByteRecord, StringRecord};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::distance::DistanceResolver;
use crate::emissions::EmissionsResolver;
use crate::error::CarbonError;
use crate::fetch::HttpClient;
use crate::outing::{Outing, Segment, Status, UNKNOWN_ID};
use crate::output::JsonArrayWriter;
use crate::segmenter::SegmentSchema;

pub struct RowProcessor<C> {
    distance: DistanceResolver<C>,
    emissions: EmissionsResolver<C>,
}

impl<C: HttpClient + Clone> RowProcessor<C> {
    pub fn new(client: C, config: &Config) -> Self {
        Self {
            distance: DistanceResolver::new(client.clone(), config),
            emissions: EmissionsResolver::new(client, config),
        }
    }
}

impl<C: HttpClient> RowProcessor<C> {
    /// Turns one input record into an outing. Never fails: record-level
    /// errors end up in the outing's status and `error_detail`.
    #[tracing::instrument(skip_all, fields(id))]
    pub async fn process(&self, record: &StringRecord, schema: &SegmentSchema) -> Outing {
        let mut outing = outing_header(record);
        tracing::Span::current().record("id", outing.id.as_str());

        match schema.extract(record) {
            Ok(segments) if segments.is_empty() => {
                warn!(raw = ?outing.raw, "Record has no segment");
                outing.fail(Some("no segment".to_string()));
                return outing;
            }
            Ok(segments) => outing.segments = segments,
            Err(err) => {
                warn!(raw = ?outing.raw, error = %err, "Record cannot be segmented");
                outing.fail(Some(err.detail()));
                return outing;
            }
        }

        let mut failure = None;
        for (index, segment) in outing.segments.iter_mut().enumerate() {
            if let Err(err) = self.resolve_segment(segment).await {
                failure = Some((index + 1, err));
                break;
            }
        }
        if let Some((segment, err)) = failure {
            warn!(raw = ?outing.raw, segment, error = %err, "Record failed");
            outing.fail(Some(err.detail()));
            return outing;
        }

        if !outing.complete() {
            outing.fail(Some("unresolved segment".to_string()));
        }
        debug!(
            segments = outing.segments.len(),
            km = outing.total_distance_km,
            kg = outing.total_emissions_kg,
            "Record processed"
        );
        outing
    }

    async fn resolve_segment(&self, segment: &mut Segment) -> Result<(), CarbonError> {
        let meters = self.distance.resolve(segment).await?;
        let travelled = segment.set_distance(meters);
        segment.emissions_kg = Some(self.emissions.resolve(travelled, segment.transport).await?);
        Ok(())
    }
}

/// Fixed columns of a record: activity code, id, title, duration, headcount.
fn outing_header(record: &StringRecord) -> Outing {
    let cell = |i: usize| record.get(i).unwrap_or("").to_string();
    let id = cell(1);
    Outing {
        activity_code: cell(0),
        id: if id.is_empty() { UNKNOWN_ID.to_string() } else { id },
        title: cell(2),
        duration: cell(3),
        headcount: cell(4),
        segments: Vec::new(),
        total_distance_km: None,
        total_emissions_kg: None,
        status: Status::Error,
        error_detail: None,
        raw: record.iter().map(str::to_string).collect(),
    }
}

/// Decodes `record` as UTF-8, replacing invalid sequences with `U+FFFD`.
///
/// A badly encoded cell only affects its own record, which is still processed.
fn decode_lossy(record: &ByteRecord, line: usize) -> StringRecord {
    if std::str::from_utf8(record.as_slice()).is_err() {
        warn!(line, "Record is not valid UTF-8, invalid bytes replaced");
    }
    record.iter().map(String::from_utf8_lossy).collect()
}

/// Counts of a run, logged when it ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub outings: usize,
    pub ok: usize,
    pub errors: usize,
    pub segments: usize,
}

impl RunSummary {
    pub fn record(&mut self, outing: &Outing) {
        self.outings += 1;
        self.segments += outing.segments.len();
        match outing.status {
            Status::Ok => self.ok += 1,
            Status::Error => self.errors += 1,
        }
    }
}

/// Processes every record of `reader` in order and streams the outings to
/// `writer`.
///
/// Only reading the input or writing the output is fatal.
pub async fn run<C, R, W>(
    processor: &RowProcessor<C>,
    mut reader: csv::Reader<R>,
    writer: &mut JsonArrayWriter<W>,
) -> Result<RunSummary>
where
    C: HttpClient,
    R: Read,
    W: Write,
{
    let header = reader
        .byte_headers()
        .context("cannot read the input header")?;
    let schema = SegmentSchema::from_header(&decode_lossy(header, 0));
    info!(max_segments = schema.max_segments(), "Processing outings");

    let mut summary = RunSummary::default();
    for (index, record) in reader.byte_records().enumerate() {
        let line = index + 1;
        let record = record.with_context(|| format!("cannot read input record {line}"))?;
        let outing = processor.process(&decode_lossy(&record, line), &schema).await;
        summary.record(&outing);
        writer.push(&outing)?;
    }

    Ok(summary)
}
