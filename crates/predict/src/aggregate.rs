//! Cross-satellite merge and row formatting.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use pass_core::{Pass, Roster, SatelliteId};
use serde::Serialize;

/// Column titles of every prediction table.
pub const HEADER: [&str; 6] = [
    "Name",
    "Date",
    "Start time",
    "Max el. time",
    "Max el. (°)",
    "Duration",
];

/// One formatted pass. `satellite_id` and `aos` are kept for ordering and
/// machine-readable export; the remaining fields are the display columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassRow {
    pub satellite_id: SatelliteId,
    pub aos: DateTime<Utc>,
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub max_elevation_time: String,
    pub max_elevation: String,
    pub duration: String,
}

impl PassRow {
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.name,
            &self.date,
            &self.start_time,
            &self.max_elevation_time,
            &self.max_elevation,
            &self.duration,
        ]
    }
}

/// Header plus rows in ascending AOS order, ties broken by designator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub header: [&'static str; 6],
    pub rows: Vec<PassRow>,
}

impl PredictionResult {
    /// Header row followed by every data row, as plain strings.
    pub fn table(&self) -> Vec<Vec<String>> {
        let header = self.header.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        std::iter::once(header)
            .chain(self.rows.iter().map(|row| {
                row.cells()
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
            }))
            .collect()
    }
}

/// Sort passes from all satellites by AOS, then designator.
pub fn merge(mut passes: Vec<Pass>) -> Vec<Pass> {
    passes.sort_by(|a, b| {
        a.aos
            .cmp(&b.aos)
            .then_with(|| a.satellite_id.cmp(&b.satellite_id))
    });
    passes
}

pub fn format_row<Tz>(pass: &Pass, name: &str, zone: &Tz) -> PassRow
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let aos = pass.aos.with_timezone(zone);
    let culmination = pass.max_elevation_time.with_timezone(zone);
    PassRow {
        satellite_id: pass.satellite_id.clone(),
        aos: pass.aos,
        name: name.to_string(),
        date: aos.format("%d/%m/%y").to_string(),
        start_time: aos.format("%H:%M:%S").to_string(),
        max_elevation_time: culmination.format("%H:%M:%S").to_string(),
        max_elevation: format!("{:.1}", pass.max_elevation_deg),
        duration: format_duration(pass.duration_seconds),
    }
}

/// `M:SS`, minutes unpadded.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Merge and format. Names come from the roster, falling back to the designator.
pub fn aggregate<Tz>(passes: Vec<Pass>, roster: &Roster, zone: &Tz) -> PredictionResult
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let rows = merge(passes)
        .iter()
        .map(|pass| {
            let name = roster
                .name(&pass.satellite_id)
                .unwrap_or(pass.satellite_id.as_str());
            format_row(pass, name, zone)
        })
        .collect();
    PredictionResult {
        header: HEADER,
        rows,
    }
}
