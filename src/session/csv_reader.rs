//! # CSV reader for session tables
//!
//! Loads the two session tables from plain CSV exports.
//!
//! Expected columns
//! -----------------
//! * Positions: `Driver,X,Y,Date,Status`
//!   - `Date` is any string accepted by [`Epoch::from_str`], e.g. `2021-03-28T15:03:12.250 UTC`.
//!   - `Status` equal to `OnTrack` marks an on-track sample, anything else is off track.
//! * Laps: `Driver,NumberOfLaps,Time,LastLapTime,Sector2Time,Sector3Time,PitInTime,PitOutTime`
//!   - Durations are seconds (floating point) counted from the session start for `Time`,
//!     `PitInTime` and `PitOutTime`.
//!   - Empty cells are read as missing values.
//!
//! Rows are appended in file order; sorting by date happens in
//! [`SessionData::new`](crate::session::SessionData::new).
use std::str::FromStr;

use camino::Utf8Path;
use csv::ReaderBuilder;
use hifitime::{Duration, Epoch};
use serde::Deserialize;

use crate::constants::ON_TRACK_STATUS;
use crate::session::{LapRecord, LapTable, PositionData, PositionSample};
use crate::trackmap_errors::TrackError;

#[derive(Debug, Deserialize)]
struct RawPosition {
    #[serde(rename = "Driver")]
    driver: String,
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Debug, Deserialize)]
struct RawLap {
    #[serde(rename = "Driver")]
    driver: String,
    #[serde(rename = "NumberOfLaps")]
    number_of_laps: Option<f64>,
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "LastLapTime")]
    last_lap_time: Option<f64>,
    #[serde(rename = "Sector2Time")]
    sector2_time: Option<f64>,
    #[serde(rename = "Sector3Time")]
    sector3_time: Option<f64>,
    #[serde(rename = "PitInTime")]
    pit_in_time: Option<f64>,
    #[serde(rename = "PitOutTime")]
    pit_out_time: Option<f64>,
}

fn seconds(value: Option<f64>) -> Option<Duration> {
    value.map(Duration::from_seconds)
}

/// Read the position series of all vehicles from a CSV file.
///
/// Arguments
/// -----------------
/// * `path`: CSV file with the columns `Driver,X,Y,Date,Status`.
///
/// Return
/// ----------
/// * The per-vehicle position series, in file order.
///
/// Errors
/// ----------
/// * [`TrackError::CsvError`] on I/O or malformed rows.
/// * [`TrackError::InvalidDate`] if a `Date` cell cannot be parsed.
pub fn read_positions_csv(path: &Utf8Path) -> Result<PositionData, TrackError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut positions = PositionData::new();

    for row in reader.deserialize() {
        let raw: RawPosition = row?;
        let date = Epoch::from_str(raw.date.trim())
            .map_err(|e| TrackError::InvalidDate(format!("{}: {e}", raw.date)))?;

        positions.entry(raw.driver).or_default().push(PositionSample {
            date,
            x: raw.x,
            y: raw.y,
            on_track: raw.status == ON_TRACK_STATUS,
        });
    }

    Ok(positions)
}

/// Read the lap timing table from a CSV file.
///
/// Lap numbers are stored as floats by some exporters (`12.0`); they are rounded.
pub fn read_laps_csv(path: &Utf8Path) -> Result<LapTable, TrackError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut laps = Vec::new();

    for row in reader.deserialize() {
        let raw: RawLap = row?;
        laps.push(LapRecord {
            vehicle: raw.driver,
            lap_number: raw
                .number_of_laps
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(|n| n.round() as u32),
            session_time: Duration::from_seconds(raw.time),
            lap_time: seconds(raw.last_lap_time),
            sector2_time: seconds(raw.sector2_time),
            sector3_time: seconds(raw.sector3_time),
            pit_in_time: seconds(raw.pit_in_time),
            pit_out_time: seconds(raw.pit_out_time),
        });
    }

    Ok(LapTable::new(laps))
}
