//! # Session inputs: position series and lap table
//!
//! Read-only tabular inputs of one recorded session, already parsed by an external
//! collaborator (or loaded from CSV with [`csv_reader`]).
//!
//! Data model
//! -----------------
//! * [`PositionSample`] – one time-stamped coordinate sample of one vehicle.
//! * [`PositionData`] – `BTreeMap<VehicleId, Vec<PositionSample>>`. The ordered map keeps
//!   vehicle iteration deterministic, which makes the tour construction reproducible.
//! * [`LapRecord`] / [`LapTable`] – per-lap timing rows of all vehicles.
//! * [`SessionData`] – bundles the above with the vehicle list and the session start
//!   instant. Built once, then shared read-only (typically behind an `Arc`).
//!
//! "Date" vs "Time"
//! -----------------
//! * A **date** is an absolute instant ([`Epoch`]), e.g. the timestamp of a position sample.
//! * A **time** is a [`Duration`] counted from the session start, e.g. the moment a lap
//!   was registered. `session_start + time` converts the latter into the former.
//!
//! The session start is the first sample of the first listed vehicle rounded to the full
//! minute: sessions are always started on a full minute. Replacing the vehicle list with
//! [`SessionData::with_vehicles`] moves the start along, unless it was set explicitly.
use std::cmp::Ordering;
use std::collections::BTreeMap;

use hifitime::{Duration, Epoch};

use crate::constants::{Coordinate, VehicleId};
use crate::trackmap_errors::TrackError;

pub mod csv_reader;

/// Position series of all vehicles, keyed by vehicle.
pub type PositionData = BTreeMap<VehicleId, Vec<PositionSample>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub date: Epoch,
    pub x: Coordinate,
    pub y: Coordinate,
    pub on_track: bool,
}

impl PositionSample {
    pub fn new(date: Epoch, x: Coordinate, y: Coordinate, on_track: bool) -> Self {
        PositionSample {
            date,
            x,
            y,
            on_track,
        }
    }
}

/// One row of the lap timing table.
///
/// Fields
/// -----------------
/// * `vehicle` – car number.
/// * `lap_number` – lap counter, missing for some partial rows.
/// * `session_time` – session time at which the lap was registered (approximately the lap end).
/// * `lap_time` – duration of this lap.
/// * `sector2_time`, `sector3_time` – durations of the last two sectors of this lap.
/// * `pit_in_time`, `pit_out_time` – set on in-laps and out-laps.
#[derive(Debug, Clone, PartialEq)]
pub struct LapRecord {
    pub vehicle: VehicleId,
    pub lap_number: Option<u32>,
    pub session_time: Duration,
    pub lap_time: Option<Duration>,
    pub sector2_time: Option<Duration>,
    pub sector3_time: Option<Duration>,
    pub pit_in_time: Option<Duration>,
    pub pit_out_time: Option<Duration>,
}

impl LapRecord {
    /// Whether this lap can be trusted for the statistical search.
    ///
    /// First lap, last lap, in-laps, out-laps and laps without lap number are unreliable.
    pub fn is_usable(&self, last_lap: Option<u32>) -> bool {
        match self.lap_number {
            None => false,
            Some(n) => {
                n != 1
                    && Some(n) != last_lap
                    && self.pit_in_time.is_none()
                    && self.pit_out_time.is_none()
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LapTable {
    laps: Vec<LapRecord>,
}

impl LapTable {
    pub fn new(laps: Vec<LapRecord>) -> Self {
        LapTable { laps }
    }

    pub fn len(&self) -> usize {
        self.laps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LapRecord> {
        self.laps.iter()
    }

    pub fn for_vehicle<'a, 'v>(
        &'a self,
        vehicle: &'v str,
    ) -> impl Iterator<Item = &'a LapRecord> + use<'a, 'v> {
        self.laps.iter().filter(move |lap| lap.vehicle == vehicle)
    }

    /// Highest lap number recorded for this vehicle.
    pub fn last_lap_number(&self, vehicle: &str) -> Option<u32> {
        self.for_vehicle(vehicle)
            .filter_map(|lap| lap.lap_number)
            .max()
    }

    /// Laps of `vehicle` passing [`LapRecord::is_usable`], in table order.
    pub fn usable_laps(&self, vehicle: &str) -> Vec<&LapRecord> {
        let last = self.last_lap_number(vehicle);
        self.laps
            .iter()
            .filter(|lap| lap.vehicle == vehicle && lap.is_usable(last))
            .collect()
    }
}

/// All read-only inputs of one session.
#[derive(Debug, Clone)]
pub struct SessionData {
    positions: PositionData,
    laps: LapTable,
    vehicles: Vec<VehicleId>,
    session_start: Epoch,
    explicit_start: bool,
}

impl SessionData {
    /// Bundle the session inputs.
    ///
    /// Every position series is sorted by date. The vehicle list defaults to the vehicles
    /// of the position data, the session start to the first sample of the first vehicle
    /// rounded to the nearest full minute.
    ///
    /// Errors
    /// ----------
    /// * [`TrackError::EmptySession`] if no vehicle has any position sample.
    pub fn new(mut positions: PositionData, laps: LapTable) -> Result<Self, TrackError> {
        for series in positions.values_mut() {
            series.sort_by(|a, b| a.date.partial_cmp(&b.date).unwrap_or(Ordering::Equal));
        }

        let vehicles: Vec<VehicleId> = positions.keys().cloned().collect();
        let first_date =
            first_sample_date(&positions, &vehicles).ok_or(TrackError::EmptySession)?;

        Ok(SessionData {
            positions,
            laps,
            vehicles,
            session_start: round_to_minute(first_date),
            explicit_start: false,
        })
    }

    /// Replace the vehicle list, e.g. with the vehicles of the telemetry feed.
    ///
    /// Unless a start was given with [`Self::with_session_start`], the session start is
    /// recomputed from the first listed vehicle that has position samples. When none of the
    /// listed vehicles has samples, the previous start is kept.
    pub fn with_vehicles<I>(mut self, vehicles: I) -> Self
    where
        I: IntoIterator<Item = VehicleId>,
    {
        self.vehicles = vehicles.into_iter().collect();
        if !self.explicit_start {
            if let Some(date) = first_sample_date(&self.positions, &self.vehicles) {
                self.session_start = round_to_minute(date);
            }
        }
        self
    }

    /// Pin the session start. Later vehicle list changes leave it untouched.
    pub fn with_session_start(mut self, start: Epoch) -> Self {
        self.session_start = start;
        self.explicit_start = true;
        self
    }

    pub fn positions(&self) -> &PositionData {
        &self.positions
    }

    /// Position series of one vehicle, sorted by date.
    pub fn series(&self, vehicle: &str) -> Option<&[PositionSample]> {
        self.positions.get(vehicle).map(Vec::as_slice)
    }

    pub fn laps(&self) -> &LapTable {
        &self.laps
    }

    pub fn vehicles(&self) -> &[VehicleId] {
        &self.vehicles
    }

    pub fn session_start(&self) -> Epoch {
        self.session_start
    }

    /// Absolute date of a session time.
    #[inline]
    pub fn date_of(&self, session_time: Duration) -> Epoch {
        self.session_start + session_time
    }
}

/// Date of the first sample of the first vehicle in `vehicles` that has any sample.
fn first_sample_date(positions: &PositionData, vehicles: &[VehicleId]) -> Option<Epoch> {
    vehicles
        .iter()
        .filter_map(|vehicle| positions.get(vehicle))
        .find_map(|series| series.first())
        .map(|sample| sample.date)
}

/// Round an instant to the nearest full UTC minute.
pub(crate) fn round_to_minute(date: Epoch) -> Epoch {
    let seconds = date.to_utc_seconds();
    Epoch::from_utc_seconds((seconds / 60.0).round() * 60.0)
}
