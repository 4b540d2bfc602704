#![allow(dead_code)]

use hifitime::{Duration, Epoch};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use trackmap::{LapRecord, LapTable, PositionData, PositionSample, SessionData, TrackPoint};

/// Perimeter of the synthetic rectangle circuit.
pub const LOOP_LENGTH: f64 = 6000.0;

/// Arc position (from the line) of the sector 1/2 border.
pub const SECTOR12_ARC: f64 = 2500.0;

/// Arc position (from the line) of the sector 2/3 border.
pub const SECTOR23_ARC: f64 = 4500.0;

/// Arc position of the vehicles when the recording starts.
const START_ARC: f64 = 3000.0;

/// Sampling period of the position feed, in seconds.
const SAMPLE_PERIOD: f64 = 0.25;

pub fn session_start() -> Epoch {
    Epoch::from_gregorian_utc_hms(2021, 3, 28, 15, 0, 0)
}

/// True start/finish line position.
pub fn start_finish() -> TrackPoint {
    position_on_loop(0.0)
}

/// Position on the 2000 × 1000 rectangle, driven counterclockwise from the line at (1000, 0).
pub fn position_on_loop(arc: f64) -> TrackPoint {
    let s = arc.rem_euclid(LOOP_LENGTH);
    let (x, y) = if s < 1000.0 {
        (1000.0 + s, 0.0)
    } else if s < 2000.0 {
        (2000.0, s - 1000.0)
    } else if s < 4000.0 {
        (4000.0 - s, 1000.0)
    } else if s < 5000.0 {
        (0.0, 5000.0 - s)
    } else {
        (s - 5000.0, 0.0)
    };
    TrackPoint::new(x, y)
}

/// `position_on_loop(arc)` moved sideways by `lateral`, perpendicular to the current edge.
pub fn position_off_line(arc: f64, lateral: f64) -> TrackPoint {
    let p = position_on_loop(arc);
    let s = arc.rem_euclid(LOOP_LENGTH);
    let on_vertical_edge = (1000.0..2000.0).contains(&s) || (4000.0..5000.0).contains(&s);
    if on_vertical_edge {
        TrackPoint::new(p.x + lateral, p.y)
    } else {
        TrackPoint::new(p.x, p.y + lateral)
    }
}

fn seconds(s: f64) -> Duration {
    Duration::from_seconds(s)
}

/// Recording of one synthetic vehicle.
pub struct SyntheticVehicle {
    pub samples: Vec<PositionSample>,
    pub laps: Vec<LapRecord>,
}

/// Drive one vehicle from the middle of the back straight through four line passages.
///
/// Every lap is driven at a constant speed drawn from `speed`. Samples restart at every line
/// passage, so each passage is sampled exactly on the line. `time_offset` shifts the
/// recorded lap end times (timing feed inaccuracy), not the samples.
pub fn drive(
    vehicle: &str,
    rng: &mut StdRng,
    speed: &Normal<f64>,
    time_offset: f64,
) -> SyntheticVehicle {
    let t0 = session_start();
    let mut samples = Vec::new();
    let mut laps = Vec::new();

    let mut t = 0.0;
    let mut previous_passage = 0.0;

    for lap in 0..4 {
        let v = speed.sample(rng).clamp(70.0, 130.0);
        let start_arc = if lap == 0 { START_ARC } else { 0.0 };
        let duration = (LOOP_LENGTH - start_arc) / v;

        let mut j = 0;
        while SAMPLE_PERIOD * (j as f64) < duration {
            let dt = SAMPLE_PERIOD * j as f64;
            let p = position_on_loop(start_arc + v * dt);
            samples.push(PositionSample::new(t0 + seconds(t + dt), p.x, p.y, true));
            j += 1;
        }

        let lap_start = t;
        t += duration;

        // lap numbers start at 1 for the partial first lap
        let number = lap + 1;
        let (lap_time, sector2, sector3) = if lap == 0 {
            (None, None, None)
        } else {
            let s12 = lap_start + SECTOR12_ARC / v;
            let s23 = lap_start + SECTOR23_ARC / v;
            (
                Some(seconds(t) - seconds(previous_passage)),
                Some(seconds(s23) - seconds(s12)),
                Some(seconds(t) - seconds(s23)),
            )
        };

        laps.push(LapRecord {
            vehicle: vehicle.to_string(),
            lap_number: Some(number),
            session_time: seconds(t) + seconds(time_offset),
            lap_time,
            sector2_time: sector2,
            sector3_time: sector3,
            pit_in_time: None,
            pit_out_time: None,
        });
        previous_passage = t;
    }

    let end = position_on_loop(0.0);
    samples.push(PositionSample::new(t0 + seconds(t), end.x, end.y, true));

    SyntheticVehicle { samples, laps }
}

/// Three vehicles on the rectangle circuit with noisy lap speeds and biased lap end times.
pub fn rectangle_session(seed: u64) -> SessionData {
    let mut rng = StdRng::seed_from_u64(seed);
    let speed = Normal::new(100.0, 8.0).unwrap();

    let mut positions = PositionData::new();
    let mut laps = Vec::new();

    for (vehicle, offset) in [("A", -0.4), ("B", 0.3), ("C", 0.1)] {
        let recording = drive(vehicle, &mut rng, &speed, offset);
        positions.insert(vehicle.to_string(), recording.samples);
        laps.extend(recording.laps);
    }

    SessionData::new(positions, LapTable::new(laps))
        .unwrap()
        .with_session_start(session_start())
}

/// Drive one vehicle from the back straight through `passages` line passages, sampled on a
/// fixed clock.
///
/// Unlike [`drive`], sampling runs every [`SAMPLE_PERIOD`] from the recording start whatever
/// the line passages, so passages fall between two samples. Every sample is moved sideways
/// by a draw of `lateral` (driving-line variance). Lap and sector times are exact,
/// `time_offset` shifts the recorded lap end times.
pub fn drive_on_clock(
    vehicle: &str,
    rng: &mut StdRng,
    speed: &Normal<f64>,
    lateral: &Normal<f64>,
    time_offset: f64,
    passages: u32,
) -> SyntheticVehicle {
    // (passage time, speed of the lap ending there)
    let mut ends: Vec<(f64, f64)> = Vec::new();
    let mut t = 0.0;
    for lap in 0..passages {
        let v = speed.sample(rng).clamp(70.0, 130.0);
        let start_arc = if lap == 0 { START_ARC } else { 0.0 };
        t += (LOOP_LENGTH - start_arc) / v;
        ends.push((t, v));
    }

    let arc_at = |time: f64| -> f64 {
        let mut lap_start = 0.0;
        for (k, &(end, v)) in ends.iter().enumerate() {
            let start_arc = if k == 0 { START_ARC } else { 0.0 };
            if time < end {
                return start_arc + v * (time - lap_start);
            }
            lap_start = end;
        }
        // after the last passage, keep the speed of the last lap
        let (end, v) = ends[ends.len() - 1];
        v * (time - end)
    };

    let t0 = session_start();
    let stop = t + 2.0;
    let samples = (0..)
        .map(|j| SAMPLE_PERIOD * j as f64)
        .take_while(|&time| time <= stop)
        .map(|time| {
            let p = position_off_line(arc_at(time), lateral.sample(rng));
            PositionSample::new(t0 + seconds(time), p.x, p.y, true)
        })
        .collect();

    let mut laps = Vec::new();
    let mut previous_passage = 0.0;
    for (k, &(end, v)) in ends.iter().enumerate() {
        let (lap_time, sector2, sector3) = if k == 0 {
            (None, None, None)
        } else {
            let s12 = previous_passage + SECTOR12_ARC / v;
            let s23 = previous_passage + SECTOR23_ARC / v;
            (
                Some(seconds(end) - seconds(previous_passage)),
                Some(seconds(s23) - seconds(s12)),
                Some(seconds(end) - seconds(s23)),
            )
        };

        laps.push(LapRecord {
            vehicle: vehicle.to_string(),
            lap_number: Some(k as u32 + 1),
            session_time: seconds(end) + seconds(time_offset),
            lap_time,
            sector2_time: sector2,
            sector3_time: sector3,
            pit_in_time: None,
            pit_out_time: None,
        });
        previous_passage = end;
    }

    SyntheticVehicle { samples, laps }
}

/// Lap end time bias of the vehicles of [`noisy_rectangle_session`], in seconds.
pub const NOISY_OFFSETS: [(&str, f64); 3] = [("A", -1.5), ("B", 1.2), ("C", 0.5)];

/// Three vehicles on the rectangle circuit, sampled on a fixed clock with lateral noise of
/// standard deviation `lateral_sigma`, five line passages each and strongly biased lap ends.
pub fn noisy_rectangle_session(seed: u64, lateral_sigma: f64) -> SessionData {
    let mut rng = StdRng::seed_from_u64(seed);
    let speed = Normal::new(100.0, 8.0).unwrap();
    let lateral = Normal::new(0.0, lateral_sigma).unwrap();

    let mut positions = PositionData::new();
    let mut laps = Vec::new();

    for (vehicle, offset) in NOISY_OFFSETS {
        let recording = drive_on_clock(vehicle, &mut rng, &speed, &lateral, offset, 5);
        positions.insert(vehicle.to_string(), recording.samples);
        laps.extend(recording.laps);
    }

    SessionData::new(positions, LapTable::new(laps))
        .unwrap()
        .with_session_start(session_start())
}
