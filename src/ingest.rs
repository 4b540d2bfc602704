//! # Unique track point extraction
//!
//! Although a session holds more than a hundred thousand position samples, the number of
//! **unique** on-track coordinates is limited: roughly one per meter of track length,
//! closer together in slow corners than on straights. A typical circuit ends up with
//! 5000 to 7000 unique points.
//!
//! [`unique_track_points`] combines the series of all vehicles, keeps the on-track samples,
//! drops everything but the coordinate pair and removes duplicates (first occurrence wins).
//!
//! A point that no car ever reported simply does not exist for the resulting track map.
//! The map is therefore only valid for the session it was computed from.
use std::collections::HashSet;

use ahash::RandomState;
use ordered_float::OrderedFloat;

use crate::point::TrackPoint;
use crate::session::PositionData;

/// Extract the unordered set of unique on-track coordinates of all vehicles.
///
/// Vehicles are visited in map order and samples in series order, so the output order is
/// deterministic for a given input. Dates are not kept.
pub fn unique_track_points(positions: &PositionData) -> Vec<TrackPoint> {
    let mut seen: HashSet<(OrderedFloat<f64>, OrderedFloat<f64>), RandomState> =
        HashSet::default();

    positions
        .values()
        .flat_map(|series| series.iter())
        .filter(|sample| sample.on_track)
        .filter(|sample| seen.insert((OrderedFloat(sample.x), OrderedFloat(sample.y))))
        .map(|sample| TrackPoint::new(sample.x, sample.y))
        .collect()
}

#[cfg(test)]
mod test_ingest {
    use hifitime::{Duration, Epoch};

    use super::*;
    use crate::session::PositionSample;

    #[test]
    fn test_unique_on_track_points() {
        let t0 = Epoch::from_gregorian_utc_hms(2021, 3, 28, 15, 0, 0);
        let at = |s: f64| t0 + Duration::from_seconds(s);

        let mut positions = PositionData::new();
        positions.insert(
            "33".into(),
            vec![
                PositionSample::new(at(0.0), 0.0, 0.0, true),
                PositionSample::new(at(0.3), 10.0, 0.0, true),
                PositionSample::new(at(0.6), 10.0, 0.0, true),
                PositionSample::new(at(0.9), 99.0, 99.0, false),
            ],
        );
        positions.insert(
            "44".into(),
            vec![
                PositionSample::new(at(0.1), 10.0, 0.0, true),
                PositionSample::new(at(0.4), 20.0, 5.0, true),
            ],
        );

        let points = unique_track_points(&positions);
        assert_eq!(
            points,
            vec![
                TrackPoint::new(0.0, 0.0),
                TrackPoint::new(10.0, 0.0),
                TrackPoint::new(20.0, 5.0),
            ]
        );
        assert!(points.iter().all(|p| p.date.is_none()));
    }
}
