//! # Time ↔ position queries
//!
//! Both queries combine the tour with the raw position series of one vehicle:
//!
//! * [`TrackTopology::position_at_time`] – where was the vehicle at a given date?
//! * [`TrackTopology::crossing_time`] – when did the vehicle pass a given point?
//!
//! Position samples arrive roughly every 200-300 ms, so both answers are linear
//! interpolations between the two relevant samples.
use hifitime::{Duration, Epoch};
use itertools::Itertools;

use crate::point::TrackPoint;
use crate::session::{PositionSample, SessionData};

use super::TrackTopology;

#[inline]
fn sample_point(sample: &PositionSample) -> TrackPoint {
    TrackPoint::with_date(sample.x, sample.y, sample.date)
}

impl TrackTopology {
    /// Interpolated position of `vehicle` at `date`.
    ///
    /// The two samples chronologically closest to `date` (ties resolve to the earlier sample)
    /// are interpolated linearly by elapsed time. Outside the sampled period, the two
    /// boundary samples are extrapolated.
    ///
    /// Return
    /// ----------
    /// * `None` if the vehicle is unknown or has fewer than two samples, if either sample
    ///   fails the lazy [`is_track_point`](TrackTopology::is_track_point) check, or if both
    ///   samples carry the same date.
    pub fn position_at_time(
        &self,
        session: &SessionData,
        vehicle: &str,
        date: Epoch,
    ) -> Option<TrackPoint> {
        let series = session.series(vehicle)?;
        if series.len() < 2 {
            return None;
        }

        // the two closest samples of a sorted series lie in [i-2, i+2)
        let i = series.partition_point(|s| s.date < date);
        let window = &series[i.saturating_sub(2)..(i + 2).min(series.len())];

        let (s0, s1) = window
            .iter()
            .sorted_by(|a, b| {
                let da = (a.date - date).to_seconds().abs();
                let db = (b.date - date).to_seconds().abs();
                da.total_cmp(&db)
            })
            .take(2)
            .collect_tuple()?;

        if !(self.is_track_point(s0.x, s0.y) && self.is_track_point(s1.x, s1.y)) {
            return None;
        }

        let dt = (s1.date - s0.date).to_seconds();
        if dt == 0.0 {
            return None;
        }
        let t = (date - s0.date).to_seconds() / dt;

        Some(TrackPoint::with_date(
            s0.x + (s1.x - s0.x) * t,
            s0.y + (s1.y - s0.y) * t,
            date,
        ))
    }

    /// Estimated date at which `vehicle` passed `candidate`.
    ///
    /// Only samples strictly inside `(around - window, around + window)` are used, so that a
    /// single passage of the point is considered. They are split by their x coordinate
    /// (lower than the candidate, or not) and the sample closest to the candidate is picked
    /// on each side. The date is interpolated linearly by the Euclidean distance ratio
    /// along the segment joining them.
    ///
    /// Arguments
    /// -----------------
    /// * `session`: position series of the session.
    /// * `vehicle`: vehicle identifier.
    /// * `candidate`: any point, not necessarily a tour point.
    /// * `around`: approximate passage date, e.g. the recorded lap end.
    /// * `window`: half width of the search window.
    ///
    /// Return
    /// ----------
    /// * `None` if no sample lies on one of the two sides within the window.
    pub fn crossing_time(
        &self,
        session: &SessionData,
        vehicle: &str,
        candidate: &TrackPoint,
        around: Epoch,
        window: Duration,
    ) -> Option<Epoch> {
        let series = session.series(vehicle)?;

        let (start, end) = (around - window, around + window);
        let lo = series.partition_point(|s| s.date <= start);
        let hi = series.partition_point(|s| s.date < end);
        let in_window = series.get(lo..hi)?;

        let (below, above): (Vec<TrackPoint>, Vec<TrackPoint>) = in_window
            .iter()
            .map(sample_point)
            .partition(|p| p.x < candidate.x);

        let nearest = |side: &[TrackPoint]| -> Option<TrackPoint> {
            side.iter()
                .min_by(|a, b| candidate.sqr_dist(a).total_cmp(&candidate.sqr_dist(b)))
                .copied()
        };
        let a = nearest(&below)?;
        let b = nearest(&above)?;

        let segment = a.distance(&b);
        if segment == 0.0 {
            return None;
        }
        let fraction = a.distance(candidate) / segment;

        let (date_a, date_b) = (a.date?, b.date?);
        Some(date_a + Duration::from_seconds((date_b - date_a).to_seconds() * fraction))
    }
}

#[cfg(test)]
mod test_temporal {
    use approx::assert_relative_eq;

    use super::*;
    use crate::session::{LapTable, PositionData};
    use crate::track::TopologyParams;

    /// Straight line along x at 100 units/s, one sample every 0.5 s (x = 0, 50, ... 950).
    fn straight() -> (TrackTopology, SessionData, Epoch) {
        let t0 = Epoch::from_gregorian_utc_hms(2021, 3, 28, 15, 0, 0);
        let series: Vec<PositionSample> = (0..20)
            .map(|i| {
                let s = 0.5 * i as f64;
                PositionSample::new(t0 + Duration::from_seconds(s), 100.0 * s, 0.0, true)
            })
            .collect();

        let mut positions = PositionData::new();
        positions.insert("16".into(), series);
        let session = SessionData::new(positions, LapTable::default()).unwrap();

        let points = session.series("16").unwrap().iter().map(sample_point).collect();
        let track = TrackTopology::from_points(points, TopologyParams::default()).unwrap();
        (track, session, t0)
    }

    #[test]
    fn test_position_at_time() {
        let (track, session, t0) = straight();

        let p = track
            .position_at_time(&session, "16", t0 + Duration::from_seconds(3.2))
            .unwrap();
        assert_relative_eq!(p.x, 320.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0);

        // exactly on a sample
        let p = track
            .position_at_time(&session, "16", t0 + Duration::from_seconds(4.0))
            .unwrap();
        assert_relative_eq!(p.x, 400.0, epsilon = 1e-6);

        // before the first sample: extrapolated
        let p = track
            .position_at_time(&session, "16", t0 - Duration::from_seconds(1.0))
            .unwrap();
        assert_relative_eq!(p.x, -100.0, epsilon = 1e-6);

        assert!(track.position_at_time(&session, "99", t0).is_none());
    }

    #[test]
    fn test_position_requires_track_points() {
        let (_, session, t0) = straight();
        let points = vec![
            TrackPoint::new(0.0, 5.0),
            TrackPoint::new(50.0, 5.0),
            TrackPoint::new(100.0, 5.0),
        ];
        let shifted = TrackTopology::from_points(points, TopologyParams::default()).unwrap();
        assert!(shifted
            .position_at_time(&session, "16", t0 + Duration::from_seconds(0.2))
            .is_none());
    }

    #[test]
    fn test_crossing_time() {
        let (track, session, t0) = straight();
        let around = t0 + Duration::from_seconds(5.0);

        let date = track
            .crossing_time(
                &session,
                "16",
                &TrackPoint::new(512.5, 0.0),
                around,
                Duration::from_seconds(10.0),
            )
            .unwrap();
        assert_relative_eq!((date - t0).to_seconds(), 5.125, epsilon = 1e-6);
    }

    #[test]
    fn test_crossing_time_needs_both_sides() {
        let (track, session, t0) = straight();
        let around = t0 + Duration::from_seconds(1.0);

        // window (0, 2) s holds x = 50 .. 150: nothing above x = 500
        assert!(track
            .crossing_time(
                &session,
                "16",
                &TrackPoint::new(500.0, 0.0),
                around,
                Duration::from_seconds(1.0),
            )
            .is_none());
    }
}
