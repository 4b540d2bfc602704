//! Per-candidate timing of the search, used for the observer snapshots and the ETA.
//!
//! Candidate durations vary with the number of laps a vehicle can contribute at this
//! position, so the remaining time is extrapolated from a smoothed duration rather than the
//! last one. [`CandidateTimer`] keeps an exponentially weighted average: every new duration
//! `dt` moves the average by `smoothing · (dt − average)`. The first candidate seeds it.
use std::time::{Duration, Instant};

use crate::constants::TourIndex;
use crate::point::TrackPoint;

/// Wall-clock duration of the evaluated candidates.
#[derive(Debug, Clone)]
pub struct CandidateTimer {
    started: Instant,
    average_ns: f64,
    smoothing: f64,
    evaluated: u64,
}

impl CandidateTimer {
    /// `smoothing` in `(0, 1]`, `1.0` keeps the last duration only.
    pub fn new(smoothing: f64) -> Self {
        debug_assert!(smoothing > 0.0 && smoothing <= 1.0);
        CandidateTimer {
            started: Instant::now(),
            average_ns: 0.0,
            smoothing,
            evaluated: 0,
        }
    }

    /// Stop the clock of the current candidate, restart it for the next one.
    pub fn finish_candidate(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.started);
        self.started = now;
        self.record(elapsed);
        elapsed
    }

    fn record(&mut self, elapsed: Duration) {
        let ns = elapsed.as_nanos() as f64;
        self.average_ns = match self.evaluated {
            0 => ns,
            _ => self.average_ns + self.smoothing * (ns - self.average_ns),
        };
        self.evaluated += 1;
    }

    pub fn evaluated(&self) -> u64 {
        self.evaluated
    }

    /// Smoothed candidate duration, zero before the first candidate.
    pub fn smoothed(&self) -> Duration {
        Duration::from_nanos(self.average_ns.round() as u64)
    }
}

/// Short human-readable duration for log lines and the progress bar message.
///
/// `"840µs"`, `"42ms"`, `"3.14s"`, and minutes above one minute (`"2m05s"`).
pub fn short_duration(d: Duration) -> String {
    match d.as_secs() {
        0 if d.as_millis() == 0 => format!("{}µs", d.as_micros()),
        0 => format!("{}ms", d.as_millis()),
        s if s < 60 => format!("{:.2}s", d.as_secs_f64()),
        s => format!("{}m{:02}s", s / 60, s % 60),
    }
}

/// State of the search after one completed candidate.
#[derive(Debug, Clone)]
pub struct SearchProgress {
    /// Zero-based number of the completed iteration.
    pub iteration: usize,
    pub total: usize,
    pub candidate_index: TourIndex,
    pub candidate: TrackPoint,
    /// Tasks enqueued (and completed) during the iteration.
    pub tasks: usize,
    pub last: Duration,
    /// Smoothed iteration duration.
    pub average: Duration,
}

impl SearchProgress {
    /// Estimated remaining time, from the smoothed iteration duration.
    pub fn eta(&self) -> Duration {
        let remaining = self.total.saturating_sub(self.iteration + 1) as u32;
        self.average * remaining
    }
}

#[cfg(test)]
mod test_progress {
    use super::*;

    #[test]
    fn test_short_duration() {
        assert_eq!(short_duration(Duration::from_micros(840)), "840µs");
        assert_eq!(short_duration(Duration::from_millis(42)), "42ms");
        assert_eq!(short_duration(Duration::from_millis(3140)), "3.14s");
        assert_eq!(short_duration(Duration::from_secs(125)), "2m05s");
    }

    #[test]
    fn test_smoothed_duration() {
        let mut timer = CandidateTimer::new(0.25);
        assert_eq!(timer.smoothed(), Duration::ZERO);

        timer.record(Duration::from_millis(100));
        assert_eq!(timer.smoothed(), Duration::from_millis(100));

        // a slow candidate only moves the average by a quarter of the difference
        timer.record(Duration::from_millis(500));
        assert_eq!(timer.smoothed(), Duration::from_millis(200));
        timer.record(Duration::from_millis(200));
        assert_eq!(timer.smoothed(), Duration::from_millis(200));
        assert_eq!(timer.evaluated(), 3);
    }

    #[test]
    fn test_finish_candidate_restarts_clock() {
        let mut timer = CandidateTimer::new(1.0);
        let first = timer.finish_candidate();
        assert_eq!(timer.smoothed(), Duration::from_nanos(first.as_nanos() as u64));
        let second = timer.finish_candidate();
        assert_eq!(timer.smoothed(), Duration::from_nanos(second.as_nanos() as u64));
        assert_eq!(timer.evaluated(), 2);
    }

    #[test]
    fn test_eta() {
        let progress = SearchProgress {
            iteration: 1,
            total: 5,
            candidate_index: 0,
            candidate: TrackPoint::new(0.0, 0.0),
            tasks: 3,
            last: Duration::from_millis(10),
            average: Duration::from_millis(20),
        };
        assert_eq!(progress.eta(), Duration::from_millis(60));
    }
}
