//! # Reference conditions
//!
//! Scoring strategies testing whether a candidate point is the position of a fixed line
//! of the circuit (start/finish line or sector border).
//!
//! Principle
//! -----------------
//! For every usable lap of a vehicle:
//!
//! 1. estimate the date at which the vehicle passed the candidate point near the recorded
//!    lap end ([`TrackTopology::crossing_time`]),
//! 2. go back in time by a known duration of that lap (see [`Border::offset`]),
//! 3. look up where the vehicle was at that earlier date
//!    ([`TrackTopology::position_at_time`]).
//!
//! If the candidate is the true lap end line, step 3 lands on the same physical line on
//! every lap, and the derived positions cluster tightly. A wrong candidate shifts every
//! lap by a different amount, because drivers never drive two laps exactly alike, and the
//! positions scatter. The dispersion ([`mean_absolute_deviation`]) of the derived positions
//! is therefore the score of the candidate: lower is better.
//!
//! | Condition     | Subtracted duration(s)                  | Borders |
//! |---------------|-----------------------------------------|---------|
//! | `StartFinish` | lap time                                | 1       |
//! | `Sector12`    | sector 2 + sector 3 time                | 1       |
//! | `Sector23`    | sector 3 time                           | 1       |
//! | `AllBorders`  | all three of the above, jointly per lap | 3       |
//!
//! Problems which only concern a single lap (no sample on one side of the candidate, a
//! missing duration, a failed interpolation) skip that lap silently.
use std::fmt;

use hifitime::Duration;
use smallvec::SmallVec;

use crate::point::TrackPoint;
use crate::session::{LapRecord, SessionData};
use crate::statistics::{mean, mean_absolute_deviation};
use crate::track::TrackTopology;

/// Fixed line of the circuit whose position can be derived from lap timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Border {
    StartFinish,
    Sector12,
    Sector23,
}

impl Border {
    /// Duration between the passage of this border and the end of the lap.
    ///
    /// `None` if the lap table does not provide the required duration(s).
    pub fn offset(&self, lap: &LapRecord) -> Option<Duration> {
        match self {
            Border::StartFinish => lap.lap_time,
            Border::Sector23 => lap.sector3_time,
            Border::Sector12 => Some(lap.sector2_time? + lap.sector3_time?),
        }
    }
}

impl fmt::Display for Border {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Border::StartFinish => write!(f, "start/finish"),
            Border::Sector12 => write!(f, "sector 1/2"),
            Border::Sector23 => write!(f, "sector 2/3"),
        }
    }
}

/// Scoring strategy of the reference-line search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceCondition {
    StartFinish,
    Sector12,
    Sector23,
    AllBorders,
}

/// Derived positions of one border, one entry per evaluated lap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorderSamples {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl BorderSamples {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    fn push(&mut self, point: &TrackPoint) {
        self.x.push(point.x);
        self.y.push(point.y);
    }
}

/// Derived positions of all borders of a condition, in [`ReferenceCondition::borders`] order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSamples {
    pub borders: SmallVec<[BorderSamples; 3]>,
}

impl ConditionSamples {
    fn with_borders(count: usize) -> Self {
        ConditionSamples {
            borders: (0..count).map(|_| BorderSamples::default()).collect(),
        }
    }

    /// Concatenate the samples of `other` to the samples of `self`, border by border.
    ///
    /// An empty accumulator adopts the border layout of `other`.
    pub fn merge(&mut self, other: ConditionSamples) {
        if self.borders.is_empty() {
            self.borders = other.borders;
            return;
        }
        for (mine, theirs) in self.borders.iter_mut().zip(other.borders) {
            mine.x.extend(theirs.x);
            mine.y.extend(theirs.y);
        }
    }

    /// Number of evaluated laps (all borders hold the same count).
    pub fn laps(&self) -> usize {
        self.borders.first().map_or(0, BorderSamples::len)
    }
}

/// Central value and dispersion of the positions derived for one border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispersion {
    pub mean_x: f64,
    pub mean_y: f64,
    pub mad_x: f64,
    pub mad_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderStat {
    pub border: Border,
    pub samples: usize,
    /// `None` when no lap could be evaluated for this border.
    pub dispersion: Option<Dispersion>,
}

/// Aggregated statistics of one candidate point for one condition.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStat {
    pub candidate: TrackPoint,
    pub borders: SmallVec<[BorderStat; 3]>,
}

impl CandidateStat {
    /// Ranking score: sum of `mad_x + mad_y` over the borders.
    ///
    /// `None` if any border has no sample, such a candidate cannot be ranked.
    pub fn score(&self) -> Option<f64> {
        self.borders
            .iter()
            .map(|b| b.dispersion.map(|d| d.mad_x + d.mad_y))
            .sum()
    }
}

impl ReferenceCondition {
    /// Borders evaluated by this condition.
    pub fn borders(&self) -> &'static [Border] {
        match self {
            ReferenceCondition::StartFinish => &[Border::StartFinish],
            ReferenceCondition::Sector12 => &[Border::Sector12],
            ReferenceCondition::Sector23 => &[Border::Sector23],
            ReferenceCondition::AllBorders => {
                &[Border::StartFinish, Border::Sector12, Border::Sector23]
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReferenceCondition::StartFinish => "StartFinish",
            ReferenceCondition::Sector12 => "Sector12",
            ReferenceCondition::Sector23 => "Sector23",
            ReferenceCondition::AllBorders => "AllBorders",
        }
    }

    /// Derive the border positions implied by `candidate` over all usable laps of `vehicle`.
    ///
    /// Arguments
    /// -----------------
    /// * `track`: tour of the session.
    /// * `session`: position series, lap table and session start.
    /// * `vehicle`: vehicle to evaluate.
    /// * `candidate`: hypothesized lap end line position.
    /// * `window`: half width of the crossing search around each recorded lap end.
    ///
    /// Return
    /// ----------
    /// * One [`BorderSamples`] per border, each holding one entry per evaluated lap. A lap is
    ///   only kept if every border of the condition could be derived.
    pub fn evaluate(
        &self,
        track: &TrackTopology,
        session: &SessionData,
        vehicle: &str,
        candidate: &TrackPoint,
        window: Duration,
    ) -> ConditionSamples {
        let borders = self.borders();
        let mut samples = ConditionSamples::with_borders(borders.len());

        for lap in session.laps().usable_laps(vehicle) {
            let lap_end = session.date_of(lap.session_time);
            let Some(crossing) = track.crossing_time(session, vehicle, candidate, lap_end, window)
            else {
                continue;
            };

            let derived: Option<SmallVec<[TrackPoint; 3]>> = borders
                .iter()
                .map(|border| {
                    let offset = border.offset(lap)?;
                    track.position_at_time(session, vehicle, crossing - offset)
                })
                .collect();

            if let Some(points) = derived {
                for (acc, point) in samples.borders.iter_mut().zip(&points) {
                    acc.push(point);
                }
            }
        }

        samples
    }

    /// Reduce the merged samples of all vehicles to the statistics of `candidate`.
    pub fn aggregate(&self, samples: &ConditionSamples, candidate: &TrackPoint) -> CandidateStat {
        let borders = self
            .borders()
            .iter()
            .enumerate()
            .map(|(i, &border)| {
                let empty = BorderSamples::default();
                let data = samples.borders.get(i).unwrap_or(&empty);
                BorderStat {
                    border,
                    samples: data.len(),
                    dispersion: dispersion(data),
                }
            })
            .collect();

        CandidateStat {
            candidate: *candidate,
            borders,
        }
    }
}

fn dispersion(data: &BorderSamples) -> Option<Dispersion> {
    Some(Dispersion {
        mean_x: mean(&data.x)?,
        mean_y: mean(&data.y)?,
        mad_x: mean_absolute_deviation(&data.x)?,
        mad_y: mean_absolute_deviation(&data.y)?,
    })
}

impl fmt::Display for ReferenceCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test_conditions {
    use approx::assert_relative_eq;
    use smallvec::smallvec;

    use super::*;

    fn lap() -> LapRecord {
        LapRecord {
            vehicle: "1".into(),
            lap_number: Some(2),
            session_time: Duration::from_seconds(200.0),
            lap_time: Some(Duration::from_seconds(90.0)),
            sector2_time: Some(Duration::from_seconds(35.0)),
            sector3_time: Some(Duration::from_seconds(25.0)),
            pit_in_time: None,
            pit_out_time: None,
        }
    }

    #[test]
    fn test_border_offsets() {
        let lap = lap();
        assert_eq!(
            Border::StartFinish.offset(&lap),
            Some(Duration::from_seconds(90.0))
        );
        assert_eq!(
            Border::Sector12.offset(&lap),
            Some(Duration::from_seconds(60.0))
        );
        assert_eq!(
            Border::Sector23.offset(&lap),
            Some(Duration::from_seconds(25.0))
        );

        let mut partial = lap;
        partial.sector2_time = None;
        assert_eq!(Border::Sector12.offset(&partial), None);
        assert!(Border::Sector23.offset(&partial).is_some());
    }

    #[test]
    fn test_merge() {
        let mut acc = ConditionSamples::default();
        acc.merge(ConditionSamples {
            borders: smallvec![BorderSamples {
                x: vec![1.0],
                y: vec![2.0]
            }],
        });
        acc.merge(ConditionSamples {
            borders: smallvec![BorderSamples {
                x: vec![3.0, 5.0],
                y: vec![4.0, 6.0]
            }],
        });
        assert_eq!(acc.laps(), 3);
        assert_eq!(acc.borders[0].x, vec![1.0, 3.0, 5.0]);
        assert_eq!(acc.borders[0].y, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_aggregate_and_score() {
        let condition = ReferenceCondition::AllBorders;
        let samples = ConditionSamples {
            borders: smallvec![
                BorderSamples {
                    x: vec![0.0, 2.0],
                    y: vec![10.0, 10.0]
                },
                BorderSamples {
                    x: vec![5.0, 5.0],
                    y: vec![1.0, 3.0]
                },
                BorderSamples {
                    x: vec![4.0, 4.0],
                    y: vec![4.0, 4.0]
                },
            ],
        };
        let candidate = TrackPoint::new(1.0, 1.0);
        let stat = condition.aggregate(&samples, &candidate);

        assert_eq!(stat.borders.len(), 3);
        assert_eq!(stat.borders[1].border, Border::Sector12);
        let d = stat.borders[0].dispersion.unwrap();
        assert_relative_eq!(d.mean_x, 1.0);
        assert_relative_eq!(d.mad_x, 1.0);
        assert_relative_eq!(d.mad_y, 0.0);
        assert_relative_eq!(stat.score().unwrap(), 2.0);
    }

    #[test]
    fn test_empty_border_has_no_score() {
        let stat = ReferenceCondition::StartFinish
            .aggregate(&ConditionSamples::default(), &TrackPoint::new(0.0, 0.0));
        assert_eq!(stat.borders[0].samples, 0);
        assert!(stat.borders[0].dispersion.is_none());
        assert!(stat.score().is_none());
    }
}
