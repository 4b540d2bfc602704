//! # Robust statistics helpers
//!
//! Small numeric helpers shared by the candidate-range estimate and the candidate scoring.
//!
//! * [`mean`], [`median`] – central values, `None` on empty input.
//! * [`mean_absolute_deviation`] – average absolute distance to the mean, the dispersion
//!   score used to rank candidates.
//! * [`reject_outliers`] – median-deviation filter applied jointly to a primary array and
//!   any number of sibling arrays sharing its indexing.
use std::cmp::Ordering;

use crate::trackmap_errors::TrackError;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of the values. For an even count, the average of the two central values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(0.5 * (sorted[mid - 1] + sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Mean absolute deviation around the mean: `Σ|vᵢ − v̄| / n`.
pub fn mean_absolute_deviation(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).abs()).sum::<f64>() / values.len() as f64)
}

/// Remove outliers from `primary` and the same indices from every `secondary` array.
///
/// An element is kept when its absolute deviation from the median of `primary`, divided by
/// the median of all those deviations, is strictly lower than `m`. If that median deviation
/// is zero the data carries no spread information and nothing is rejected.
///
/// Arguments
/// -----------------
/// * `primary`: values tested against the median criterion.
/// * `secondary`: arrays filtered alongside `primary` (e.g. the y coordinates of x values).
/// * `m`: rejection multiplier, in units of median deviation.
///
/// Return
/// ----------
/// * The filtered primary array and the filtered secondary arrays, in input order.
///
/// Errors
/// ----------
/// * [`TrackError::LengthMismatch`] if a secondary array does not match the primary length.
pub fn reject_outliers(
    primary: &[f64],
    secondary: &[&[f64]],
    m: f64,
) -> Result<(Vec<f64>, Vec<Vec<f64>>), TrackError> {
    if let Some(bad) = secondary.iter().find(|s| s.len() != primary.len()) {
        return Err(TrackError::LengthMismatch {
            expected: primary.len(),
            found: bad.len(),
        });
    }

    let Some(med) = median(primary) else {
        return Ok((Vec::new(), vec![Vec::new(); secondary.len()]));
    };
    let deviations: Vec<f64> = primary.iter().map(|v| (v - med).abs()).collect();
    let mdev = median(&deviations).unwrap_or(0.0);

    let keep: Vec<bool> = if mdev == 0.0 {
        vec![true; primary.len()]
    } else {
        deviations.iter().map(|d| d / mdev < m).collect()
    };

    let filter = |values: &[f64]| -> Vec<f64> {
        values
            .iter()
            .zip(&keep)
            .filter_map(|(v, k)| k.then_some(*v))
            .collect()
    };

    Ok((filter(primary), secondary.iter().map(|&s| filter(s)).collect()))
}
