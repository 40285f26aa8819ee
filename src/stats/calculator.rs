//! Statistics Calculator Module
//! Descriptive statistics for the numeric student fields and correlation between pairs.

use crate::data::{NumericField, Snapshot};
use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Summary of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub p05: f64,
}

impl Default for DescriptiveStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            variance: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p95: f64::NAN,
            p05: f64::NAN,
        }
    }
}

/// Statistics for one numeric field across the snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub field: NumericField,
    /// Students with no value for the field.
    pub missing: usize,
    pub stats: DescriptiveStats,
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Present values of `field`, in snapshot order.
    pub fn values(snapshot: &Snapshot, field: NumericField) -> Vec<f64> {
        snapshot.iter().filter_map(|r| r.numeric(field)).collect()
    }

    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> DescriptiveStats {
        let n = values.len();
        if n == 0 {
            return DescriptiveStats::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        // sample variance; a single value has none
        let variance = if n > 1 { values.iter().variance() } else { 0.0 };

        DescriptiveStats {
            count: n,
            mean: values.iter().mean(),
            median,
            std: variance.sqrt(),
            variance,
            min: sorted[0],
            max: sorted[n - 1],
            p95: Self::percentile(&sorted, 95.0),
            p05: Self::percentile(&sorted, 5.0),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        match n {
            0 => return f64::NAN,
            1 => return sorted_values[0],
            _ => {}
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    pub fn field_stats(snapshot: &Snapshot, field: NumericField) -> FieldStats {
        let values = Self::values(snapshot, field);
        FieldStats {
            field,
            missing: snapshot.len() - values.len(),
            stats: Self::compute_descriptive_stats(&values),
        }
    }

    /// Statistics for every numeric field, computed in parallel, in field order.
    pub fn compute_all_stats_parallel(snapshot: &Snapshot) -> Vec<FieldStats> {
        NumericField::ALL
            .par_iter()
            .map(|&field| Self::field_stats(snapshot, field))
            .collect()
    }

    /// Pearson correlation of paired samples.
    ///
    /// `None` with fewer than two pairs, mismatched lengths, or a constant sample.
    pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
        if xs.len() != ys.len() || xs.len() < 2 {
            return None;
        }
        let sx = xs.iter().std_dev();
        let sy = ys.iter().std_dev();
        if sx == 0.0 || sy == 0.0 || !sx.is_finite() || !sy.is_finite() {
            return None;
        }
        let r = xs.iter().covariance(ys.iter()) / (sx * sy);
        Some(r.clamp(-1.0, 1.0))
    }
}
