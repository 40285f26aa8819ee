//! Donut Chart Module
//! Student counts per attribute value, laid out as padded pie slices on a ring.

use crate::charts::attributes::{find_donut_attribute, AttributeOption, SPECTRAL_10};
use crate::charts::{ChartError, Point};
use crate::data::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::TAU;

/// Group label for students with no value for the chosen attribute.
pub const MISSING_LABEL: &str = "missing";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonutOptions {
    pub width: f64,
    pub height: f64,
    /// Ring thickness and arc corner rounding.
    pub corner_radius: f64,
    pub pad_angle: f64,
}

impl Default for DonutOptions {
    fn default() -> Self {
        Self {
            width: 300.0,
            height: 300.0,
            corner_radius: 15.0,
            pad_angle: 0.03,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutSlice {
    pub label: String,
    pub count: usize,
    /// Radians clockwise from 12 o'clock.
    pub start_angle: f64,
    pub end_angle: f64,
    pub pad_angle: f64,
    pub color: &'static str,
}

/// Text shown in the middle of the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonutDetail {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DonutLayout {
    pub attribute: AttributeOption,
    pub total: usize,
    pub center: Point,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub corner_radius: f64,
    pub slices: Vec<DonutSlice>,
}

impl DonutLayout {
    /// Centre text: the student total, or the hovered slice's count.
    pub fn detail(&self, hovered: Option<usize>) -> DonutDetail {
        match hovered.and_then(|i| self.slices.get(i)) {
            Some(slice) => DonutDetail {
                value: slice.count.to_string(),
                label: slice.label.to_lowercase(),
            },
            None => DonutDetail {
                value: self.total.to_string(),
                label: "Students".to_string(),
            },
        }
    }
}

/// Slice angles for `values` over a full turn, in input order.
///
/// Each slice is widened by the pad angle, which is capped at `TAU / n`, and
/// the remaining turn is split proportionally among positive values.
/// Returns `(start, end, pad)` per value.
pub fn pie_angles(values: &[f64], pad_angle: f64) -> Vec<(f64, f64, f64)> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let pad = pad_angle.min(TAU / n as f64);
    let sum: f64 = values.iter().filter(|v| **v > 0.0).sum();
    let k = if sum > 0.0 {
        (TAU - n as f64 * pad) / sum
    } else {
        0.0
    };

    let mut start = 0.0;
    values
        .iter()
        .map(|&v| {
            let end = start + if v > 0.0 { v * k } else { 0.0 } + pad;
            let angles = (start, end, pad);
            start = end;
            angles
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct DonutChart {
    options: DonutOptions,
}

impl DonutChart {
    pub fn new(options: DonutOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DonutOptions {
        &self.options
    }

    /// Count students per value of `key`, in order of first appearance.
    pub fn rollup(snapshot: &Snapshot, key: &str) -> Vec<(String, usize)> {
        let mut groups: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in snapshot {
            let value = record
                .category(key)
                .unwrap_or_else(|| MISSING_LABEL.to_string());
            match index.get(&value) {
                Some(&i) => groups[i].1 += 1,
                None => {
                    index.insert(value.clone(), groups.len());
                    groups.push((value, 1));
                }
            }
        }
        groups
    }

    pub fn layout(&self, snapshot: &Snapshot, key: &str) -> Result<DonutLayout, ChartError> {
        let attribute =
            find_donut_attribute(key).ok_or_else(|| ChartError::UnknownAttribute(key.to_string()))?;

        let groups = Self::rollup(snapshot, key);
        let counts: Vec<f64> = groups.iter().map(|(_, count)| *count as f64).collect();
        let angles = pie_angles(&counts, self.options.pad_angle);

        let slices = groups
            .into_iter()
            .zip(angles)
            .enumerate()
            .map(|(i, ((label, count), (start_angle, end_angle, pad_angle)))| DonutSlice {
                label,
                count,
                start_angle,
                end_angle,
                pad_angle,
                color: SPECTRAL_10[i % SPECTRAL_10.len()],
            })
            .collect();

        let outer_radius = self.options.width / 2.0;
        Ok(DonutLayout {
            attribute,
            total: snapshot.len(),
            center: Point::new(self.options.width / 2.0, self.options.height / 2.0),
            inner_radius: outer_radius - self.options.corner_radius,
            outer_radius,
            corner_radius: self.options.corner_radius,
            slices,
        })
    }
}
