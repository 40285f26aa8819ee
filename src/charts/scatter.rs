//! Scatter Plot Module
//! Two numeric fields plotted against each other with linear axes.

use crate::charts::attributes::SCATTER_FIELDS;
use crate::charts::{ChartError, Margin, Point};
use crate::data::{CountField, NumericField, ScoreField, Snapshot};
use crate::stats::StatsCalculator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterOptions {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub circle_radius: f64,
}

impl Default for ScatterOptions {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 300.0,
            margin: Margin {
                top: 10.0,
                right: 10.0,
                bottom: 60.0,
                left: 60.0,
            },
            circle_radius: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Fields currently chosen for the two axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScatterSelection {
    pub x: NumericField,
    pub y: NumericField,
}

impl Default for ScatterSelection {
    fn default() -> Self {
        Self {
            x: NumericField::Count(CountField::NumberOfRepetition),
            y: NumericField::Score(ScoreField::Primary),
        }
    }
}

impl ScatterSelection {
    /// Point one axis at the field named `column`.
    pub fn set(&mut self, axis: Axis, column: &str) -> Result<(), ChartError> {
        let field = SCATTER_FIELDS
            .iter()
            .copied()
            .find(|f| f.column() == column)
            .ok_or_else(|| ChartError::UnknownAttribute(column.to_string()))?;
        match axis {
            Axis::X => self.x = field,
            Axis::Y => self.y = field,
        }
        Ok(())
    }
}

/// Maps a domain interval linearly onto a range interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Unclamped; a zero-width domain maps everything to the middle of the range.
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let t = if d1 != d0 {
            (value - d0) / (d1 - d0)
        } else {
            0.5
        };
        r0 + t * (r1 - r0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub code: i64,
    pub x: f64,
    pub y: f64,
    pub cx: f64,
    pub cy: f64,
}

/// Axis title text and where it goes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLabel {
    pub text: &'static str,
    pub position: Point,
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterLayout {
    pub inner_width: f64,
    pub inner_height: f64,
    pub x_scale: LinearScale,
    pub y_scale: LinearScale,
    pub x_label: AxisLabel,
    pub y_label: AxisLabel,
    pub circle_radius: f64,
    pub points: Vec<ScatterPoint>,
    /// Students left out because one of the two values is missing.
    pub omitted: usize,
    /// Pearson coefficient over the plotted points.
    pub correlation: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ScatterChart {
    options: ScatterOptions,
}

impl ScatterChart {
    pub fn new(options: ScatterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScatterOptions {
        &self.options
    }

    pub fn layout(&self, snapshot: &Snapshot, selection: ScatterSelection) -> ScatterLayout {
        let opts = &self.options;
        let inner_width = opts.width - opts.margin.left - opts.margin.right;
        let inner_height = opts.height - opts.margin.top - opts.margin.bottom;

        let pairs: Vec<(i64, f64, f64)> = snapshot
            .iter()
            .filter_map(|r| Some((r.code(), r.numeric(selection.x)?, r.numeric(selection.y)?)))
            .collect();
        let xs: Vec<f64> = pairs.iter().map(|p| p.1).collect();
        let ys: Vec<f64> = pairs.iter().map(|p| p.2).collect();

        let x_scale = LinearScale::new(extent(&xs), (0.0, inner_width));
        let y_scale = LinearScale::new(extent(&ys), (inner_height, 0.0));

        let points = pairs
            .iter()
            .map(|&(code, x, y)| ScatterPoint {
                code,
                x,
                y,
                cx: x_scale.map(x),
                cy: y_scale.map(y),
            })
            .collect();

        ScatterLayout {
            inner_width,
            inner_height,
            x_scale,
            y_scale,
            x_label: AxisLabel {
                text: selection.x.label(),
                position: Point::new(inner_width / 2.0, opts.height - 20.0),
                rotation: 0.0,
            },
            y_label: AxisLabel {
                text: selection.y.label(),
                position: Point::new(-inner_height / 2.0, -opts.margin.left + 20.0),
                rotation: -90.0,
            },
            circle_radius: opts.circle_radius,
            points,
            omitted: snapshot.len() - pairs.len(),
            correlation: StatsCalculator::pearson(&xs, &ys),
        }
    }
}

/// Min and max; `(0, 0)` when empty.
fn extent(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
        .unwrap_or((0.0, 0.0))
}
