//! Radar Chart Module
//! Score polygons for one student or several students compared on the same axes.

use crate::charts::attributes::TABLEAU_10;
use crate::charts::{ChartError, Margin, Point};
use crate::data::{DerivedRecord, ScoreField, Snapshot};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Score at the outer gridline.
pub const RADAR_MAX: f64 = 20.0;
pub const RADAR_TICKS: [f64; 5] = [0.0, 5.0, 10.0, 15.0, 20.0];
const LABEL_VALUE: f64 = 23.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarOptions {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

impl Default for RadarOptions {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 500.0,
            margin: Margin::uniform(50.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarAxis {
    pub column: &'static str,
    pub abbrev: &'static str,
    pub full_form: &'static str,
    pub angle: f64,
    pub end: Point,
    pub label: Point,
}

/// Concentric gridline and its label position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadarTick {
    pub value: f64,
    pub radius: f64,
    pub label: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarPolygon {
    pub code: i64,
    pub color: &'static str,
    pub points: Vec<Point>,
}

/// Coordinates are relative to the margin-translated group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarLayout {
    pub size: f64,
    pub center: Point,
    pub ticks: Vec<RadarTick>,
    pub axes: Vec<RadarAxis>,
    pub polygons: Vec<RadarPolygon>,
}

#[derive(Debug, Clone, Default)]
pub struct RadarChart {
    options: RadarOptions,
}

impl RadarChart {
    pub fn new(options: RadarOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RadarOptions {
        &self.options
    }

    /// Side of the square the radar is drawn in.
    pub fn size(&self) -> f64 {
        self.options.width.min(self.options.height)
            - self.options.margin.left
            - self.options.margin.right
    }

    /// Radius for a score, `[0, RADAR_MAX]` onto `[0, size / 2]` (unclamped).
    pub fn radius(&self, value: f64) -> f64 {
        value / RADAR_MAX * (self.size() / 2.0)
    }

    /// Angle of axis `index`; the first axis points straight up.
    pub fn angle(index: usize, count: usize) -> f64 {
        FRAC_PI_2 + TAU * index as f64 / count as f64
    }

    pub fn point(&self, angle: f64, value: f64) -> Point {
        let half = self.size() / 2.0;
        let r = self.radius(value);
        Point::new(half + angle.cos() * r, half - angle.sin() * r)
    }

    /// Polygon vertices for one student. Missing scores sit at the centre.
    pub fn polygon(&self, record: &DerivedRecord) -> Vec<Point> {
        let count = ScoreField::ALL.len();
        ScoreField::ALL
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let value = record.score(*field).unwrap_or(0.0);
                self.point(Self::angle(i, count), value)
            })
            .collect()
    }

    pub fn single(&self, snapshot: &Snapshot, code: i64) -> Result<RadarLayout, ChartError> {
        self.compare(snapshot, &[code])
    }

    /// Overlay several students; colors follow selection order.
    pub fn compare(&self, snapshot: &Snapshot, codes: &[i64]) -> Result<RadarLayout, ChartError> {
        if codes.is_empty() {
            return Err(ChartError::NoStudents);
        }

        let polygons = codes
            .iter()
            .enumerate()
            .map(|(i, &code)| {
                let record = snapshot.find(code).ok_or(ChartError::UnknownStudent(code))?;
                Ok(RadarPolygon {
                    code,
                    color: TABLEAU_10[i % TABLEAU_10.len()],
                    points: self.polygon(record),
                })
            })
            .collect::<Result<Vec<_>, ChartError>>()?;

        Ok(RadarLayout {
            size: self.size(),
            center: Point::new(self.size() / 2.0, self.size() / 2.0),
            ticks: self.ticks(),
            axes: self.axes(),
            polygons,
        })
    }

    fn ticks(&self) -> Vec<RadarTick> {
        let half = self.size() / 2.0;
        RADAR_TICKS
            .iter()
            .map(|&value| {
                let radius = self.radius(value);
                RadarTick {
                    value,
                    radius,
                    label: Point::new(half, half - radius),
                }
            })
            .collect()
    }

    fn axes(&self) -> Vec<RadarAxis> {
        let count = ScoreField::ALL.len();
        ScoreField::ALL
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let angle = Self::angle(i, count);
                RadarAxis {
                    column: field.column(),
                    abbrev: field.abbrev(),
                    full_form: field.label(),
                    angle,
                    end: self.point(angle, RADAR_MAX),
                    label: self.point(angle, LABEL_VALUE),
                }
            })
            .collect()
    }
}
