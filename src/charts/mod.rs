//! Charts module - renderer-independent chart layouts
//!
//! Each chart turns the shared [`Snapshot`](crate::data::Snapshot) into plain
//! numbers (angles, coordinates, counts, colors) that a renderer can draw.

mod attributes;
mod donut;
mod radar;
mod scatter;

pub use attributes::{
    find_donut_attribute, student_options, AttributeOption, StudentOption, DONUT_ATTRIBUTES,
    SCATTER_FIELDS, SPECTRAL_10, TABLEAU_10,
};
pub use donut::{pie_angles, DonutChart, DonutDetail, DonutLayout, DonutOptions, DonutSlice};
pub use radar::{
    RadarAxis, RadarChart, RadarLayout, RadarOptions, RadarPolygon, RadarTick, RADAR_MAX,
    RADAR_TICKS,
};
pub use scatter::{
    Axis, AxisLabel, LinearScale, ScatterChart, ScatterLayout, ScatterOptions, ScatterPoint,
    ScatterSelection,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Unknown attribute `{0}`")]
    UnknownAttribute(String),
    #[error("No student with code {0}")]
    UnknownStudent(i64),
    #[error("No students selected")]
    NoStudents,
}

/// A position in chart coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}
