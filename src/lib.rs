//! Student Dashboard - academic records loading & chart data preparation
//!
//! Reads the student questionnaire CSV (from disk or over HTTP), derives one
//! typed record per student, and turns the resulting snapshot into the layouts
//! of four charts: an attribute donut, single and comparison score radars, and
//! a two-field scatter plot.

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod stats;
