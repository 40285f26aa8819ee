//! Student Dashboard Application
//! Ties the load session to the four chart selections and builds their layouts.

use crate::charts::{
    Axis, ChartError, DonutChart, DonutLayout, DonutOptions, RadarChart, RadarLayout,
    RadarOptions, ScatterChart, ScatterLayout, ScatterOptions, ScatterSelection,
    DONUT_ATTRIBUTES,
};
use crate::dashboard::session::{LoadSession, LoadState};
use crate::data::{RecordLoader, Snapshot, Source};
use tracing::info;

/// How many students the comparison radar shows until told otherwise.
const DEFAULT_COMPARED: usize = 2;

/// Geometry for all charts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChartSettings {
    pub donut: DonutOptions,
    pub radar: RadarOptions,
    pub scatter: ScatterOptions,
}

/// What each chart currently shows. `None` falls back to the first students.
#[derive(Debug, Clone, PartialEq)]
pub struct Selections {
    pub donut_attribute: &'static str,
    pub student: Option<i64>,
    pub compared: Option<Vec<i64>>,
    pub scatter: ScatterSelection,
}

impl Default for Selections {
    fn default() -> Self {
        Self {
            donut_attribute: DONUT_ATTRIBUTES[0].key,
            student: None,
            compared: None,
            scatter: ScatterSelection::default(),
        }
    }
}

/// Layouts of every chart, computed from one snapshot.
#[derive(Debug, Clone)]
pub struct ReadyView {
    pub snapshot: Snapshot,
    pub donut: DonutLayout,
    pub radar: Option<RadarLayout>,
    pub comparison: Option<RadarLayout>,
    pub scatter: ScatterLayout,
}

/// What to show right now.
#[derive(Debug, Clone)]
pub enum DashboardView {
    Idle,
    Loading,
    Failed(String),
    Ready(Box<ReadyView>),
}

/// Main application state.
pub struct Dashboard {
    session: LoadSession,
    selections: Selections,
    donut: DonutChart,
    radar: RadarChart,
    scatter: ScatterChart,
}

impl Dashboard {
    pub fn new(loader: RecordLoader, settings: ChartSettings) -> Self {
        Self {
            session: LoadSession::new(loader),
            selections: Selections::default(),
            donut: DonutChart::new(settings.donut),
            radar: RadarChart::new(settings.radar),
            scatter: ScatterChart::new(settings.scatter),
        }
    }

    pub fn start(&mut self, source: Source) {
        info!(%source, "dashboard loading");
        self.session.start(source);
    }

    pub fn poll(&mut self) -> &LoadState {
        self.session.poll()
    }

    pub fn wait(&mut self) -> &LoadState {
        self.session.wait()
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn select_donut_attribute(&mut self, key: &str) -> Result<(), ChartError> {
        let option = DONUT_ATTRIBUTES
            .iter()
            .find(|a| a.key == key)
            .ok_or_else(|| ChartError::UnknownAttribute(key.to_string()))?;
        self.selections.donut_attribute = option.key;
        Ok(())
    }

    /// Choose the single-student radar. Checked against the snapshot once loaded.
    pub fn select_student(&mut self, code: i64) -> Result<(), ChartError> {
        self.check_student(code)?;
        self.selections.student = Some(code);
        Ok(())
    }

    pub fn compare_students(&mut self, codes: Vec<i64>) -> Result<(), ChartError> {
        if codes.is_empty() {
            return Err(ChartError::NoStudents);
        }
        for &code in &codes {
            self.check_student(code)?;
        }
        self.selections.compared = Some(codes);
        Ok(())
    }

    pub fn select_scatter_axis(&mut self, axis: Axis, column: &str) -> Result<(), ChartError> {
        self.selections.scatter.set(axis, column)
    }

    fn check_student(&self, code: i64) -> Result<(), ChartError> {
        match self.session.state().snapshot() {
            Some(snapshot) if snapshot.find(code).is_none() => {
                Err(ChartError::UnknownStudent(code))
            }
            _ => Ok(()),
        }
    }

    /// Nothing data-dependent is built before a snapshot exists. Selected
    /// codes missing from the snapshot fall back to the defaults.
    pub fn view(&self) -> Result<DashboardView, ChartError> {
        let snapshot = match self.session.state() {
            LoadState::Idle => return Ok(DashboardView::Idle),
            LoadState::Pending => return Ok(DashboardView::Loading),
            LoadState::Failed(err) => return Ok(DashboardView::Failed(err.to_string())),
            LoadState::Ready(snapshot) => snapshot,
        };

        let donut = self.donut.layout(snapshot, self.selections.donut_attribute)?;

        // Codes picked before the load finished may not exist in it.
        let known = |code: &i64| snapshot.find(*code).is_some();

        let student = self
            .selections
            .student
            .filter(known)
            .or_else(|| snapshot.first().map(|r| r.code()));
        let radar = student
            .map(|code| self.radar.single(snapshot, code))
            .transpose()?;

        let mut compared: Vec<i64> = self
            .selections
            .compared
            .iter()
            .flatten()
            .copied()
            .filter(known)
            .collect();
        if compared.is_empty() {
            compared = snapshot.iter().take(DEFAULT_COMPARED).map(|r| r.code()).collect();
        }
        let comparison = if compared.is_empty() {
            None
        } else {
            Some(self.radar.compare(snapshot, &compared)?)
        };

        let scatter = self.scatter.layout(snapshot, self.selections.scatter);

        Ok(DashboardView::Ready(Box::new(ReadyView {
            snapshot: snapshot.clone(),
            donut,
            radar,
            comparison,
            scatter,
        })))
    }
}
