//! Dashboard module - load lifecycle and chart selections

mod app;
mod session;

pub use app::{ChartSettings, Dashboard, DashboardView, ReadyView, Selections};
pub use session::{LoadSession, LoadState};
