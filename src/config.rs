//! Dashboard configuration.
//!
//! Settings come from an optional TOML file; command-line flags override the
//! file, which overrides the defaults below.

use crate::charts::{DonutOptions, RadarOptions, ScatterOptions};
use crate::dashboard::ChartSettings;
use crate::data::{FetchError, LoadOptions, Source};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Published academic questionnaire dataset.
pub const DEFAULT_SOURCE: &str = "https://gist.githubusercontent.com/hassanaitnacer/7f7da265b9c9f826746e5878e05fd7bc/raw/3780d1c06a99d7dbe6f8ad473d81d962edde1640/academic-questionnaire.csv";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Top-level config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub derive: DeriveConfig,

    #[serde(default)]
    pub charts: ChartsConfig,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path or http(s) URL of the CSV dataset.
    #[serde(default = "default_location")]
    pub location: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_location() -> String {
    DEFAULT_SOURCE.into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[derive]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeriveConfig {
    /// Fixed "now" for age calculation (RFC 3339). Unset means the system clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<DateTime<Utc>>,
}

/// `[charts.*]` sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartsConfig {
    #[serde(default)]
    pub donut: DonutOptions,
    #[serde(default)]
    pub radar: RadarOptions,
    #[serde(default)]
    pub scatter: ScatterOptions,
}

impl DashboardConfig {
    pub fn source(&self) -> Result<Source, FetchError> {
        Source::parse(&self.source.location)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            timeout: Duration::from_secs(self.source.timeout_secs),
            now: self.derive.now,
        }
    }

    pub fn chart_settings(&self) -> ChartSettings {
        ChartSettings {
            donut: self.charts.donut,
            radar: self.charts.radar,
            scatter: self.charts.scatter,
        }
    }
}

/// Load config from a TOML file.
pub fn load_config_from(path: &Path) -> Result<DashboardConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load `path` if given, otherwise use defaults.
pub fn load_config(path: Option<&Path>) -> Result<DashboardConfig, ConfigError> {
    match path {
        Some(path) => load_config_from(path),
        None => {
            tracing::debug!("no config file given, using defaults");
            Ok(DashboardConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn defaults_point_at_published_dataset() {
        let config = DashboardConfig::default();
        assert!(matches!(config.source(), Ok(Source::Url(_))));
        assert_eq!(config.load_options().timeout, Duration::from_secs(30));
        assert_eq!(config.load_options().now, None);
        assert_eq!(config.chart_settings(), ChartSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let toml_str = r#"
[source]
location = "data/students.csv"

[derive]
now = "2024-01-01T00:00:00Z"

[charts.donut]
width = 400.0

[charts.scatter.margin]
top = 1.0
right = 2.0
bottom = 3.0
left = 4.0
"#;
        let config: DashboardConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(
            config.source().unwrap(),
            Source::Path(PathBuf::from("data/students.csv"))
        );
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(
            config.derive.now,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(config.charts.donut.width, 400.0);
        assert_eq!(config.charts.donut.corner_radius, 15.0);
        assert_eq!(config.charts.scatter.margin.left, 4.0);
        assert_eq!(config.charts.scatter.width, 500.0);
        assert_eq!(config.charts.radar, RadarOptions::default());
    }

    #[test]
    fn config_roundtrip() {
        let config = DashboardConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: DashboardConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.source.location, DEFAULT_SOURCE);
        assert_eq!(parsed.charts.radar.margin.top, 50.0);
    }

    #[test]
    fn bad_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[source\nlocation = 1").unwrap();
        let err = load_config_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
