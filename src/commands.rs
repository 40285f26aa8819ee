//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use student_dashboard::charts::{
    student_options, Axis, DonutChart, RadarChart, RadarLayout, ScatterChart, ScatterSelection,
};
use student_dashboard::config::{load_config, DashboardConfig};
use student_dashboard::dashboard::{Dashboard, DashboardView, LoadState};
use student_dashboard::data::{parse_date_of_birth, RecordLoader, Snapshot, Source};
use student_dashboard::stats::StatsCalculator;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Student Dashboard - load academic records and print the data behind each chart.
#[derive(Parser)]
#[command(
    name = "student-dashboard",
    version,
    about = "Load student academic records and print the data behind each chart.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// TOML config file.
    #[arg(long, env = "STUDENT_DASHBOARD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Fixed "now" for ages (YYYY-MM-DD or RFC 3339).
    #[arg(long, value_parser = parse_now, global = true)]
    pub now: Option<DateTime<Utc>>,

    /// HTTP fetch timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Load the dataset and report how many students it holds.
    Load {
        /// CSV path or URL (defaults to the configured source).
        source: Option<String>,

        /// Print every derived record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Count students by attribute (donut chart data).
    Donut {
        source: Option<String>,

        /// Attribute key, e.g. gender or primary_score_range.
        #[arg(short, long, default_value = "age")]
        attribute: String,
    },

    /// Radar polygon for one student, or several compared.
    Radar {
        source: Option<String>,

        /// Student code (defaults to the first student).
        #[arg(short, long)]
        student: Option<i64>,

        /// Compare these student codes instead.
        #[arg(short, long, num_args = 1..)]
        compare: Vec<i64>,
    },

    /// Two fields plotted against each other (scatter plot data).
    Scatter {
        source: Option<String>,

        #[arg(short, long, default_value = "number_of_repetition")]
        x: String,

        #[arg(short, long, default_value = "primary_score")]
        y: String,

        /// Print the plotted points as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Descriptive statistics for every numeric field.
    Stats { source: Option<String> },

    /// Load in the background and summarize all four charts.
    Dashboard { source: Option<String> },
}

fn parse_now(value: &str) -> Result<DateTime<Utc>, String> {
    parse_date_of_birth(value).ok_or_else(|| format!("not a date: {value:?}"))
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber. Logs go to stderr; results go to stdout.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "student_dashboard=info",
        1 => "student_dashboard=debug",
        _ => "student_dashboard=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

pub(crate) fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(now) = cli.now {
        config.derive.now = Some(now);
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.source.timeout_secs = timeout_secs;
    }

    match cli.command {
        Command::Load { source, json } => cmd_load(&config, source, json),
        Command::Donut { source, attribute } => cmd_donut(&config, source, &attribute),
        Command::Radar {
            source,
            student,
            compare,
        } => cmd_radar(&config, source, student, &compare),
        Command::Scatter { source, x, y, json } => cmd_scatter(&config, source, &x, &y, json),
        Command::Stats { source } => cmd_stats(&config, source),
        Command::Dashboard { source } => cmd_dashboard(&config, source),
    }
}

fn resolve_source(config: &DashboardConfig, source: Option<String>) -> Result<Source> {
    let source = match source {
        Some(locator) => Source::parse(&locator)?,
        None => config.source()?,
    };
    Ok(source)
}

fn load_snapshot(config: &DashboardConfig, source: Option<String>) -> Result<Snapshot> {
    let source = resolve_source(config, source)?;
    RecordLoader::new(config.load_options())
        .load(&source)
        .with_context(|| format!("loading {source}"))
}

fn cmd_load(config: &DashboardConfig, source: Option<String>, json: bool) -> Result<()> {
    let snapshot = load_snapshot(config, source)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("Loaded {} students", snapshot.len());
    }
    Ok(())
}

fn cmd_donut(config: &DashboardConfig, source: Option<String>, attribute: &str) -> Result<()> {
    let snapshot = load_snapshot(config, source)?;
    let layout = DonutChart::new(config.charts.donut).layout(&snapshot, attribute)?;

    println!("{} ({} students)", layout.attribute.label, layout.total);
    for slice in &layout.slices {
        let share = slice.count as f64 / layout.total.max(1) as f64 * 100.0;
        println!(
            "  {:<28} {:>6} {:>6.1}%  [{:.3} .. {:.3}] {}",
            slice.label, slice.count, share, slice.start_angle, slice.end_angle, slice.color
        );
    }
    Ok(())
}

fn cmd_radar(
    config: &DashboardConfig,
    source: Option<String>,
    student: Option<i64>,
    compare: &[i64],
) -> Result<()> {
    let snapshot = load_snapshot(config, source)?;
    let chart = RadarChart::new(config.charts.radar);

    let layout = if compare.is_empty() {
        let code = match student {
            Some(code) => code,
            None => student_options(&snapshot)
                .first()
                .map(|option| option.code)
                .ok_or_else(|| anyhow!("dataset has no students"))?,
        };
        chart.single(&snapshot, code)?
    } else {
        chart.compare(&snapshot, compare)?
    };

    print_radar(&layout);
    Ok(())
}

fn print_radar(layout: &RadarLayout) {
    let axes: Vec<&str> = layout.axes.iter().map(|a| a.abbrev).collect();
    println!("Radar {}x{} axes: {}", layout.size, layout.size, axes.join(", "));
    for polygon in &layout.polygons {
        let points: Vec<String> = polygon
            .points
            .iter()
            .map(|p| format!("{:.1},{:.1}", p.x, p.y))
            .collect();
        println!("  Student {} {}: {}", polygon.code, polygon.color, points.join(" "));
    }
}

fn cmd_scatter(
    config: &DashboardConfig,
    source: Option<String>,
    x: &str,
    y: &str,
    json: bool,
) -> Result<()> {
    let snapshot = load_snapshot(config, source)?;
    let mut selection = ScatterSelection::default();
    selection.set(Axis::X, x)?;
    selection.set(Axis::Y, y)?;

    let layout = ScatterChart::new(config.charts.scatter).layout(&snapshot, selection);
    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    println!("{} vs {}", layout.x_label.text, layout.y_label.text);
    println!(
        "  x domain {:?}, y domain {:?}",
        layout.x_scale.domain, layout.y_scale.domain
    );
    println!(
        "  {} points plotted, {} omitted for missing values",
        layout.points.len(),
        layout.omitted
    );
    match layout.correlation {
        Some(r) => println!("  Pearson r = {r:.3}"),
        None => println!("  Pearson r undefined"),
    }
    Ok(())
}

fn cmd_stats(config: &DashboardConfig, source: Option<String>) -> Result<()> {
    let snapshot = load_snapshot(config, source)?;
    println!(
        "{:<24} {:>6} {:>7} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "field", "count", "missing", "mean", "median", "std", "p05", "p95"
    );
    for field_stats in StatsCalculator::compute_all_stats_parallel(&snapshot) {
        let s = field_stats.stats;
        println!(
            "{:<24} {:>6} {:>7} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
            field_stats.field.column(),
            s.count,
            field_stats.missing,
            s.mean,
            s.median,
            s.std,
            s.p05,
            s.p95
        );
    }
    Ok(())
}

fn cmd_dashboard(config: &DashboardConfig, source: Option<String>) -> Result<()> {
    let source = resolve_source(config, source)?;
    let mut dashboard = Dashboard::new(
        RecordLoader::new(config.load_options()),
        config.chart_settings(),
    );
    dashboard.start(source);

    if let LoadState::Failed(err) = dashboard.wait() {
        info!(error = %err, "dashboard has no data");
    }

    match dashboard.view()? {
        DashboardView::Idle | DashboardView::Loading => bail!("dashboard never finished loading"),
        DashboardView::Failed(message) => bail!("could not load students: {message}"),
        DashboardView::Ready(view) => {
            println!("Total Number of Students by {}", view.donut.attribute.label);
            let detail = view.donut.detail(None);
            println!("  {} {}", detail.value, detail.label);
            for slice in &view.donut.slices {
                println!("  {:<28} {:>6}", slice.label, slice.count);
            }

            if let Some(radar) = &view.radar {
                println!("Student Scores Radar");
                print_radar(radar);
            }
            if let Some(comparison) = &view.comparison {
                println!("Compare Students Scores Radar");
                print_radar(comparison);
            }

            let scatter = &view.scatter;
            println!(
                "Relationship Between {} and {}: {} points, r = {}",
                scatter.x_label.text,
                scatter.y_label.text,
                scatter.points.len(),
                scatter
                    .correlation
                    .map(|r| format!("{r:.3}"))
                    .unwrap_or_else(|| "n/a".to_string())
            );
            Ok(())
        }
    }
}
