//! Student Dashboard - academic records loader & chart data viewer
//!
//! Loads the student questionnaire CSV and prints the data behind each chart.

mod commands;

use anyhow::Result;
use clap::Parser;

use commands::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
