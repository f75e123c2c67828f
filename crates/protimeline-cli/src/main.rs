//! protimeline CLI - Project Timeline Charts
//!
//! Command-line interface for rendering role-tagged project tables as
//! timeline SVGs and inspecting the row model they produce.

mod config;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use protimeline_core::{DataTable, Renderer, RowModel, RowModelBuilder, Timeline};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ChartConfig;

#[derive(Parser)]
#[command(name = "protimeline")]
#[command(author, version, about = "Project timeline charts", long_about = None)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a project table to SVG
    Render {
        /// Input table (JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Chart configuration (TOML)
        #[arg(short, long, env = "PROTIMELINE_CONFIG")]
        config: Option<PathBuf>,

        /// Reference date for ongoing projects (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        now: Option<NaiveDate>,

        /// Document width in pixels
        #[arg(long)]
        width: Option<f64>,

        /// Minimum document height in pixels
        #[arg(long)]
        height: Option<f64>,

        /// Omit the icon legend
        #[arg(long)]
        no_legend: bool,
    },

    /// Print the row model built from a project table as JSON
    Rows {
        /// Input table (JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Reference date for ongoing projects (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        now: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    match cli.command {
        Commands::Render {
            file,
            output,
            config,
            now,
            width,
            height,
            no_legend,
        } => {
            let mut config = match config {
                Some(path) => ChartConfig::load(&path)?,
                None => ChartConfig::default(),
            };
            if let Some(width) = width {
                config.chart.width = width;
            }
            if let Some(height) = height {
                config.chart.height = height;
            }
            if no_legend {
                config.settings.show_legend.show = false;
            }
            cmd_render(&file, output.as_deref(), &config, now.unwrap_or_else(today))
        }
        Commands::Rows { file, now } => cmd_rows(&file, now.unwrap_or_else(today)),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn load_table(path: &Path) -> Result<DataTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid table in {}", path.display()))
}

fn build(path: &Path, now: NaiveDate) -> Result<RowModel> {
    let table = load_table(path)?;
    Ok(RowModelBuilder::new(now).build(&table))
}

fn cmd_render(file: &Path, output: Option<&Path>, config: &ChartConfig, now: NaiveDate) -> Result<()> {
    let model = build(file, now)?;
    let timeline = Timeline::new(model.rows, now).with_settings(config.settings);
    let rendered = config
        .chart
        .render(&timeline)
        .context("failed to render timeline")?;

    match output {
        Some(path) => {
            std::fs::write(path, &rendered.svg)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), rows = timeline.rows.len(), "wrote timeline");
            println!(
                "Rendered {} projects ({} skipped) to {}",
                timeline.rows.len(),
                model.skipped.len(),
                path.display()
            );
        }
        None => println!("{}", rendered.svg),
    }
    Ok(())
}

fn cmd_rows(file: &Path, now: NaiveDate) -> Result<()> {
    let model = build(file, now)?;
    let json = serde_json::to_string_pretty(&model).context("failed to serialize row model")?;
    println!("{json}");
    Ok(())
}
