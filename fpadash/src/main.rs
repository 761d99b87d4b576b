use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fpadash_core::{BarMode, Dashboard, DashboardConfig, Selection, Value, export_file_name, kpi};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod formatter;

#[derive(Parser)]
#[command(name = "fpadash")]
#[command(about = "FP&A dashboard over a five-sheet financial workbook", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the Excel/ODS workbook
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Period to show (defaults to the last one in the summary)
    #[arg(short, long)]
    period: Option<String>,

    /// Revenue segments to chart, comma separated or repeated (defaults to all)
    #[arg(short, long, value_delimiter = ',')]
    segments: Vec<String>,

    /// Bar mode of the segment chart, overrides the configuration
    #[arg(long, value_enum)]
    barmode: Option<BarModeArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Write the chart specifications as JSON to this file
    #[arg(long, value_name = "OUT.json")]
    charts: Option<PathBuf>,

    /// Export the selected period's summary rows as XLSX into this directory
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Print each sheet's columns and the fields bound to them
    #[arg(long)]
    show_columns: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum BarModeArg {
    Stack,
    Group,
}

impl From<BarModeArg> for BarMode {
    fn from(arg: BarModeArg) -> Self {
        match arg {
            BarModeArg::Stack => BarMode::Stack,
            BarModeArg::Group => BarMode::Group,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        DashboardConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Try to load default config from current directory if it exists
        let default_config_path = PathBuf::from("fpadash.toml");
        if default_config_path.exists() {
            DashboardConfig::from_file(&default_config_path).with_context(|| {
                format!(
                    "Failed to load config from {}",
                    default_config_path.display()
                )
            })?
        } else {
            DashboardConfig::default()
        }
    };
    if let Some(barmode) = cli.barmode {
        config.global.segment_barmode = Some(barmode.into());
    }

    let mut dashboard = Dashboard::with_config(config).context("Invalid configuration")?;
    let workbook = dashboard
        .open(&cli.file)
        .with_context(|| format!("Failed to load workbook: {}", cli.file.display()))?;

    if cli.show_columns {
        formatter::print_columns(&workbook);
    }

    let mut selection = match &cli.period {
        Some(period) => Selection::new(resolve_period(&workbook, period)),
        None => dashboard
            .default_selection(&workbook)
            .context("The summary sheet has no periods")?,
    };
    if !cli.segments.is_empty() {
        selection.segments = cli.segments.clone();
    }

    let view = dashboard.render(&workbook, &selection);

    match cli.format {
        OutputFormat::Human => formatter::print_human(&cli.file, &view),
        OutputFormat::Json => formatter::print_json(&cli.file, &view)?,
    }

    if let Some(charts_path) = &cli.charts {
        let json = serde_json::to_string_pretty(&view.charts)?;
        fs::write(charts_path, json)
            .with_context(|| format!("Failed to write charts to {}", charts_path.display()))?;
        info!(path = %charts_path.display(), "chart specifications written");
    }

    if let Some(dir) = &cli.export {
        let bytes = dashboard
            .export_filtered(&workbook, &view.period)
            .context("Failed to export the filtered summary")?;
        let path = dir.join(export_file_name(&view.period));
        fs::write(&path, bytes)
            .with_context(|| format!("Failed to write export to {}", path.display()))?;
        info!(path = %path.display(), "summary exported");
    }

    // Exit with appropriate code
    let exit_code = if view.has_errors() { 1 } else { 0 };
    std::process::exit(exit_code);
}

/// Match the argument against the summary's periods by their displayed
/// text, so dates and numbers can be selected as typed
fn resolve_period(workbook: &fpadash_core::Workbook, arg: &str) -> Value {
    kpi::periods(&workbook.summary)
        .into_iter()
        .find(|p| p.to_string() == arg)
        .unwrap_or_else(|| Value::from(arg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_do_not_consume_file() {
        let cli = Cli::try_parse_from([
            "fpadash",
            "--segments",
            "Consultoria PJ,Treinamentos",
            "fpa.xlsx",
        ])
        .unwrap();
        assert_eq!(cli.file, PathBuf::from("fpa.xlsx"));
        assert_eq!(cli.segments, vec!["Consultoria PJ", "Treinamentos"]);
    }

    #[test]
    fn test_segments_repeated_flag() {
        let cli = Cli::try_parse_from([
            "fpadash",
            "-s",
            "Consultoria PJ",
            "-s",
            "Treinamentos",
            "fpa.xlsx",
        ])
        .unwrap();
        assert_eq!(cli.file, PathBuf::from("fpa.xlsx"));
        assert_eq!(cli.segments, vec!["Consultoria PJ", "Treinamentos"]);
    }

    #[test]
    fn test_extra_positional_is_rejected() {
        assert!(Cli::try_parse_from(["fpadash", "--segments", "A", "B", "fpa.xlsx"]).is_err());
    }
}
