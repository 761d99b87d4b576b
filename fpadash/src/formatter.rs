//! Output formatters for dashboard views

use anyhow::Result;
use colored::*;
use fpadash_core::kpi::Unit;
use fpadash_core::{DashboardView, Diagnostic, MetricCard, Scope, Severity, Workbook};
use std::collections::BTreeMap;
use std::path::Path;

/// Print the dashboard in human-readable format with colors
pub fn print_human(file_path: &Path, view: &DashboardView) {
    println!("{}", format!("Dashboard: {}", file_path.display()).bold());
    println!("{} {}", "Period:".bold(), view.period.to_string().cyan().bold());
    println!();

    println!("{}", "KPIs:".bold().underline());
    for card in &view.kpis {
        print_card(card);
    }
    println!();

    println!("{}", "Charts:".bold().underline());
    for chart in view.charts.iter() {
        if chart.placeholder {
            println!("  {} {}", chart.title, "(empty)".yellow());
        } else {
            let series: Vec<&str> = chart.traces.iter().map(|t| t.name()).collect();
            println!("  {} {}", chart.title, format!("[{}]", series.join(", ")).bright_black());
        }
    }
    println!();

    println!("{} {}", "Filtered rows:".bold(), view.filtered.height());
    println!();

    if view.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
        return;
    }
    print_diagnostics(&view.diagnostics);
}

fn print_card(card: &MetricCard) {
    let value = match (&card.error, card.value) {
        (Some(error), _) => format!("{} {}", "ERROR".red().bold(), error),
        (None, Some(v)) => match card.unit {
            Unit::Currency => format_currency(v),
            Unit::Percent => format_percent(Some(v)),
        },
        (None, None) => format_percent(None),
    };
    println!("  {:<26} {}", card.label, value);
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    // Group diagnostics by scope for hierarchical display
    let mut grouped: BTreeMap<&Scope, Vec<&Diagnostic>> = BTreeMap::new();
    for diagnostic in diagnostics {
        grouped.entry(&diagnostic.scope).or_default().push(diagnostic);
    }

    for (scope, diagnostics) in &grouped {
        println!("{} {}", "Scope:".bold(), scope.to_string().cyan().bold());
        for diagnostic in diagnostics {
            let severity_str = match diagnostic.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warning => "WARN".yellow().bold(),
                Severity::Info => "INFO".blue().bold(),
            };
            println!("  {} {}", severity_str, diagnostic.message);
        }
        println!();
    }

    let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();
    println!("{}", "Summary:".bold().underline());
    if count(Severity::Error) > 0 {
        println!("  {} {}", "Errors:".red().bold(), count(Severity::Error));
    }
    if count(Severity::Warning) > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), count(Severity::Warning));
    }
    if count(Severity::Info) > 0 {
        println!("  {} {}", "Info:".blue().bold(), count(Severity::Info));
    }
}

/// Print each sheet's columns and which logical field each one carries
pub fn print_columns(workbook: &Workbook) {
    for (_, table) in workbook.tables() {
        println!("{} {}", "Sheet:".bold(), table.name.cyan().bold());
        let bound: BTreeMap<&str, String> = table
            .bindings()
            .map(|(field, column)| (column, field.label().to_string()))
            .collect();
        for column in &table.columns {
            match bound.get(column.as_str()) {
                Some(field) => println!("  {} {}", column, format!("-> {}", field).green()),
                None => println!("  {}", column),
            }
        }
        println!();
    }
}

/// Print the dashboard in JSON format
pub fn print_json(file_path: &Path, view: &DashboardView) -> Result<()> {
    let count = |severity: Severity| {
        view.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    };
    let output = serde_json::json!({
        "file": file_path.display().to_string(),
        "dashboard": view,
        "summary": {
            "errors": count(Severity::Error),
            "warnings": count(Severity::Warning),
            "info": count(Severity::Info),
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// `R$ 1,234,567.89`
pub fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}R$ {}.{}", sign, grouped, frac_part)
}

/// One decimal place; `n/a` for an undefined value
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v),
        None => "n/a".to_string(),
    }
}
