//! fpadash-core: FP&A dashboard engine over a five-sheet financial workbook
//!
//! Loads the workbook once through an explicit column schema, computes the
//! month-over-month KPIs for a selected period, describes the four dashboard
//! charts declaratively and exports the filtered summary rows as XLSX.

pub mod cache;
pub mod charts;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod export;
pub mod kpi;
pub mod reader;
pub mod schema;

#[cfg(test)]
mod test_fixtures;

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

pub use cache::WorkbookCache;
pub use charts::{BarMode, ChartKind, ChartOptions, ChartSet, ChartSpec, Trace, build_charts};
pub use config::DashboardConfig;
pub use diagnostic::{Diagnostic, Scope, Severity};
pub use error::{DashboardError, Result};
pub use export::{XLSX_MIME, export_file_name, export_table, filter_by_period};
pub use kpi::{KpiSnapshot, Metric, MetricCard, compute_kpis, kpi_cards};
pub use reader::{SheetKind, Table, Value, Workbook};
pub use schema::{Field, Schema};

/// Period and segments the user picked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub period: Value,
    /// Empty means every known segment
    pub segments: Vec<String>,
}

impl Selection {
    pub fn new(period: impl Into<Value>) -> Self {
        Self {
            period: period.into(),
            segments: Vec::new(),
        }
    }

    pub fn with_segments(mut self, segments: Vec<String>) -> Self {
        self.segments = segments;
        self
    }
}

/// Everything the dashboard shows for one selection
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub period: Value,
    pub kpis: Vec<MetricCard>,
    pub charts: ChartSet,
    /// Summary rows of the selected period
    pub filtered: Table,
    /// Load, metric and chart diagnostics, sorted by scope
    pub diagnostics: Vec<Diagnostic>,
}

impl DashboardView {
    /// Any error diagnostic or metric that could not be computed
    pub fn has_errors(&self) -> bool {
        self.kpis.iter().any(MetricCard::is_error)
            || self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

/// Main dashboard interface
pub struct Dashboard {
    config: DashboardConfig,
    schema: Schema,
    cache: WorkbookCache,
}

impl Dashboard {
    /// Create a dashboard with default configuration
    pub fn new() -> Self {
        let config = DashboardConfig::default();
        Self {
            schema: Schema::from_config(&config),
            cache: WorkbookCache::new(config.cache_capacity()),
            config,
        }
    }

    /// Create a dashboard with custom configuration
    pub fn with_config(config: DashboardConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            schema: Schema::from_config(&config),
            cache: WorkbookCache::new(config.cache_capacity()),
            config,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn cache(&self) -> &WorkbookCache {
        &self.cache
    }

    /// Load a workbook file through the session cache
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<Arc<Workbook>> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        self.open_bytes(&path.display().to_string(), &bytes)
    }

    /// Load uploaded bytes through the session cache
    pub fn open_bytes(&mut self, identity: &str, bytes: &[u8]) -> Result<Arc<Workbook>> {
        self.cache.get_or_load(identity, bytes, &self.schema)
    }

    /// Last period of the summary with the configured default segments, or
    /// every segment when none are configured. `None` for an empty summary.
    pub fn default_selection(&self, workbook: &Workbook) -> Option<Selection> {
        let period = kpi::periods(&workbook.summary).pop()?;
        let segments = if self.config.global.default_segments.is_empty() {
            charts::segments(&workbook.revenues)
        } else {
            self.config.global.default_segments.clone()
        };
        Some(Selection { period, segments })
    }

    /// Compute KPIs, charts and the filtered table for one selection.
    /// Metric and chart failures are reported as diagnostics, never as errors.
    pub fn render(&self, workbook: &Workbook, selection: &Selection) -> DashboardView {
        let period = &selection.period;
        let mut diagnostics = workbook.diagnostics.clone();

        let kpis = kpi_cards(&workbook.summary, &workbook.cash_flow, period);
        for card in &kpis {
            if let Some(error) = &card.error {
                diagnostics.push(Diagnostic::error(Scope::Metric(card.metric), error.clone()));
            }
        }

        let segments = if selection.segments.is_empty() {
            self.config.global.default_segments.as_slice()
        } else {
            selection.segments.as_slice()
        };
        let options = ChartOptions {
            segment_barmode: self.config.segment_barmode(),
        };
        let charts = build_charts(
            &workbook.summary,
            &workbook.revenues,
            &workbook.cash_flow,
            period,
            segments,
            &options,
        );
        diagnostics.extend(charts.diagnostics.iter().cloned());
        diagnostics.sort();

        DashboardView {
            period: period.clone(),
            kpis,
            charts,
            filtered: filter_by_period(&workbook.summary, period),
            diagnostics,
        }
    }

    /// XLSX bytes of the summary rows for `period`
    pub fn export_filtered(&self, workbook: &Workbook, period: &Value) -> Result<Vec<u8>> {
        export_table(&filter_by_period(&workbook.summary, period))
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::workbook_bytes;

    #[test]
    fn test_default_selection_is_last_period() {
        let mut dashboard = Dashboard::new();
        let workbook = dashboard
            .open_bytes("upload.xlsx", &workbook_bytes(&[100.0, 150.0, 120.0]))
            .unwrap();
        let selection = dashboard.default_selection(&workbook).unwrap();
        assert_eq!(selection.period, Value::from("Mar"));
        assert_eq!(selection.segments, vec!["Consultoria PJ", "Treinamentos"]);
    }

    #[test]
    fn test_configured_default_segments() {
        let mut config = DashboardConfig::default();
        config.global.default_segments = vec!["Treinamentos".to_string()];
        let mut dashboard = Dashboard::with_config(config).unwrap();
        let workbook = dashboard
            .open_bytes("upload.xlsx", &workbook_bytes(&[100.0, 150.0]))
            .unwrap();

        let view = dashboard.render(&workbook, &Selection::new("Feb"));
        let names: Vec<&str> = view.charts.segment_chart.traces.iter().map(Trace::name).collect();
        assert_eq!(names, vec!["Treinamentos"]);
    }

    #[test]
    fn test_render_scenario() {
        let mut dashboard = Dashboard::new();
        let workbook = dashboard
            .open_bytes("upload.xlsx", &workbook_bytes(&[100.0, 150.0, 120.0]))
            .unwrap();
        let view = dashboard.render(&workbook, &Selection::new("Feb"));

        assert_eq!(view.kpis[0].value, Some(150.0));
        assert_eq!(view.kpis[1].value, Some(50.0));
        assert_eq!(view.filtered.height(), 1);
        assert!(!view.has_errors());
        assert!(view.charts.iter().all(|c| !c.placeholder));
    }

    #[test]
    fn test_unknown_period_is_reported() {
        let mut dashboard = Dashboard::new();
        let workbook = dashboard
            .open_bytes("upload.xlsx", &workbook_bytes(&[100.0, 150.0]))
            .unwrap();
        let view = dashboard.render(&workbook, &Selection::new("Dec"));

        assert!(view.has_errors());
        assert!(view.filtered.is_empty());
        assert!(view.charts.waterfall_chart.placeholder);
        assert!(!view.charts.line_chart.placeholder);
        assert!(
            view.diagnostics
                .iter()
                .any(|d| d.scope == Scope::Metric(Metric::TotalRevenue))
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = DashboardConfig::default();
        config.global.cache_capacity = Some(0);
        assert!(Dashboard::with_config(config).is_err());
    }

    #[test]
    fn test_export_filtered() {
        let mut dashboard = Dashboard::new();
        let workbook = dashboard
            .open_bytes("upload.xlsx", &workbook_bytes(&[100.0, 150.0]))
            .unwrap();
        let bytes = dashboard
            .export_filtered(&workbook, &Value::from("Jan"))
            .unwrap();
        let table = reader::read_sheet_from_bytes(&bytes, "Resumo Financeiro").unwrap();
        assert_eq!(table.height(), 1);
        assert_eq!(table.value(0, "Receita Total"), Some(&Value::Number(100.0)));
    }
}
