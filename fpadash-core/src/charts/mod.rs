//! Declarative chart specifications
//!
//! Each chart is a [`ChartRecipe`]. [`build_charts`] runs all four and
//! replaces any recipe that fails with an empty placeholder plus a warning,
//! so one unresolved column never takes the other charts down with it.

mod cash_flow;
mod revenue_line;
mod segment_bars;
mod waterfall;

pub use cash_flow::CashFlowChart;
pub use revenue_line::RevenueLineChart;
pub use segment_bars::{SegmentBarsChart, segments};
pub use waterfall::{WATERFALL_LABELS, WaterfallChart};

use crate::diagnostic::{Diagnostic, Scope};
use crate::error::Result;
use crate::reader::{Table, Value};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The four dashboard charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    RevenueLine,
    SegmentBars,
    Waterfall,
    CashFlow,
}

impl ChartKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::RevenueLine => "Revenue line",
            ChartKind::SegmentBars => "Revenue by segment",
            ChartKind::Waterfall => "Income statement waterfall",
            ChartKind::CashFlow => "Cash flow",
        }
    }
}

/// How bar series share a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    #[default]
    Stack,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Absolute,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScatterMode {
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

/// One series of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trace {
    Scatter {
        name: String,
        x: Vec<Value>,
        y: Vec<Option<f64>>,
        mode: ScatterMode,
    },
    Bar {
        name: String,
        x: Vec<Value>,
        y: Vec<Option<f64>>,
    },
    Waterfall {
        name: String,
        x: Vec<String>,
        y: Vec<f64>,
        measure: Vec<Measure>,
    },
}

impl Trace {
    pub fn name(&self) -> &str {
        match self {
            Trace::Scatter { name, .. }
            | Trace::Bar { name, .. }
            | Trace::Waterfall { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<BarMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<String>,
}

/// A chart ready for a rendering collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub traces: Vec<Trace>,
    pub layout: Layout,
    /// Set when the chart could not be built and is intentionally empty
    pub placeholder: bool,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            traces: Vec::new(),
            layout: Layout::default(),
            placeholder: false,
        }
    }

    pub fn placeholder(kind: ChartKind, title: impl Into<String>) -> Self {
        Self {
            placeholder: true,
            ..Self::new(kind, title)
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn push_trace(&mut self, trace: Trace) {
        self.traces.push(trace);
    }
}

/// Tables and selections a chart is built from
#[derive(Debug, Clone, Copy)]
pub struct ChartInputs<'a> {
    pub summary: &'a Table,
    pub revenues: &'a Table,
    pub cashflow: &'a Table,
    pub period: &'a Value,
    pub selected_segments: &'a [String],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChartOptions {
    pub segment_barmode: BarMode,
}

/// Trait that all dashboard charts implement
pub trait ChartRecipe {
    fn kind(&self) -> ChartKind;

    /// Title, also used for the placeholder when the build fails
    fn title(&self, inputs: &ChartInputs<'_>) -> String;

    fn build(&self, inputs: &ChartInputs<'_>, options: &ChartOptions) -> Result<ChartSpec>;
}

/// All four charts plus the warnings raised while building them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub line_chart: ChartSpec,
    pub segment_chart: ChartSpec,
    pub waterfall_chart: ChartSpec,
    pub flow_chart: ChartSpec,
    pub diagnostics: Vec<Diagnostic>,
}

impl ChartSet {
    pub fn iter(&self) -> impl Iterator<Item = &ChartSpec> {
        [
            &self.line_chart,
            &self.segment_chart,
            &self.waterfall_chart,
            &self.flow_chart,
        ]
        .into_iter()
    }
}

pub fn build_charts(
    summary: &Table,
    revenues: &Table,
    cashflow: &Table,
    period: &Value,
    selected_segments: &[String],
    options: &ChartOptions,
) -> ChartSet {
    let inputs = ChartInputs {
        summary,
        revenues,
        cashflow,
        period,
        selected_segments,
    };
    let mut diagnostics = Vec::new();

    ChartSet {
        line_chart: render(&RevenueLineChart, &inputs, options, &mut diagnostics),
        segment_chart: render(&SegmentBarsChart, &inputs, options, &mut diagnostics),
        waterfall_chart: render(&WaterfallChart, &inputs, options, &mut diagnostics),
        flow_chart: render(&CashFlowChart, &inputs, options, &mut diagnostics),
        diagnostics,
    }
}

fn render(
    recipe: &dyn ChartRecipe,
    inputs: &ChartInputs<'_>,
    options: &ChartOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> ChartSpec {
    match recipe.build(inputs, options) {
        Ok(spec) => spec,
        Err(e) => {
            warn!(chart = recipe.kind().label(), error = %e, "chart replaced by placeholder");
            diagnostics.push(Diagnostic::warning(
                Scope::Chart(recipe.kind()),
                format!("Chart left empty: {}", e),
            ));
            ChartSpec::placeholder(recipe.kind(), recipe.title(inputs))
        }
    }
}

/// x values of `x_column` and numeric y values of `y_column`, row by row
fn column_series(table: &Table, x_column: &str, y_column: &str) -> (Vec<Value>, Vec<Option<f64>>) {
    let x = table
        .column_values(x_column)
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let y = table
        .column_values(y_column)
        .map(|values| values.map(Value::as_f64).collect())
        .unwrap_or_default();
    (x, y)
}
