use super::{ChartInputs, ChartKind, ChartOptions, ChartRecipe, ChartSpec, Layout, Trace};
use crate::error::{DashboardError, Result};
use crate::reader::{Table, Value};
use crate::schema::Field;
use tracing::debug;

/// Revenue per segment over time, one bar series per selected segment
pub struct SegmentBarsChart;

/// Segment names known to the revenues sheet.
///
/// Long layout: distinct values of the segment column in first-appearance
/// order. Wide layout: every numeric column other than the period and any
/// "total" column.
pub fn segments(revenues: &Table) -> Vec<String> {
    match revenues.field(Field::Segment) {
        Some(column) => {
            let mut out: Vec<String> = Vec::new();
            for value in revenues.column_values(column).into_iter().flatten() {
                if value.is_empty() {
                    continue;
                }
                let name = value.to_string();
                if !out.contains(&name) {
                    out.push(name);
                }
            }
            out
        }
        None => wide_segment_columns(revenues),
    }
}

fn wide_segment_columns(revenues: &Table) -> Vec<String> {
    let period = revenues.field(Field::Period);
    revenues
        .columns
        .iter()
        .enumerate()
        .filter(|(idx, name)| {
            Some(name.as_str()) != period
                && !name.to_lowercase().contains("total")
                && revenues.is_numeric_column(*idx)
        })
        .map(|(_, name)| name.clone())
        .collect()
}

impl ChartRecipe for SegmentBarsChart {
    fn kind(&self) -> ChartKind {
        ChartKind::SegmentBars
    }

    fn title(&self, _inputs: &ChartInputs<'_>) -> String {
        "Revenue by Segment".to_string()
    }

    fn build(&self, inputs: &ChartInputs<'_>, options: &ChartOptions) -> Result<ChartSpec> {
        let revenues = inputs.revenues;
        let period = revenues.require_field(Field::Period)?;

        let known = segments(revenues);
        if known.is_empty() {
            return Err(DashboardError::ColumnNotFound {
                field: Field::Segment.label().to_string(),
                table: revenues.name.clone(),
                columns: revenues.columns.clone(),
            });
        }

        let mut selected: Vec<&str> = Vec::new();
        if inputs.selected_segments.is_empty() {
            selected.extend(known.iter().map(String::as_str));
        } else {
            for name in inputs.selected_segments {
                if !known.contains(name) {
                    debug!(segment = %name, "unknown segment ignored");
                } else if !selected.contains(&name.as_str()) {
                    selected.push(name.as_str());
                }
            }
        }

        let mut spec = ChartSpec::new(self.kind(), self.title(inputs)).with_layout(Layout {
            x_title: Some("Month".to_string()),
            y_title: Some("Revenue (R$)".to_string()),
            barmode: Some(options.segment_barmode),
            ..Layout::default()
        });

        match revenues.field(Field::Segment) {
            Some(segment_column) => {
                let value_column = revenues.require_field(Field::SegmentValue)?;
                for name in selected {
                    let (x, y) = long_series(revenues, period, segment_column, value_column, name);
                    spec.push_trace(Trace::Bar {
                        name: name.to_string(),
                        x,
                        y,
                    });
                }
            }
            None => {
                for name in selected {
                    let (x, y) = super::column_series(revenues, period, name);
                    spec.push_trace(Trace::Bar {
                        name: name.to_string(),
                        x,
                        y,
                    });
                }
            }
        }
        Ok(spec)
    }
}

fn long_series(
    revenues: &Table,
    period: &str,
    segment_column: &str,
    value_column: &str,
    name: &str,
) -> (Vec<Value>, Vec<Option<f64>>) {
    (0..revenues.height())
        .filter(|&row| {
            revenues
                .value(row, segment_column)
                .is_some_and(|v| !v.is_empty() && v.to_string() == name)
        })
        .map(|row| {
            let x = revenues.value(row, period).cloned().unwrap_or_default();
            let y = revenues.value(row, value_column).and_then(Value::as_f64);
            (x, y)
        })
        .unzip()
}
