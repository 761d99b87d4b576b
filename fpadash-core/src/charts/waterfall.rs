use super::{ChartInputs, ChartKind, ChartOptions, ChartRecipe, ChartSpec, Layout, Measure, Trace};
use crate::error::Result;
use crate::kpi::find_period_row;
use crate::schema::Field;

/// Fixed category order of the income statement waterfall
pub const WATERFALL_LABELS: [&str; 3] = ["Total Revenue", "Cost of Services", "Operating Expenses"];

/// Revenue minus costs and expenses for the selected period
pub struct WaterfallChart;

impl ChartRecipe for WaterfallChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Waterfall
    }

    fn title(&self, inputs: &ChartInputs<'_>) -> String {
        format!("Simplified Income Statement - {}", inputs.period)
    }

    fn build(&self, inputs: &ChartInputs<'_>, _options: &ChartOptions) -> Result<ChartSpec> {
        let summary = inputs.summary;
        let revenue = summary.require_field(Field::TotalRevenue)?;
        let costs = summary.require_field(Field::CostOfServices)?;
        let expenses = summary.require_field(Field::OperatingExpenses)?;
        let row = find_period_row(summary, inputs.period)?;

        let y = vec![
            summary.number_at(row, revenue)?,
            -summary.number_at(row, costs)?,
            -summary.number_at(row, expenses)?,
        ];

        let mut spec = ChartSpec::new(self.kind(), self.title(inputs)).with_layout(Layout {
            y_title: Some("R$".to_string()),
            ..Layout::default()
        });
        spec.push_trace(Trace::Waterfall {
            name: "DRE".to_string(),
            x: WATERFALL_LABELS.iter().map(|s| s.to_string()).collect(),
            y,
            measure: vec![Measure::Absolute, Measure::Relative, Measure::Relative],
        });
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::error::DashboardError;
    use crate::reader::{SheetKind, Table, Value};

    fn build(summary: &Table, period: &str) -> Result<ChartSpec> {
        let r = wide_revenues();
        let c = cashflow();
        let period = Value::from(period);
        WaterfallChart.build(
            &ChartInputs {
                summary,
                revenues: &r,
                cashflow: &c,
                period: &period,
                selected_segments: &[],
            },
            &ChartOptions::default(),
        )
    }

    #[test]
    fn test_waterfall_order_and_signs() {
        let spec = build(&summary(), "Feb").unwrap();
        assert_eq!(spec.title, "Simplified Income Statement - Feb");
        match &spec.traces[0] {
            Trace::Waterfall { x, y, measure, .. } => {
                assert_eq!(x, &vec!["Total Revenue", "Cost of Services", "Operating Expenses"]);
                assert_eq!(y, &vec![150.0, -60.0, -35.0]);
                assert_eq!(
                    measure,
                    &vec![Measure::Absolute, Measure::Relative, Measure::Relative]
                );
            }
            other => panic!("unexpected trace: {other:?}"),
        }
    }

    #[test]
    fn test_missing_cost_column_fails() {
        let s = bound(
            SheetKind::Summary,
            &["Ms", "Receita Total", "Despesas Operacionais"],
            vec![vec!["Jan".into(), 100.0.into(), 30.0.into()]],
        );
        let err = build(&s, "Jan").unwrap_err();
        match err {
            DashboardError::ColumnNotFound { field, .. } => assert_eq!(field, "Cost of Services"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_period_fails() {
        let err = build(&summary(), "Dec").unwrap_err();
        assert!(matches!(err, DashboardError::PeriodNotFound { .. }));
    }
}
