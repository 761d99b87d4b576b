use super::{
    BarMode, ChartInputs, ChartKind, ChartOptions, ChartRecipe, ChartSpec, Layout, ScatterMode,
    Trace,
};
use crate::error::Result;
use crate::schema::Field;

/// Inflow and outflow bars grouped per period, with the running balance as a line
pub struct CashFlowChart;

impl ChartRecipe for CashFlowChart {
    fn kind(&self) -> ChartKind {
        ChartKind::CashFlow
    }

    fn title(&self, _inputs: &ChartInputs<'_>) -> String {
        "Cash Flow - Inflows, Outflows and Balance".to_string()
    }

    fn build(&self, inputs: &ChartInputs<'_>, _options: &ChartOptions) -> Result<ChartSpec> {
        let cashflow = inputs.cashflow;
        let period = cashflow.require_field(Field::Period)?;
        let inflows = cashflow.require_field(Field::Inflows)?;
        let outflows = cashflow.require_field(Field::Outflows)?;
        let balance = cashflow.require_field(Field::AccumulatedBalance)?;

        let mut spec = ChartSpec::new(self.kind(), self.title(inputs)).with_layout(Layout {
            x_title: Some("Month".to_string()),
            y_title: Some("R$".to_string()),
            barmode: Some(BarMode::Group),
            ..Layout::default()
        });

        let (x, y) = super::column_series(cashflow, period, inflows);
        spec.push_trace(Trace::Bar {
            name: Field::Inflows.label().to_string(),
            x,
            y,
        });
        let (x, y) = super::column_series(cashflow, period, outflows);
        spec.push_trace(Trace::Bar {
            name: Field::Outflows.label().to_string(),
            x,
            y,
        });
        let (x, y) = super::column_series(cashflow, period, balance);
        spec.push_trace(Trace::Scatter {
            name: Field::AccumulatedBalance.label().to_string(),
            x,
            y,
            mode: ScatterMode::LinesMarkers,
        });
        Ok(spec)
    }
}
