use super::{
    ChartInputs, ChartKind, ChartOptions, ChartRecipe, ChartSpec, Layout, ScatterMode, Trace,
};
use crate::error::Result;
use crate::schema::Field;

/// Total revenue for every period of the summary, in table order
pub struct RevenueLineChart;

impl ChartRecipe for RevenueLineChart {
    fn kind(&self) -> ChartKind {
        ChartKind::RevenueLine
    }

    fn title(&self, _inputs: &ChartInputs<'_>) -> String {
        "Total Revenue by Month".to_string()
    }

    fn build(&self, inputs: &ChartInputs<'_>, _options: &ChartOptions) -> Result<ChartSpec> {
        let summary = inputs.summary;
        let period = summary.require_field(Field::Period)?;
        let revenue = summary.require_field(Field::TotalRevenue)?;
        let (x, y) = super::column_series(summary, period, revenue);

        let mut spec = ChartSpec::new(self.kind(), self.title(inputs)).with_layout(Layout {
            x_title: Some("Month".to_string()),
            y_title: Some("Revenue (R$)".to_string()),
            hovermode: Some("x unified".to_string()),
            ..Layout::default()
        });
        spec.push_trace(Trace::Scatter {
            name: Field::TotalRevenue.label().to_string(),
            x,
            y,
            mode: ScatterMode::LinesMarkers,
        });
        Ok(spec)
    }
}
