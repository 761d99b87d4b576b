//! Month-over-month KPIs for one selected period

use crate::error::{DashboardError, Result};
use crate::reader::{Table, Value};
use crate::schema::Field;
use serde::Serialize;
use tracing::debug;

/// The four headline metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Metric {
    TotalRevenue,
    MomGrowth,
    AvgNetMargin,
    CashBalance,
}

/// How a metric value reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    Currency,
    Percent,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::TotalRevenue,
        Metric::MomGrowth,
        Metric::AvgNetMargin,
        Metric::CashBalance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::TotalRevenue => "Total Revenue",
            Metric::MomGrowth => "MoM Growth",
            Metric::AvgNetMargin => "Average Net Margin",
            Metric::CashBalance => "Accumulated Cash Balance",
        }
    }

    pub fn unit(&self) -> Unit {
        match self {
            Metric::TotalRevenue | Metric::CashBalance => Unit::Currency,
            Metric::MomGrowth | Metric::AvgNetMargin => Unit::Percent,
        }
    }
}

/// KPIs computed for one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSnapshot {
    pub period: Value,
    pub total_revenue: f64,
    /// `None` when the previous period's revenue is zero or missing
    pub mom_growth_pct: Option<f64>,
    pub avg_net_margin_pct: f64,
    pub cash_balance: f64,
}

/// Distinct periods of a table in first-appearance order
pub fn periods(table: &Table) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    let Some(values) = table
        .field(Field::Period)
        .and_then(|column| table.column_values(column))
    else {
        return out;
    };
    for value in values {
        if !value.is_empty() && !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

/// Index of the first row whose period equals `period`
pub fn find_period_row(table: &Table, period: &Value) -> Result<usize> {
    let column = table.require_field(Field::Period)?;
    table
        .column_values(column)
        .and_then(|mut values| values.position(|v| v == period))
        .ok_or_else(|| DashboardError::PeriodNotFound {
            period: period.to_string(),
            table: table.name.clone(),
            column: column.to_string(),
            columns: table.columns.clone(),
        })
}

pub fn total_revenue(summary: &Table, period: &Value) -> Result<f64> {
    let column = summary.require_field(Field::TotalRevenue)?;
    let row = find_period_row(summary, period)?;
    summary.number_at(row, column)
}

/// Growth against the row immediately above in table order. The first row
/// has no prior period and yields `Some(0.0)`.
pub fn mom_growth_pct(summary: &Table, period: &Value) -> Result<Option<f64>> {
    let column = summary.require_field(Field::TotalRevenue)?;
    let row = find_period_row(summary, period)?;
    let current = summary.number_at(row, column)?;
    if row == 0 {
        return Ok(Some(0.0));
    }

    let previous = summary.value(row - 1, column).and_then(Value::as_f64);
    match previous {
        Some(prev) if prev != 0.0 => Ok(Some((current - prev) / prev * 100.0)),
        _ => {
            debug!(
                sheet = %summary.name,
                period = %period,
                "previous revenue is zero or missing; growth undefined"
            );
            Ok(None)
        }
    }
}

/// Mean of the numeric net margin cells over every row; 0 without a column
pub fn avg_net_margin_pct(summary: &Table) -> f64 {
    let Some(values) = summary
        .field(Field::NetMargin)
        .and_then(|column| summary.column_values(column))
    else {
        return 0.0;
    };
    let numbers: Vec<f64> = values.filter_map(Value::as_f64).collect();
    if numbers.is_empty() {
        0.0
    } else {
        numbers.iter().sum::<f64>() / numbers.len() as f64
    }
}

pub fn cash_balance(cashflow: &Table, period: &Value) -> Result<f64> {
    let column = cashflow.require_field(Field::AccumulatedBalance)?;
    let row = find_period_row(cashflow, period)?;
    cashflow.number_at(row, column)
}

/// All four KPIs; fails on the first metric that cannot be computed
pub fn compute_kpis(summary: &Table, cashflow: &Table, period: &Value) -> Result<KpiSnapshot> {
    Ok(KpiSnapshot {
        period: period.clone(),
        total_revenue: total_revenue(summary, period)?,
        mom_growth_pct: mom_growth_pct(summary, period)?,
        avg_net_margin_pct: avg_net_margin_pct(summary),
        cash_balance: cash_balance(cashflow, period)?,
    })
}

/// One metric ready for display: a value, an undefined value, or an error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub metric: Metric,
    pub label: &'static str,
    pub unit: Unit,
    pub value: Option<f64>,
    pub error: Option<String>,
}

impl MetricCard {
    fn from_result(metric: Metric, result: Result<Option<f64>>) -> Self {
        let (value, error) = match result {
            Ok(value) => (value, None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            metric,
            label: metric.label(),
            unit: metric.unit(),
            value,
            error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Evaluate each metric on its own so one broken column does not hide the rest
pub fn kpi_cards(summary: &Table, cashflow: &Table, period: &Value) -> Vec<MetricCard> {
    Metric::ALL
        .into_iter()
        .map(|metric| {
            let result = match metric {
                Metric::TotalRevenue => total_revenue(summary, period).map(Some),
                Metric::MomGrowth => mom_growth_pct(summary, period),
                Metric::AvgNetMargin => Ok(Some(avg_net_margin_pct(summary))),
                Metric::CashBalance => cash_balance(cashflow, period).map(Some),
            };
            MetricCard::from_result(metric, result)
        })
        .collect()
}
