//! Explicit header alias mapping, validated once when a workbook is loaded
//!
//! Each sheet lists the logical fields it may carry. Binding a sheet resolves
//! every field to an actual column; a missing required field fails the load,
//! a missing optional field only yields a diagnostic and degrades whatever
//! metric or chart depends on it.

pub mod resolver;

pub use resolver::{ColumnPattern, resolve_column, resolve_numeric_column};

use crate::config::DashboardConfig;
use crate::diagnostic::{Diagnostic, Scope, Severity};
use crate::error::{DashboardError, Result};
use crate::reader::{SheetKind, Table};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Logical columns the dashboard understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Field {
    Period,
    TotalRevenue,
    NetMargin,
    CostOfServices,
    OperatingExpenses,
    Segment,
    SegmentValue,
    Inflows,
    Outflows,
    AccumulatedBalance,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Period,
        Field::TotalRevenue,
        Field::NetMargin,
        Field::CostOfServices,
        Field::OperatingExpenses,
        Field::Segment,
        Field::SegmentValue,
        Field::Inflows,
        Field::Outflows,
        Field::AccumulatedBalance,
    ];

    /// Key used in configuration (`<key>_aliases`)
    pub fn key(&self) -> &'static str {
        match self {
            Field::Period => "period",
            Field::TotalRevenue => "total_revenue",
            Field::NetMargin => "net_margin",
            Field::CostOfServices => "cost_of_services",
            Field::OperatingExpenses => "operating_expenses",
            Field::Segment => "segment",
            Field::SegmentValue => "segment_value",
            Field::Inflows => "inflows",
            Field::Outflows => "outflows",
            Field::AccumulatedBalance => "accumulated_balance",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Period => "Period",
            Field::TotalRevenue => "Total Revenue",
            Field::NetMargin => "Net Margin",
            Field::CostOfServices => "Cost of Services",
            Field::OperatingExpenses => "Operating Expenses",
            Field::Segment => "Segment",
            Field::SegmentValue => "Segment Value",
            Field::Inflows => "Inflows",
            Field::Outflows => "Outflows",
            Field::AccumulatedBalance => "Accumulated Balance",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Built-in header aliases. Includes the accent-stripped headers some
    /// spreadsheet exports produce ("Ms" for "Mês", "Sadas" for "Saídas").
    pub fn default_pattern(&self) -> ColumnPattern {
        match self {
            Field::Period => ColumnPattern::new()
                .aliases([
                    "Ms", "Mês", "Mes", "mês", "mes", "MÊS", "MES", "Month", "Data", "Período",
                    "Period",
                ])
                .contains(["mes"])
                .contains(["mês"])
                .contains(["month"]),
            Field::TotalRevenue => ColumnPattern::new()
                .aliases(["Receita Total", "Total Revenue"])
                .contains(["receita", "total"])
                .contains(["total", "revenue"]),
            Field::NetMargin => ColumnPattern::new()
                .aliases(["Margem Líquida", "Margem Liquida", "Margem Lquida", "Net Margin"])
                .contains(["margem", "líquida"])
                .contains(["margem", "liquida"])
                .contains(["margem", "lquida"])
                .contains(["net", "margin"]),
            Field::CostOfServices => ColumnPattern::new()
                .aliases([
                    "Custo dos Serviços CS",
                    "Custo dos Servios CS",
                    "Custo dos Serviços",
                    "Custos dos Serviços",
                    "Cost of Services",
                ])
                .contains(["custo"])
                .contains(["cost"]),
            Field::OperatingExpenses => ColumnPattern::new()
                .aliases(["Despesas Operacionais", "Operating Expenses", "OpEx"])
                .contains(["despesa"])
                .contains(["operating", "expense"]),
            Field::Segment => ColumnPattern::new()
                .aliases(["Segmento", "Segment"])
                .contains(["segment"]),
            Field::SegmentValue => ColumnPattern::new()
                .aliases(["Valor", "Value"])
                .contains(["valor"])
                .contains(["value"])
                .numeric_fallback(),
            Field::Inflows => ColumnPattern::new()
                .aliases(["Entradas", "Inflows"])
                .contains(["entrada"])
                .contains(["inflow"]),
            Field::Outflows => ColumnPattern::new()
                .aliases(["Saídas", "Saidas", "Sadas", "Outflows"])
                .contains(["saída"])
                .contains(["saida"])
                .contains(["sadas"])
                .contains(["outflow"]),
            Field::AccumulatedBalance => ColumnPattern::new()
                .aliases(["Saldo Acumulado", "Accumulated Balance"])
                .contains(["saldo", "acumulado"])
                .contains(["accumulated", "balance"])
                .contains(["saldo"])
                .contains(["balance"]),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One field expected on a sheet
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    pub pattern: ColumnPattern,
    pub required: bool,
    /// Severity reported when an optional field is missing
    pub missing_severity: Severity,
    /// Only bind when this other field was bound
    pub depends_on: Option<Field>,
}

impl FieldRule {
    pub fn required(field: Field) -> Self {
        Self {
            field,
            pattern: field.default_pattern(),
            required: true,
            missing_severity: Severity::Error,
            depends_on: None,
        }
    }

    pub fn optional(field: Field) -> Self {
        Self {
            required: false,
            missing_severity: Severity::Warning,
            ..Self::required(field)
        }
    }

    fn quiet(mut self) -> Self {
        self.missing_severity = Severity::Info;
        self
    }

    fn depends_on(mut self, field: Field) -> Self {
        self.depends_on = Some(field);
        self
    }
}

/// Fields per sheet
#[derive(Debug, Clone)]
pub struct Schema {
    sheets: BTreeMap<SheetKind, Vec<FieldRule>>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Schema {
    pub fn builtin() -> Self {
        let mut sheets = BTreeMap::new();
        sheets.insert(
            SheetKind::Summary,
            vec![
                FieldRule::required(Field::Period),
                FieldRule::required(Field::TotalRevenue),
                FieldRule::optional(Field::NetMargin),
                FieldRule::optional(Field::CostOfServices),
                FieldRule::optional(Field::OperatingExpenses),
            ],
        );
        sheets.insert(
            SheetKind::Revenues,
            vec![
                FieldRule::required(Field::Period),
                // Wide layouts have one column per segment and no segment column
                FieldRule::optional(Field::Segment).quiet(),
                FieldRule::optional(Field::SegmentValue).depends_on(Field::Segment),
            ],
        );
        sheets.insert(
            SheetKind::CashFlow,
            vec![
                FieldRule::required(Field::Period),
                FieldRule::optional(Field::Inflows),
                FieldRule::optional(Field::Outflows),
                FieldRule::optional(Field::AccumulatedBalance),
            ],
        );
        sheets.insert(
            SheetKind::OperatingExpenses,
            vec![FieldRule::optional(Field::Period).quiet()],
        );
        sheets.insert(
            SheetKind::Indicators,
            vec![FieldRule::optional(Field::Period).quiet()],
        );
        Self { sheets }
    }

    /// Built-in schema extended with configured aliases
    /// (`<field>_aliases`, sheet section first, then global) and strictness
    pub fn from_config(config: &DashboardConfig) -> Self {
        let mut schema = Self::builtin();
        let strict = config.strict_schema();
        for (kind, rules) in schema.sheets.iter_mut() {
            for rule in rules.iter_mut() {
                let key = format!("{}_aliases", rule.field.key());
                if let Some(extra) = config.get_param_array(&key, Some(kind.sheet_name())) {
                    rule.pattern.prepend_aliases(&extra);
                }
                if strict {
                    rule.required = true;
                    rule.missing_severity = Severity::Error;
                }
            }
        }
        schema
    }

    pub fn rules(&self, kind: SheetKind) -> &[FieldRule] {
        self.sheets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve every field of `kind` on `table`. Optional misses are pushed
    /// to `diagnostics`; a required miss fails with the columns present.
    pub fn bind(
        &self,
        kind: SheetKind,
        mut table: Table,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Table> {
        for rule in self.rules(kind) {
            if let Some(dep) = rule.depends_on {
                if table.field(dep).is_none() {
                    continue;
                }
            }

            let bound: Vec<String> = table.bindings().map(|(_, c)| c.to_string()).collect();
            let exclude: Vec<&str> = bound.iter().map(String::as_str).collect();

            match rule.pattern.resolve(&table, &exclude).map(str::to_string) {
                Some(column) => {
                    debug!(
                        sheet = %table.name,
                        field = %rule.field,
                        column = %column,
                        "field bound"
                    );
                    table.bind_field(rule.field, column);
                }
                None if rule.required => {
                    return Err(DashboardError::ColumnNotFound {
                        field: rule.field.label().to_string(),
                        table: table.name.clone(),
                        columns: table.columns.clone(),
                    });
                }
                None => {
                    let message = format!(
                        "No column for '{}'. Columns present: {}",
                        rule.field.label(),
                        crate::error::format_names(&table.columns)
                    );
                    if rule.missing_severity >= Severity::Warning {
                        warn!(sheet = %table.name, "{}", message);
                    }
                    diagnostics.push(Diagnostic::new(
                        Scope::Sheet(table.name.clone()),
                        message,
                        rule.missing_severity,
                    ));
                }
            }
        }
        Ok(table)
    }
}
