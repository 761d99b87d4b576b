//! Workbook data structures

use crate::diagnostic::Diagnostic;
use crate::error::{DashboardError, Result};
use crate::schema::Field;
use chrono::{NaiveDate, TimeDelta};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// The five sheets every dashboard workbook carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SheetKind {
    Summary,
    Revenues,
    OperatingExpenses,
    CashFlow,
    Indicators,
}

impl SheetKind {
    pub const ALL: [SheetKind; 5] = [
        SheetKind::Summary,
        SheetKind::Revenues,
        SheetKind::OperatingExpenses,
        SheetKind::CashFlow,
        SheetKind::Indicators,
    ];

    /// Exact sheet name expected in the workbook
    pub fn sheet_name(&self) -> &'static str {
        match self {
            SheetKind::Summary => "Resumo Financeiro",
            SheetKind::Revenues => "Receitas",
            SheetKind::OperatingExpenses => "Despesas Operacionais",
            SheetKind::CashFlow => "Fluxo de Caixa",
            SheetKind::Indicators => "Indicadores",
        }
    }

    pub fn from_sheet_name(name: &str) -> Option<SheetKind> {
        Self::ALL.into_iter().find(|kind| kind.sheet_name() == name)
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

/// Loaded workbook: one table per required sheet
#[derive(Debug, Clone)]
pub struct Workbook {
    /// File path or upload name the workbook was read from
    pub source: String,
    pub summary: Table,
    pub revenues: Table,
    pub operating_expenses: Table,
    pub cash_flow: Table,
    pub indicators: Table,
    /// Warnings raised while binding the schema
    pub diagnostics: Vec<Diagnostic>,
}

impl Workbook {
    /// Get the table backing a sheet
    pub fn table(&self, kind: SheetKind) -> &Table {
        match kind {
            SheetKind::Summary => &self.summary,
            SheetKind::Revenues => &self.revenues,
            SheetKind::OperatingExpenses => &self.operating_expenses,
            SheetKind::CashFlow => &self.cash_flow,
            SheetKind::Indicators => &self.indicators,
        }
    }

    /// All tables in sheet order
    pub fn tables(&self) -> impl Iterator<Item = (SheetKind, &Table)> {
        SheetKind::ALL.into_iter().map(move |kind| (kind, self.table(kind)))
    }

    /// Get all sheet names
    pub fn sheet_names(&self) -> Vec<&str> {
        self.tables().map(|(_, t)| t.name.as_str()).collect()
    }
}

/// A sheet read as a header row followed by data rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Logical fields bound to actual column names
    #[serde(skip)]
    fields: BTreeMap<Field, String>,
}

impl Table {
    /// Build a table, trimming every header
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(|c| c.trim().to_string()).collect(),
            rows,
            fields: BTreeMap::new(),
        }
    }

    /// Same columns and bindings, different rows
    pub fn with_rows(&self, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows,
            fields: self.fields.clone(),
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Get a cell by row index and column name
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r.get(col).unwrap_or(&EMPTY))
    }

    /// Iterate the values of one column, one per row
    pub fn column_values(&self, column: &str) -> Option<impl Iterator<Item = &Value>> {
        let col = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .map(move |r| r.get(col).unwrap_or(&EMPTY)),
        )
    }

    /// A column is numeric when it has at least one number and nothing else
    /// besides empty cells
    pub fn is_numeric_column(&self, col: usize) -> bool {
        let mut seen_number = false;
        for row in &self.rows {
            match row.get(col).unwrap_or(&EMPTY) {
                Value::Number(_) => seen_number = true,
                Value::Empty => {}
                _ => return false,
            }
        }
        seen_number
    }

    pub(crate) fn bind_field(&mut self, field: Field, column: impl Into<String>) {
        self.fields.insert(field, column.into());
    }

    /// Column bound to a logical field at load time
    pub fn field(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Like [`Table::field`] but fails with the columns present
    pub fn require_field(&self, field: Field) -> Result<&str> {
        self.field(field)
            .ok_or_else(|| DashboardError::ColumnNotFound {
                field: field.label().to_string(),
                table: self.name.clone(),
                columns: self.columns.clone(),
            })
    }

    /// All field bindings, in field order
    pub fn bindings(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields.iter().map(|(f, c)| (*f, c.as_str()))
    }

    /// Read a numeric cell, failing with context when it is not a number
    pub fn number_at(&self, row: usize, column: &str) -> Result<f64> {
        let value = self.value(row, column).unwrap_or(&EMPTY);
        value.as_f64().ok_or_else(|| DashboardError::NotNumeric {
            table: self.name.clone(),
            column: column.to_string(),
            row,
            found: value.to_string(),
            columns: self.columns.clone(),
        })
    }
}

static EMPTY: Value = Value::Empty;

/// Cell value types
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Excel serial date (days since 1899-12-30)
    DateTime(f64),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::DateTime(serial) => match excel_serial_to_string(*serial) {
                Some(s) => f.write_str(&s),
                None => write!(f, "{}", serial),
            },
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Empty => serializer.serialize_none(),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::DateTime(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

fn excel_serial_to_string(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let dt = epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)?;
    if millis % 86_400_000 == 0 {
        Some(dt.format("%Y-%m-%d").to_string())
    } else {
        Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
