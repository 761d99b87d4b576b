//! Excel/ODS workbook loader using calamine

use crate::diagnostic::Diagnostic;
use crate::error::{DashboardError, Result};
use crate::schema::Schema;
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info};

pub mod workbook;

pub use workbook::{SheetKind, Table, Value, Workbook};

/// Load a workbook from a file path with the built-in schema
pub fn load<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    read_workbook(path, &Schema::default())
}

/// Load an in-memory workbook with the built-in schema
pub fn load_from_bytes(identity: &str, bytes: &[u8]) -> Result<Workbook> {
    read_workbook_from_bytes(identity, bytes, &Schema::default())
}

/// Read a workbook from a file path
pub fn read_workbook<P: AsRef<Path>>(path: P, schema: &Schema) -> Result<Workbook> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let mut excel = open_workbook_auto(path).map_err(|e| DashboardError::Open {
        source_name: source.clone(),
        source: e,
    })?;
    extract_workbook(&source, &mut excel, schema)
}

/// Read a workbook held in memory (e.g. an upload). `identity` names the
/// source in messages; the format is sniffed from the content.
pub fn read_workbook_from_bytes(identity: &str, bytes: &[u8], schema: &Schema) -> Result<Workbook> {
    let mut excel =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| DashboardError::Open {
            source_name: identity.to_string(),
            source: e,
        })?;
    extract_workbook(identity, &mut excel, schema)
}

/// Read one sheet from an in-memory workbook without binding any schema
pub fn read_sheet_from_bytes(bytes: &[u8], sheet: &str) -> Result<Table> {
    let mut excel =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| DashboardError::Open {
            source_name: "<memory>".to_string(),
            source: e,
        })?;
    let available = excel.sheet_names();
    if !available.iter().any(|s| s == sheet) {
        return Err(DashboardError::MissingSheet {
            sheet: sheet.to_string(),
            available,
        });
    }
    read_table(&mut excel, sheet)
}

fn extract_workbook<RS: Read + Seek>(
    source: &str,
    excel: &mut Sheets<RS>,
    schema: &Schema,
) -> Result<Workbook> {
    let available = excel.sheet_names();
    if let Some(missing) = SheetKind::ALL
        .iter()
        .find(|kind| !available.iter().any(|s| s == kind.sheet_name()))
    {
        return Err(DashboardError::MissingSheet {
            sheet: missing.sheet_name().to_string(),
            available,
        });
    }

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut read = |kind: SheetKind| -> Result<Table> {
        let table = read_table(excel, kind.sheet_name())?;
        schema.bind(kind, table, &mut diagnostics)
    };

    let summary = read(SheetKind::Summary)?;
    let revenues = read(SheetKind::Revenues)?;
    let operating_expenses = read(SheetKind::OperatingExpenses)?;
    let cash_flow = read(SheetKind::CashFlow)?;
    let indicators = read(SheetKind::Indicators)?;

    info!(
        source,
        summary_rows = summary.height(),
        revenue_rows = revenues.height(),
        cash_flow_rows = cash_flow.height(),
        "workbook loaded"
    );

    diagnostics.sort();
    Ok(Workbook {
        source: source.to_string(),
        summary,
        revenues,
        operating_expenses,
        cash_flow,
        indicators,
        diagnostics,
    })
}

fn read_table<RS: Read + Seek>(excel: &mut Sheets<RS>, sheet: &str) -> Result<Table> {
    let range = excel
        .worksheet_range(sheet)
        .map_err(|e| DashboardError::Sheet {
            sheet: sheet.to_string(),
            source: e,
        })?;
    Ok(range_to_table(sheet, &range))
}

/// First row is the header; fully empty data rows are dropped
fn range_to_table(name: &str, range: &Range<Data>) -> Table {
    let mut rows_iter = range.rows();

    let columns: Vec<String> = match rows_iter.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(idx, cell)| match cell {
                Data::Empty => format!("col_{}", idx),
                Data::String(s) if s.trim().is_empty() => format!("col_{}", idx),
                other => parse_cell_value(other).to_string(),
            })
            .collect(),
        None => Vec::new(),
    };

    let rows: Vec<Vec<Value>> = rows_iter
        .map(|row| row.iter().map(parse_cell_value).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|v| !v.is_empty()))
        .collect();

    debug!(sheet = name, columns = ?columns, rows = rows.len(), "sheet read");
    Table::new(name, columns, rows)
}

fn parse_cell_value(data: &Data) -> Value {
    match data {
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) => Value::Number(*f),
        Data::String(s) if s.is_empty() => Value::Empty,
        Data::String(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(e) => Value::Text(e.to_string()),
        Data::Empty => Value::Empty,
        Data::DateTime(dt) => Value::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) => Value::Text(s.clone()),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}
