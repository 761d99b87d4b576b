//! Export of the filtered summary table to XLSX

use crate::error::Result;
use crate::reader::{Table, Value};
use crate::schema::Field;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::info;

/// Content type of the exported file
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Download name for a period's export. Path separators in the period are
/// replaced so the name stays a single file.
pub fn export_file_name(period: &Value) -> String {
    let period: String = period
        .to_string()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect();
    format!("Resumo_Financeiro_{}.xlsx", period)
}

/// Rows whose period equals `period`, same columns and bindings. A table
/// without a period column yields no rows.
pub fn filter_by_period(table: &Table, period: &Value) -> Table {
    let rows = match table.field(Field::Period).and_then(|c| table.column_index(c)) {
        Some(idx) => table
            .rows
            .iter()
            .filter(|row| row.get(idx) == Some(period))
            .cloned()
            .collect(),
        None => Vec::new(),
    };
    table.with_rows(rows)
}

/// Serialize `table` as a single-sheet XLSX named after the table
pub fn export_table(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(table)?;
    let bytes = workbook.save_to_buffer()?;
    info!(sheet = %table.name, rows = table.height(), bytes = bytes.len(), "table exported");
    Ok(bytes)
}

pub fn export_to_path<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = build_workbook(table)?;
    workbook.save(path)?;
    info!(sheet = %table.name, path = %path.display(), "table exported");
    Ok(())
}

fn build_workbook(table: &Table) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.name)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string(0, column_number(col)?, name)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_number = u32::try_from(row_idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, value) in row.iter().enumerate() {
            write_value(worksheet, row_number, column_number(col)?, value, &date_format)?;
        }
    }
    Ok(workbook)
}

fn column_number(col: usize) -> std::result::Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

fn write_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    date_format: &Format,
) -> std::result::Result<(), XlsxError> {
    match value {
        Value::Empty => {}
        Value::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        Value::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        Value::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Value::DateTime(serial) => {
            worksheet.write_number_with_format(row, col, *serial, date_format)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{SheetKind, read_sheet_from_bytes};
    use crate::schema::Schema;

    fn summary() -> Table {
        let table = Table::new(
            SheetKind::Summary.sheet_name(),
            vec!["Ms".to_string(), "Receita Total".to_string(), "Obs".to_string()],
            vec![
                vec!["Jan".into(), 100.0.into(), Value::Empty],
                vec!["Feb".into(), 150.0.into(), "revisado".into()],
                vec!["Mar".into(), 120.0.into(), true.into()],
            ],
        );
        Schema::builtin().bind(SheetKind::Summary, table, &mut Vec::new()).unwrap()
    }

    #[test]
    fn test_filter_by_period() {
        let filtered = filter_by_period(&summary(), &Value::from("Feb"));
        assert_eq!(filtered.columns, summary().columns);
        assert_eq!(filtered.height(), 1);
        assert_eq!(filtered.value(0, "Receita Total"), Some(&Value::Number(150.0)));
        assert_eq!(filtered.field(Field::Period), Some("Ms"));

        let none = filter_by_period(&summary(), &Value::from("Dec"));
        assert!(none.is_empty());
    }

    #[test]
    fn test_export_round_trip() {
        let table = summary();
        let bytes = export_table(&table).unwrap();
        let back = read_sheet_from_bytes(&bytes, "Resumo Financeiro").unwrap();
        assert_eq!(back.columns, table.columns);
        assert_eq!(back.rows, table.rows);
    }

    #[test]
    fn test_export_dates_round_trip() {
        let table = Table::new(
            "Indicadores",
            vec!["Data".to_string(), "Valor".to_string()],
            vec![vec![Value::DateTime(45292.0), 1.5.into()]],
        );
        let bytes = export_table(&table).unwrap();
        let back = read_sheet_from_bytes(&bytes, "Indicadores").unwrap();
        assert_eq!(back.value(0, "Data"), Some(&Value::DateTime(45292.0)));
        assert_eq!(back.value(0, "Data").unwrap().to_string(), "2024-01-01");
    }

    #[test]
    fn test_export_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        export_to_path(&summary(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let back = read_sheet_from_bytes(&bytes, "Resumo Financeiro").unwrap();
        assert_eq!(back.height(), 3);
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name(&Value::from("Fev/2024")),
            "Resumo_Financeiro_Fev-2024.xlsx"
        );
        assert_eq!(export_file_name(&Value::from("Jan")), "Resumo_Financeiro_Jan.xlsx");
    }
}
