//! Error taxonomy shared by the loader, KPI calculator, charts and export

use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// A required sheet is absent from the workbook. Fatal for the load.
    #[error("Missing required sheet '{sheet}'. Sheets present: {}", format_names(.available))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },

    /// The selected period does not appear in a table's period column.
    #[error(
        "Period '{period}' not found in column '{column}' of sheet '{table}'. Columns present: {}",
        format_names(.columns)
    )]
    PeriodNotFound {
        period: String,
        table: String,
        column: String,
        columns: Vec<String>,
    },

    /// No column of a table could be matched to a logical field.
    #[error(
        "Column for '{field}' not found in sheet '{table}'. Columns present: {}",
        format_names(.columns)
    )]
    ColumnNotFound {
        field: String,
        table: String,
        columns: Vec<String>,
    },

    /// A cell that must hold a number holds something else.
    #[error(
        "Expected a number in column '{column}' (row {row}) of sheet '{table}', \
         found '{found}'. Columns present: {}",
        format_names(.columns)
    )]
    NotNumeric {
        table: String,
        column: String,
        row: usize,
        found: String,
        columns: Vec<String>,
    },

    #[error("Failed to open workbook '{source_name}': {source}")]
    Open {
        source_name: String,
        #[source]
        source: calamine::Error,
    },

    #[error("Failed to read sheet '{sheet}': {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: calamine::Error,
    },

    #[error("Failed to write spreadsheet export: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Render a list of names the way the messages above show them
pub fn format_names(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    format!("[{}]", quoted.join(", "))
}
