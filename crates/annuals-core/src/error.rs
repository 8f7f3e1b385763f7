use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("field sets differ between summaries: {0}")]
    SchemaMismatch(crate::assemble::SchemaMismatch),

    #[error("duplicate row for {company} {fiscal_year}")]
    DuplicateRow { company: String, fiscal_year: i32 },

    #[error("null {column} at row {row}")]
    NullIdentity { column: &'static str, row: usize },

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("column {column} has type {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("row has {found} values, table has {expected} columns")]
    RowWidth { expected: usize, found: usize },

    #[error("companion rows differ: {rows} rows vs {companion_rows}, or identities out of step")]
    RowMismatch { rows: usize, companion_rows: usize },

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
