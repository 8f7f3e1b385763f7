//! Company-year tables as Parquet files.

use std::fs::{self, File};
use std::path::Path;

use annuals_core::CompanyYearTable;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::info;

use crate::error::StoreError;

/// Write `table` as a single-batch Parquet file, creating parent directories.
///
/// Output depends only on the table contents, so rewriting an unchanged table
/// yields the same bytes.
pub fn write_table(path: &Path, table: &CompanyYearTable) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let batch = table.to_record_batch()?;
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    info!(
        path = %path.display(),
        rows = table.num_rows(),
        columns = table.columns().len(),
        "wrote table"
    );
    Ok(())
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::ParquetNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

/// Read a table written by [`write_table`] (or any Parquet file with the
/// company-year layout).
pub fn read_table(path: &Path) -> Result<CompanyYearTable, StoreError> {
    let batches = read_parquet(path)?;
    if batches.is_empty() {
        return Err(StoreError::Empty(path.to_path_buf()));
    }
    Ok(CompanyYearTable::from_record_batches(&batches)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use annuals_core::CompanyYearRow;
    use tempfile::TempDir;

    fn table() -> CompanyYearTable {
        CompanyYearTable::new(
            vec!["revenue".into(), "revenue_smoothed".into()],
            vec![
                CompanyYearRow {
                    company_name: "SKF".into(),
                    fiscal_year: 1921,
                    values: vec![Some(12.5), None],
                },
                CompanyYearRow {
                    company_name: "ASEA".into(),
                    fiscal_year: 1930,
                    values: vec![None, Some(3.25)],
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn write_and_read_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("smoothed.parquet");
        write_table(&path, &table()).unwrap();
        assert_eq!(read_table(&path).unwrap(), table());
    }

    #[test]
    fn rewriting_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.parquet");
        let b = tmp.path().join("b.parquet");
        write_table(&a, &table()).unwrap();
        write_table(&b, &table()).unwrap();
        assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
    }

    #[test]
    fn missing_file() {
        let err = read_table(Path::new("/nonexistent/table.parquet")).unwrap_err();
        assert!(matches!(err, StoreError::ParquetNotFound(_)));
    }
}
