//! The company-year table shared by every stage after reconciliation.
//!
//! One row per (company, fiscal year), sorted ascending on both, one nullable
//! `f64` per numeric column. Stages derive new tables of the same shape; rows
//! are never dropped.

use std::ops::Range;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int32Array, LargeStringArray, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::TableError;
use crate::schema::company_year::{self, COMPANY_COLUMN, YEAR_COLUMN};

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyYearRow {
    pub company_name: String,
    pub fiscal_year: i32,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyYearTable {
    columns: Vec<String>,
    rows: Vec<CompanyYearRow>,
}

/// A borrowed view of one column of one company's series.
pub struct Series<'a> {
    pub company: &'a str,
    pub column: &'a str,
    pub years: Vec<i32>,
    pub values: Vec<Option<f64>>,
}

impl CompanyYearTable {
    /// Build a table, sorting rows by (company, fiscal year).
    ///
    /// Fails if a row's width differs from the column count or two rows share
    /// the same (company, fiscal year).
    pub fn new(columns: Vec<String>, mut rows: Vec<CompanyYearRow>) -> Result<Self, TableError> {
        if let Some(row) = rows.iter().find(|r| r.values.len() != columns.len()) {
            return Err(TableError::RowWidth {
                expected: columns.len(),
                found: row.values.len(),
            });
        }
        rows.sort_by(|a, b| {
            a.company_name
                .cmp(&b.company_name)
                .then(a.fiscal_year.cmp(&b.fiscal_year))
        });
        if let Some(w) = rows
            .windows(2)
            .find(|w| w[0].company_name == w[1].company_name && w[0].fiscal_year == w[1].fiscal_year)
        {
            return Err(TableError::DuplicateRow {
                company: w[0].company_name.clone(),
                fiscal_year: w[0].fiscal_year,
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[CompanyYearRow] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup by identity and column name.
    pub fn value(&self, company: &str, fiscal_year: i32, column: &str) -> Option<f64> {
        let col = self.column_index(column)?;
        self.rows
            .iter()
            .find(|r| r.company_name == company && r.fiscal_year == fiscal_year)
            .and_then(|r| r.values[col])
    }

    /// Distinct companies in table order.
    pub fn companies(&self) -> Vec<&str> {
        self.company_ranges()
            .into_iter()
            .map(|r| self.rows[r.start].company_name.as_str())
            .collect()
    }

    /// Row ranges covering each company's contiguous, year-ordered block.
    pub fn company_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;
        for i in 1..=self.rows.len() {
            if i == self.rows.len() || self.rows[i].company_name != self.rows[start].company_name {
                if i > start {
                    ranges.push(start..i);
                }
                start = i;
            }
        }
        ranges
    }

    /// One company's series for one column, ordered by fiscal year.
    pub fn series(&self, company: &str, column: &str) -> Option<Series<'_>> {
        let col = self.column_index(column)?;
        let range = self
            .company_ranges()
            .into_iter()
            .find(|r| self.rows[r.start].company_name == company)?;
        Some(self.series_at(range, col))
    }

    fn series_at(&self, range: Range<usize>, col: usize) -> Series<'_> {
        let rows = &self.rows[range];
        Series {
            company: rows[0].company_name.as_str(),
            column: self.columns[col].as_str(),
            years: rows.iter().map(|r| r.fiscal_year).collect(),
            values: rows.iter().map(|r| r.values[col]).collect(),
        }
    }

    /// Derive a same-shape table by transforming every (company, column)
    /// series independently.
    ///
    /// `f` must return one value per input value, in the same order.
    pub fn map_series<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Series<'_>) -> Vec<Option<f64>>,
    {
        let mut out = self.clone();
        for range in self.company_ranges() {
            for col in 0..self.columns.len() {
                let series = self.series_at(range.clone(), col);
                let mapped = f(&series);
                debug_assert_eq!(mapped.len(), range.len());
                for (row, v) in out.rows[range.clone()].iter_mut().zip(mapped) {
                    row.values[col] = v;
                }
            }
        }
        out
    }

    /// Append every column of `companion` (same rows) under `{column}{suffix}`.
    pub fn with_companions(&self, companion: &Self, suffix: &str) -> Result<Self, TableError> {
        let same_rows = self.rows.len() == companion.rows.len()
            && self.rows.iter().zip(&companion.rows).all(|(a, b)| {
                a.company_name == b.company_name && a.fiscal_year == b.fiscal_year
            });
        if !same_rows {
            return Err(TableError::RowMismatch {
                rows: self.rows.len(),
                companion_rows: companion.rows.len(),
            });
        }
        let mut columns = self.columns.clone();
        columns.extend(companion.columns.iter().map(|c| format!("{c}{suffix}")));
        let rows = self
            .rows
            .iter()
            .zip(&companion.rows)
            .map(|(a, b)| {
                let mut values = a.values.clone();
                values.extend_from_slice(&b.values);
                CompanyYearRow {
                    company_name: a.company_name.clone(),
                    fiscal_year: a.fiscal_year,
                    values,
                }
            })
            .collect();
        Ok(Self { columns, rows })
    }

    // ── Arrow ──

    /// Convert to a single RecordBatch using [`company_year::table_schema`].
    pub fn to_record_batch(&self) -> Result<RecordBatch, TableError> {
        let schema = Arc::new(company_year::table_schema(&self.columns));
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len() + 2);
        arrays.push(Arc::new(StringArray::from_iter_values(
            self.rows.iter().map(|r| r.company_name.as_str()),
        )));
        arrays.push(Arc::new(Int32Array::from_iter_values(
            self.rows.iter().map(|r| r.fiscal_year),
        )));
        for col in 0..self.columns.len() {
            let values: Float64Array = self.rows.iter().map(|r| r.values[col]).collect();
            arrays.push(Arc::new(values));
        }
        Ok(RecordBatch::try_new(schema, arrays)?)
    }

    /// Rebuild a table from RecordBatches, e.g. as read back from Parquet.
    ///
    /// Every column besides the identity columns is read as a numeric column;
    /// integer columns are cast to `f64`.
    pub fn from_record_batches(batches: &[RecordBatch]) -> Result<Self, TableError> {
        let Some(first) = batches.first() else {
            return Self::new(Vec::new(), Vec::new());
        };
        let columns: Vec<String> = first
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .filter(|n| n != COMPANY_COLUMN && n != YEAR_COLUMN)
            .collect();

        let mut rows = Vec::new();
        for batch in batches {
            let company_col = batch
                .column_by_name(COMPANY_COLUMN)
                .ok_or_else(|| TableError::MissingColumn(COMPANY_COLUMN.into()))?;
            let year_col = batch
                .column_by_name(YEAR_COLUMN)
                .ok_or_else(|| TableError::MissingColumn(YEAR_COLUMN.into()))?;
            let years = cast(year_col, &DataType::Int32)?;
            let years = years
                .as_any()
                .downcast_ref::<Int32Array>()
                .ok_or_else(|| column_type(YEAR_COLUMN, "Int32", year_col.data_type()))?;

            let mut numeric = Vec::with_capacity(columns.len());
            for name in &columns {
                let col = batch
                    .column_by_name(name)
                    .ok_or_else(|| TableError::MissingColumn(name.clone()))?;
                if !col.data_type().is_numeric() && col.data_type() != &DataType::Null {
                    return Err(column_type(name, "Float64", col.data_type()));
                }
                numeric.push(cast(col, &DataType::Float64)?);
            }

            for row in 0..batch.num_rows() {
                let company_name = get_string(company_col.as_ref(), row).ok_or(
                    TableError::NullIdentity {
                        column: COMPANY_COLUMN,
                        row,
                    },
                )?;
                let values = numeric
                    .iter()
                    .map(|arr| {
                        let arr = arr.as_any().downcast_ref::<Float64Array>()?;
                        (!arr.is_null(row)).then(|| arr.value(row))
                    })
                    .collect();
                if years.is_null(row) {
                    return Err(TableError::NullIdentity {
                        column: YEAR_COLUMN,
                        row,
                    });
                }
                rows.push(CompanyYearRow {
                    company_name,
                    fiscal_year: years.value(row),
                    values,
                });
            }
        }
        Self::new(columns, rows)
    }
}

fn column_type(column: &str, expected: &'static str, found: &DataType) -> TableError {
    TableError::ColumnType {
        column: column.to_string(),
        expected,
        found: found.to_string(),
    }
}

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}
