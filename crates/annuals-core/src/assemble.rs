//! Cross-sectional assembly: year summaries → one company-year table.
//!
//! A pure reshape. Nested groups flatten into columns named after the field
//! (`income_statement.revenue` → `revenue`); a name that occurs in more than
//! one group is qualified as `{group}_{field}` for every group it occurs in.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::TableError;
use crate::report::{FieldKey, YearSummary};
use crate::schema::company_year::canonical_rank;
use crate::table::{CompanyYearRow, CompanyYearTable};

/// Summaries whose field sets lack keys present in other summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaMismatch {
    pub gaps: Vec<SchemaGap>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaGap {
    pub company_name: String,
    pub fiscal_year: i32,
    pub missing: Vec<String>,
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} summaries lack fields", self.gaps.len())?;
        if let Some(first) = self.gaps.first() {
            write!(
                f,
                " (first: {}-{} lacks {})",
                first.company_name,
                first.fiscal_year,
                first.missing.join(", ")
            )?;
        }
        Ok(())
    }
}

/// The assembled table plus the divergence report, if field sets differed.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub table: CompanyYearTable,
    pub mismatch: Option<SchemaMismatch>,
}

/// Assemble with the union-of-columns strategy: a field missing from a
/// summary becomes a null cell, and the divergence is reported.
pub fn assemble(summaries: &[YearSummary]) -> Result<Assembled, TableError> {
    let keys = ordered_keys(summaries);
    let names = column_names(&keys);

    let mut gaps = Vec::new();
    let mut rows = Vec::with_capacity(summaries.len());
    for summary in summaries {
        let present: BTreeMap<FieldKey, Option<f64>> = summary.values().collect();
        let missing: Vec<String> = keys
            .iter()
            .filter(|k| !present.contains_key(*k))
            .map(|k| k.to_string())
            .collect();
        if !missing.is_empty() {
            gaps.push(SchemaGap {
                company_name: summary.company_name.clone(),
                fiscal_year: summary.fiscal_year,
                missing,
            });
        }
        rows.push(CompanyYearRow {
            company_name: summary.company_name.clone(),
            fiscal_year: summary.fiscal_year,
            values: keys
                .iter()
                .map(|k| present.get(k).copied().flatten())
                .collect(),
        });
    }

    let table = CompanyYearTable::new(names, rows)?;
    let mismatch = (!gaps.is_empty()).then_some(SchemaMismatch { gaps });
    if let Some(m) = &mismatch {
        warn!(%m, "schema mismatch; filled missing fields with nulls");
    }
    info!(
        rows = table.num_rows(),
        columns = table.columns().len(),
        "assembled company-year table"
    );
    Ok(Assembled { table, mismatch })
}

/// Assemble, failing on any field-set divergence.
pub fn assemble_strict(summaries: &[YearSummary]) -> Result<CompanyYearTable, TableError> {
    let assembled = assemble(summaries)?;
    match assembled.mismatch {
        Some(m) => Err(TableError::SchemaMismatch(m)),
        None => Ok(assembled.table),
    }
}

/// Union of all keys: canonical fields first, then the rest by (group, name).
fn ordered_keys(summaries: &[YearSummary]) -> Vec<FieldKey> {
    let union: BTreeSet<FieldKey> = summaries.iter().flat_map(|s| s.values().map(|(k, _)| k)).collect();
    let mut keys: Vec<FieldKey> = union.into_iter().collect();
    keys.sort_by_key(|k| (canonical_rank(k.group, &k.name).unwrap_or(usize::MAX), k.clone()));
    keys
}

fn column_names(keys: &[FieldKey]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for k in keys {
        *counts.entry(k.name.as_str()).or_default() += 1;
    }
    keys.iter()
        .map(|k| {
            if counts[k.name.as_str()] > 1 {
                format!("{}_{}", k.group.as_str(), k.name)
            } else {
                k.name.clone()
            }
        })
        .collect()
}
