//! Vertical card display for one company's series.
//!
//! Renders each numeric column of a smoothed table as a section listing the
//! raw and smoothed value per fiscal year.

use std::fmt::Write;

use annuals_core::CompanyYearTable;
use annuals_core::company_year::{SMOOTHED_SUFFIX, smoothed_column};
use anyhow::bail;

const YEAR_WIDTH: usize = 6;
const VALUE_WIDTH: usize = 18;

// ── Public API ──

/// Print a company card; see [`render_company_card`].
pub fn print_company_card(
    table: &CompanyYearTable,
    company: &str,
    field: Option<&str>,
) -> anyhow::Result<()> {
    print!("{}", render_company_card(table, company, field)?);
    Ok(())
}

/// Render every raw column (or just `field`) of `company` next to its
/// smoothed companion, one line per fiscal year.
pub fn render_company_card(
    table: &CompanyYearTable,
    company: &str,
    field: Option<&str>,
) -> anyhow::Result<String> {
    let Some(first) = table.rows().iter().position(|r| r.company_name == company) else {
        bail!("company {company:?} not in table");
    };
    let raw: Vec<&str> = match field {
        Some(f) if table.column_index(f).is_some() => vec![f],
        Some(f) => bail!("column {f:?} not in table"),
        None => table
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| !c.ends_with(SMOOTHED_SUFFIX))
            .collect(),
    };

    let years: Vec<i32> = table.rows()[first..]
        .iter()
        .take_while(|r| r.company_name == company)
        .map(|r| r.fiscal_year)
        .collect();

    let mut out = String::new();
    writeln!(out, "=== {company} ===")?;
    if let (Some(lo), Some(hi)) = (years.first(), years.last()) {
        writeln!(out, "{lo}–{hi}, {} years", years.len())?;
    }
    writeln!(out)?;

    for column in raw {
        write_section(&mut out, table, company, column)?;
    }
    Ok(out)
}

// ── Section rendering ──

fn write_section(
    out: &mut String,
    table: &CompanyYearTable,
    company: &str,
    column: &str,
) -> std::fmt::Result {
    let Some(series) = table.series(company, column) else {
        return Ok(());
    };
    if series.values.iter().all(Option::is_none) {
        return Ok(());
    }
    let smoothed = table.series(company, &smoothed_column(column));

    writeln!(out, "{column}")?;
    write!(out, "  {:<YEAR_WIDTH$}{:>VALUE_WIDTH$}", "year", "raw")?;
    if smoothed.is_some() {
        write!(out, "{:>VALUE_WIDTH$}", "smoothed")?;
    }
    writeln!(out)?;

    for (i, (year, value)) in series.years.iter().zip(&series.values).enumerate() {
        write!(out, "  {year:<YEAR_WIDTH$}{:>VALUE_WIDTH$}", cell(*value))?;
        if let Some(s) = &smoothed {
            write!(out, "{:>VALUE_WIDTH$}", cell(s.values[i]))?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    }
}
