//! Table-level drivers: apply each series transform to every
//! (company, column) series of a [`CompanyYearTable`].

use annuals_core::company_year::SMOOTHED_SUFFIX;
use annuals_core::{
    CompanyYearTable, PipelineConfig, ScaleConfig, SmoothConfig, TableError, WinsorConfig,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::trend::smooth;
use crate::scale::{ScaleOutcome, normalize_scale};
use crate::winsor::winsorize;

/// One scale correction applied to a company's column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleAdjustment {
    pub company: String,
    pub column: String,
    pub factor: f64,
    pub rows_rescaled: usize,
}

pub fn scale_table(
    table: &CompanyYearTable,
    config: &ScaleConfig,
) -> (CompanyYearTable, Vec<ScaleAdjustment>) {
    let mut adjustments = Vec::new();
    let out = table.map_series(|s| {
        let (values, outcome) = normalize_scale(&s.values, config);
        match outcome {
            ScaleOutcome::Rescaled { factor, rescaled } => {
                info!(
                    company = s.company,
                    column = s.column,
                    factor,
                    rescaled,
                    "rescaled lower scale regime"
                );
                adjustments.push(ScaleAdjustment {
                    company: s.company.to_string(),
                    column: s.column.to_string(),
                    factor,
                    rows_rescaled: rescaled,
                });
            }
            other => debug!(company = s.company, column = s.column, ?other, "scale unchanged"),
        }
        values
    });
    (out, adjustments)
}

pub fn winsorize_table(table: &CompanyYearTable, config: &WinsorConfig) -> CompanyYearTable {
    let mut clipped = 0;
    let out = table.map_series(|s| {
        let w = winsorize(&s.values, config);
        clipped += w.clipped;
        w.values
    });
    info!(clipped, "winsorized");
    out
}

pub fn smooth_table(table: &CompanyYearTable, config: &SmoothConfig) -> CompanyYearTable {
    table.map_series(|s| match smooth(&s.years, &s.values, config) {
        Ok(values) => values,
        Err(e) => {
            warn!(
                company = s.company,
                column = s.column,
                error = %e,
                "lowess failed, series left unsmoothed"
            );
            s.values.clone()
        }
    })
}

/// Every intermediate table of the series stages.
#[derive(Debug, Clone)]
pub struct SeriesTables {
    pub scale_adjusted: CompanyYearTable,
    pub winsorized: CompanyYearTable,
    /// Raw columns followed by their `_smoothed` companions.
    pub smoothed: CompanyYearTable,
    pub adjustments: Vec<ScaleAdjustment>,
}

/// Scale, winsorize and smooth `raw`.
///
/// The raw columns of the result keep the assembled values; only the
/// companions carry the adjusted, smoothed series.
pub fn process_series(
    raw: &CompanyYearTable,
    config: &PipelineConfig,
) -> Result<SeriesTables, TableError> {
    let (scale_adjusted, adjustments) = scale_table(raw, &config.scale);
    let winsorized = winsorize_table(&scale_adjusted, &config.winsor);
    let smoothed = raw.with_companions(&smooth_table(&winsorized, &config.smooth), SMOOTHED_SUFFIX)?;
    info!(
        rows = smoothed.num_rows(),
        companies = smoothed.companies().len(),
        adjustments = adjustments.len(),
        "series stages complete"
    );
    Ok(SeriesTables {
        scale_adjusted,
        winsorized,
        smoothed,
        adjustments,
    })
}

#[cfg(test)]
mod tests {
    use annuals_core::CompanyYearRow;

    use super::*;

    fn table() -> CompanyYearTable {
        let mut rows = Vec::new();
        for (i, year) in (1930..1945).enumerate() {
            let revenue = if i < 5 { 2_000.0 } else { 2_000_000.0 };
            rows.push(CompanyYearRow {
                company_name: "Alfa".into(),
                fiscal_year: year,
                values: vec![Some(revenue), Some(100.0 + i as f64)],
            });
        }
        for year in 1950..1953 {
            rows.push(CompanyYearRow {
                company_name: "Beta".into(),
                fiscal_year: year,
                values: vec![Some(1.0), None],
            });
        }
        CompanyYearTable::new(vec!["revenue".into(), "n_employees".into()], rows).unwrap()
    }

    #[test]
    fn scale_adjustments_are_reported_per_series() {
        let (out, adjustments) = scale_table(&table(), &ScaleConfig::default());
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].company, "Alfa");
        assert_eq!(adjustments[0].column, "revenue");
        assert_eq!(adjustments[0].rows_rescaled, 5);
        let v = out.value("Alfa", 1930, "revenue").unwrap();
        assert!((v - 2_000_000.0).abs() < 1e-3);
        assert_eq!(out.value("Beta", 1950, "revenue"), Some(1.0));
    }

    #[test]
    fn output_keeps_raw_and_appends_smoothed() {
        let raw = table();
        let out = process_series(&raw, &PipelineConfig::default()).unwrap();
        assert_eq!(
            out.smoothed.columns(),
            ["revenue", "n_employees", "revenue_smoothed", "n_employees_smoothed"]
        );
        assert_eq!(out.smoothed.num_rows(), raw.num_rows());
        // Raw column is the unadjusted value.
        assert_eq!(out.smoothed.value("Alfa", 1930, "revenue"), Some(2_000.0));
        let smoothed = out.smoothed.value("Alfa", 1930, "revenue_smoothed").unwrap();
        assert!(smoothed > 1_000_000.0);
        // Beta has three years: below the smoothing minimum.
        assert_eq!(out.smoothed.value("Beta", 1951, "revenue_smoothed"), Some(1.0));
        assert_eq!(out.smoothed.value("Beta", 1951, "n_employees_smoothed"), None);
        assert_eq!(out.adjustments.len(), 1);
    }

    #[test]
    fn linear_employee_series_survives_every_stage() {
        let out = process_series(&table(), &PipelineConfig::default()).unwrap();
        for (i, year) in (1930..1945).enumerate() {
            let v = out
                .smoothed
                .value("Alfa", year, "n_employees_smoothed")
                .unwrap();
            assert!((v - (100.0 + i as f64)).abs() < 0.05, "{year}: {v}");
        }
    }
}
