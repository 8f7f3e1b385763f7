//! LOWESS trend smoothing of one company series.
//!
//! The fit itself is the `lowess` crate's batch adapter (Cleveland 1979:
//! tricube neighbourhood weights, local linear fit, bisquare robustness
//! passes). This module maps fiscal years onto calendar-day positions and
//! keeps nulls out of the fit.

use annuals_core::SmoothConfig;
use chrono::{Datelike, NaiveDate};
use ::lowess::prelude::*;

/// Day number of January 1 of `fiscal_year`, counting from 0001-01-01 as day 1.
pub fn year_ordinal(fiscal_year: i32) -> f64 {
    match NaiveDate::from_ymd_opt(fiscal_year, 1, 1) {
        Some(d) => f64::from(d.num_days_from_ce()),
        // Outside chrono's range; keep the spacing proportional.
        None => f64::from(fiscal_year) * 365.2425,
    }
}

/// Smooth one company series ordered by fiscal year.
///
/// Nulls are left out of the fit and stay null. With fewer than
/// `min_points` non-null values the series is returned unchanged.
pub fn smooth(
    years: &[i32],
    values: &[Option<f64>],
    config: &SmoothConfig,
) -> std::result::Result<Vec<Option<f64>>, LowessError> {
    let (x, y): (Vec<f64>, Vec<f64>) = years
        .iter()
        .zip(values)
        .filter_map(|(&yr, v)| v.map(|v| (year_ordinal(yr), v)))
        .unzip();
    if x.len() < config.min_points {
        return Ok(values.to_vec());
    }

    let mut fitted = lowess(&x, &y, config.frac, config.robustness_iterations)?.into_iter();
    Ok(values
        .iter()
        .map(|v| v.and_then(|_| fitted.next()))
        .collect())
}

/// LOWESS fit of `y` against `x`; one fitted value per input point.
///
/// `delta` is 0 so every point gets its own local fit.
pub fn lowess(
    x: &[f64],
    y: &[f64],
    frac: f64,
    robustness_iterations: usize,
) -> std::result::Result<Vec<f64>, LowessError> {
    let model = Lowess::new()
        .fraction(frac)
        .iterations(robustness_iterations)
        .delta(0.0)
        .adapter(Batch)
        .build()?;
    Ok(model.fit(x, y)?.y)
}
