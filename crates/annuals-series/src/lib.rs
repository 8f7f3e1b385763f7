//! Series-level cleaning of the company-year table: scale normalization,
//! winsorization and LOWESS trend smoothing, each applied per company and
//! per column.

pub mod scale;
pub mod stages;
pub mod stats;
pub mod trend;
pub mod winsor;

pub use scale::{ScaleOutcome, normalize_scale};
pub use stages::{
    ScaleAdjustment, SeriesTables, process_series, scale_table, smooth_table, winsorize_table,
};
pub use winsor::{Spread, Winsorized, winsorize};
