//! Tunable parameters for every pipeline stage.
//!
//! One [`PipelineConfig`] is built per run and passed to each stage. All
//! structs deserialize with defaults, so a partial TOML file only overrides
//! the keys it names:
//!
//! ```toml
//! [reconcile]
//! discrepancy_threshold = 0.25
//! adjacent_policy = "nearest_only"
//!
//! [smooth]
//! frac = 0.4
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("invalid {field}: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub reconcile: ReconcileConfig,
    pub scale: ScaleConfig,
    pub winsor: WinsorConfig,
    pub smooth: SmoothConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("reconcile.discrepancy_threshold", self.reconcile.discrepancy_threshold)?;
        positive("reconcile.deviation_threshold", self.reconcile.deviation_threshold)?;
        positive("scale.separation_log10", self.scale.separation_log10)?;
        at_least("scale.min_points", self.scale.min_points, 2)?;
        at_least("scale.max_iterations", self.scale.max_iterations, 1)?;
        positive("winsor.threshold", self.winsor.threshold)?;
        positive("smooth.frac", self.smooth.frac)?;
        if self.smooth.frac > 1.0 {
            return Err(ConfigError {
                field: "smooth.frac",
                reason: format!("{} is greater than 1", self.smooth.frac),
            });
        }
        at_least("smooth.min_points", self.smooth.min_points, 2)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError {
            field,
            reason: format!("{value} is not a positive finite number"),
        })
    }
}

fn at_least(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError {
            field,
            reason: format!("{value} is below the minimum of {min}"),
        })
    }
}

/// Which adjacent years to pool when only one side of the current year has data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjacentPolicy {
    /// Widen to two years on the side that has data (year+1 and year+2, or
    /// year−1 and year−2).
    #[default]
    WidenOneSided,
    /// Use only the single nearest year on the side that has data.
    NearestOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Attempts whose relative spread is below this are averaged directly.
    pub discrepancy_threshold: f64,
    /// Current-year values within this relative deviation of the adjacent
    /// mean survive adjacent-year smoothing.
    pub deviation_threshold: f64,
    pub adjacent_policy: AdjacentPolicy,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            discrepancy_threshold: 0.2,
            deviation_threshold: 0.2,
            adjacent_policy: AdjacentPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaleConfig {
    /// Minimum strictly positive values before scale detection runs.
    pub min_points: usize,
    /// Cluster centers closer than this (in log10) are one scale regime.
    pub separation_log10: f64,
    pub max_iterations: usize,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            min_points: 10,
            separation_log10: 2.5,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WinsorConfig {
    /// Half-width of the clip band in MAD units.
    pub threshold: f64,
}

impl Default for WinsorConfig {
    fn default() -> Self {
        Self { threshold: 3.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmoothConfig {
    /// Fraction of the series used for each local fit.
    pub frac: f64,
    /// Series with fewer non-null points pass through unchanged.
    pub min_points: usize,
    pub robustness_iterations: usize,
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            frac: 0.3,
            min_points: 5,
            robustness_iterations: 3,
        }
    }
}
