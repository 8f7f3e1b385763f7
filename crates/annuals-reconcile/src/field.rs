//! Reconciliation of one numeric field across the attempts of a report.

use annuals_core::{FieldKey, QualityFlag, ReconcileConfig};
use tracing::{debug, warn};

use crate::window::select_window;

/// Raw-attempt lookup for the years around the one being reconciled.
pub trait AdjacentLookup {
    /// Whether at least one attempt of `fiscal_year` loads.
    fn has_data(&self, fiscal_year: i32) -> bool;

    /// Non-null values of `key` pooled over every loaded attempt of `fiscal_year`.
    fn values(&self, fiscal_year: i32, key: &FieldKey) -> Vec<f64>;
}

/// How a reconciled value was arrived at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// No attempt had a value.
    Empty,
    /// The attempts agreed; their mean was taken.
    Agreed,
    /// The attempts disagreed; the mean of those close to the adjacent years was taken.
    Adjacent { adjacent_mean: f64, kept: usize },
    /// The attempts disagreed and no adjacent year had the field.
    NoAdjacentData,
    /// The attempts disagreed and none was close to the adjacent years.
    NoneNearAdjacent { adjacent_mean: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub value: Option<f64>,
    /// `(max − min) / |mean|` of the non-null attempts, 0 when the mean is 0.
    pub discrepancy: f64,
    pub outcome: Outcome,
}

impl Reconciled {
    /// The quality flag to record for this field, if any.
    pub fn flag(&self, key: &FieldKey) -> Option<QualityFlag> {
        match self.outcome {
            Outcome::NoAdjacentData => Some(QualityFlag::NoAdjacentData {
                field: key.to_string(),
                discrepancy: self.discrepancy,
            }),
            Outcome::NoneNearAdjacent { adjacent_mean } => Some(QualityFlag::NoneNearAdjacent {
                field: key.to_string(),
                discrepancy: self.discrepancy,
                adjacent_mean,
            }),
            _ => None,
        }
    }
}

/// Reconcile the values the attempts of `fiscal_year` hold for `key`.
///
/// Never fails: absent attempts are simply not in `current`, and every
/// fallback ends in a value (or `None` when no attempt had one).
pub fn reconcile_field(
    key: &FieldKey,
    current: &[Option<f64>],
    fiscal_year: i32,
    adjacent: &dyn AdjacentLookup,
    config: &ReconcileConfig,
) -> Reconciled {
    let values: Vec<f64> = current.iter().flatten().copied().collect();
    let Some(mean) = average(&values) else {
        return Reconciled {
            value: None,
            discrepancy: 0.0,
            outcome: Outcome::Empty,
        };
    };
    let discrepancy = discrepancy(&values, mean);

    if discrepancy < config.discrepancy_threshold {
        return Reconciled {
            value: Some(mean),
            discrepancy,
            outcome: Outcome::Agreed,
        };
    }

    debug!(
        field = %key,
        fiscal_year,
        discrepancy,
        "attempts disagree, consulting adjacent years"
    );

    let pooled: Vec<f64> = select_window(fiscal_year, config.adjacent_policy, |y| {
        adjacent.has_data(y)
    })
    .map(|years| {
        years
            .into_iter()
            .flat_map(|y| adjacent.values(y, key))
            .collect()
    })
    .unwrap_or_default();

    let Some(adjacent_mean) = average(&pooled) else {
        warn!(
            field = %key,
            fiscal_year,
            discrepancy,
            "no adjacent data, keeping unsmoothed mean"
        );
        return Reconciled {
            value: Some(mean),
            discrepancy,
            outcome: Outcome::NoAdjacentData,
        };
    };

    let near: Vec<f64> = values
        .iter()
        .copied()
        .filter(|&v| deviation(v, adjacent_mean) < config.deviation_threshold)
        .collect();

    match average(&near) {
        Some(value) => Reconciled {
            value: Some(value),
            discrepancy,
            outcome: Outcome::Adjacent {
                adjacent_mean,
                kept: near.len(),
            },
        },
        None => {
            warn!(
                field = %key,
                fiscal_year,
                discrepancy,
                adjacent_mean,
                "no attempt near adjacent mean, keeping unsmoothed mean"
            );
            Reconciled {
                value: Some(mean),
                discrepancy,
                outcome: Outcome::NoneNearAdjacent { adjacent_mean },
            }
        }
    }
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn discrepancy(values: &[f64], mean: f64) -> f64 {
    if mean == 0.0 {
        return 0.0;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (max - min) / mean.abs()
}

/// Relative deviation of `v` from `reference`; against a zero reference only
/// an exact zero counts as near.
fn deviation(v: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        if v == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        (v - reference).abs() / reference.abs()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use annuals_core::{AdjacentPolicy, FieldGroup};

    use super::*;

    /// Adjacent years keyed by year; a present year with no values has data
    /// but not for this field.
    #[derive(Default)]
    struct Years(BTreeMap<i32, Vec<f64>>);

    impl Years {
        fn with(mut self, year: i32, values: &[f64]) -> Self {
            self.0.insert(year, values.to_vec());
            self
        }
    }

    impl AdjacentLookup for Years {
        fn has_data(&self, fiscal_year: i32) -> bool {
            self.0.contains_key(&fiscal_year)
        }

        fn values(&self, fiscal_year: i32, _key: &FieldKey) -> Vec<f64> {
            self.0.get(&fiscal_year).cloned().unwrap_or_default()
        }
    }

    fn revenue() -> FieldKey {
        FieldKey::new(FieldGroup::IncomeStatement, "revenue")
    }

    fn run(current: &[Option<f64>], years: &Years) -> Reconciled {
        reconcile_field(
            &revenue(),
            current,
            1950,
            years,
            &ReconcileConfig::default(),
        )
    }

    #[test]
    fn close_attempts_return_mean() {
        let r = run(&[Some(100.0), Some(105.0), Some(110.0)], &Years::default());
        assert_eq!(r.value, Some(105.0));
        assert_eq!(r.outcome, Outcome::Agreed);
        assert!((r.discrepancy - 10.0 / 105.0).abs() < 1e-12);
    }

    #[test]
    fn agreeing_triples_return_exact_mean() {
        for (a, b, c) in [
            (1.0, 1.1, 1.05),
            (2_500_000.0, 2_480_000.0, 2_510_000.0),
            (-40.0, -42.0, -41.0),
            (7.0, 7.0, 7.0),
        ] {
            let r = run(&[Some(a), Some(b), Some(c)], &Years::default());
            assert_eq!(r.value, Some((a + b + c) / 3.0));
            assert!(r.flag(&revenue()).is_none());
        }
    }

    #[test]
    fn disagreement_without_adjacent_data_keeps_mean_and_flags() {
        let r = run(&[Some(100.0), Some(100.0), Some(1000.0)], &Years::default());
        assert_eq!(r.value, Some(400.0));
        assert_eq!(r.discrepancy, 2.25);
        assert_eq!(r.outcome, Outcome::NoAdjacentData);
        assert_eq!(
            r.flag(&revenue()),
            Some(QualityFlag::NoAdjacentData {
                field: "income_statement.revenue".into(),
                discrepancy: 2.25,
            })
        );
    }

    #[test]
    fn adjacent_years_pick_the_plausible_attempts() {
        let years = Years::default().with(1949, &[95.0, 96.0]).with(1951, &[105.0]);
        let r = run(&[Some(100.0), Some(100.0), Some(1000.0)], &years);
        assert_eq!(r.value, Some(100.0));
        assert!(matches!(r.outcome, Outcome::Adjacent { kept: 2, .. }));
        assert!(r.flag(&revenue()).is_none());
    }

    #[test]
    fn no_attempt_near_adjacent_falls_back_to_mean() {
        let years = Years::default().with(1949, &[500.0]).with(1951, &[500.0]);
        let r = run(&[Some(100.0), Some(1000.0)], &years);
        assert_eq!(r.value, Some(550.0));
        assert_eq!(
            r.outcome,
            Outcome::NoneNearAdjacent {
                adjacent_mean: 500.0
            }
        );
        assert!(matches!(
            r.flag(&revenue()),
            Some(QualityFlag::NoneNearAdjacent { .. })
        ));
    }

    #[test]
    fn adjacent_years_without_the_field_count_as_no_data() {
        let years = Years::default().with(1949, &[]).with(1951, &[]);
        let r = run(&[Some(100.0), Some(1000.0)], &years);
        assert_eq!(r.value, Some(550.0));
        assert_eq!(r.outcome, Outcome::NoAdjacentData);
    }

    #[test]
    fn widens_to_two_later_years() {
        // Mean of 1951 and 1952 is 60, far from both attempts.
        let years = Years::default().with(1951, &[110.0]).with(1952, &[10.0]);
        let r = run(&[Some(100.0), Some(1000.0)], &years);
        assert_eq!(r.value, Some(550.0));
        assert_eq!(
            r.outcome,
            Outcome::NoneNearAdjacent {
                adjacent_mean: 60.0
            }
        );

        let nearest = ReconcileConfig {
            adjacent_policy: AdjacentPolicy::NearestOnly,
            ..ReconcileConfig::default()
        };
        let r = reconcile_field(
            &revenue(),
            &[Some(100.0), Some(1000.0)],
            1950,
            &years,
            &nearest,
        );
        assert_eq!(r.value, Some(100.0));
    }

    #[test]
    fn all_null_is_null() {
        let r = run(&[None, None, None], &Years::default());
        assert_eq!(r.value, None);
        assert_eq!(r.outcome, Outcome::Empty);
        assert_eq!(run(&[], &Years::default()).value, None);
    }

    #[test]
    fn single_value_is_kept() {
        let r = run(&[None, Some(42.0), None], &Years::default());
        assert_eq!(r.value, Some(42.0));
        assert_eq!(r.discrepancy, 0.0);
    }

    #[test]
    fn zero_mean_counts_as_agreement() {
        let r = run(&[Some(-5.0), Some(5.0)], &Years::default());
        assert_eq!(r.value, Some(0.0));
        assert_eq!(r.outcome, Outcome::Agreed);
    }

    #[test]
    fn zero_adjacent_mean_keeps_only_zero() {
        let years = Years::default().with(1949, &[0.0]).with(1951, &[0.0]);
        let r = run(&[Some(0.0), Some(10.0)], &years);
        assert_eq!(r.value, Some(0.0));
        assert!(matches!(r.outcome, Outcome::Adjacent { kept: 1, .. }));
    }

    #[test]
    fn negative_values_use_absolute_mean() {
        let r = run(&[Some(-100.0), Some(-100.0), Some(-1000.0)], &Years::default());
        assert_eq!(r.discrepancy, 2.25);
        assert_eq!(r.value, Some(-400.0));
    }
}
