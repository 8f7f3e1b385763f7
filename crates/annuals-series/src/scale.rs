//! Detection and correction of order-of-magnitude unit shifts.
//!
//! Reports switch between units (kronor, thousands, millions) over the years,
//! so one company's series can sit in two scale regimes. The positive values
//! are split into two clusters in log10 space; when the cluster centers are
//! far enough apart the lower cluster is multiplied up to the higher one.
//! Only two regimes are modelled. A series with three unit conventions gets
//! at most one correction.

use annuals_core::ScaleConfig;

/// What scale normalization did to one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleOutcome {
    /// Fewer strictly positive values than the configured minimum.
    TooFewPoints { positives: usize },
    /// The clusters are closer than the separation threshold.
    SingleRegime { separation: f64 },
    /// The lower cluster was multiplied by `factor`.
    Rescaled { factor: f64, rescaled: usize },
}

/// Two clusters over a 1-D sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Clusters {
    pub low_center: f64,
    pub high_center: f64,
    /// `true` where the point belongs to the high cluster.
    pub high: Vec<bool>,
}

/// Lloyd's k-means with k = 2 over scalar values.
///
/// Centers start at the minimum and maximum, iteration stops when no
/// assignment changes or after `max_iterations`. A point equidistant from
/// both centers joins the low one. Returns `None` for an empty sample.
pub fn kmeans2(xs: &[f64], max_iterations: usize) -> Option<Clusters> {
    let mut low = xs.iter().copied().reduce(f64::min)?;
    let mut high = xs.iter().copied().reduce(f64::max)?;
    let mut labels = vec![false; xs.len()];

    for iteration in 0..max_iterations {
        let next: Vec<bool> = xs
            .iter()
            .map(|&x| (x - low).abs() > (x - high).abs())
            .collect();
        if iteration > 0 && next == labels {
            break;
        }
        labels = next;
        if let Some(c) = center(xs, &labels, false) {
            low = c;
        }
        if let Some(c) = center(xs, &labels, true) {
            high = c;
        }
    }

    Some(Clusters {
        low_center: low,
        high_center: high,
        high: labels,
    })
}

fn center(xs: &[f64], labels: &[bool], high: bool) -> Option<f64> {
    let members: Vec<f64> = xs
        .iter()
        .zip(labels)
        .filter(|(_, l)| **l == high)
        .map(|(x, _)| *x)
        .collect();
    crate::stats::mean(&members)
}

/// Bring the lower scale regime of `values` up to the higher one.
///
/// Nulls and non-positive values pass through unchanged and take no part in
/// the clustering.
pub fn normalize_scale(
    values: &[Option<f64>],
    config: &ScaleConfig,
) -> (Vec<Option<f64>>, ScaleOutcome) {
    let positive: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|&x| x > 0.0).map(|x| (i, x)))
        .collect();

    if positive.len() < config.min_points {
        return (
            values.to_vec(),
            ScaleOutcome::TooFewPoints {
                positives: positive.len(),
            },
        );
    }

    let logs: Vec<f64> = positive.iter().map(|(_, x)| x.log10()).collect();
    let Some(clusters) = kmeans2(&logs, config.max_iterations) else {
        return (
            values.to_vec(),
            ScaleOutcome::TooFewPoints {
                positives: positive.len(),
            },
        );
    };

    let separation = (clusters.high_center - clusters.low_center).abs();
    if separation < config.separation_log10 {
        return (values.to_vec(), ScaleOutcome::SingleRegime { separation });
    }

    let factor = 10f64.powf(separation);
    let mut out = values.to_vec();
    let mut rescaled = 0;
    for ((i, x), high) in positive.iter().zip(&clusters.high) {
        if !high {
            out[*i] = Some(x * factor);
            rescaled += 1;
        }
    }
    (out, ScaleOutcome::Rescaled { factor, rescaled })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
    }

    #[test]
    fn kmeans_separates_two_magnitudes() {
        let xs = [3.0, 3.1, 6.0, 6.2, 2.9, 6.1];
        let c = kmeans2(&xs, 100).unwrap();
        assert!(close(c.low_center, 3.0));
        assert!(close(c.high_center, 6.1));
        assert_eq!(c.high, vec![false, false, true, true, false, true]);
    }

    #[test]
    fn kmeans_single_value() {
        let c = kmeans2(&[4.0, 4.0, 4.0], 100).unwrap();
        assert_eq!(c.low_center, 4.0);
        assert_eq!(c.high_center, 4.0);
        assert!(c.high.iter().all(|h| !h));
        assert!(kmeans2(&[], 100).is_none());
    }

    #[test]
    fn thousandfold_minority_is_rescaled() {
        // 10 values in kronor, 5 reported in thousands.
        let mut values: Vec<Option<f64>> = (0..10).map(|_| Some(1_000_000.0)).collect();
        values.splice(3..3, (0..5).map(|_| Some(1_000.0)));

        let (out, outcome) = normalize_scale(&values, &ScaleConfig::default());
        let ScaleOutcome::Rescaled { factor, rescaled } = outcome else {
            panic!("expected rescale, got {outcome:?}");
        };
        assert!(close(factor, 1000.0));
        assert_eq!(rescaled, 5);
        for (before, after) in values.iter().zip(&out) {
            assert!(close(after.unwrap(), 1_000_000.0), "{before:?} -> {after:?}");
        }
    }

    #[test]
    fn majority_cluster_is_untouched() {
        let mut values: Vec<Option<f64>> = (0..10)
            .map(|i| Some(1_000_000.0 + 10_000.0 * i as f64))
            .collect();
        values.extend((0..5).map(|i| Some(1_000.0 + 10.0 * i as f64)));

        let (out, outcome) = normalize_scale(&values, &ScaleConfig::default());
        assert!(matches!(outcome, ScaleOutcome::Rescaled { rescaled: 5, .. }));
        assert_eq!(out[..10], values[..10]);
        for v in &out[10..] {
            let v = v.unwrap();
            assert!((900_000.0..1_100_000.0).contains(&v), "{v}");
        }
    }

    #[test]
    fn one_order_of_magnitude_is_one_regime() {
        let values: Vec<Option<f64>> = (1..=15).map(|i| Some(100.0 * i as f64)).collect();
        let (out, outcome) = normalize_scale(&values, &ScaleConfig::default());
        assert!(matches!(outcome, ScaleOutcome::SingleRegime { .. }));
        assert_eq!(out, values);
    }

    #[test]
    fn too_few_positive_points() {
        let mut values: Vec<Option<f64>> = (0..8).map(|_| Some(1_000_000.0)).collect();
        values.extend([Some(0.0), Some(-5.0), None, Some(1.0)]);
        let (out, outcome) = normalize_scale(&values, &ScaleConfig::default());
        assert_eq!(outcome, ScaleOutcome::TooFewPoints { positives: 9 });
        assert_eq!(out, values);
    }

    #[test]
    fn nulls_and_non_positive_pass_through() {
        let mut values: Vec<Option<f64>> = (0..10).map(|_| Some(5_000_000.0)).collect();
        values.extend([Some(5_000.0), Some(5_000.0), None, Some(0.0), Some(-3.0)]);
        let (out, _) = normalize_scale(&values, &ScaleConfig::default());
        assert!(close(out[10].unwrap(), 5_000_000.0));
        assert_eq!(out[12], None);
        assert_eq!(out[13], Some(0.0));
        assert_eq!(out[14], Some(-3.0));
    }
}
