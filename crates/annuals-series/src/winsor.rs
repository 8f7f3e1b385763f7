//! Median/MAD winsorization of one series.

use annuals_core::WinsorConfig;

use crate::stats::{mad, median, sample_std};

/// The spread estimate a clip band was built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spread {
    Mad(f64),
    /// MAD was zero; the sample standard deviation was used instead.
    StdDev(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Winsorized {
    pub values: Vec<Option<f64>>,
    /// `None` when the series passed through unchanged.
    pub band: Option<(f64, f64)>,
    pub spread: Option<Spread>,
    pub clipped: usize,
}

/// Clip every value to `median ± threshold · MAD`.
///
/// When MAD is zero the sample standard deviation takes its place. Nulls are
/// left alone; a series whose spread is undefined passes through unchanged.
pub fn winsorize(values: &[Option<f64>], config: &WinsorConfig) -> Winsorized {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let unchanged = || Winsorized {
        values: values.to_vec(),
        band: None,
        spread: None,
        clipped: 0,
    };

    let Some(center) = median(&present) else {
        return unchanged();
    };
    let spread = match mad(&present, center) {
        Some(m) if m > 0.0 => Spread::Mad(m),
        _ => match sample_std(&present) {
            Some(s) => Spread::StdDev(s),
            None => return unchanged(),
        },
    };
    let width = match spread {
        Spread::Mad(s) | Spread::StdDev(s) => config.threshold * s,
    };
    let (lo, hi) = (center - width, center + width);

    let mut clipped = 0;
    let out = values
        .iter()
        .map(|v| {
            v.map(|x| {
                let c = x.clamp(lo, hi);
                if c != x {
                    clipped += 1;
                }
                c
            })
        })
        .collect();

    Winsorized {
        values: out,
        band: Some((lo, hi)),
        spread: Some(spread),
        clipped,
    }
}
