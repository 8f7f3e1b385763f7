//! Which adjacent years to pool when a field's attempts disagree.
//!
//! The search is an ordered list of candidate windows. Each candidate names
//! the year offsets that must have data (its anchors) and the offsets to pool
//! when they do. The first candidate whose anchors all have data wins:
//!
//! | anchors   | pooled (`WidenOneSided`) | pooled (`NearestOnly`) |
//! |-----------|--------------------------|------------------------|
//! | −1, +1    | −1, +1                   | −1, +1                 |
//! | +1        | +1, +2                   | +1                     |
//! | −1        | −1, −2                   | −1                     |
//!
//! A year "has data" when at least one of its attempts loads.

use annuals_core::AdjacentPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub anchors: &'static [i32],
    pub pooled: &'static [i32],
}

const WIDEN_ONE_SIDED: &[Candidate] = &[
    Candidate {
        anchors: &[-1, 1],
        pooled: &[-1, 1],
    },
    Candidate {
        anchors: &[1],
        pooled: &[1, 2],
    },
    Candidate {
        anchors: &[-1],
        pooled: &[-1, -2],
    },
];

const NEAREST_ONLY: &[Candidate] = &[
    Candidate {
        anchors: &[-1, 1],
        pooled: &[-1, 1],
    },
    Candidate {
        anchors: &[1],
        pooled: &[1],
    },
    Candidate {
        anchors: &[-1],
        pooled: &[-1],
    },
];

/// The candidate windows for a policy, in the order they are tried.
pub fn candidates(policy: AdjacentPolicy) -> &'static [Candidate] {
    match policy {
        AdjacentPolicy::WidenOneSided => WIDEN_ONE_SIDED,
        AdjacentPolicy::NearestOnly => NEAREST_ONLY,
    }
}

/// Years to pool around `year`, or `None` if neither neighbour has data.
pub fn select_window(
    year: i32,
    policy: AdjacentPolicy,
    mut has_data: impl FnMut(i32) -> bool,
) -> Option<Vec<i32>> {
    candidates(policy)
        .iter()
        .find(|c| c.anchors.iter().all(|&off| has_data(year + off)))
        .map(|c| c.pooled.iter().map(|&off| year + off).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_years(years: &[i32]) -> impl FnMut(i32) -> bool + '_ {
        move |y| years.contains(&y)
    }

    #[test]
    fn both_neighbours_present() {
        let w = select_window(1950, AdjacentPolicy::WidenOneSided, with_years(&[1949, 1951]));
        assert_eq!(w, Some(vec![1949, 1951]));
    }

    #[test]
    fn first_year_widens_forward() {
        let w = select_window(
            1950,
            AdjacentPolicy::WidenOneSided,
            with_years(&[1951, 1952]),
        );
        assert_eq!(w, Some(vec![1951, 1952]));
    }

    #[test]
    fn last_year_widens_backward() {
        let w = select_window(
            1950,
            AdjacentPolicy::WidenOneSided,
            with_years(&[1948, 1949]),
        );
        assert_eq!(w, Some(vec![1949, 1948]));
    }

    #[test]
    fn widening_does_not_require_second_year() {
        // year+2 may itself be empty; it is pooled anyway and contributes nothing.
        let w = select_window(1950, AdjacentPolicy::WidenOneSided, with_years(&[1951]));
        assert_eq!(w, Some(vec![1951, 1952]));
    }

    #[test]
    fn nearest_only_uses_single_year() {
        let w = select_window(1950, AdjacentPolicy::NearestOnly, with_years(&[1951, 1952]));
        assert_eq!(w, Some(vec![1951]));
        let w = select_window(1950, AdjacentPolicy::NearestOnly, with_years(&[1949]));
        assert_eq!(w, Some(vec![1949]));
    }

    #[test]
    fn gap_of_one_year_is_not_bridged() {
        // Only year±2 present: no anchor matches.
        let w = select_window(
            1950,
            AdjacentPolicy::WidenOneSided,
            with_years(&[1948, 1952]),
        );
        assert_eq!(w, None);
    }

    #[test]
    fn isolated_year_has_no_window() {
        assert_eq!(
            select_window(1950, AdjacentPolicy::WidenOneSided, with_years(&[])),
            None
        );
    }

    #[test]
    fn candidate_order_is_symmetric_first() {
        let c = candidates(AdjacentPolicy::WidenOneSided);
        assert_eq!(c.len(), 3);
        assert_eq!(c[0].anchors, &[-1, 1]);
    }
}
