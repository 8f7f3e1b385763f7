//! Memoised raw-attempt loading for the years around a summarised report.

use std::cell::RefCell;
use std::collections::BTreeMap;

use annuals_core::{AttemptSet, AttemptSource, FieldKey, ReportKey};

use crate::field::AdjacentLookup;

/// Adjacent years of one company, loaded from raw attempts on first use.
///
/// Each year is read at most once however many fields consult it, and never
/// from summaries, so smoothing one year cannot feed on an already smoothed
/// neighbour.
pub struct AdjacentYears<'a, S: AttemptSource + ?Sized> {
    source: &'a S,
    key: ReportKey,
    loaded: RefCell<BTreeMap<i32, AttemptSet>>,
}

impl<'a, S: AttemptSource + ?Sized> AdjacentYears<'a, S> {
    pub fn new(source: &'a S, key: ReportKey) -> Self {
        Self {
            source,
            key,
            loaded: RefCell::new(BTreeMap::new()),
        }
    }

    fn with_year<R>(&self, fiscal_year: i32, f: impl FnOnce(&AttemptSet) -> R) -> R {
        let mut loaded = self.loaded.borrow_mut();
        let set = loaded
            .entry(fiscal_year)
            .or_insert_with(|| self.source.load(&self.key.with_year(fiscal_year)));
        f(set)
    }

    /// Years loaded so far.
    pub fn loaded_years(&self) -> Vec<i32> {
        self.loaded.borrow().keys().copied().collect()
    }
}

impl<S: AttemptSource + ?Sized> AdjacentLookup for AdjacentYears<'_, S> {
    fn has_data(&self, fiscal_year: i32) -> bool {
        self.with_year(fiscal_year, |set| !set.is_empty())
    }

    fn values(&self, fiscal_year: i32, key: &FieldKey) -> Vec<f64> {
        self.with_year(fiscal_year, |set| {
            set.values(key).into_iter().flatten().collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use annuals_core::{ExtractionAttempt, FieldGroup, MemorySource};

    use super::*;

    struct Counting {
        inner: MemorySource,
        loads: Cell<usize>,
    }

    impl AttemptSource for Counting {
        fn load(&self, key: &ReportKey) -> AttemptSet {
            self.loads.set(self.loads.get() + 1);
            self.inner.load(key)
        }
    }

    fn attempt(revenue: f64) -> ExtractionAttempt {
        serde_json::from_value(serde_json::json!({"income_statement": {"revenue": revenue}}))
            .unwrap()
    }

    #[test]
    fn pools_every_attempt_and_loads_once() {
        let key = ReportKey::new("Bofors", 1940);
        let mut inner = MemorySource::new();
        inner.insert(key.with_year(1941), 1, attempt(10.0));
        inner.insert(key.with_year(1941), 3, attempt(12.0));
        let src = Counting {
            inner,
            loads: Cell::new(0),
        };

        let adjacent = AdjacentYears::new(&src, key);
        let revenue = FieldKey::new(FieldGroup::IncomeStatement, "revenue");
        assert!(adjacent.has_data(1941));
        assert!(!adjacent.has_data(1939));
        assert_eq!(adjacent.values(1941, &revenue), vec![10.0, 12.0]);
        assert_eq!(adjacent.values(1941, &revenue), vec![10.0, 12.0]);
        assert_eq!(src.loads.get(), 2);
        assert_eq!(adjacent.loaded_years(), vec![1939, 1941]);
    }
}
