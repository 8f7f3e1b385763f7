//! Lookup of raw extraction attempts by (company, fiscal year).
//!
//! The reconciler only ever sees attempts through [`AttemptSource`], both for
//! the year being summarised and for the adjacent years it pools when the
//! attempts disagree. Implementations must be side-effect free; a failed load
//! is an absent attempt, never an error.

use std::collections::BTreeMap;

use crate::naming::{ATTEMPTS_PER_REPORT, ReportKey};
use crate::report::{ExtractionAttempt, FieldKey};

#[derive(Debug, Clone, PartialEq)]
pub enum MissingReason {
    NotFound,
    Unreadable(String),
}

/// An attempt slot that could not be filled.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingAttempt {
    pub attempt: u8,
    pub reason: MissingReason,
}

/// Up to three attempts for one report, indexed 1..=3.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptSet {
    pub key: ReportKey,
    slots: [Option<ExtractionAttempt>; ATTEMPTS_PER_REPORT as usize],
    missing: Vec<MissingAttempt>,
}

impl AttemptSet {
    pub fn new(key: ReportKey) -> Self {
        Self {
            key,
            slots: Default::default(),
            missing: Vec::new(),
        }
    }

    /// Fill slot `attempt` (1-based). Out-of-range indexes are ignored.
    pub fn insert(&mut self, attempt: u8, value: ExtractionAttempt) {
        if let Some(slot) = slot_index(attempt).and_then(|i| self.slots.get_mut(i)) {
            *slot = Some(value);
        }
    }

    pub fn mark_missing(&mut self, attempt: u8, reason: MissingReason) {
        self.missing.push(MissingAttempt { attempt, reason });
    }

    pub fn get(&self, attempt: u8) -> Option<&ExtractionAttempt> {
        slot_index(attempt)
            .and_then(|i| self.slots.get(i))
            .and_then(|s| s.as_ref())
    }

    /// Loaded attempts with their 1-based index, in index order.
    pub fn available(&self) -> impl Iterator<Item = (u8, &ExtractionAttempt)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|a| (i as u8 + 1, a)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// 1-based indexes of the slots that are empty.
    pub fn absent(&self) -> Vec<u8> {
        (1..=ATTEMPTS_PER_REPORT)
            .filter(|&i| self.get(i).is_none())
            .collect()
    }

    /// Why each absent slot is absent, as recorded by the loader.
    pub fn missing(&self) -> &[MissingAttempt] {
        &self.missing
    }

    /// The attempt whose non-numeric fields are taken as ground truth:
    /// attempt 1 if loaded, otherwise the first loaded one.
    pub fn primary(&self) -> Option<(u8, &ExtractionAttempt)> {
        self.available().next()
    }

    /// Values of `key` from every attempt that has the key.
    pub fn values(&self, key: &FieldKey) -> Vec<Option<f64>> {
        self.available()
            .filter(|(_, a)| a.has_key(key))
            .map(|(_, a)| a.value(key))
            .collect()
    }
}

fn slot_index(attempt: u8) -> Option<usize> {
    (1..=ATTEMPTS_PER_REPORT)
        .contains(&attempt)
        .then(|| attempt as usize - 1)
}

/// Load the raw attempts of one report.
pub trait AttemptSource {
    fn load(&self, key: &ReportKey) -> AttemptSet;
}

/// Attempts held in memory, keyed by report and attempt index.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    attempts: BTreeMap<(ReportKey, u8), ExtractionAttempt>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ReportKey, attempt: u8, value: ExtractionAttempt) {
        self.attempts.insert((key, attempt), value);
    }

    /// Every report with at least one attempt, in key order.
    pub fn keys(&self) -> Vec<ReportKey> {
        let mut keys: Vec<ReportKey> = self.attempts.keys().map(|(k, _)| k.clone()).collect();
        keys.dedup();
        keys
    }
}

impl AttemptSource for MemorySource {
    fn load(&self, key: &ReportKey) -> AttemptSet {
        let mut set = AttemptSet::new(key.clone());
        for i in 1..=ATTEMPTS_PER_REPORT {
            match self.attempts.get(&(key.clone(), i)) {
                Some(a) => set.insert(i, a.clone()),
                None => set.mark_missing(i, MissingReason::NotFound),
            }
        }
        set
    }
}
