//! One [`YearSummary`] per (company, fiscal year).

use annuals_core::{
    AttemptSet, AttemptSource, FieldGroup, FieldKey, QualityFlag, ReconcileConfig, ReportKey,
    YearSummary, report::NumericGroup,
};
use tracing::{debug, warn};

use crate::adjacent::AdjacentYears;
use crate::error::ReconcileError;
use crate::field::{AdjacentLookup, reconcile_field};

/// A summary together with the quality flags raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct YearOutcome {
    pub summary: YearSummary,
    pub flags: Vec<QualityFlag>,
}

/// Load the attempts of `key` from `source` and reconcile them, consulting
/// the raw attempts of adjacent years when a field's attempts disagree.
pub fn summarize_year<S: AttemptSource + ?Sized>(
    source: &S,
    key: &ReportKey,
    config: &ReconcileConfig,
) -> Result<YearOutcome, ReconcileError> {
    let attempts = source.load(key);
    let adjacent = AdjacentYears::new(source, key.clone());
    summarize_attempts(&attempts, &adjacent, config)
}

/// Reconcile already loaded attempts.
///
/// Every numeric key of the primary attempt gets an entry in the summary,
/// null if no attempt had a value. Board, auditors and notes are copied from
/// the primary attempt as they are. Identity comes from the lookup key.
pub fn summarize_attempts(
    attempts: &AttemptSet,
    adjacent: &dyn AdjacentLookup,
    config: &ReconcileConfig,
) -> Result<YearOutcome, ReconcileError> {
    let key = &attempts.key;
    let Some((primary_index, primary)) = attempts.primary() else {
        return Err(ReconcileError::NoValidReport {
            company: key.company.clone(),
            fiscal_year: key.fiscal_year,
        });
    };

    let mut flags = Vec::new();
    let absent = attempts.absent();
    if !absent.is_empty() {
        warn!(
            company = %key.company,
            fiscal_year = key.fiscal_year,
            attempts = ?absent,
            "reconciling from partial attempts"
        );
        flags.push(QualityFlag::MissingAttempts { attempts: absent });
    }

    let mut reconcile_group = |group: FieldGroup| -> NumericGroup {
        primary
            .group(group)
            .names()
            .map(|name| {
                let field = FieldKey::new(group, name);
                let r = reconcile_field(
                    &field,
                    &attempts.values(&field),
                    key.fiscal_year,
                    adjacent,
                    config,
                );
                if let Some(flag) = r.flag(&field) {
                    flags.push(flag);
                }
                (name.to_string(), r.value)
            })
            .collect()
    };

    let summary = YearSummary {
        company_name: key.company.clone(),
        fiscal_year: key.fiscal_year,
        additional_notes: primary.additional_notes.clone(),
        income_statement: reconcile_group(FieldGroup::IncomeStatement),
        balance_sheet: reconcile_group(FieldGroup::BalanceSheet),
        employees: reconcile_group(FieldGroup::Employees),
        board: primary.board.clone(),
        auditors: primary.auditors.clone(),
    };

    debug!(
        company = %key.company,
        fiscal_year = key.fiscal_year,
        primary = primary_index,
        flags = flags.len(),
        "summarised"
    );
    Ok(YearOutcome { summary, flags })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use annuals_core::{ExtractionAttempt, MemorySource};
    use serde_json::json;

    use super::*;

    fn attempt(value: serde_json::Value) -> ExtractionAttempt {
        serde_json::from_value(value).unwrap()
    }

    fn revenue_attempt(revenue: f64) -> ExtractionAttempt {
        attempt(json!({"income_statement": {"revenue": revenue}}))
    }

    fn config() -> ReconcileConfig {
        ReconcileConfig::default()
    }

    #[test]
    fn every_primary_key_has_an_entry() {
        let key = ReportKey::new("Atlas", 1925);
        let mut src = MemorySource::new();
        src.insert(
            key.clone(),
            1,
            attempt(json!({
                "company_name": "Atlas Diesel",
                "fiscal_year": 1952,
                "income_statement": {"revenue": 1000, "net_income": null},
                "balance_sheet": {"total_assets": 5000},
                "employees": {"n_employees": 300},
                "board": [{"surname": "Wenström", "position": "VD"}],
                "additional_notes": "kronor"
            })),
        );
        src.insert(
            key.clone(),
            2,
            attempt(json!({
                "income_statement": {"revenue": 1010, "depreciation": 7},
                "balance_sheet": {"total_assets": 5050}
            })),
        );
        src.insert(
            key.clone(),
            3,
            attempt(json!({"income_statement": {"revenue": 990}})),
        );

        let out = summarize_year(&src, &key, &config()).unwrap();
        let s = &out.summary;
        assert_eq!(s.company_name, "Atlas");
        assert_eq!(s.fiscal_year, 1925);
        assert_eq!(s.income_statement.get("revenue"), Some(1000.0));
        assert!(s.income_statement.contains("net_income"));
        assert_eq!(s.income_statement.get("net_income"), None);
        assert!(!s.income_statement.contains("depreciation"));
        assert_eq!(s.balance_sheet.get("total_assets"), Some(5025.0));
        assert_eq!(s.employees.get("n_employees"), Some(300.0));
        assert_eq!(s.board.as_ref().unwrap()[0].surname, "Wenström");
        assert_eq!(s.additional_notes.as_deref(), Some("kronor"));
        assert!(out.flags.is_empty());
    }

    #[test]
    fn later_attempt_becomes_primary() {
        let key = ReportKey::new("Atlas", 1925);
        let mut src = MemorySource::new();
        src.insert(
            key.clone(),
            2,
            attempt(json!({
                "income_statement": {"revenue": 100},
                "auditors": [{"surname": "Lind", "auditing_firm": "Revisionsbyrå"}]
            })),
        );
        src.insert(key.clone(), 3, revenue_attempt(104.0));

        let out = summarize_year(&src, &key, &config()).unwrap();
        assert_eq!(out.summary.income_statement.get("revenue"), Some(102.0));
        assert_eq!(
            out.summary.auditors.as_ref().unwrap()[0]
                .auditing_firm
                .as_deref(),
            Some("Revisionsbyrå")
        );
        assert_eq!(
            out.flags,
            vec![QualityFlag::MissingAttempts { attempts: vec![1] }]
        );
    }

    #[test]
    fn no_attempts_is_no_valid_report() {
        let src = MemorySource::new();
        let err = summarize_year(&src, &ReportKey::new("Atlas", 1925), &config()).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::NoValidReport {
                company: "Atlas".into(),
                fiscal_year: 1925
            }
        );
    }

    #[test]
    fn disagreement_is_resolved_from_raw_adjacent_attempts() {
        let key = ReportKey::new("Sandvik", 1930);
        let mut src = MemorySource::new();
        for (i, v) in [(1, 100.0), (2, 100.0), (3, 1000.0)] {
            src.insert(key.clone(), i, revenue_attempt(v));
        }
        src.insert(key.with_year(1929), 1, revenue_attempt(98.0));
        src.insert(key.with_year(1931), 2, revenue_attempt(103.0));

        let out = summarize_year(&src, &key, &config()).unwrap();
        assert_eq!(out.summary.income_statement.get("revenue"), Some(100.0));
        assert!(out.flags.is_empty());
    }

    #[test]
    fn unresolved_disagreement_is_flagged() {
        let key = ReportKey::new("Sandvik", 1930);
        let mut src = MemorySource::new();
        for (i, v) in [(1, 100.0), (2, 100.0), (3, 1000.0)] {
            src.insert(key.clone(), i, revenue_attempt(v));
        }
        let out = summarize_year(&src, &key, &config()).unwrap();
        assert_eq!(out.summary.income_statement.get("revenue"), Some(400.0));
        assert_eq!(
            out.flags,
            vec![QualityFlag::NoAdjacentData {
                field: "income_statement.revenue".into(),
                discrepancy: 2.25
            }]
        );
    }

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

    #[test]
    fn adjacent_years_are_loaded_once_per_summary() {
        let key = ReportKey::new("Sandvik", 1930);
        let mut inner = MemorySource::new();
        for (i, v) in [(1, 1.0), (2, 1.0), (3, 10.0)] {
            inner.insert(
                key.clone(),
                i,
                attempt(json!({
                    "income_statement": {"revenue": v, "net_income": v},
                    "balance_sheet": {"total_assets": v}
                })),
            );
        }
        inner.insert(key.with_year(1929), 1, revenue_attempt(1.0));
        inner.insert(key.with_year(1931), 1, revenue_attempt(1.0));
        let src = Counting {
            inner,
            loads: Cell::new(0),
        };

        summarize_year(&src, &key, &config()).unwrap();
        // The year itself plus 1929 and 1931, despite three disagreeing fields.
        assert_eq!(src.loads.get(), 3);
    }
}
