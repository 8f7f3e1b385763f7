//! Quality flags raised during reconciliation.
//!
//! None of these stop a unit from being processed; they are recorded next to
//! the result so a run report can list every value that was reconciled on
//! weaker evidence than three agreeing attempts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityFlag {
    /// One or two attempts were absent or unreadable.
    MissingAttempts { attempts: Vec<u8> },
    /// Attempts disagreed and no adjacent-year data was found; the plain
    /// mean of the attempts was kept unsmoothed.
    NoAdjacentData { field: String, discrepancy: f64 },
    /// Attempts disagreed and none was close to the adjacent-year mean; the
    /// plain mean of the attempts was kept.
    NoneNearAdjacent {
        field: String,
        discrepancy: f64,
        adjacent_mean: f64,
    },
}

impl QualityFlag {
    /// The field the flag concerns, if it is field-level.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingAttempts { .. } => None,
            Self::NoAdjacentData { field, .. } | Self::NoneNearAdjacent { field, .. } => {
                Some(field)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let flag = QualityFlag::NoAdjacentData {
            field: "income_statement.revenue".into(),
            discrepancy: 2.25,
        };
        let json = serde_json::to_string(&flag).unwrap();
        assert!(json.contains(r#""kind":"no_adjacent_data""#));
        assert_eq!(flag.field(), Some("income_statement.revenue"));
        assert_eq!(QualityFlag::MissingAttempts { attempts: vec![2] }.field(), None);
    }
}
