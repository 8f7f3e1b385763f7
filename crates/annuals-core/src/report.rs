//! Extraction attempts and reconciled year summaries.
//!
//! An [`ExtractionAttempt`] is one structured reading of a scanned annual
//! report. Three attempts per (company, fiscal year) are reconciled into a
//! single [`YearSummary`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// The numeric groups of a report, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    IncomeStatement,
    BalanceSheet,
    Employees,
}

impl FieldGroup {
    pub const ALL: [FieldGroup; 3] = [
        FieldGroup::IncomeStatement,
        FieldGroup::BalanceSheet,
        FieldGroup::Employees,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncomeStatement => "income_statement",
            Self::BalanceSheet => "balance_sheet",
            Self::Employees => "employees",
        }
    }
}

/// Path to one scalar field, e.g. `income_statement.revenue`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    pub group: FieldGroup,
    pub name: String,
}

impl FieldKey {
    pub fn new(group: FieldGroup, name: impl Into<String>) -> Self {
        Self {
            group,
            name: name.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group.as_str(), self.name)
    }
}

/// Field name → optional value for one numeric group.
///
/// Deserialization is lenient: numbers are kept, numeric strings such as
/// `"1 234 500"` or `"12,000"` are parsed, and anything else (including a
/// decimal comma such as `"12,5"`) becomes null.
/// A `null` group reads as an empty group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NumericGroup(pub BTreeMap<String, Option<f64>>);

impl NumericGroup {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied().flatten()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Option<f64>)> for NumericGroup {
    fn from_iter<I: IntoIterator<Item = (String, Option<f64>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for NumericGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
        let values = raw
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| {
                let parsed = lenient_number(&value);
                if parsed.is_none() && !value.is_null() {
                    debug!(field = %name, value = %value, "non-numeric value read as null");
                }
                (name, parsed)
            })
            .collect();
        Ok(Self(values))
    }
}

/// Interpret a JSON value as a finite number, if it plausibly is one.
pub fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let spaced: String = s
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '\u{2009}')
                .collect();
            let cleaned = strip_thousands_commas(&spaced)?;
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// `"12,000.5"` → `"12000.5"`. A comma not followed by exactly three digits
/// (a decimal comma such as `"12,5"`) makes the value unreadable.
fn strip_thousands_commas(s: &str) -> Option<String> {
    let mut parts = s.split(',');
    let mut out = parts.next()?.to_string();
    for part in parts {
        let digits = part.find('.').map_or(part, |i| &part[..i]);
        let grouped = digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit());
        if out.contains('.') || !grouped {
            return None;
        }
        out.push_str(part);
    }
    Some(out)
}

/// A board member as listed in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardMember {
    pub surname: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub initials: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

/// An auditor as listed in the report, typically after the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auditor {
    pub surname: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub initials: Option<String>,
    #[serde(default)]
    pub auditing_firm: Option<String>,
}

/// One structured extraction of a single report document.
///
/// Every member is optional; the extractor leaves out whatever it could not read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionAttempt {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub fiscal_year: Option<i32>,
    #[serde(default)]
    pub income_statement: NumericGroup,
    #[serde(default)]
    pub balance_sheet: NumericGroup,
    #[serde(default)]
    pub employees: NumericGroup,
    #[serde(default)]
    pub board: Option<Vec<BoardMember>>,
    #[serde(default)]
    pub auditors: Option<Vec<Auditor>>,
    #[serde(default)]
    pub additional_notes: Option<String>,
}

impl ExtractionAttempt {
    pub fn group(&self, group: FieldGroup) -> &NumericGroup {
        match group {
            FieldGroup::IncomeStatement => &self.income_statement,
            FieldGroup::BalanceSheet => &self.balance_sheet,
            FieldGroup::Employees => &self.employees,
        }
    }

    /// Value of a field, `None` if the key is absent or the value is null.
    pub fn value(&self, key: &FieldKey) -> Option<f64> {
        self.group(key.group).get(&key.name)
    }

    /// Whether the field key appears in this attempt (even with a null value).
    pub fn has_key(&self, key: &FieldKey) -> bool {
        self.group(key.group).contains(&key.name)
    }

    /// All numeric field keys in group order, then name order.
    pub fn field_keys(&self) -> Vec<FieldKey> {
        FieldGroup::ALL
            .iter()
            .flat_map(|&g| self.group(g).names().map(move |n| FieldKey::new(g, n)))
            .collect()
    }
}

/// One reconciled record per (company, fiscal year).
///
/// Persisted as `{company}-{year}_summary.json`. Numeric groups hold a
/// (possibly null) entry for every key in the primary attempt; board,
/// auditors and notes are copied from the primary attempt unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub company_name: String,
    pub fiscal_year: i32,
    #[serde(default)]
    pub additional_notes: Option<String>,
    #[serde(default)]
    pub income_statement: NumericGroup,
    #[serde(default)]
    pub balance_sheet: NumericGroup,
    #[serde(default)]
    pub employees: NumericGroup,
    #[serde(default)]
    pub board: Option<Vec<BoardMember>>,
    #[serde(default)]
    pub auditors: Option<Vec<Auditor>>,
}

impl YearSummary {
    pub fn group(&self, group: FieldGroup) -> &NumericGroup {
        match group {
            FieldGroup::IncomeStatement => &self.income_statement,
            FieldGroup::BalanceSheet => &self.balance_sheet,
            FieldGroup::Employees => &self.employees,
        }
    }

    /// Every numeric entry as `(key, value)` in group order.
    pub fn values(&self) -> impl Iterator<Item = (FieldKey, Option<f64>)> + '_ {
        FieldGroup::ALL.into_iter().flat_map(move |g| {
            self.group(g)
                .iter()
                .map(move |(name, v)| (FieldKey::new(g, name), v))
        })
    }
}
