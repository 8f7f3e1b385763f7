//! File naming for extraction attempts and year summaries.
//!
//! Attempts live at `{company}-{year}_{attempt}.json` with `attempt` in 1..=3,
//! summaries at `{company}-{year}_summary.json`. Company names are ASCII
//! alphanumeric (e.g. "ASEA", "SKF", "Atlas1"); the year is all digits.

/// Number of independent extraction attempts per report.
pub const ATTEMPTS_PER_REPORT: u8 = 3;

/// Identifies one (company, fiscal year) unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportKey {
    pub company: String,
    pub fiscal_year: i32,
}

impl ReportKey {
    pub fn new(company: impl Into<String>, fiscal_year: i32) -> Self {
        Self {
            company: company.into(),
            fiscal_year,
        }
    }

    /// Same company, another year.
    pub fn with_year(&self, fiscal_year: i32) -> Self {
        Self {
            company: self.company.clone(),
            fiscal_year,
        }
    }
}

impl std::fmt::Display for ReportKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.company, self.fiscal_year)
    }
}

/// `ASEA`, 1954, 2 → `ASEA-1954_2.json`
pub fn attempt_file_name(key: &ReportKey, attempt: u8) -> String {
    format!("{}-{}_{}.json", key.company, key.fiscal_year, attempt)
}

/// `ASEA`, 1954 → `ASEA-1954_summary.json`
pub fn summary_file_name(key: &ReportKey) -> String {
    format!("{}-{}_summary.json", key.company, key.fiscal_year)
}

/// Parse `{company}-{year}_{attempt}.json`. Returns `None` for anything else.
pub fn parse_attempt_file_name(name: &str) -> Option<(ReportKey, u8)> {
    let stem = name.strip_suffix(".json")?;
    let (head, suffix) = stem.rsplit_once('_')?;
    let attempt: u8 = match suffix.as_bytes() {
        [d @ b'1'..=b'3'] => *d - b'0',
        _ => return None,
    };
    let key = parse_company_year(head)?;
    Some((key, attempt))
}

/// Parse `{company}-{year}_summary.json`. Returns `None` for anything else.
pub fn parse_summary_file_name(name: &str) -> Option<ReportKey> {
    let head = name.strip_suffix("_summary.json")?;
    parse_company_year(head)
}

fn parse_company_year(s: &str) -> Option<ReportKey> {
    let (company, year) = s.rsplit_once('-')?;
    if company.is_empty() || !company.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    if year.is_empty() || year.len() > 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let fiscal_year: i32 = year.parse().ok()?;
    Some(ReportKey::new(company, fiscal_year))
}
