//! The reconciliation checkpoint: one pretty-printed JSON file per summary.

use std::fs;
use std::path::{Path, PathBuf};

use annuals_core::{ReportKey, YearSummary};
use annuals_core::naming::{parse_summary_file_name, summary_file_name};
use tracing::{info, warn};

use crate::error::StoreError;

/// A summary file that could not be read back.
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadableSummary {
    pub path: PathBuf,
    pub reason: String,
}

/// Write `summary` to `{dir}/{company}-{year}_summary.json`, creating `dir`.
pub fn write_summary(dir: &Path, summary: &YearSummary) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
    let key = ReportKey::new(summary.company_name.clone(), summary.fiscal_year);
    let path = dir.join(summary_file_name(&key));
    let mut body = serde_json::to_string_pretty(summary).map_err(|e| StoreError::json(&path, e))?;
    body.push('\n');
    fs::write(&path, body).map_err(|e| StoreError::io(&path, e))?;
    Ok(path)
}

/// Delete the checkpoint for `key`, if one exists. Returns whether a file
/// was removed.
pub fn remove_summary(dir: &Path, key: &ReportKey) -> Result<bool, StoreError> {
    let path = dir.join(summary_file_name(key));
    match fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::io(&path, e)),
    }
}

pub fn read_summary(path: &Path) -> Result<YearSummary, StoreError> {
    let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| StoreError::json(path, e))
}

/// Read every summary in `dir`, sorted by (company, year).
///
/// Identity is taken from the file name, not the file body. Files that fail
/// to parse are returned separately instead of failing the whole read.
pub fn read_summaries(
    dir: &Path,
) -> Result<(Vec<YearSummary>, Vec<UnreadableSummary>), StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::DirectoryNotFound(dir.to_path_buf()));
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))? {
        let entry = entry.map_err(|e| StoreError::io(dir, e))?;
        if let Some(key) = entry.file_name().to_str().and_then(parse_summary_file_name) {
            found.push((key, entry.path()));
        }
    }
    found.sort();

    let mut summaries = Vec::with_capacity(found.len());
    let mut unreadable = Vec::new();
    for (key, path) in found {
        match read_summary(&path) {
            Ok(mut s) => {
                s.company_name = key.company;
                s.fiscal_year = key.fiscal_year;
                summaries.push(s);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable summary");
                unreadable.push(UnreadableSummary {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }
    info!(
        count = summaries.len(),
        unreadable = unreadable.len(),
        "read summaries"
    );
    Ok((summaries, unreadable))
}
