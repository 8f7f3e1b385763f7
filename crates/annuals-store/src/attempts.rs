//! Raw extraction attempts on disk, one JSON file per attempt.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use annuals_core::naming::{ATTEMPTS_PER_REPORT, attempt_file_name, parse_attempt_file_name};
use annuals_core::{AttemptSet, AttemptSource, ExtractionAttempt, MissingReason, ReportKey};
use tracing::{debug, info, warn};

use crate::error::StoreError;

/// A flat directory of `{company}-{year}_{attempt}.json` files.
#[derive(Debug, Clone)]
pub struct FsAttemptStore {
    dir: PathBuf,
}

impl FsAttemptStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(StoreError::DirectoryNotFound(dir));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn attempt_path(&self, key: &ReportKey, attempt: u8) -> PathBuf {
        self.dir.join(attempt_file_name(key, attempt))
    }

    /// Every (company, year) with at least one attempt file, sorted.
    pub fn discover(&self) -> Result<Vec<ReportKey>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut keys = BTreeSet::new();
        let mut ignored = 0usize;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let name = entry.file_name();
            match name.to_str().and_then(parse_attempt_file_name) {
                Some((key, _)) => {
                    keys.insert(key);
                }
                None => {
                    debug!(file = ?name, "ignoring non-attempt file");
                    ignored += 1;
                }
            }
        }
        info!(
            reports = keys.len(),
            ignored,
            dir = %self.dir.display(),
            "discovered attempts"
        );
        Ok(keys.into_iter().collect())
    }
}

fn read_attempt(path: &Path) -> Result<ExtractionAttempt, StoreError> {
    let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| StoreError::json(path, e))
}

impl AttemptSource for FsAttemptStore {
    /// Absent files and unparseable JSON become missing slots; never fails.
    fn load(&self, key: &ReportKey) -> AttemptSet {
        let mut set = AttemptSet::new(key.clone());
        for attempt in 1..=ATTEMPTS_PER_REPORT {
            let path = self.attempt_path(key, attempt);
            match read_attempt(&path) {
                Ok(a) => set.insert(attempt, a),
                Err(StoreError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                    debug!(report = %key, attempt, "attempt not found");
                    set.mark_missing(attempt, MissingReason::NotFound);
                }
                Err(e) => {
                    warn!(report = %key, attempt, error = %e, "unreadable attempt");
                    set.mark_missing(attempt, MissingReason::Unreadable(e.to_string()));
                }
            }
        }
        set
    }
}
