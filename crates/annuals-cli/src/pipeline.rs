//! Stage orchestration for one run.
//!
//! Per-unit failures (a year with no readable attempt, a summary that no
//! longer parses) are logged and listed in the [`RunReport`]; only run-level
//! failures such as an unreadable input directory or an unwritable output
//! return an error.

use std::fs;
use std::path::{Path, PathBuf};

use annuals_core::{PipelineConfig, QualityFlag, ReportKey, SchemaMismatch, assemble};
use annuals_reconcile::summarize_year;
use annuals_series::{ScaleAdjustment, process_series};
use annuals_store::{
    FsAttemptStore, read_summaries, remove_summary, write_summary, write_table,
};
use anyhow::Context;
use serde::Serialize;
use tracing::{error, info, warn};

pub const RUN_REPORT_FILE: &str = "run_report.json";
pub const SCALE_ADJUSTED_FILE: &str = "scale_adjusted.parquet";
pub const WINSORIZED_FILE: &str = "winsorized.parquet";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedUnit {
    pub company: String,
    pub fiscal_year: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<QualityFlag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedUnit {
    /// `{company}-{year}` or the path of the file that was skipped.
    pub unit: String,
    pub reason: String,
}

/// Everything a run did besides producing its artifacts.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub processed: Vec<ProcessedUnit>,
    pub skipped: Vec<SkippedUnit>,
    pub schema_mismatch: Option<SchemaMismatch>,
    pub scale_adjustments: Vec<ScaleAdjustment>,
    pub outputs: Vec<PathBuf>,
}

impl RunReport {
    pub fn flagged(&self) -> usize {
        self.processed.iter().filter(|u| !u.flags.is_empty()).count()
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        fs::write(path, body).with_context(|| format!("writing {}", path.display()))
    }
}

// ── Stages ──

/// Stages 1–2: reconcile every discovered report into the summary checkpoint.
pub fn summarize(
    input: &Path,
    summaries: &Path,
    config: &PipelineConfig,
    report: &mut RunReport,
) -> anyhow::Result<()> {
    let store = FsAttemptStore::open(input)
        .with_context(|| format!("opening input directory {}", input.display()))?;
    let keys = store.discover().context("scanning input directory")?;

    for key in &keys {
        match summarize_year(&store, key, &config.reconcile) {
            Ok(outcome) => {
                write_summary(summaries, &outcome.summary)
                    .with_context(|| format!("writing summary for {key}"))?;
                report.processed.push(ProcessedUnit {
                    company: key.company.clone(),
                    fiscal_year: key.fiscal_year,
                    flags: outcome.flags,
                });
            }
            Err(e) => {
                error!(report = %key, error = %e, "skipping report");
                // A checkpoint from an earlier run must not bring the year back.
                if remove_summary(summaries, key)
                    .with_context(|| format!("removing stale summary for {key}"))?
                {
                    warn!(report = %key, "removed stale summary");
                }
                report.skipped.push(skipped(key, e.to_string()));
            }
        }
    }

    info!(
        reports = keys.len(),
        summarised = report.processed.len(),
        flagged = report.flagged(),
        skipped = report.skipped.len(),
        "summaries written"
    );
    Ok(())
}

/// Stages 3–6: assemble the checkpoint into a table, then scale, winsorize
/// and smooth it. Writes the final table to `output`, and the intermediate
/// tables next to it when `intermediate` is set.
pub fn tables(
    summaries: &Path,
    output: &Path,
    intermediate: bool,
    config: &PipelineConfig,
    report: &mut RunReport,
) -> anyhow::Result<()> {
    let (read, unreadable) = read_summaries(summaries)
        .with_context(|| format!("reading summaries from {}", summaries.display()))?;
    for u in unreadable {
        report.skipped.push(SkippedUnit {
            unit: u.path.display().to_string(),
            reason: u.reason,
        });
    }

    let assembled = assemble(&read).context("assembling summaries")?;
    report.schema_mismatch = assembled.mismatch;

    let series = process_series(&assembled.table, config).context("smoothing series")?;
    report.scale_adjustments = series.adjustments;

    if intermediate {
        let dir = output.parent().unwrap_or(Path::new(""));
        for (name, table) in [
            (SCALE_ADJUSTED_FILE, &series.scale_adjusted),
            (WINSORIZED_FILE, &series.winsorized),
        ] {
            let path = dir.join(name);
            write_table(&path, table).with_context(|| format!("writing {}", path.display()))?;
            report.outputs.push(path);
        }
    }
    write_table(output, &series.smoothed)
        .with_context(|| format!("writing {}", output.display()))?;
    report.outputs.push(output.to_path_buf());
    Ok(())
}

/// Where the run report for a table written to `output` goes.
pub fn report_path(output: &Path) -> PathBuf {
    output
        .parent()
        .unwrap_or(Path::new(""))
        .join(RUN_REPORT_FILE)
}

fn skipped(key: &ReportKey, reason: String) -> SkippedUnit {
    SkippedUnit {
        unit: key.to_string(),
        reason,
    }
}
