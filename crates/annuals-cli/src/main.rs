mod config;
mod display;
mod logging;
mod pipeline;

use std::path::{Path, PathBuf};

use annuals_store::{read_parquet, read_table};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use pipeline::RunReport;

#[derive(Parser)]
#[command(
    name = "annuals",
    version,
    about = "Reconcile annual-report extractions and smooth the resulting series"
)]
struct Cli {
    /// TOML file overriding stage parameters.
    #[arg(long, global = true, env = "ANNUALS_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile attempts, then assemble, normalize and smooth.
    Run {
        #[arg(long, env = "ANNUALS_INPUT")]
        input: PathBuf,
        #[arg(long, env = "ANNUALS_SUMMARIES")]
        summaries: PathBuf,
        #[arg(long, env = "ANNUALS_OUTPUT")]
        output: PathBuf,
        /// Also write the scale-adjusted and winsorized tables.
        #[arg(long)]
        intermediate: bool,
    },
    /// Reconcile attempts into per-year summaries only.
    Summarize {
        #[arg(long, env = "ANNUALS_INPUT")]
        input: PathBuf,
        #[arg(long, env = "ANNUALS_SUMMARIES")]
        summaries: PathBuf,
    },
    /// Build the smoothed table from existing summaries.
    Tables {
        #[arg(long, env = "ANNUALS_SUMMARIES")]
        summaries: PathBuf,
        #[arg(long, env = "ANNUALS_OUTPUT")]
        output: PathBuf,
        #[arg(long)]
        intermediate: bool,
    },
    /// Print one company's raw and smoothed series.
    Show {
        #[arg(long)]
        table: PathBuf,
        #[arg(long)]
        company: String,
        #[arg(long)]
        field: Option<String>,
    },
    /// Print the first rows of a table.
    Head {
        #[arg(long)]
        table: PathBuf,
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json);
    info!("annuals v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Run {
            input,
            summaries,
            output,
            intermediate,
        } => {
            let config = config::load(cli.config.as_deref())?;
            let mut report = RunReport::default();
            pipeline::summarize(&input, &summaries, &config, &mut report)?;
            pipeline::tables(&summaries, &output, intermediate, &config, &mut report)?;
            finish(&report, &pipeline::report_path(&output))
        }
        Command::Summarize { input, summaries } => {
            let config = config::load(cli.config.as_deref())?;
            let mut report = RunReport::default();
            pipeline::summarize(&input, &summaries, &config, &mut report)?;
            finish(&report, &summaries.join(pipeline::RUN_REPORT_FILE))
        }
        Command::Tables {
            summaries,
            output,
            intermediate,
        } => {
            let config = config::load(cli.config.as_deref())?;
            let mut report = RunReport::default();
            pipeline::tables(&summaries, &output, intermediate, &config, &mut report)?;
            finish(&report, &pipeline::report_path(&output))
        }
        Command::Show {
            table,
            company,
            field,
        } => {
            let table = read_table(&table)
                .with_context(|| format!("reading {}", table.display()))?;
            display::print_company_card(&table, &company, field.as_deref())
        }
        Command::Head { table, rows } => head(&table, rows),
    }
}

fn finish(report: &RunReport, path: &Path) -> anyhow::Result<()> {
    report.write(path)?;
    info!(
        processed = report.processed.len(),
        flagged = report.flagged(),
        skipped = report.skipped.len(),
        scale_adjustments = report.scale_adjustments.len(),
        report = %path.display(),
        "run complete"
    );
    Ok(())
}

fn head(path: &Path, rows: usize) -> anyhow::Result<()> {
    let batches = read_parquet(path).with_context(|| format!("reading {}", path.display()))?;
    let mut remaining = rows;
    let mut shown = Vec::new();
    for batch in batches {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(batch.num_rows());
        shown.push(batch.slice(0, take));
        remaining -= take;
    }
    arrow::util::pretty::print_batches(&shown)?;
    Ok(())
}
