//! Storage layer: raw attempts and summary checkpoints as JSON files,
//! company-year tables as Parquet.

mod attempts;
mod error;
mod summaries;
mod tables;

pub use attempts::FsAttemptStore;
pub use error::StoreError;
pub use summaries::{
    UnreadableSummary, read_summaries, read_summary, remove_summary, write_summary,
};
pub use tables::{read_parquet, read_table, write_table};
