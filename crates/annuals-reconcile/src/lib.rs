//! Reconciliation of three extraction attempts into one summary per company-year.
//!
//! [`field::reconcile_field`] settles a single numeric field, falling back to
//! adjacent years when the attempts disagree; [`summarize::summarize_year`]
//! runs it over every numeric field of a report.

pub mod adjacent;
mod error;
pub mod field;
pub mod summarize;
pub mod window;

pub use adjacent::AdjacentYears;
pub use error::ReconcileError;
pub use field::{AdjacentLookup, Outcome, Reconciled, reconcile_field};
pub use summarize::{YearOutcome, summarize_attempts, summarize_year};
pub use window::select_window;
