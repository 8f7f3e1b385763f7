use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ReconcileError {
    /// None of the three attempts for the unit could be loaded.
    #[error("no valid report for {company}-{fiscal_year}: all attempts missing or unreadable")]
    NoValidReport { company: String, fiscal_year: i32 },
}
