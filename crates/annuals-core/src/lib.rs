pub mod assemble;
pub mod config;
mod error;
pub mod naming;
pub mod quality;
pub mod report;
pub mod schema;
pub mod source;
pub mod table;

pub use assemble::{Assembled, SchemaMismatch, assemble, assemble_strict};
pub use config::{
    AdjacentPolicy, ConfigError, PipelineConfig, ReconcileConfig, ScaleConfig, SmoothConfig,
    WinsorConfig,
};
pub use error::TableError;
pub use naming::ReportKey;
pub use quality::QualityFlag;
pub use report::{Auditor, BoardMember, ExtractionAttempt, FieldGroup, FieldKey, YearSummary};
pub use schema::company_year;
pub use source::{AttemptSet, AttemptSource, MemorySource, MissingReason};
pub use table::{CompanyYearRow, CompanyYearTable, Series};
