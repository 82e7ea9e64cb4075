//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod report;
pub mod workflow;
pub mod workflow_definition;

pub use report::{ReportDetail, ReportRepository};
pub use workflow::{ApprovalResult, PendingApproval, WorkflowRepository};
pub use workflow_definition::WorkflowDefinitionRepository;

use sea_orm::DbErr;
use spendgate_core::workflow::WorkflowError;

/// Collapses a persistence failure into the engine's internal error.
pub(crate) fn db_error(err: DbErr) -> WorkflowError {
    WorkflowError::Database(err.to_string())
}
