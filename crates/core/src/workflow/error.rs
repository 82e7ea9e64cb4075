//! Workflow error types for expense report approval.
//!
//! Every failure the engine can report is a variant here; none are
//! swallowed, and persistence failures collapse into `Database`.

use spendgate_shared::AppError;
use spendgate_shared::types::{EmployeeId, ReportId, WorkflowId};
use thiserror::Error;

use crate::workflow::types::ReportStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Report does not exist (or belongs to another company).
    #[error("Report {0} not found")]
    ReportNotFound(ReportId),

    /// Workflow definition does not exist (or belongs to another company).
    #[error("Workflow {0} not found")]
    WorkflowNotFound(WorkflowId),

    /// Employee does not exist in the actor's company.
    #[error("Employee {0} not found")]
    EmployeeNotFound(EmployeeId),

    /// Actor lacks ownership or role for the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Operation is not valid for the report's current status.
    #[error("Cannot {action} report in status {status}")]
    InvalidState {
        /// The attempted action.
        action: &'static str,
        /// The report's status at the time of the attempt.
        status: ReportStatus,
    },

    /// The actor has no pending ledger entry on the report.
    #[error("No pending approval for employee {approver_id} on report {report_id}")]
    NoPendingApproval {
        /// The report acted on.
        report_id: ReportId,
        /// The would-be approver.
        approver_id: EmployeeId,
    },

    /// No workflow is bound and no manager is configured.
    #[error("No approval workflow or manager found for employee {0}")]
    NoApproverAvailable(EmployeeId),

    /// A required argument was missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The employee is already bound to another workflow.
    #[error("Employee {0} is already assigned to another workflow")]
    WorkflowAlreadyBound(EmployeeId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,

            Self::Forbidden(_) | Self::NoPendingApproval { .. } => 403,

            Self::ReportNotFound(_) | Self::WorkflowNotFound(_) | Self::EmployeeNotFound(_) => 404,

            Self::InvalidState { .. } | Self::WorkflowAlreadyBound(_) => 409,

            Self::NoApproverAvailable(_) => 422,

            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ReportNotFound(_) => "REPORT_NOT_FOUND",
            Self::WorkflowNotFound(_) => "WORKFLOW_NOT_FOUND",
            Self::EmployeeNotFound(_) => "EMPLOYEE_NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::NoPendingApproval { .. } => "NO_PENDING_APPROVAL",
            Self::NoApproverAvailable(_) => "NO_APPROVER_AVAILABLE",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::WorkflowAlreadyBound(_) => "WORKFLOW_ALREADY_BOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true when the report moved on underneath the caller.
    ///
    /// Losing a race against a concurrent terminal transition surfaces this
    /// way; callers may treat it as a no-op.
    #[must_use]
    pub fn is_lost_race(&self) -> bool {
        matches!(self, Self::InvalidState { status, .. } if status.is_terminal())
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::ReportNotFound(_)
            | WorkflowError::WorkflowNotFound(_)
            | WorkflowError::EmployeeNotFound(_) => Self::NotFound(message),
            WorkflowError::Forbidden(_) | WorkflowError::NoPendingApproval { .. } => {
                Self::Forbidden(message)
            }
            WorkflowError::InvalidState { .. } | WorkflowError::NoApproverAvailable(_) => {
                Self::BusinessRule(message)
            }
            WorkflowError::InvalidArgument(_) => Self::Validation(message),
            WorkflowError::WorkflowAlreadyBound(_) => Self::Conflict(message),
            WorkflowError::Database(_) => Self::Database(message),
        }
    }
}
