//! Expense report approval workflow for Spendgate.
//!
//! This module implements the routing and transition rules that move a
//! report from draft to a terminal decision.
//!
//! # Modules
//!
//! - `types` - Report and ledger statuses, approval modes
//! - `error` - Workflow-specific error types
//! - `definition` - Workflow definitions, rosters and quorum thresholds
//! - `ledger` - Per-report approval entries
//! - `routing` - Custom workflow or manager fallback at submission
//! - `transition` - Submit, approve and reject decisions

pub mod definition;
pub mod error;
pub mod ledger;
pub mod routing;
pub mod transition;
pub mod types;

#[cfg(test)]
mod definition_props;
#[cfg(test)]
mod transition_props;

pub use definition::{
    ApprovalPolicy, ApprovalThreshold, ApproverRoster, ApproverSlot, NewWorkflowDefinition,
    ValidatedWorkflow, WorkflowDefinition,
};
pub use error::WorkflowError;
pub use ledger::{Ledger, LedgerEntry};
pub use routing::{Assignment, Routing};
pub use transition::{
    ActionContext, ApprovalOutcome, ApprovalPlan, RejectionPlan, SubmissionPlan, TransitionEngine,
};
pub use types::{ApprovalMode, ApprovalStatus, ReportStatus};
