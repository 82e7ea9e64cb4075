//! Routing resolution for newly submitted reports.
//!
//! A submitting employee is either covered by a workflow bound to them or
//! falls back to their direct manager. [`Routing`] makes that choice a
//! tagged union so the "no manager either" case is a named error.

use spendgate_shared::types::{EmployeeId, WorkflowId};

use crate::workflow::definition::{ApprovalPolicy, ApproverRoster, WorkflowDefinition};
use crate::workflow::error::WorkflowError;

/// Step order recorded for the manager in fallback routing.
pub const FALLBACK_STEP_ORDER: i32 = 1;

/// A pending ledger entry to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    /// The approver to activate.
    pub approver_id: EmployeeId,
    /// Step order to record on the entry.
    pub step_order: Option<i32>,
}

/// How a report is routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routing {
    /// A workflow bound to the employee.
    CustomWorkflow {
        /// The workflow that applies.
        workflow_id: WorkflowId,
        /// Activation and completion rule.
        policy: ApprovalPolicy,
        /// Configured approvers.
        roster: ApproverRoster,
    },
    /// Single approval by the employee's direct manager.
    ManagerFallback {
        /// The manager.
        manager_id: EmployeeId,
    },
}

impl Routing {
    /// Chooses the routing for `employee_id`.
    ///
    /// # Arguments
    /// * `employee_id` - The submitting employee
    /// * `workflow` - The workflow bound to the employee, if any
    /// * `manager_id` - The employee's direct manager, if any
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NoApproverAvailable` when there is no usable
    /// workflow and no manager (a manager equal to the employee counts as
    /// none).
    pub fn resolve(
        employee_id: EmployeeId,
        workflow: Option<WorkflowDefinition>,
        manager_id: Option<EmployeeId>,
    ) -> Result<Self, WorkflowError> {
        if let Some(workflow) = workflow.filter(|w| !w.roster.is_empty()) {
            return Ok(Self::CustomWorkflow {
                workflow_id: workflow.id,
                policy: workflow.policy,
                roster: workflow.roster,
            });
        }

        match manager_id {
            Some(manager_id) if manager_id != employee_id => Ok(Self::ManagerFallback { manager_id }),
            _ => Err(WorkflowError::NoApproverAvailable(employee_id)),
        }
    }

    /// The ledger entries to create at submission time.
    ///
    /// Sequential workflows activate the head of the chain only; parallel
    /// workflows activate everybody, recording step orders for
    /// traceability.
    #[must_use]
    pub fn initial_assignments(&self) -> Vec<Assignment> {
        match self {
            Self::CustomWorkflow {
                policy: ApprovalPolicy::Sequential,
                roster,
                ..
            } => roster
                .first()
                .map(|slot| Assignment {
                    approver_id: slot.approver_id,
                    step_order: slot.step_order,
                })
                .into_iter()
                .collect(),
            Self::CustomWorkflow {
                policy: ApprovalPolicy::Parallel { .. },
                roster,
                ..
            } => roster
                .iter()
                .map(|slot| Assignment {
                    approver_id: slot.approver_id,
                    step_order: slot.step_order,
                })
                .collect(),
            Self::ManagerFallback { manager_id } => vec![Assignment {
                approver_id: *manager_id,
                step_order: Some(FALLBACK_STEP_ORDER),
            }],
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CustomWorkflow {
                policy: ApprovalPolicy::Sequential,
                ..
            } => "sequential",
            Self::CustomWorkflow {
                policy: ApprovalPolicy::Parallel { .. },
                ..
            } => "parallel",
            Self::ManagerFallback { .. } => "manager",
        }
    }
}
