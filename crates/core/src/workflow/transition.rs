//! Transition engine for expense report approval.
//!
//! The engine is stateless: each operation takes the report's current
//! status, its ledger and the workflow that currently applies, and returns
//! a plan describing the writes to perform. The persistence layer applies a
//! plan inside one transaction.

use chrono::{DateTime, Utc};
use spendgate_shared::types::{ApprovalRecordId, EmployeeId, ReportId};

use crate::workflow::definition::{ApprovalPolicy, WorkflowDefinition};
use crate::workflow::error::WorkflowError;
use crate::workflow::ledger::{Ledger, LedgerEntry};
use crate::workflow::routing::{Assignment, Routing};
use crate::workflow::types::{ApprovalStatus, ReportStatus};

/// Writes needed to submit a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPlan {
    /// The routing that was chosen.
    pub routing: Routing,
    /// Pending ledger entries to create.
    pub assignments: Vec<Assignment>,
    /// Timestamp for `submitted_at` and `last_action_at`.
    pub submitted_at: DateTime<Utc>,
}

/// What an approval did to the report as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The report is fully approved.
    FullyApproved,
    /// The next approver in the chain must be activated.
    NextStepActivated(Assignment),
    /// The next approver in the chain already has a pending entry.
    AwaitingNextStep(EmployeeId),
    /// The parallel quorum is not reached yet.
    QuorumPending {
        /// Approvals recorded including this one.
        approved: usize,
        /// Size of the current roster.
        roster_size: usize,
    },
}

impl ApprovalOutcome {
    /// Returns true if this approval closed out the report.
    #[must_use]
    pub const fn report_approved(&self) -> bool {
        matches!(self, Self::FullyApproved)
    }

    /// The report status after the approval is applied.
    #[must_use]
    pub const fn resulting_status(&self) -> ReportStatus {
        if self.report_approved() {
            ReportStatus::Approved
        } else {
            ReportStatus::Submitted
        }
    }
}

/// Writes needed to record an approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPlan {
    /// The ledger entry to mark approved.
    pub entry_id: ApprovalRecordId,
    /// The acting approver.
    pub approver_id: EmployeeId,
    /// Approver comments.
    pub comments: Option<String>,
    /// Timestamp of the decision.
    pub acted_at: DateTime<Utc>,
    /// Effect on the report.
    pub outcome: ApprovalOutcome,
}

/// Writes needed to record a rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionPlan {
    /// The ledger entry to mark rejected.
    pub entry_id: ApprovalRecordId,
    /// The acting approver.
    pub approver_id: EmployeeId,
    /// Trimmed rejection reason.
    pub reason: String,
    /// Timestamp of the decision.
    pub acted_at: DateTime<Utc>,
}

/// Inputs to an approve or reject decision.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// The report acted on.
    pub report_id: ReportId,
    /// Its status as read inside the unit of work.
    pub status: ReportStatus,
    /// Every ledger entry of the report.
    pub ledger: Ledger<'a>,
    /// The acting approver.
    pub approver_id: EmployeeId,
}

/// Stateless service deciding report transitions.
pub struct TransitionEngine;

impl TransitionEngine {
    /// Checks that `actor_id` may submit a report in `status` owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// * `WorkflowError::Forbidden` if the actor does not own the report
    /// * `WorkflowError::InvalidState` if the report is not a draft
    pub fn ensure_submittable(
        actor_id: EmployeeId,
        owner_id: EmployeeId,
        status: ReportStatus,
    ) -> Result<(), WorkflowError> {
        if actor_id != owner_id {
            return Err(WorkflowError::Forbidden(
                "Only the owner can submit a report".to_string(),
            ));
        }
        Self::ensure_edge(status, ReportStatus::Submitted, "submit")
    }

    /// Plans the submission of a draft report.
    ///
    /// # Arguments
    /// * `actor_id` - The employee submitting
    /// * `owner_id` - The report's owner
    /// * `status` - The report's current status
    /// * `workflow` - The workflow bound to the owner, if any
    /// * `manager_id` - The owner's direct manager, if any
    ///
    /// # Errors
    ///
    /// Ownership and status errors from [`Self::ensure_submittable`], then
    /// `WorkflowError::NoApproverAvailable` if nobody can approve.
    pub fn submit(
        actor_id: EmployeeId,
        owner_id: EmployeeId,
        status: ReportStatus,
        workflow: Option<WorkflowDefinition>,
        manager_id: Option<EmployeeId>,
    ) -> Result<SubmissionPlan, WorkflowError> {
        Self::ensure_submittable(actor_id, owner_id, status)?;

        let routing = Routing::resolve(owner_id, workflow, manager_id)?;
        let assignments = routing.initial_assignments();

        Ok(SubmissionPlan {
            routing,
            assignments,
            submitted_at: Utc::now(),
        })
    }

    /// Plans an approval.
    ///
    /// `workflow` is the definition bound to the report's owner right now;
    /// edits made after submission apply to later steps.
    ///
    /// # Errors
    ///
    /// * `WorkflowError::InvalidState` if the report is not submitted
    /// * `WorkflowError::NoPendingApproval` if the approver has nothing pending
    pub fn approve(
        ctx: ActionContext<'_>,
        workflow: Option<&WorkflowDefinition>,
        comments: Option<String>,
    ) -> Result<ApprovalPlan, WorkflowError> {
        let entry = Self::pending_entry(&ctx, ReportStatus::Approved, "approve")?;

        let outcome = match workflow.filter(|w| !w.roster.is_empty()) {
            None => ApprovalOutcome::FullyApproved,
            Some(workflow) => match workflow.policy {
                ApprovalPolicy::Sequential => Self::advance_chain(&ctx, workflow, entry),
                ApprovalPolicy::Parallel { min_approval } => {
                    let approved = ctx.ledger.approved_count() + 1;
                    let roster_size = workflow.roster.len();
                    if min_approval.is_met(approved, roster_size) {
                        ApprovalOutcome::FullyApproved
                    } else {
                        ApprovalOutcome::QuorumPending {
                            approved,
                            roster_size,
                        }
                    }
                }
            },
        };

        Ok(ApprovalPlan {
            entry_id: entry.id,
            approver_id: ctx.approver_id,
            comments: Self::normalize_comments(comments),
            acted_at: Utc::now(),
            outcome,
        })
    }

    /// Plans a rejection. Any pending approver can end the report.
    ///
    /// # Errors
    ///
    /// * `WorkflowError::InvalidArgument` if the reason is blank
    /// * `WorkflowError::InvalidState` if the report is not submitted
    /// * `WorkflowError::NoPendingApproval` if the approver has nothing pending
    pub fn reject(ctx: ActionContext<'_>, reason: &str) -> Result<RejectionPlan, WorkflowError> {
        let reason = Self::validate_reason(reason)?;
        let entry = Self::pending_entry(&ctx, ReportStatus::Rejected, "reject")?;

        Ok(RejectionPlan {
            entry_id: entry.id,
            approver_id: ctx.approver_id,
            reason: reason.to_string(),
            acted_at: Utc::now(),
        })
    }

    /// Trims a rejection reason, refusing blank ones.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidArgument` if nothing is left.
    pub fn validate_reason(reason: &str) -> Result<&str, WorkflowError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::InvalidArgument(
                "Rejection reason is required".to_string(),
            ));
        }
        Ok(reason)
    }

    /// Trims approver comments; nothing left means no comment.
    #[must_use]
    fn normalize_comments(comments: Option<String>) -> Option<String> {
        comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }

    /// Refuses `action` unless the state machine has an edge `from -> to`.
    ///
    /// The submitted self-loop belongs to partial approvals only, so it never
    /// counts as entering a status.
    fn ensure_edge(
        from: ReportStatus,
        to: ReportStatus,
        action: &'static str,
    ) -> Result<(), WorkflowError> {
        if from != to && ReportStatus::can_transition(from, to) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidState {
                action,
                status: from,
            })
        }
    }

    /// The actor's pending entry, once the report may move to `target`.
    ///
    /// An approval is checked against the approved edge even when it only
    /// advances the chain: both leave from the same status.
    fn pending_entry<'a>(
        ctx: &ActionContext<'a>,
        target: ReportStatus,
        action: &'static str,
    ) -> Result<&'a LedgerEntry, WorkflowError> {
        Self::ensure_edge(ctx.status, target, action)?;
        ctx.ledger
            .pending_for(ctx.approver_id)
            .ok_or(WorkflowError::NoPendingApproval {
                report_id: ctx.report_id,
                approver_id: ctx.approver_id,
            })
    }

    /// Finds the next link of a sequential chain after `entry`.
    ///
    /// Approvers who already signed off are skipped, as is the actor.
    fn advance_chain(
        ctx: &ActionContext<'_>,
        workflow: &WorkflowDefinition,
        entry: &LedgerEntry,
    ) -> ApprovalOutcome {
        let next = workflow.roster.successors(entry.step_order).find(|slot| {
            slot.approver_id != ctx.approver_id
                && ctx
                    .ledger
                    .entry_for(slot.approver_id)
                    .is_none_or(|e| e.status != ApprovalStatus::Approved)
        });

        match next {
            None => ApprovalOutcome::FullyApproved,
            Some(slot) if ctx.ledger.entry_for(slot.approver_id).is_some() => {
                ApprovalOutcome::AwaitingNextStep(slot.approver_id)
            }
            Some(slot) => ApprovalOutcome::NextStepActivated(Assignment {
                approver_id: slot.approver_id,
                step_order: slot.step_order,
            }),
        }
    }
}
