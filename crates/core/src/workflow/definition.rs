//! Approval workflow definitions.
//!
//! A definition pairs an [`ApprovalPolicy`] with an [`ApproverRoster`], an
//! immutable view of its approvers sorted by ascending step order. The
//! sequential "who is next" question is answered by a pure query over that
//! view rather than by scanning storage.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use spendgate_shared::types::{CompanyId, EmployeeId, WorkflowId};

use crate::workflow::error::WorkflowError;
use crate::workflow::types::ApprovalMode;

/// Minimum share of the roster, in whole percent, that must approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct ApprovalThreshold(u8);

impl ApprovalThreshold {
    /// Creates a threshold, rejecting anything outside `0..=100`.
    pub fn new(percent: i32) -> Result<Self, WorkflowError> {
        u8::try_from(percent)
            .ok()
            .filter(|p| *p <= 100)
            .map(Self)
            .ok_or_else(|| {
                WorkflowError::InvalidArgument(format!(
                    "Minimum approval percentage must be between 0 and 100, got {percent}"
                ))
            })
    }

    /// Returns the threshold in whole percent.
    #[must_use]
    pub const fn percent(self) -> u8 {
        self.0
    }

    /// Returns true if `approved / roster_size * 100 >= threshold`.
    ///
    /// Evaluated in integers: `approved * 100 >= threshold * roster_size`.
    /// An empty roster never reaches quorum.
    #[must_use]
    pub fn is_met(self, approved: usize, roster_size: usize) -> bool {
        if roster_size == 0 {
            return false;
        }
        let approved = approved as u128 * 100;
        let required = u128::from(self.0) * roster_size as u128;
        approved >= required
    }
}

impl TryFrom<i32> for ApprovalThreshold {
    type Error = WorkflowError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApprovalThreshold> for i32 {
    fn from(threshold: ApprovalThreshold) -> Self {
        i32::from(threshold.0)
    }
}

/// What it takes for a workflow to fully approve a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ApprovalPolicy {
    /// Every step, in ascending order.
    Sequential,
    /// A percentage of the roster, in any order.
    Parallel {
        /// Required share of approvals.
        min_approval: ApprovalThreshold,
    },
}

impl ApprovalPolicy {
    /// Builds a policy from its stored parts.
    ///
    /// The percentage is ignored for sequential workflows and required for
    /// parallel ones.
    pub fn from_parts(
        mode: ApprovalMode,
        min_approval_percentage: Option<i32>,
    ) -> Result<Self, WorkflowError> {
        match mode {
            ApprovalMode::Sequential => Ok(Self::Sequential),
            ApprovalMode::Parallel => {
                let percent = min_approval_percentage.ok_or_else(|| {
                    WorkflowError::InvalidArgument(
                        "Minimum approval percentage is required for parallel mode".to_string(),
                    )
                })?;
                Ok(Self::Parallel {
                    min_approval: ApprovalThreshold::new(percent)?,
                })
            }
        }
    }

    /// Returns the mode this policy corresponds to.
    #[must_use]
    pub const fn mode(&self) -> ApprovalMode {
        match self {
            Self::Sequential => ApprovalMode::Sequential,
            Self::Parallel { .. } => ApprovalMode::Parallel,
        }
    }

    /// Returns the quorum percentage for parallel policies.
    #[must_use]
    pub const fn min_approval_percentage(&self) -> Option<u8> {
        match self {
            Self::Sequential => None,
            Self::Parallel { min_approval } => Some(min_approval.percent()),
        }
    }
}

/// One configured approver of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverSlot {
    /// The approving employee.
    pub approver_id: EmployeeId,
    /// Position in a sequential chain; advisory in parallel workflows.
    pub step_order: Option<i32>,
}

impl ApproverSlot {
    /// Creates a slot with an explicit step.
    #[must_use]
    pub const fn at_step(approver_id: EmployeeId, step_order: i32) -> Self {
        Self {
            approver_id,
            step_order: Some(step_order),
        }
    }

    /// Creates a slot without a step.
    #[must_use]
    pub const fn unordered(approver_id: EmployeeId) -> Self {
        Self {
            approver_id,
            step_order: None,
        }
    }
}

/// Approvers of a workflow sorted by ascending step order.
///
/// Slots without a step sort after every ordered slot and keep their
/// relative input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverRoster {
    slots: Vec<ApproverSlot>,
}

impl ApproverRoster {
    /// Builds the sorted view.
    #[must_use]
    pub fn new(mut slots: Vec<ApproverSlot>) -> Self {
        slots.sort_by_key(|slot| (slot.step_order.is_none(), slot.step_order));
        Self { slots }
    }

    /// Number of configured approvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nobody is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates the approvers in chain order.
    pub fn iter(&self) -> impl Iterator<Item = &ApproverSlot> {
        self.slots.iter()
    }

    /// The head of the chain.
    #[must_use]
    pub fn first(&self) -> Option<&ApproverSlot> {
        self.slots.first()
    }

    /// Slots whose step is strictly greater than `after`, ascending.
    ///
    /// A missing `after` step has no successors, and unordered slots are
    /// never successors.
    pub fn successors(&self, after: Option<i32>) -> impl Iterator<Item = &ApproverSlot> {
        self.slots.iter().filter(move |slot| match (after, slot.step_order) {
            (Some(current), Some(step)) => step > current,
            _ => false,
        })
    }

    /// The approver with the smallest step strictly greater than `after`.
    #[must_use]
    pub fn next_after(&self, after: Option<i32>) -> Option<&ApproverSlot> {
        self.successors(after).next()
    }

    /// Returns true if the employee is on the roster.
    #[must_use]
    pub fn contains(&self, approver_id: EmployeeId) -> bool {
        self.slots.iter().any(|slot| slot.approver_id == approver_id)
    }
}

/// A configured approval workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Unique identifier.
    pub id: WorkflowId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Human-readable name.
    pub name: String,
    /// Activation and completion rule.
    pub policy: ApprovalPolicy,
    /// The employee whose reports this workflow routes, if any.
    pub bound_employee_id: Option<EmployeeId>,
    /// Configured approvers.
    pub roster: ApproverRoster,
}

impl WorkflowDefinition {
    /// Returns the approval mode.
    #[must_use]
    pub const fn mode(&self) -> ApprovalMode {
        self.policy.mode()
    }
}

/// Input for creating or replacing a workflow definition.
#[derive(Debug, Clone)]
pub struct NewWorkflowDefinition {
    /// Human-readable name.
    pub name: String,
    /// Approval mode.
    pub mode: ApprovalMode,
    /// Quorum for parallel workflows, in whole percent.
    pub min_approval_percentage: Option<i32>,
    /// Employee to bind the workflow to.
    pub bound_employee_id: Option<EmployeeId>,
    /// Approvers, in any order.
    pub approvers: Vec<ApproverSlot>,
}

/// A definition that passed validation and is ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedWorkflow {
    /// Trimmed name.
    pub name: String,
    /// Activation and completion rule.
    pub policy: ApprovalPolicy,
    /// Employee to bind the workflow to.
    pub bound_employee_id: Option<EmployeeId>,
    /// Sorted approvers.
    pub roster: ApproverRoster,
}

impl NewWorkflowDefinition {
    /// Checks the definition and produces its persisted shape.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidArgument` if:
    /// - the name is blank
    /// - there are no approvers, or an approver appears twice
    /// - a step order is not positive
    /// - a sequential workflow has a missing or repeated step order
    /// - a parallel workflow lacks a percentage in `0..=100`
    pub fn validate(self) -> Result<ValidatedWorkflow, WorkflowError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid("Workflow name is required"));
        }
        if self.approvers.is_empty() {
            return Err(invalid("At least one approver is required"));
        }

        let mut seen_approvers = HashSet::new();
        let mut seen_steps = HashSet::new();
        for slot in &self.approvers {
            if !seen_approvers.insert(slot.approver_id) {
                return Err(invalid(&format!(
                    "Approver {} is listed more than once",
                    slot.approver_id
                )));
            }
            match slot.step_order {
                Some(step) if step < 1 => {
                    return Err(invalid(&format!("Step order must be positive, got {step}")));
                }
                Some(step) if self.mode == ApprovalMode::Sequential => {
                    if !seen_steps.insert(step) {
                        return Err(invalid(&format!("Step order {step} is used more than once")));
                    }
                }
                None if self.mode == ApprovalMode::Sequential => {
                    return Err(invalid(&format!(
                        "Approver {} needs a step order in a sequential workflow",
                        slot.approver_id
                    )));
                }
                _ => {}
            }
        }

        let policy = ApprovalPolicy::from_parts(self.mode, self.min_approval_percentage)?;

        Ok(ValidatedWorkflow {
            name: name.to_string(),
            policy,
            bound_employee_id: self.bound_employee_id,
            roster: ApproverRoster::new(self.approvers),
        })
    }
}

fn invalid(message: &str) -> WorkflowError {
    WorkflowError::InvalidArgument(message.to_string())
}
