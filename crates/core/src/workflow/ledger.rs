//! Approval ledger entries and read-only queries over them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spendgate_shared::types::{ApprovalRecordId, EmployeeId};

use crate::workflow::types::ApprovalStatus;

/// One approver's decision record for one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier.
    pub id: ApprovalRecordId,
    /// The approver this entry gates on.
    pub approver_id: EmployeeId,
    /// Current decision.
    pub status: ApprovalStatus,
    /// Step in the chain when the entry was created.
    pub step_order: Option<i32>,
    /// Approval comments or rejection reason.
    pub comments: Option<String>,
    /// When the decision was made.
    pub action_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    /// Returns true while the approver has not acted.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }
}

/// Read-only view over every ledger entry of a single report.
#[derive(Debug, Clone, Copy)]
pub struct Ledger<'a> {
    entries: &'a [LedgerEntry],
}

impl<'a> Ledger<'a> {
    /// Wraps the entries of one report.
    #[must_use]
    pub const fn new(entries: &'a [LedgerEntry]) -> Self {
        Self { entries }
    }

    /// The entry held by `approver_id`, whatever its status.
    #[must_use]
    pub fn entry_for(&self, approver_id: EmployeeId) -> Option<&'a LedgerEntry> {
        self.entries.iter().find(|e| e.approver_id == approver_id)
    }

    /// The entry `approver_id` still has to act on.
    #[must_use]
    pub fn pending_for(&self, approver_id: EmployeeId) -> Option<&'a LedgerEntry> {
        self.entries
            .iter()
            .find(|e| e.approver_id == approver_id && e.is_pending())
    }

    /// Number of entries with the given status.
    #[must_use]
    pub fn count(&self, status: ApprovalStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Number of approvals recorded so far.
    #[must_use]
    pub fn approved_count(&self) -> usize {
        self.count(ApprovalStatus::Approved)
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no approver was ever activated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
