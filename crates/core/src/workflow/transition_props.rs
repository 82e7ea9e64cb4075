//! Property-based tests for TransitionEngine.
//!
//! A small in-memory harness applies each plan the way the repository does,
//! so whole report lifecycles can be driven with random inputs.

use proptest::prelude::*;
use spendgate_shared::types::{ApprovalRecordId, CompanyId, EmployeeId, ReportId, WorkflowId};

use crate::workflow::definition::{
    ApprovalPolicy, ApprovalThreshold, ApproverRoster, ApproverSlot, WorkflowDefinition,
};
use crate::workflow::error::WorkflowError;
use crate::workflow::ledger::{Ledger, LedgerEntry};
use crate::workflow::transition::{ActionContext, ApprovalOutcome, TransitionEngine};
use crate::workflow::types::{ApprovalStatus, ReportStatus};

/// One report plus its ledger, mutated only through engine plans.
#[derive(Debug, Clone)]
struct Harness {
    report_id: ReportId,
    owner: EmployeeId,
    status: ReportStatus,
    entries: Vec<LedgerEntry>,
    workflow: Option<WorkflowDefinition>,
    manager: Option<EmployeeId>,
}

impl Harness {
    fn draft(workflow: Option<WorkflowDefinition>, manager: Option<EmployeeId>) -> Self {
        Self {
            report_id: ReportId::new(),
            owner: EmployeeId::new(),
            status: ReportStatus::Draft,
            entries: Vec::new(),
            workflow,
            manager,
        }
    }

    fn submit(&mut self) -> Result<(), WorkflowError> {
        let plan = TransitionEngine::submit(
            self.owner,
            self.owner,
            self.status,
            self.workflow.clone(),
            self.manager,
        )?;
        for assignment in plan.assignments {
            self.entries.push(LedgerEntry {
                id: ApprovalRecordId::new(),
                approver_id: assignment.approver_id,
                status: ApprovalStatus::Pending,
                step_order: assignment.step_order,
                comments: None,
                action_at: None,
            });
        }
        self.status = ReportStatus::Submitted;
        Ok(())
    }

    fn ctx(&self, approver_id: EmployeeId) -> ActionContext<'_> {
        ActionContext {
            report_id: self.report_id,
            status: self.status,
            ledger: Ledger::new(&self.entries),
            approver_id,
        }
    }

    fn approve(&mut self, approver_id: EmployeeId) -> Result<bool, WorkflowError> {
        let plan = TransitionEngine::approve(self.ctx(approver_id), self.workflow.as_ref(), None)?;
        self.mark(plan.entry_id, ApprovalStatus::Approved);
        match plan.outcome {
            ApprovalOutcome::FullyApproved => self.status = ReportStatus::Approved,
            ApprovalOutcome::NextStepActivated(next) => self.entries.push(LedgerEntry {
                id: ApprovalRecordId::new(),
                approver_id: next.approver_id,
                status: ApprovalStatus::Pending,
                step_order: next.step_order,
                comments: None,
                action_at: None,
            }),
            ApprovalOutcome::AwaitingNextStep(_) | ApprovalOutcome::QuorumPending { .. } => {}
        }
        Ok(plan.outcome.report_approved())
    }

    fn reject(&mut self, approver_id: EmployeeId) -> Result<(), WorkflowError> {
        let plan = TransitionEngine::reject(self.ctx(approver_id), "not allowed")?;
        self.mark(plan.entry_id, ApprovalStatus::Rejected);
        self.status = ReportStatus::Rejected;
        Ok(())
    }

    fn mark(&mut self, entry_id: ApprovalRecordId, status: ApprovalStatus) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == entry_id) {
            entry.status = status;
        }
    }

    fn pending(&self) -> Vec<EmployeeId> {
        self.entries
            .iter()
            .filter(|e| e.is_pending())
            .map(|e| e.approver_id)
            .collect()
    }
}

fn definition(policy: ApprovalPolicy, slots: Vec<ApproverSlot>) -> WorkflowDefinition {
    WorkflowDefinition {
        id: WorkflowId::new(),
        company_id: CompanyId::new(),
        name: "props".to_string(),
        policy,
        bound_employee_id: None,
        roster: ApproverRoster::new(slots),
    }
}

fn parallel(approvers: &[EmployeeId], percent: i32) -> WorkflowDefinition {
    definition(
        ApprovalPolicy::Parallel {
            min_approval: ApprovalThreshold::new(percent).unwrap(),
        },
        approvers.iter().map(|id| ApproverSlot::unordered(*id)).collect(),
    )
}

fn sequential(approvers: &[EmployeeId], steps: &[i32]) -> WorkflowDefinition {
    definition(
        ApprovalPolicy::Sequential,
        approvers
            .iter()
            .zip(steps)
            .map(|(id, step)| ApproverSlot::at_step(*id, *step))
            .collect(),
    )
}

fn employees(n: usize) -> Vec<EmployeeId> {
    (0..n).map(|_| EmployeeId::new()).collect()
}

/// Roster size together with a random approval order over it.
fn arb_roster_order() -> impl Strategy<Value = (usize, Vec<usize>)> {
    (1usize..8).prop_flat_map(|n| (Just(n), Just((0..n).collect::<Vec<_>>()).prop_shuffle()))
}

/// Distinct ascending step orders, deliberately sparse.
fn arb_steps() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::btree_set(1i32..1000, 1..8).prop_map(|s| s.into_iter().collect())
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Submit,
    Approve(usize),
    Reject(usize),
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        1 => Just(Action::Submit),
        4 => (0usize..8).prop_map(Action::Approve),
        1 => (0usize..8).prop_map(Action::Reject),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Report status only moves along the lifecycle edges
    // =========================================================================

    /// Any sequence of actions only produces allowed transitions, and
    /// failed actions leave the report untouched.
    #[test]
    fn prop_status_moves_only_along_edges(
        use_parallel in any::<bool>(),
        (n, _) in arb_roster_order(),
        percent in 0i32..=100,
        actions in prop::collection::vec(arb_action(), 1..30),
    ) {
        let ids = employees(n);
        let steps: Vec<i32> = (1..=8).collect();
        let workflow = if use_parallel {
            parallel(&ids, percent)
        } else {
            sequential(&ids, &steps)
        };
        let mut harness = Harness::draft(Some(workflow), None);

        for action in actions {
            let before = harness.clone();
            let result = match action {
                Action::Submit => harness.submit(),
                Action::Approve(i) => harness.approve(ids[i % n]).map(|_| ()),
                Action::Reject(i) => harness.reject(ids[i % n]),
            };

            match result {
                Ok(()) => prop_assert!(
                    ReportStatus::can_transition(before.status, harness.status),
                    "{} -> {} is not a lifecycle edge",
                    before.status,
                    harness.status
                ),
                Err(_) => {
                    prop_assert_eq!(before.status, harness.status);
                    prop_assert_eq!(&before.entries, &harness.entries);
                }
            }
        }
    }

    // =========================================================================
    // Parallel quorum
    // =========================================================================

    /// The report is approved by the first approval that reaches the
    /// threshold, and never earlier.
    #[test]
    fn prop_parallel_approves_exactly_at_threshold(
        (n, order) in arb_roster_order(),
        percent in 0i32..=100,
    ) {
        let ids = employees(n);
        let mut harness = Harness::draft(Some(parallel(&ids, percent)), None);
        harness.submit().unwrap();
        prop_assert_eq!(harness.pending().len(), n);

        let threshold = usize::try_from(percent).unwrap();
        for (k, idx) in order.iter().enumerate() {
            let approved_so_far = k + 1;
            let closed = harness.approve(ids[*idx]).unwrap();
            let expected = approved_so_far * 100 >= threshold * n;
            prop_assert_eq!(closed, expected);

            if closed {
                prop_assert_eq!(harness.status, ReportStatus::Approved);
                // Remaining approvers are left pending and can no longer act.
                for rest in &order[k + 1..] {
                    let err = harness.approve(ids[*rest]).unwrap_err();
                    prop_assert!(err.is_lost_race());
                }
                break;
            }
            prop_assert_eq!(harness.status, ReportStatus::Submitted);
        }
        prop_assert_eq!(harness.status, ReportStatus::Approved);
    }

    // =========================================================================
    // Sequential chain
    // =========================================================================

    /// Approving step k activates step k+1, or approves the report at the
    /// last step; never both.
    #[test]
    fn prop_sequential_walks_the_chain(steps in arb_steps()) {
        let n = steps.len();
        let ids = employees(n);
        let mut harness = Harness::draft(Some(sequential(&ids, &steps)), None);
        harness.submit().unwrap();
        prop_assert_eq!(harness.pending(), vec![ids[0]]);

        for k in 0..n {
            let entries_before = harness.entries.len();
            let closed = harness.approve(ids[k]).unwrap();

            if k + 1 < n {
                prop_assert!(!closed);
                prop_assert_eq!(harness.status, ReportStatus::Submitted);
                prop_assert_eq!(harness.entries.len(), entries_before + 1);
                prop_assert_eq!(harness.pending(), vec![ids[k + 1]]);
                let activated = harness.entries.last().unwrap();
                prop_assert_eq!(activated.step_order, Some(steps[k + 1]));
            } else {
                prop_assert!(closed);
                prop_assert_eq!(harness.status, ReportStatus::Approved);
                prop_assert_eq!(harness.entries.len(), entries_before);
            }
        }
    }

    /// Only the currently activated approver may act on a sequential report.
    #[test]
    fn prop_sequential_later_steps_wait(steps in arb_steps()) {
        let n = steps.len();
        prop_assume!(n > 1);
        let ids = employees(n);
        let mut harness = Harness::draft(Some(sequential(&ids, &steps)), None);
        harness.submit().unwrap();

        for later in &ids[1..] {
            let is_no_pending = matches!(
                harness.approve(*later),
                Err(WorkflowError::NoPendingApproval { .. })
            );
            prop_assert!(is_no_pending);
        }
    }

    // =========================================================================
    // Rejection is final
    // =========================================================================

    /// A rejection by any pending approver ends the report, however many
    /// approvals were already recorded.
    #[test]
    fn prop_rejection_is_immediate(
        use_parallel in any::<bool>(),
        (n, order) in arb_roster_order(),
        approvals_before in 0usize..8,
    ) {
        let ids = employees(n);
        let steps: Vec<i32> = (1..=8).collect();
        let workflow = if use_parallel {
            parallel(&ids, 100)
        } else {
            sequential(&ids, &steps)
        };
        let mut harness = Harness::draft(Some(workflow), None);
        harness.submit().unwrap();

        let approvals_before = approvals_before % n;
        for k in 0..approvals_before {
            let approver = if use_parallel { ids[order[k]] } else { ids[k] };
            prop_assert!(!harness.approve(approver).unwrap());
        }

        let rejecter = harness.pending()[0];
        harness.reject(rejecter).unwrap();
        prop_assert_eq!(harness.status, ReportStatus::Rejected);
        prop_assert_eq!(harness.entries.iter().filter(|e| e.status == ApprovalStatus::Approved).count(), approvals_before);

        for other in harness.pending() {
            prop_assert!(harness.approve(other).unwrap_err().is_lost_race());
            prop_assert!(harness.reject(other).unwrap_err().is_lost_race());
        }
    }

    // =========================================================================
    // Manager fallback
    // =========================================================================

    /// Without a workflow the manager's single approval is final.
    #[test]
    fn prop_manager_fallback_single_approval(with_manager in any::<bool>()) {
        let manager = EmployeeId::new();
        let mut harness = Harness::draft(None, with_manager.then_some(manager));

        if with_manager {
            harness.submit().unwrap();
            prop_assert_eq!(harness.pending(), vec![manager]);
            prop_assert_eq!(harness.entries[0].step_order, Some(1));
            prop_assert!(harness.approve(manager).unwrap());
            prop_assert_eq!(harness.status, ReportStatus::Approved);
        } else {
            let is_unavailable = matches!(harness.submit(), Err(WorkflowError::NoApproverAvailable(_)));
            prop_assert!(is_unavailable);
            prop_assert!(harness.entries.is_empty());
            prop_assert_eq!(harness.status, ReportStatus::Draft);
        }
    }
}
