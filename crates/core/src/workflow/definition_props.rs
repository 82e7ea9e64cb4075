//! Property-based tests for workflow definitions.

use proptest::prelude::*;
use spendgate_shared::types::EmployeeId;

use crate::workflow::definition::{
    ApprovalThreshold, ApproverRoster, ApproverSlot, NewWorkflowDefinition,
};
use crate::workflow::types::ApprovalMode;

/// Random step orders, possibly repeated, possibly missing.
fn arb_slots() -> impl Strategy<Value = Vec<Option<i32>>> {
    prop::collection::vec(prop::option::weighted(0.8, -5i32..50), 0..12)
}

fn roster_from(steps: &[Option<i32>]) -> ApproverRoster {
    ApproverRoster::new(
        steps
            .iter()
            .map(|step| ApproverSlot {
                approver_id: EmployeeId::new(),
                step_order: *step,
            })
            .collect(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The roster is ascending by step with unordered slots last.
    #[test]
    fn prop_roster_is_sorted(steps in arb_slots()) {
        let roster = roster_from(&steps);
        let sorted: Vec<_> = roster.iter().map(|s| s.step_order).collect();

        prop_assert_eq!(sorted.len(), steps.len());
        for pair in sorted.windows(2) {
            match (pair[0], pair[1]) {
                (Some(a), Some(b)) => prop_assert!(a <= b),
                (None, Some(_)) => prop_assert!(false, "unordered slot before an ordered one"),
                _ => {}
            }
        }
    }

    /// `next_after` returns the smallest step strictly greater than the
    /// given one.
    #[test]
    fn prop_next_after_is_smallest_greater(steps in arb_slots(), after in -10i32..60) {
        let roster = roster_from(&steps);
        let expected = steps.iter().flatten().copied().filter(|s| *s > after).min();

        prop_assert_eq!(roster.next_after(Some(after)).and_then(|s| s.step_order), expected);
        prop_assert!(roster.next_after(None).is_none());
    }

    /// Quorum is monotonic in approvals and always reached by everyone.
    #[test]
    fn prop_threshold_monotonic(percent in 0i32..=100, roster in 1usize..50) {
        let threshold = ApprovalThreshold::new(percent).unwrap();

        prop_assert!(threshold.is_met(roster, roster));
        prop_assert_eq!(threshold.is_met(0, roster), percent == 0);
        for approved in 0..roster {
            if threshold.is_met(approved, roster) {
                prop_assert!(threshold.is_met(approved + 1, roster));
            }
        }
    }

    /// Sequential definitions with distinct positive steps always validate,
    /// and the head of the chain is the smallest step.
    #[test]
    fn prop_sequential_with_distinct_steps_validates(
        steps in prop::collection::hash_set(1i32..500, 1..10)
    ) {
        let approvers: Vec<_> = steps
            .iter()
            .map(|step| ApproverSlot::at_step(EmployeeId::new(), *step))
            .collect();
        let input = NewWorkflowDefinition {
            name: "Chain".to_string(),
            mode: ApprovalMode::Sequential,
            min_approval_percentage: None,
            bound_employee_id: None,
            approvers,
        };

        let validated = input.validate().unwrap();
        prop_assert_eq!(validated.roster.len(), steps.len());
        prop_assert_eq!(
            validated.roster.first().and_then(|s| s.step_order),
            steps.iter().min().copied()
        );
    }

    /// Parallel percentages outside `0..=100` are refused.
    #[test]
    fn prop_parallel_percentage_range(percent in -200i32..300) {
        let input = NewWorkflowDefinition {
            name: "Quorum".to_string(),
            mode: ApprovalMode::Parallel,
            min_approval_percentage: Some(percent),
            bound_employee_id: None,
            approvers: vec![ApproverSlot::unordered(EmployeeId::new())],
        };
        prop_assert_eq!(input.validate().is_ok(), (0..=100).contains(&percent));
    }
}
