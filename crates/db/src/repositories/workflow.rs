//! Workflow repository for expense report approval.
//!
//! Each operation is one database transaction: the report row is locked,
//! its ledger and the currently bound workflow are read, the
//! `TransitionEngine` decides, and the resulting plan is written with guarded
//! updates. Any error drops the transaction, which rolls everything back.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use spendgate_core::workflow::{
    ActionContext, ApprovalOutcome, Assignment, Ledger, LedgerEntry, TransitionEngine,
    WorkflowError,
};
use spendgate_shared::ActorContext;
use spendgate_shared::types::{ApprovalRecordId, EmployeeId, ReportId};

use crate::entities::{
    employees, expense_reports, report_approvals,
    sea_orm_active_enums::{ApprovalStatus, ReportStatus},
};

use super::db_error;
use super::report::{current_status, load_approvals, lock_report};
use super::workflow_definition::load_bound;

/// Result of an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalResult {
    /// Whether this approval closed out the report.
    pub approved: bool,
    /// What the approval did to the chain or quorum.
    pub outcome: ApprovalOutcome,
}

/// A ledger entry waiting on the actor, with its report.
#[derive(Debug, Clone)]
pub struct PendingApproval {
    /// The submitted report.
    pub report: expense_reports::Model,
    /// The actor's pending entry on it.
    pub approval: report_approvals::Model,
}

/// Workflow repository for report state transitions.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submits a draft report for approval.
    ///
    /// Creates the initial ledger entries and flips the report to submitted
    /// in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Report is not found
    /// - Actor does not own the report
    /// - Report is not in draft status
    /// - No workflow is bound and the owner has no manager
    /// - Database operation fails
    pub async fn submit_report(
        &self,
        actor: &ActorContext,
        report_id: ReportId,
    ) -> Result<expense_reports::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let report = lock_report(&txn, actor.company_id, report_id).await?;
        let owner_id = EmployeeId::from(report.employee_id);
        TransitionEngine::ensure_submittable(actor.employee_id, owner_id, report.status.into())?;

        let owner = employees::Entity::find_by_id(report.employee_id)
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or(WorkflowError::EmployeeNotFound(owner_id))?;
        let workflow = load_bound(&txn, actor.company_id, owner_id).await?;

        let plan = TransitionEngine::submit(
            actor.employee_id,
            owner_id,
            report.status.into(),
            workflow,
            owner.manager_id.map(EmployeeId::from),
        )?;

        insert_pending(&txn, report_id, &plan.assignments, plan.submitted_at).await?;

        let submitted_at = plan.submitted_at.into();
        let updated = expense_reports::Entity::update_many()
            .set(expense_reports::ActiveModel {
                status: Set(ReportStatus::Submitted),
                submitted_at: Set(Some(submitted_at)),
                last_action_at: Set(submitted_at),
                ..Default::default()
            })
            .filter(expense_reports::Column::Id.eq(report_id.into_inner()))
            .filter(expense_reports::Column::Status.eq(ReportStatus::Draft))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        if updated.rows_affected == 0 {
            return Err(lost_race(&txn, report_id, "submit").await);
        }

        let report = reload(&txn, report_id).await?;
        txn.commit().await.map_err(db_error)?;

        info!(
            report_id = %report_id,
            employee_id = %owner_id,
            routing = plan.routing.kind(),
            approvers = plan.assignments.len(),
            "Expense report submitted"
        );
        Ok(report)
    }

    /// Records an approval and advances the report.
    ///
    /// The workflow bound to the owner is re-read now, not taken from
    /// submission time.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Report is not found
    /// - Report is not submitted (including a lost race)
    /// - Actor has no pending entry on the report
    /// - Database operation fails
    pub async fn approve_report(
        &self,
        actor: &ActorContext,
        report_id: ReportId,
        comments: Option<String>,
    ) -> Result<ApprovalResult, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let report = lock_report(&txn, actor.company_id, report_id).await?;
        let entries = load_ledger(&txn, report_id).await?;
        let workflow =
            load_bound(&txn, actor.company_id, EmployeeId::from(report.employee_id)).await?;

        let ctx = ActionContext {
            report_id,
            status: report.status.into(),
            ledger: Ledger::new(&entries),
            approver_id: actor.employee_id,
        };
        let plan = TransitionEngine::approve(ctx, workflow.as_ref(), comments)?;

        record_decision(
            &txn,
            report_id,
            plan.entry_id,
            plan.approver_id,
            ApprovalStatus::Approved,
            plan.comments.clone(),
            plan.acted_at,
        )
        .await?;

        match plan.outcome {
            ApprovalOutcome::FullyApproved => {
                close_report(
                    &txn,
                    report_id,
                    ReportStatus::Approved,
                    plan.approver_id,
                    plan.acted_at,
                    None,
                )
                .await?;
            }
            ApprovalOutcome::NextStepActivated(next) => {
                insert_pending(&txn, report_id, &[next], plan.acted_at).await?;
            }
            ApprovalOutcome::AwaitingNextStep(_) | ApprovalOutcome::QuorumPending { .. } => {}
        }

        txn.commit().await.map_err(db_error)?;

        match plan.outcome {
            ApprovalOutcome::FullyApproved => info!(
                report_id = %report_id,
                approver_id = %plan.approver_id,
                "Expense report fully approved"
            ),
            ApprovalOutcome::NextStepActivated(next) => info!(
                report_id = %report_id,
                approver_id = %plan.approver_id,
                next_approver_id = %next.approver_id,
                step_order = ?next.step_order,
                "Approval recorded, next step activated"
            ),
            ApprovalOutcome::AwaitingNextStep(next) => info!(
                report_id = %report_id,
                approver_id = %plan.approver_id,
                next_approver_id = %next,
                "Approval recorded, next approver already pending"
            ),
            ApprovalOutcome::QuorumPending {
                approved,
                roster_size,
            } => info!(
                report_id = %report_id,
                approver_id = %plan.approver_id,
                approved,
                roster_size,
                "Approval recorded, quorum not reached"
            ),
        }

        Ok(ApprovalResult {
            approved: plan.outcome.report_approved(),
            outcome: plan.outcome,
        })
    }

    /// Rejects a report. Final regardless of mode or prior approvals.
    ///
    /// Other pending entries are left as they are; the report status
    /// governs from here on.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Reason is blank
    /// - Report is not found
    /// - Report is not submitted (including a lost race)
    /// - Actor has no pending entry on the report
    /// - Database operation fails
    pub async fn reject_report(
        &self,
        actor: &ActorContext,
        report_id: ReportId,
        reason: &str,
    ) -> Result<expense_reports::Model, WorkflowError> {
        let reason = TransitionEngine::validate_reason(reason)?;

        let txn = self.db.begin().await.map_err(db_error)?;

        let report = lock_report(&txn, actor.company_id, report_id).await?;
        let entries = load_ledger(&txn, report_id).await?;

        let ctx = ActionContext {
            report_id,
            status: report.status.into(),
            ledger: Ledger::new(&entries),
            approver_id: actor.employee_id,
        };
        let plan = TransitionEngine::reject(ctx, reason)?;

        record_decision(
            &txn,
            report_id,
            plan.entry_id,
            plan.approver_id,
            ApprovalStatus::Rejected,
            Some(plan.reason.clone()),
            plan.acted_at,
        )
        .await?;
        close_report(
            &txn,
            report_id,
            ReportStatus::Rejected,
            plan.approver_id,
            plan.acted_at,
            Some(plan.reason),
        )
        .await?;

        let report = reload(&txn, report_id).await?;
        txn.commit().await.map_err(db_error)?;

        info!(
            report_id = %report_id,
            approver_id = %actor.employee_id,
            "Expense report rejected"
        );
        Ok(report)
    }

    /// Lists the reports waiting on the actor, oldest submission first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_pending_approvals(
        &self,
        actor: &ActorContext,
    ) -> Result<Vec<PendingApproval>, WorkflowError> {
        let rows = report_approvals::Entity::find()
            .find_also_related(expense_reports::Entity)
            .filter(report_approvals::Column::ApproverId.eq(actor.employee_id.into_inner()))
            .filter(report_approvals::Column::Status.eq(ApprovalStatus::Pending))
            .filter(expense_reports::Column::Status.eq(ReportStatus::Submitted))
            .filter(expense_reports::Column::CompanyId.eq(actor.company_id.into_inner()))
            .order_by_asc(expense_reports::Column::SubmittedAt)
            .order_by_asc(expense_reports::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|(approval, report)| report.map(|report| PendingApproval { report, approval }))
            .collect())
    }
}

async fn load_ledger(
    txn: &DatabaseTransaction,
    report_id: ReportId,
) -> Result<Vec<LedgerEntry>, WorkflowError> {
    Ok(load_approvals(txn, report_id)
        .await?
        .into_iter()
        .map(|row| LedgerEntry {
            id: ApprovalRecordId::from(row.id),
            approver_id: EmployeeId::from(row.approver_id),
            status: row.status.into(),
            step_order: row.step_order,
            comments: row.comments,
            action_at: row.action_at.map(|at| at.with_timezone(&Utc)),
        })
        .collect())
}

async fn insert_pending(
    txn: &DatabaseTransaction,
    report_id: ReportId,
    assignments: &[Assignment],
    at: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if assignments.is_empty() {
        return Ok(());
    }
    let rows = assignments.iter().map(|a| report_approvals::ActiveModel {
        id: Set(Uuid::now_v7()),
        report_id: Set(report_id.into_inner()),
        approver_id: Set(a.approver_id.into_inner()),
        status: Set(ApprovalStatus::Pending),
        step_order: Set(a.step_order),
        comments: Set(None),
        action_at: Set(None),
        created_at: Set(at.into()),
    });

    report_approvals::Entity::insert_many(rows)
        .exec_without_returning(txn)
        .await
        .map_err(db_error)?;
    Ok(())
}

/// Marks a ledger entry decided, only if it is still pending.
async fn record_decision(
    txn: &DatabaseTransaction,
    report_id: ReportId,
    entry_id: ApprovalRecordId,
    approver_id: EmployeeId,
    status: ApprovalStatus,
    comments: Option<String>,
    at: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    let result = report_approvals::Entity::update_many()
        .set(report_approvals::ActiveModel {
            status: Set(status),
            comments: Set(comments),
            action_at: Set(Some(at.into())),
            ..Default::default()
        })
        .filter(report_approvals::Column::Id.eq(entry_id.into_inner()))
        .filter(report_approvals::Column::Status.eq(ApprovalStatus::Pending))
        .exec(txn)
        .await
        .map_err(db_error)?;

    if result.rows_affected == 0 {
        warn!(report_id = %report_id, approver_id = %approver_id, "Ledger entry changed underneath");
        return Err(WorkflowError::NoPendingApproval {
            report_id,
            approver_id,
        });
    }
    Ok(())
}

/// Moves a submitted report to a terminal status.
async fn close_report(
    txn: &DatabaseTransaction,
    report_id: ReportId,
    status: ReportStatus,
    actor_id: EmployeeId,
    at: DateTime<Utc>,
    rejection_reason: Option<String>,
) -> Result<(), WorkflowError> {
    let mut changes = expense_reports::ActiveModel {
        status: Set(status),
        last_action_at: Set(at.into()),
        last_action_by_id: Set(Some(actor_id.into_inner())),
        ..Default::default()
    };
    if rejection_reason.is_some() {
        changes.rejection_reason = Set(rejection_reason);
    }

    let result = expense_reports::Entity::update_many()
        .set(changes)
        .filter(expense_reports::Column::Id.eq(report_id.into_inner()))
        .filter(expense_reports::Column::Status.eq(ReportStatus::Submitted))
        .exec(txn)
        .await
        .map_err(db_error)?;

    if result.rows_affected == 0 {
        let action = if status == ReportStatus::Rejected {
            "reject"
        } else {
            "approve"
        };
        return Err(lost_race(txn, report_id, action).await);
    }
    Ok(())
}

async fn lost_race(
    txn: &DatabaseTransaction,
    report_id: ReportId,
    action: &'static str,
) -> WorkflowError {
    match current_status(txn, report_id).await {
        Ok(status) => {
            warn!(report_id = %report_id, action, status = %status, "Report moved on before the update");
            WorkflowError::InvalidState { action, status }
        }
        Err(err) => err,
    }
}

async fn reload(
    txn: &DatabaseTransaction,
    report_id: ReportId,
) -> Result<expense_reports::Model, WorkflowError> {
    expense_reports::Entity::find_by_id(report_id.into_inner())
        .one(txn)
        .await
        .map_err(db_error)?
        .ok_or(WorkflowError::ReportNotFound(report_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{ActiveModelTrait, ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;

    use spendgate_core::report::NewExpense;
    use spendgate_core::workflow::ReportStatus as DomainStatus;
    use spendgate_shared::Role;
    use spendgate_shared::types::CompanyId;

    use crate::entities::{companies, sea_orm_active_enums::EmployeeRole};
    use crate::migration::Migrator;
    use crate::repositories::ReportRepository;

    struct Submitted {
        db: DatabaseConnection,
        company_id: CompanyId,
        manager: EmployeeId,
        report_id: ReportId,
    }

    async fn insert_employee(
        db: &DatabaseConnection,
        company_id: CompanyId,
        name: &str,
        role: Role,
        manager: Option<EmployeeId>,
    ) -> ActorContext {
        let id = Uuid::now_v7();
        employees::ActiveModel {
            id: Set(id),
            company_id: Set(company_id.into_inner()),
            full_name: Set(name.to_string()),
            email: Set(format!("{}@example.com", name.to_lowercase())),
            role: Set(EmployeeRole::from(role)),
            manager_id: Set(manager.map(EmployeeId::into_inner)),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
        .unwrap();
        ActorContext::new(EmployeeId::from(id), company_id, role)
    }

    /// A report submitted to its owner's manager, with one pending entry.
    async fn submitted() -> Submitted {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let company = companies::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set("Acme Travel".to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&db)
        .await
        .unwrap();
        let company_id = CompanyId::from(company.id);
        let manager = insert_employee(&db, company_id, "Mona", Role::Manager, None).await;
        let owner =
            insert_employee(&db, company_id, "Eli", Role::Employee, Some(manager.employee_id))
                .await;

        let reports = ReportRepository::new(db.clone());
        let report = reports.create_report(&owner, "Offsite").await.unwrap();
        let report_id = ReportId::from(report.id);
        let line = NewExpense {
            merchant: "Rail".to_string(),
            expense_date: Utc::now().date_naive(),
            amount: dec!(64.50),
            currency: "EUR".to_string(),
            category: None,
            description: None,
        };
        reports.add_expense(&owner, report_id, line).await.unwrap();
        WorkflowRepository::new(db.clone())
            .submit_report(&owner, report_id)
            .await
            .unwrap();

        Submitted {
            db,
            company_id,
            manager: manager.employee_id,
            report_id,
        }
    }

    async fn only_entry(db: &DatabaseConnection, report_id: ReportId) -> report_approvals::Model {
        let mut entries = report_approvals::Entity::find()
            .filter(report_approvals::Column::ReportId.eq(report_id.into_inner()))
            .all(db)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        entries.remove(0)
    }

    #[tokio::test]
    async fn test_lost_close_rolls_back_ledger_write() {
        let s = submitted().await;
        let entry = only_entry(&s.db, s.report_id).await;

        let txn = s.db.begin().await.unwrap();
        lock_report(&txn, s.company_id, s.report_id).await.unwrap();
        record_decision(
            &txn,
            s.report_id,
            ApprovalRecordId::from(entry.id),
            s.manager,
            ApprovalStatus::Approved,
            Some("Fine".to_string()),
            Utc::now(),
        )
        .await
        .unwrap();

        // Another transition got there first.
        expense_reports::Entity::update_many()
            .set(expense_reports::ActiveModel {
                status: Set(ReportStatus::Rejected),
                ..Default::default()
            })
            .filter(expense_reports::Column::Id.eq(s.report_id.into_inner()))
            .exec(&txn)
            .await
            .unwrap();

        let err = close_report(
            &txn,
            s.report_id,
            ReportStatus::Approved,
            s.manager,
            Utc::now(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidState {
                action: "approve",
                status: DomainStatus::Rejected,
            }
        ));
        assert!(err.is_lost_race());
        drop(txn);

        let entry = only_entry(&s.db, s.report_id).await;
        assert_eq!(entry.status, ApprovalStatus::Pending);
        assert!(entry.action_at.is_none());
        assert!(entry.comments.is_none());

        let report = expense_reports::Entity::find_by_id(s.report_id.into_inner())
            .one(&s.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.status, ReportStatus::Submitted);
        assert!(report.last_action_by_id.is_none());
    }

    #[tokio::test]
    async fn test_decided_entry_is_not_decided_again() {
        let s = submitted().await;
        let entry = only_entry(&s.db, s.report_id).await;
        let entry_id = ApprovalRecordId::from(entry.id);

        let txn = s.db.begin().await.unwrap();
        record_decision(
            &txn,
            s.report_id,
            entry_id,
            s.manager,
            ApprovalStatus::Approved,
            None,
            Utc::now(),
        )
        .await
        .unwrap();
        let err = record_decision(
            &txn,
            s.report_id,
            entry_id,
            s.manager,
            ApprovalStatus::Rejected,
            None,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::NoPendingApproval { .. }));
        txn.commit().await.unwrap();

        let entry = only_entry(&s.db, s.report_id).await;
        assert_eq!(entry.status, ApprovalStatus::Approved);
    }
}
