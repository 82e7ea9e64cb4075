//! Expense report repository.
//!
//! Draft-side operations: creating reports, adding expense lines, and the
//! read models the owner and approvers see.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use spendgate_core::report::{NewExpense, ensure_editable, validate_report_name};
use spendgate_core::workflow::{ReportStatus, WorkflowError};
use spendgate_shared::ActorContext;
use spendgate_shared::types::{
    CompanyId, EmployeeId, ExpenseId, PageRequest, PageResponse, ReportId,
};

use crate::entities::{
    expense_reports, expenses, report_approvals,
    sea_orm_active_enums::ReportStatus as DbReportStatus,
};

use super::db_error;

/// A report with its expense lines and approval ledger.
#[derive(Debug, Clone)]
pub struct ReportDetail {
    /// The report itself.
    pub report: expense_reports::Model,
    /// Expense lines, oldest first.
    pub expenses: Vec<expenses::Model>,
    /// Ledger entries, in activation order.
    pub approvals: Vec<report_approvals::Model>,
}

/// Repository for expense reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft report owned by the actor.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the database operation fails.
    pub async fn create_report(
        &self,
        actor: &ActorContext,
        name: &str,
    ) -> Result<expense_reports::Model, WorkflowError> {
        let name = validate_report_name(name)?;
        let now = Utc::now().into();

        let report = expense_reports::ActiveModel {
            id: Set(ReportId::new().into_inner()),
            company_id: Set(actor.company_id.into_inner()),
            employee_id: Set(actor.employee_id.into_inner()),
            name: Set(name),
            status: Set(DbReportStatus::Draft),
            submitted_at: Set(None),
            last_action_at: Set(now),
            last_action_by_id: Set(None),
            rejection_reason: Set(None),
            created_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(db_error)?;

        info!(report_id = %report.id, employee_id = %actor.employee_id, "Expense report created");
        Ok(report)
    }

    /// Adds an expense line to a draft report.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Report is not found
    /// - Actor does not own the report
    /// - Report is no longer a draft
    /// - The expense fails validation
    /// - Database operation fails
    pub async fn add_expense(
        &self,
        actor: &ActorContext,
        report_id: ReportId,
        input: NewExpense,
    ) -> Result<expenses::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let report = lock_report(&txn, actor.company_id, report_id).await?;
        ensure_editable(
            actor.employee_id,
            EmployeeId::from(report.employee_id),
            report.status.into(),
        )?;
        let expense = input.validate()?;

        let now = Utc::now().into();
        let created = expenses::ActiveModel {
            id: Set(ExpenseId::new().into_inner()),
            report_id: Set(report.id),
            merchant: Set(expense.merchant),
            expense_date: Set(expense.expense_date),
            amount: Set(expense.amount.amount),
            currency: Set(expense.amount.currency.as_str().to_string()),
            category: Set(expense.category),
            description: Set(expense.description),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_error)?;

        let mut active: expense_reports::ActiveModel = report.into();
        active.last_action_at = Set(now);
        active.update(&txn).await.map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        info!(
            report_id = %report_id,
            expense_id = %created.id,
            amount = %created.amount,
            currency = %created.currency,
            "Expense added"
        );
        Ok(created)
    }

    /// Fetches a report with its expenses and ledger.
    ///
    /// Visible to the owner and to every employee holding a ledger entry on it.
    ///
    /// # Errors
    ///
    /// Returns `ReportNotFound`, `Forbidden`, or a database error.
    pub async fn get_report(
        &self,
        actor: &ActorContext,
        report_id: ReportId,
    ) -> Result<ReportDetail, WorkflowError> {
        let report = expense_reports::Entity::find_by_id(report_id.into_inner())
            .filter(expense_reports::Column::CompanyId.eq(actor.company_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or(WorkflowError::ReportNotFound(report_id))?;

        let approvals = load_approvals(&self.db, report_id).await?;

        let actor_id = actor.employee_id.into_inner();
        let visible =
            report.employee_id == actor_id || approvals.iter().any(|a| a.approver_id == actor_id);
        if !visible {
            return Err(WorkflowError::Forbidden(
                "Report is not visible to this employee".to_string(),
            ));
        }

        let expenses = expenses::Entity::find()
            .filter(expenses::Column::ReportId.eq(report_id.into_inner()))
            .order_by_asc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(ReportDetail {
            report,
            expenses,
            approvals,
        })
    }

    /// Lists the actor's own reports, most recent action first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_reports(
        &self,
        actor: &ActorContext,
        page: PageRequest,
    ) -> Result<PageResponse<expense_reports::Model>, WorkflowError> {
        let query = expense_reports::Entity::find()
            .filter(expense_reports::Column::CompanyId.eq(actor.company_id.into_inner()))
            .filter(expense_reports::Column::EmployeeId.eq(actor.employee_id.into_inner()));

        let total = query.clone().count(&self.db).await.map_err(db_error)?;

        let reports = query
            .order_by_desc(expense_reports::Column::LastActionAt)
            .order_by_desc(expense_reports::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(PageResponse::new(reports, &page, total))
    }
}

/// Loads a report of the company, locking its row until the transaction ends.
///
/// Every transition on a report starts here, which serializes concurrent
/// actions on the same report.
pub(crate) async fn lock_report(
    txn: &DatabaseTransaction,
    company_id: CompanyId,
    report_id: ReportId,
) -> Result<expense_reports::Model, WorkflowError> {
    expense_reports::Entity::find_by_id(report_id.into_inner())
        .filter(expense_reports::Column::CompanyId.eq(company_id.into_inner()))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_error)?
        .ok_or(WorkflowError::ReportNotFound(report_id))
}

/// Re-reads a report's status after a guarded update matched nothing.
pub(crate) async fn current_status(
    txn: &DatabaseTransaction,
    report_id: ReportId,
) -> Result<ReportStatus, WorkflowError> {
    expense_reports::Entity::find_by_id(report_id.into_inner())
        .one(txn)
        .await
        .map_err(db_error)?
        .map(|report| report.status.into())
        .ok_or(WorkflowError::ReportNotFound(report_id))
}

/// Loads a report's ledger in activation order.
pub(crate) async fn load_approvals<C: ConnectionTrait>(
    conn: &C,
    report_id: ReportId,
) -> Result<Vec<report_approvals::Model>, WorkflowError> {
    report_approvals::Entity::find()
        .filter(report_approvals::Column::ReportId.eq(report_id.into_inner()))
        .order_by_asc(report_approvals::Column::CreatedAt)
        .order_by_asc(report_approvals::Column::Id)
        .all(conn)
        .await
        .map_err(db_error)
}
