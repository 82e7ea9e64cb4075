//! Workflow definition repository.
//!
//! Admin-side storage of approval workflows and their approver rosters, plus
//! the per-employee lookup the engine uses at submission and approval time.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use spendgate_core::workflow::{
    ApprovalPolicy, ApproverRoster, ApproverSlot, NewWorkflowDefinition, ValidatedWorkflow,
    WorkflowDefinition, WorkflowError,
};
use spendgate_shared::ActorContext;
use spendgate_shared::types::{CompanyId, EmployeeId, WorkflowId};

use crate::entities::{approval_workflows, employees, workflow_approvers};

use super::db_error;

/// Repository for approval workflow definitions.
#[derive(Debug, Clone)]
pub struct WorkflowDefinitionRepository {
    db: DatabaseConnection,
}

impl WorkflowDefinitionRepository {
    /// Creates a new workflow definition repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a workflow and its roster in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The actor is not an admin
    /// - The definition fails validation
    /// - An approver or the bound employee is not in the company
    /// - The bound employee already has a workflow
    /// - Database operation fails
    pub async fn create_workflow(
        &self,
        actor: &ActorContext,
        input: NewWorkflowDefinition,
    ) -> Result<WorkflowDefinition, WorkflowError> {
        ensure_admin(actor)?;
        let validated = input.validate()?;

        let txn = self.db.begin().await.map_err(db_error)?;

        ensure_employees_exist(&txn, actor.company_id, &validated).await?;
        if let Some(employee_id) = validated.bound_employee_id {
            ensure_unbound(&txn, employee_id, None).await?;
        }

        let id = WorkflowId::new();
        let now = Utc::now().into();
        approval_workflows::ActiveModel {
            id: Set(id.into_inner()),
            company_id: Set(actor.company_id.into_inner()),
            name: Set(validated.name.clone()),
            mode: Set(validated.policy.mode().into()),
            min_approval_percentage: Set(validated
                .policy
                .min_approval_percentage()
                .map(i32::from)),
            bound_employee_id: Set(validated.bound_employee_id.map(EmployeeId::into_inner)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| binding_conflict(e, validated.bound_employee_id))?;

        insert_roster(&txn, id, &validated.roster).await?;

        txn.commit().await.map_err(db_error)?;

        info!(
            workflow_id = %id,
            mode = %validated.policy.mode(),
            approvers = validated.roster.len(),
            bound_employee_id = ?validated.bound_employee_id,
            "Approval workflow created"
        );

        Ok(WorkflowDefinition {
            id,
            company_id: actor.company_id,
            name: validated.name,
            policy: validated.policy,
            bound_employee_id: validated.bound_employee_id,
            roster: validated.roster,
        })
    }

    /// Replaces a workflow's settings and roster.
    ///
    /// Reports already in flight pick up the new definition on their next
    /// approval.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_workflow`], plus `WorkflowNotFound`.
    pub async fn update_workflow(
        &self,
        actor: &ActorContext,
        workflow_id: WorkflowId,
        input: NewWorkflowDefinition,
    ) -> Result<WorkflowDefinition, WorkflowError> {
        ensure_admin(actor)?;
        let validated = input.validate()?;

        let txn = self.db.begin().await.map_err(db_error)?;

        let existing = approval_workflows::Entity::find_by_id(workflow_id.into_inner())
            .filter(approval_workflows::Column::CompanyId.eq(actor.company_id.into_inner()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or(WorkflowError::WorkflowNotFound(workflow_id))?;

        ensure_employees_exist(&txn, actor.company_id, &validated).await?;
        if let Some(employee_id) = validated.bound_employee_id {
            ensure_unbound(&txn, employee_id, Some(workflow_id)).await?;
        }

        let mut active: approval_workflows::ActiveModel = existing.into();
        active.name = Set(validated.name.clone());
        active.mode = Set(validated.policy.mode().into());
        active.min_approval_percentage =
            Set(validated.policy.min_approval_percentage().map(i32::from));
        active.bound_employee_id = Set(validated.bound_employee_id.map(EmployeeId::into_inner));
        active.updated_at = Set(Utc::now().into());
        active
            .update(&txn)
            .await
            .map_err(|e| binding_conflict(e, validated.bound_employee_id))?;

        workflow_approvers::Entity::delete_many()
            .filter(workflow_approvers::Column::WorkflowId.eq(workflow_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        insert_roster(&txn, workflow_id, &validated.roster).await?;

        txn.commit().await.map_err(db_error)?;

        info!(
            workflow_id = %workflow_id,
            mode = %validated.policy.mode(),
            approvers = validated.roster.len(),
            "Approval workflow updated"
        );

        Ok(WorkflowDefinition {
            id: workflow_id,
            company_id: actor.company_id,
            name: validated.name,
            policy: validated.policy,
            bound_employee_id: validated.bound_employee_id,
            roster: validated.roster,
        })
    }

    /// Deletes a workflow and its roster.
    ///
    /// Employees it was bound to fall back to manager routing.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an admin, the workflow does not
    /// exist, or the database operation fails.
    pub async fn delete_workflow(
        &self,
        actor: &ActorContext,
        workflow_id: WorkflowId,
    ) -> Result<(), WorkflowError> {
        ensure_admin(actor)?;

        let txn = self.db.begin().await.map_err(db_error)?;

        let existing = approval_workflows::Entity::find_by_id(workflow_id.into_inner())
            .filter(approval_workflows::Column::CompanyId.eq(actor.company_id.into_inner()))
            .one(&txn)
            .await
            .map_err(db_error)?;
        if existing.is_none() {
            return Err(WorkflowError::WorkflowNotFound(workflow_id));
        }

        workflow_approvers::Entity::delete_many()
            .filter(workflow_approvers::Column::WorkflowId.eq(workflow_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        approval_workflows::Entity::delete_by_id(workflow_id.into_inner())
            .exec(&txn)
            .await
            .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        info!(workflow_id = %workflow_id, "Approval workflow deleted");
        Ok(())
    }

    /// Fetches one workflow of a company.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowNotFound` if it does not exist in the company.
    pub async fn get_workflow(
        &self,
        company_id: CompanyId,
        workflow_id: WorkflowId,
    ) -> Result<WorkflowDefinition, WorkflowError> {
        let model = approval_workflows::Entity::find_by_id(workflow_id.into_inner())
            .filter(approval_workflows::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or(WorkflowError::WorkflowNotFound(workflow_id))?;

        let approvers = load_approvers(&self.db, &[model.id]).await?;
        to_definition(model, approvers)
    }

    /// Lists every workflow of a company, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_workflows(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<WorkflowDefinition>, WorkflowError> {
        let models = approval_workflows::Entity::find()
            .filter(approval_workflows::Column::CompanyId.eq(company_id.into_inner()))
            .order_by_asc(approval_workflows::Column::Name)
            .order_by_asc(approval_workflows::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut by_workflow: HashMap<Uuid, Vec<workflow_approvers::Model>> = HashMap::new();
        for approver in load_approvers(&self.db, &ids).await? {
            by_workflow
                .entry(approver.workflow_id)
                .or_default()
                .push(approver);
        }

        models
            .into_iter()
            .map(|model| {
                let approvers = by_workflow.remove(&model.id).unwrap_or_default();
                to_definition(model, approvers)
            })
            .collect()
    }

    /// Returns the workflow bound to an employee, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn find_bound_to(
        &self,
        company_id: CompanyId,
        employee_id: EmployeeId,
    ) -> Result<Option<WorkflowDefinition>, WorkflowError> {
        load_bound(&self.db, company_id, employee_id).await
    }
}

/// Loads the workflow bound to `employee_id` through any connection.
///
/// The transition repositories call this inside their own transaction so the
/// definition is read in the same unit of work as the ledger.
pub(crate) async fn load_bound<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    employee_id: EmployeeId,
) -> Result<Option<WorkflowDefinition>, WorkflowError> {
    let model = approval_workflows::Entity::find()
        .filter(approval_workflows::Column::CompanyId.eq(company_id.into_inner()))
        .filter(approval_workflows::Column::BoundEmployeeId.eq(employee_id.into_inner()))
        .one(conn)
        .await
        .map_err(db_error)?;

    match model {
        Some(model) => {
            let approvers = load_approvers(conn, &[model.id]).await?;
            to_definition(model, approvers).map(Some)
        }
        None => Ok(None),
    }
}

async fn load_approvers<C: ConnectionTrait>(
    conn: &C,
    workflow_ids: &[Uuid],
) -> Result<Vec<workflow_approvers::Model>, WorkflowError> {
    if workflow_ids.is_empty() {
        return Ok(Vec::new());
    }
    workflow_approvers::Entity::find()
        .filter(workflow_approvers::Column::WorkflowId.is_in(workflow_ids.iter().copied()))
        .all(conn)
        .await
        .map_err(db_error)
}

fn to_definition(
    model: approval_workflows::Model,
    approvers: Vec<workflow_approvers::Model>,
) -> Result<WorkflowDefinition, WorkflowError> {
    let policy = ApprovalPolicy::from_parts(model.mode.into(), model.min_approval_percentage)
        .map_err(|e| WorkflowError::Database(format!("Workflow {} is malformed: {e}", model.id)))?;

    let roster = ApproverRoster::new(
        approvers
            .into_iter()
            .map(|a| ApproverSlot {
                approver_id: EmployeeId::from(a.approver_id),
                step_order: a.step_order,
            })
            .collect(),
    );

    Ok(WorkflowDefinition {
        id: WorkflowId::from(model.id),
        company_id: CompanyId::from(model.company_id),
        name: model.name,
        policy,
        bound_employee_id: model.bound_employee_id.map(EmployeeId::from),
        roster,
    })
}

fn ensure_admin(actor: &ActorContext) -> Result<(), WorkflowError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(WorkflowError::Forbidden(
            "Only admins can manage approval workflows".to_string(),
        ))
    }
}

/// Every approver and the bound employee must belong to the company.
async fn ensure_employees_exist(
    txn: &DatabaseTransaction,
    company_id: CompanyId,
    workflow: &ValidatedWorkflow,
) -> Result<(), WorkflowError> {
    let wanted: Vec<EmployeeId> = workflow
        .roster
        .iter()
        .map(|slot| slot.approver_id)
        .chain(workflow.bound_employee_id)
        .collect();

    let found: HashSet<Uuid> = employees::Entity::find()
        .select_only()
        .column(employees::Column::Id)
        .filter(employees::Column::CompanyId.eq(company_id.into_inner()))
        .filter(employees::Column::Id.is_in(wanted.iter().map(|id| id.into_inner())))
        .into_tuple::<Uuid>()
        .all(txn)
        .await
        .map_err(db_error)?
        .into_iter()
        .collect();

    match wanted.into_iter().find(|id| !found.contains(&id.into_inner())) {
        Some(missing) => Err(WorkflowError::EmployeeNotFound(missing)),
        None => Ok(()),
    }
}

async fn ensure_unbound(
    txn: &DatabaseTransaction,
    employee_id: EmployeeId,
    except: Option<WorkflowId>,
) -> Result<(), WorkflowError> {
    let mut query = approval_workflows::Entity::find()
        .filter(approval_workflows::Column::BoundEmployeeId.eq(employee_id.into_inner()));
    if let Some(except) = except {
        query = query.filter(approval_workflows::Column::Id.ne(except.into_inner()));
    }

    let bound = query.one(txn).await.map_err(db_error)?;
    if bound.is_some() {
        return Err(WorkflowError::WorkflowAlreadyBound(employee_id));
    }
    Ok(())
}

async fn insert_roster(
    txn: &DatabaseTransaction,
    workflow_id: WorkflowId,
    roster: &ApproverRoster,
) -> Result<(), WorkflowError> {
    let rows: Vec<workflow_approvers::ActiveModel> = roster
        .iter()
        .map(|slot| workflow_approvers::ActiveModel {
            id: Set(Uuid::now_v7()),
            workflow_id: Set(workflow_id.into_inner()),
            approver_id: Set(slot.approver_id.into_inner()),
            step_order: Set(slot.step_order),
        })
        .collect();

    if rows.is_empty() {
        return Ok(());
    }
    workflow_approvers::Entity::insert_many(rows)
        .exec_without_returning(txn)
        .await
        .map_err(db_error)?;
    Ok(())
}

/// A concurrent binding of the same employee surfaces as a unique violation.
fn binding_conflict(err: sea_orm::DbErr, employee_id: Option<EmployeeId>) -> WorkflowError {
    match (err.sql_err(), employee_id) {
        (Some(SqlErr::UniqueConstraintViolation(_)), Some(employee_id)) => {
            WorkflowError::WorkflowAlreadyBound(employee_id)
        }
        _ => db_error(err),
    }
}
