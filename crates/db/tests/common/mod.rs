//! Shared fixtures for repository integration tests.
//!
//! Most tests get their own in-memory `SQLite` database with the full
//! migration applied, so they are isolated and need no running server.
//! Tests that need real row locks and several pooled connections use the
//! Postgres database named by `DATABASE_URL` and are skipped without it.

#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tokio::sync::OnceCell;
use uuid::Uuid;

use spendgate_core::report::NewExpense;
use spendgate_core::workflow::{ApprovalMode, ApproverSlot, NewWorkflowDefinition};
use spendgate_db::entities::{companies, employees, sea_orm_active_enums::EmployeeRole};
use spendgate_db::migration::Migrator;
use spendgate_shared::types::{CompanyId, EmployeeId};
use spendgate_shared::{ActorContext, Role};

/// Opens a fresh migrated database.
pub async fn setup_db() -> DatabaseConnection {
    // One connection: an in-memory database lives and dies with it.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Postgres migrations run once per test binary.
static POSTGRES_MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Opens a pooled connection to the Postgres database in `DATABASE_URL`.
///
/// Returns `None` when the variable is unset so callers can skip.
pub async fn postgres_db() -> Option<DatabaseConnection> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        println!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };

    let mut options = ConnectOptions::new(url);
    options.max_connections(16).sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to connect to DATABASE_URL");

    POSTGRES_MIGRATED
        .get_or_init(|| async {
            Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
        })
        .await;
    Some(db)
}

/// Inserts a company.
pub async fn create_company(db: &DatabaseConnection, name: &str) -> CompanyId {
    let company = companies::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(name.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("Failed to create company");
    CompanyId::from(company.id)
}

/// Inserts an employee and returns the actor context for them.
pub async fn create_employee(
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
        email: Set(format!("{}.{}@example.com", name.to_lowercase(), id.simple())),
        role: Set(EmployeeRole::from(role)),
        manager_id: Set(manager.map(EmployeeId::into_inner)),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("Failed to create employee");

    ActorContext::new(EmployeeId::from(id), company_id, role)
}

/// A company with an admin, a manager, and an employee reporting to them.
pub struct Org {
    pub db: DatabaseConnection,
    pub company_id: CompanyId,
    pub admin: ActorContext,
    pub manager: ActorContext,
    pub employee: ActorContext,
}

impl Org {
    /// Seeds the basic org chart in a fresh in-memory database.
    pub async fn seed() -> Self {
        Self::seed_on(setup_db().await).await
    }

    /// Seeds the basic org chart as a new company in an existing database.
    pub async fn seed_on(db: DatabaseConnection) -> Self {
        let company_id = create_company(&db, "Acme Travel").await;
        let admin = create_employee(&db, company_id, "Ada", Role::Admin, None).await;
        let manager = create_employee(&db, company_id, "Mona", Role::Manager, None).await;
        let employee = create_employee(
            &db,
            company_id,
            "Eli",
            Role::Employee,
            Some(manager.employee_id),
        )
        .await;

        Self {
            db,
            company_id,
            admin,
            manager,
            employee,
        }
    }

    /// Adds another approver to the company.
    pub async fn approver(&self, name: &str) -> ActorContext {
        create_employee(&self.db, self.company_id, name, Role::Manager, None).await
    }

    /// Adds another employee with an optional manager.
    pub async fn employee_with_manager(
        &self,
        name: &str,
        manager: Option<EmployeeId>,
    ) -> ActorContext {
        create_employee(&self.db, self.company_id, name, Role::Employee, manager).await
    }
}

/// A sequential workflow over the approvers, stepping 1, 2, 3...
pub fn sequential(bound: EmployeeId, approvers: &[EmployeeId]) -> NewWorkflowDefinition {
    NewWorkflowDefinition {
        name: "Sequential review".to_string(),
        mode: ApprovalMode::Sequential,
        min_approval_percentage: None,
        bound_employee_id: Some(bound),
        approvers: approvers
            .iter()
            .zip(1..)
            .map(|(id, step)| ApproverSlot::at_step(*id, step))
            .collect(),
    }
}

/// A parallel workflow over the approvers with the given quorum.
pub fn parallel(bound: EmployeeId, approvers: &[EmployeeId], percent: i32) -> NewWorkflowDefinition {
    NewWorkflowDefinition {
        name: "Parallel review".to_string(),
        mode: ApprovalMode::Parallel,
        min_approval_percentage: Some(percent),
        bound_employee_id: Some(bound),
        approvers: approvers.iter().map(|id| ApproverSlot::unordered(*id)).collect(),
    }
}

/// A valid expense line.
pub fn expense(merchant: &str, amount: Decimal) -> NewExpense {
    NewExpense {
        merchant: merchant.to_string(),
        expense_date: Utc::now().date_naive(),
        amount,
        currency: "USD".to_string(),
        category: Some("travel".to_string()),
        description: None,
    }
}
