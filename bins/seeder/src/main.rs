//! Demo data seeder for Spendgate development.
//!
//! Applies pending migrations, then seeds one company with an admin, a
//! manager, three approvers and two employees. One employee is bound to a
//! sequential workflow and the other to a 60% parallel workflow; each gets a
//! draft report with a couple of expense lines.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use spendgate_core::report::NewExpense;
use spendgate_core::workflow::{ApprovalMode, ApproverSlot, NewWorkflowDefinition};
use spendgate_db::entities::{companies, employees, sea_orm_active_enums::EmployeeRole};
use spendgate_db::migration::Migrator;
use spendgate_db::{ReportRepository, WorkflowDefinitionRepository};
use spendgate_shared::config::LoggingConfig;
use spendgate_shared::types::{CompanyId, EmployeeId, ReportId};
use spendgate_shared::{ActorContext, AppConfig, Role};

/// Demo company ID, fixed so reruns can detect earlier seeds.
const DEMO_COMPANY_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let db = spendgate_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;

    Migrator::up(&db, None)
        .await
        .context("Failed to apply migrations")?;

    if companies::Entity::find_by_id(DEMO_COMPANY_ID)
        .one(&db)
        .await?
        .is_some()
    {
        info!(company_id = %DEMO_COMPANY_ID, "Demo company already seeded, nothing to do");
        return Ok(());
    }

    seed(&db).await?;
    info!("Seeding complete");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn seed(db: &DatabaseConnection) -> anyhow::Result<()> {
    let company_id = CompanyId::from(DEMO_COMPANY_ID);
    companies::ActiveModel {
        id: Set(DEMO_COMPANY_ID),
        name: Set("Acme Corp".to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;
    info!(company_id = %company_id, "Seeded demo company");

    let admin = employee(db, company_id, "Alice Admin", Role::Admin, None).await?;
    let manager = employee(db, company_id, "Marco Manager", Role::Manager, None).await?;
    let finance = employee(db, company_id, "Fiona Finance", Role::Manager, None).await?;
    let director = employee(db, company_id, "Dana Director", Role::Manager, None).await?;
    let legal = employee(db, company_id, "Lee Legal", Role::Manager, None).await?;
    let traveler = employee(
        db,
        company_id,
        "Tom Traveler",
        Role::Employee,
        Some(manager.employee_id),
    )
    .await?;
    let engineer = employee(
        db,
        company_id,
        "Erin Engineer",
        Role::Employee,
        Some(manager.employee_id),
    )
    .await?;

    let workflows = WorkflowDefinitionRepository::new(db.clone());
    workflows
        .create_workflow(
            &admin,
            NewWorkflowDefinition {
                name: "Travel sign-off".to_string(),
                mode: ApprovalMode::Sequential,
                min_approval_percentage: None,
                bound_employee_id: Some(traveler.employee_id),
                approvers: vec![
                    ApproverSlot::at_step(manager.employee_id, 1),
                    ApproverSlot::at_step(finance.employee_id, 2),
                    ApproverSlot::at_step(director.employee_id, 3),
                ],
            },
        )
        .await?;
    workflows
        .create_workflow(
            &admin,
            NewWorkflowDefinition {
                name: "Equipment committee".to_string(),
                mode: ApprovalMode::Parallel,
                min_approval_percentage: Some(60),
                bound_employee_id: Some(engineer.employee_id),
                approvers: vec![
                    ApproverSlot::unordered(finance.employee_id),
                    ApproverSlot::unordered(director.employee_id),
                    ApproverSlot::unordered(legal.employee_id),
                ],
            },
        )
        .await?;
    info!("Seeded approval workflows");

    let reports = ReportRepository::new(db.clone());
    draft(
        &reports,
        &traveler,
        "Lisbon customer visit",
        &[("TAP Air Portugal", dec!(342.80)), ("Hotel Avenida", dec!(519.00))],
    )
    .await?;
    draft(
        &reports,
        &engineer,
        "Home office setup",
        &[("Monitor Depot", dec!(289.99)), ("Desk Co", dec!(410.00))],
    )
    .await?;
    info!("Seeded draft reports");

    Ok(())
}

async fn employee(
    db: &DatabaseConnection,
    company_id: CompanyId,
    full_name: &str,
    role: Role,
    manager: Option<EmployeeId>,
) -> anyhow::Result<ActorContext> {
    let id = EmployeeId::new();
    let email = format!(
        "{}@acme.example",
        full_name.to_lowercase().replace(' ', ".")
    );

    employees::ActiveModel {
        id: Set(id.into_inner()),
        company_id: Set(company_id.into_inner()),
        full_name: Set(full_name.to_string()),
        email: Set(email),
        role: Set(EmployeeRole::from(role)),
        manager_id: Set(manager.map(EmployeeId::into_inner)),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .with_context(|| format!("Failed to seed employee {full_name}"))?;

    Ok(ActorContext::new(id, company_id, role))
}

async fn draft(
    reports: &ReportRepository,
    owner: &ActorContext,
    name: &str,
    lines: &[(&str, Decimal)],
) -> anyhow::Result<ReportId> {
    let report = reports.create_report(owner, name).await?;
    let report_id = ReportId::from(report.id);

    for (days_ago, (merchant, amount)) in (1..).zip(lines) {
        reports
            .add_expense(
                owner,
                report_id,
                NewExpense {
                    merchant: (*merchant).to_string(),
                    expense_date: (Utc::now() - Duration::days(days_ago)).date_naive(),
                    amount: *amount,
                    currency: "USD".to_string(),
                    category: None,
                    description: None,
                },
            )
            .await?;
    }
    Ok(report_id)
}
