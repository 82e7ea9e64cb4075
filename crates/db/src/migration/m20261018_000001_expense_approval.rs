//! Initial schema for expense reports and their approval workflow.
//!
//! Built with the schema builder so the same migration runs on Postgres and
//! on the SQLite databases used by the integration tests.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: DIRECTORY
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Companies::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Companies::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Companies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Employees::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Employees::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Employees::FullName).string_len(200).not_null())
                    .col(ColumnDef::new(Employees::Email).string_len(320).not_null())
                    .col(ColumnDef::new(Employees::Role).string_len(16).not_null())
                    .col(ColumnDef::new(Employees::ManagerId).uuid().null())
                    .col(
                        ColumnDef::new(Employees::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_company")
                            .from(Employees::Table, Employees::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_manager")
                            .from(Employees::Table, Employees::ManagerId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .check(Expr::col(Employees::ManagerId).ne(Expr::col(Employees::Id)))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_employees_company_email")
                    .table(Employees::Table)
                    .col(Employees::CompanyId)
                    .col(Employees::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 2: WORKFLOW DEFINITIONS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ApprovalWorkflows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalWorkflows::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApprovalWorkflows::CompanyId).uuid().not_null())
                    .col(
                        ColumnDef::new(ApprovalWorkflows::Name)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalWorkflows::Mode)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalWorkflows::MinApprovalPercentage)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalWorkflows::BoundEmployeeId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalWorkflows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalWorkflows::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_workflows_company")
                            .from(ApprovalWorkflows::Table, ApprovalWorkflows::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_workflows_employee")
                            .from(ApprovalWorkflows::Table, ApprovalWorkflows::BoundEmployeeId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .check(Expr::col(ApprovalWorkflows::MinApprovalPercentage).between(0, 100))
                    .to_owned(),
            )
            .await?;

        // At most one workflow per employee
        manager
            .create_index(
                Index::create()
                    .name("idx_approval_workflows_bound_employee")
                    .table(ApprovalWorkflows::Table)
                    .col(ApprovalWorkflows::BoundEmployeeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WorkflowApprovers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkflowApprovers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WorkflowApprovers::WorkflowId).uuid().not_null())
                    .col(ColumnDef::new(WorkflowApprovers::ApproverId).uuid().not_null())
                    .col(ColumnDef::new(WorkflowApprovers::StepOrder).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_approvers_workflow")
                            .from(WorkflowApprovers::Table, WorkflowApprovers::WorkflowId)
                            .to(ApprovalWorkflows::Table, ApprovalWorkflows::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_approvers_employee")
                            .from(WorkflowApprovers::Table, WorkflowApprovers::ApproverId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workflow_approvers_unique")
                    .table(WorkflowApprovers::Table)
                    .col(WorkflowApprovers::WorkflowId)
                    .col(WorkflowApprovers::ApproverId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 3: REPORTS AND LEDGER
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ExpenseReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseReports::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpenseReports::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(ExpenseReports::EmployeeId).uuid().not_null())
                    .col(ColumnDef::new(ExpenseReports::Name).string_len(200).not_null())
                    .col(ColumnDef::new(ExpenseReports::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(ExpenseReports::SubmittedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseReports::LastActionAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpenseReports::LastActionById).uuid().null())
                    .col(ColumnDef::new(ExpenseReports::RejectionReason).text().null())
                    .col(
                        ColumnDef::new(ExpenseReports::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_reports_company")
                            .from(ExpenseReports::Table, ExpenseReports::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_reports_employee")
                            .from(ExpenseReports::Table, ExpenseReports::EmployeeId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expense_reports_employee")
                    .table(ExpenseReports::Table)
                    .col(ExpenseReports::EmployeeId)
                    .col(ExpenseReports::LastActionAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::ReportId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::Merchant).string_len(200).not_null())
                    .col(ColumnDef::new(Expenses::ExpenseDate).date().not_null())
                    // SQLite caps decimal precision at 16
                    .col(ColumnDef::new(Expenses::Amount).decimal_len(16, 4).not_null())
                    .col(ColumnDef::new(Expenses::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Expenses::Category).string_len(100).null())
                    .col(ColumnDef::new(Expenses::Description).text().null())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_report")
                            .from(Expenses::Table, Expenses::ReportId)
                            .to(ExpenseReports::Table, ExpenseReports::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_report")
                    .table(Expenses::Table)
                    .col(Expenses::ReportId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReportApprovals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportApprovals::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportApprovals::ReportId).uuid().not_null())
                    .col(ColumnDef::new(ReportApprovals::ApproverId).uuid().not_null())
                    .col(ColumnDef::new(ReportApprovals::Status).string_len(16).not_null())
                    .col(ColumnDef::new(ReportApprovals::StepOrder).integer().null())
                    .col(ColumnDef::new(ReportApprovals::Comments).text().null())
                    .col(
                        ColumnDef::new(ReportApprovals::ActionAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReportApprovals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_approvals_report")
                            .from(ReportApprovals::Table, ReportApprovals::ReportId)
                            .to(ExpenseReports::Table, ExpenseReports::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_approvals_approver")
                            .from(ReportApprovals::Table, ReportApprovals::ApproverId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One ledger entry per approver per report
        manager
            .create_index(
                Index::create()
                    .name("idx_report_approvals_unique")
                    .table(ReportApprovals::Table)
                    .col(ReportApprovals::ReportId)
                    .col(ReportApprovals::ApproverId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Pending inbox lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_report_approvals_approver_status")
                    .table(ReportApprovals::Table)
                    .col(ReportApprovals::ApproverId)
                    .col(ReportApprovals::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportApprovals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseReports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkflowApprovers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalWorkflows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    CompanyId,
    FullName,
    Email,
    Role,
    ManagerId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ApprovalWorkflows {
    Table,
    Id,
    CompanyId,
    Name,
    Mode,
    MinApprovalPercentage,
    BoundEmployeeId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WorkflowApprovers {
    Table,
    Id,
    WorkflowId,
    ApproverId,
    StepOrder,
}

#[derive(DeriveIden)]
enum ExpenseReports {
    Table,
    Id,
    CompanyId,
    EmployeeId,
    Name,
    Status,
    SubmittedAt,
    LastActionAt,
    LastActionById,
    RejectionReason,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    ReportId,
    Merchant,
    ExpenseDate,
    Amount,
    Currency,
    Category,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ReportApprovals {
    Table,
    Id,
    ReportId,
    ApproverId,
    Status,
    StepOrder,
    Comments,
    ActionAt,
    CreatedAt,
}
