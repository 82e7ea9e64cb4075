//! `SeaORM` entity definitions.

pub mod prelude;

pub mod approval_workflows;
pub mod companies;
pub mod employees;
pub mod expense_reports;
pub mod expenses;
pub mod report_approvals;
pub mod sea_orm_active_enums;
pub mod workflow_approvers;
