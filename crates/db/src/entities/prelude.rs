//! Entity re-exports.

pub use super::approval_workflows::Entity as ApprovalWorkflows;
pub use super::companies::Entity as Companies;
pub use super::employees::Entity as Employees;
pub use super::expense_reports::Entity as ExpenseReports;
pub use super::expenses::Entity as Expenses;
pub use super::report_approvals::Entity as ReportApprovals;
pub use super::workflow_approvers::Entity as WorkflowApprovers;
