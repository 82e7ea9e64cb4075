//! String-backed enums stored in the database.
//!
//! Each mirrors a `spendgate-core` or `spendgate-shared` type; the `From`
//! impls below are the only place the two representations meet.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use spendgate_core::workflow::types as domain;
use spendgate_shared::Role;

/// Expense report status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Being assembled.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Waiting on approvers.
    #[sea_orm(string_value = "submitted")]
    Submitted,
    /// Fully approved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Ledger entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Awaiting the approver.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Signed off.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Turned down.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Workflow approval mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalMode {
    /// One step at a time.
    #[sea_orm(string_value = "sequential")]
    Sequential,
    /// Everyone at once, percentage quorum.
    #[sea_orm(string_value = "parallel")]
    Parallel,
}

/// Employee role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EmployeeRole {
    /// Files reports.
    #[sea_orm(string_value = "employee")]
    Employee,
    /// Manages other employees.
    #[sea_orm(string_value = "manager")]
    Manager,
    /// Configures workflows.
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl From<ReportStatus> for domain::ReportStatus {
    fn from(status: ReportStatus) -> Self {
        match status {
            ReportStatus::Draft => Self::Draft,
            ReportStatus::Submitted => Self::Submitted,
            ReportStatus::Approved => Self::Approved,
            ReportStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<domain::ReportStatus> for ReportStatus {
    fn from(status: domain::ReportStatus) -> Self {
        match status {
            domain::ReportStatus::Draft => Self::Draft,
            domain::ReportStatus::Submitted => Self::Submitted,
            domain::ReportStatus::Approved => Self::Approved,
            domain::ReportStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<ApprovalStatus> for domain::ApprovalStatus {
    fn from(status: ApprovalStatus) -> Self {
        match status {
            ApprovalStatus::Pending => Self::Pending,
            ApprovalStatus::Approved => Self::Approved,
            ApprovalStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<ApprovalMode> for domain::ApprovalMode {
    fn from(mode: ApprovalMode) -> Self {
        match mode {
            ApprovalMode::Sequential => Self::Sequential,
            ApprovalMode::Parallel => Self::Parallel,
        }
    }
}

impl From<domain::ApprovalMode> for ApprovalMode {
    fn from(mode: domain::ApprovalMode) -> Self {
        match mode {
            domain::ApprovalMode::Sequential => Self::Sequential,
            domain::ApprovalMode::Parallel => Self::Parallel,
        }
    }
}

impl From<EmployeeRole> for Role {
    fn from(role: EmployeeRole) -> Self {
        match role {
            EmployeeRole::Employee => Self::Employee,
            EmployeeRole::Manager => Self::Manager,
            EmployeeRole::Admin => Self::Admin,
        }
    }
}

impl From<Role> for EmployeeRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Employee => Self::Employee,
            Role::Manager => Self::Manager,
            Role::Admin => Self::Admin,
        }
    }
}
