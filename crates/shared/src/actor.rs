//! The verified caller context handed to the approval engine.
//!
//! Authentication and session handling happen upstream; by the time an
//! `ActorContext` exists its fields are trusted as-is.

use serde::{Deserialize, Serialize};

use crate::types::{CompanyId, EmployeeId};

/// Role of an employee within their company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Submits their own expense reports.
    Employee = 0,
    /// May act as an approver.
    Manager = 1,
    /// Configures approval workflows.
    Admin = 2,
}

impl Role {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "employee" => Some(Self::Employee),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is acting, and on behalf of which company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// The acting employee.
    pub employee_id: EmployeeId,
    /// The company the actor is signed into.
    pub company_id: CompanyId,
    /// The actor's role in that company.
    pub role: Role,
}

impl ActorContext {
    /// Creates a new actor context.
    #[must_use]
    pub const fn new(employee_id: EmployeeId, company_id: CompanyId, role: Role) -> Self {
        Self {
            employee_id,
            company_id,
            role,
        }
    }

    /// Returns true if the actor may administer workflows.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("employee"), Some(Role::Employee));
        assert_eq!(Role::parse("MANAGER"), Some(Role::Manager));
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Employee, Role::Manager, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::Employee < Role::Manager);
        assert!(Role::Manager < Role::Admin);
    }

    #[test]
    fn test_only_admin_is_admin() {
        let employee = EmployeeId::new();
        let company = CompanyId::new();
        assert!(ActorContext::new(employee, company, Role::Admin).is_admin());
        assert!(!ActorContext::new(employee, company, Role::Manager).is_admin());
        assert!(!ActorContext::new(employee, company, Role::Employee).is_admin());
    }
}
