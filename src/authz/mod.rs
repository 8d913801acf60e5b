//! Authorization module - roles and the role policy table
//!
//! Roles are derived once from the department at registration and then
//! trusted from the signed token. Each workflow operation asks the policy
//! whether the caller's role may perform it; ownership is never checked here
//! because it travels inside the store's conditional statements.

mod policy;

pub use policy::{authorize, Action, Scope};

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Employee,
    Finance,
    Manager,
    Admin,
}

impl Role {
    /// Fixed department mapping applied at registration.
    pub fn from_department(department: &str) -> Self {
        match department.trim().to_lowercase().as_str() {
            "finance" => Role::Finance,
            "management" => Role::Manager,
            "admin" => Role::Admin,
            _ => Role::Employee,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "Employee",
            Role::Finance => "Finance",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Employee" => Some(Role::Employee),
            "Finance" => Some(Role::Finance),
            "Manager" => Some(Role::Manager),
            "Admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
