//! Role-based access checks performed before the curriculum is touched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};

/// Platform role of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    #[default]
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Teacher => f.write_str("teacher"),
            Role::Student => f.write_str("student"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(format!(
                "unknown role '{other}' (expected admin, teacher or student)"
            )),
        }
    }
}

/// What the caller wants to do with the curriculum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Modify,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::View => f.write_str("view"),
            Action::Modify => f.write_str("modify"),
        }
    }
}

/// Access-control collaborator.
pub trait AccessPolicy: Send + Sync {
    fn allows(&self, role: Role, action: Action) -> bool;

    fn authorize(&self, role: Role, action: Action) -> ApplicationResult<()> {
        if self.allows(role, action) {
            Ok(())
        } else {
            Err(ApplicationError::PermissionDenied { role, action })
        }
    }
}

/// Everyone may view; admins and teachers may modify.
#[derive(Debug, Default)]
pub struct RolePolicy;

impl AccessPolicy for RolePolicy {
    fn allows(&self, role: Role, action: Action) -> bool {
        match action {
            Action::View => true,
            Action::Modify => matches!(role, Role::Admin | Role::Teacher),
        }
    }
}
