// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Closed role vocabulary. The route policy table is defined against this
/// set; adding a role means updating both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }

    pub fn parse(role: &str) -> Result<Role, RoleParseError> {
        match role.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "instructor" => Ok(Role::Instructor),
            "student" => Ok(Role::Student),
            other => Err(RoleParseError::new(format!("Unknown role '{}'", other))),
        }
    }
}

impl Default for Role {
    /// New accounts default to the lowest-privilege role.
    fn default() -> Self {
        Role::Student
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
pub struct RoleParseError {
    message: String,
}

impl RoleParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for RoleParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_roles() {
        assert_eq!(Role::parse("admin").expect("admin"), Role::Admin);
        assert_eq!(
            Role::parse(" Instructor ").expect("instructor"),
            Role::Instructor
        );
        assert_eq!(Role::parse("STUDENT").expect("student"), Role::Student);
    }

    #[test]
    fn parse_rejects_unknown_role() {
        let err = Role::parse("superuser").expect_err("unknown role");
        assert_eq!(err.to_string(), "Unknown role 'superuser'");
    }

    #[test]
    fn default_role_is_lowest_privilege() {
        assert_eq!(Role::default(), Role::Student);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Instructor).expect("serialize");
        assert_eq!(json, "\"instructor\"");
    }
}
