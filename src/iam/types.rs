// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::roles::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Account {
    pub username: String,
    pub email: String,
    /// PHC-format hash. Never the plaintext.
    pub password_hash: String,
    pub role: Role,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email_verified: bool,
}

// Structure matching the users.yaml file format; the username is the map key.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YamlAccount {
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

impl YamlAccount {
    pub fn into_account(self, username: String) -> Account {
        Account {
            username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            full_name: self.full_name,
            avatar_url: self.avatar_url,
            gender: self.gender,
            phone: self.phone,
            email_verified: self.email_verified,
        }
    }

    pub fn from_account(account: &Account) -> Self {
        Self {
            email: account.email.clone(),
            password_hash: account.password_hash.clone(),
            role: account.role,
            full_name: account.full_name.clone(),
            avatar_url: account.avatar_url.clone(),
            gender: account.gender.clone(),
            phone: account.phone.clone(),
            email_verified: account.email_verified,
        }
    }
}

#[derive(Debug, Clone)]
pub enum IamError {
    AccountNotFound(String),
    UsernameTaken(String),
    EmailTaken(String),
    ServiceNotInitialized,
    ConfigurationError(String),
    FileError(String),
    ParseError(String),
}

impl std::fmt::Display for IamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IamError::AccountNotFound(username) => write!(f, "Account not found: {}", username),
            IamError::UsernameTaken(username) => {
                write!(f, "Username already exists: {}", username)
            }
            IamError::EmailTaken(email) => write!(f, "Email already exists: {}", email),
            IamError::ServiceNotInitialized => write!(f, "IAM service not initialized"),
            IamError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            IamError::FileError(msg) => write!(f, "File error: {}", msg),
            IamError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for IamError {}

// Mutation commands for the background task
#[derive(Debug)]
pub enum AccountMutation {
    Create {
        account: Account,
    },
    SetEmailVerified {
        username: String,
    },
    SetPasswordHash {
        username: String,
        password_hash: String,
    },
}

#[derive(Debug)]
pub enum AccountMutationResult {
    Created,
    Updated,
}

// The users.yaml file structure: username -> yaml account data
pub type YamlAccountsData = HashMap<String, YamlAccount>;
pub type AccountsData = HashMap<String, Account>;
