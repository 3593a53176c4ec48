// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{AccountsData, IamError, YamlAccount, YamlAccountsData};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub trait AccountStore: Send + Sync {
    fn load(&self) -> Result<AccountsData, IamError>;
    fn save(&self, accounts: &AccountsData) -> Result<(), IamError>;
}

pub struct FileAccountStore {
    accounts_file: PathBuf,
}

impl FileAccountStore {
    pub fn new(accounts_file: PathBuf) -> Result<Self, IamError> {
        if accounts_file.as_os_str().is_empty() {
            return Err(IamError::ConfigurationError(
                "Accounts file path is empty".to_string(),
            ));
        }

        Ok(Self { accounts_file })
    }

    fn parse_accounts(content: &str) -> Result<AccountsData, IamError> {
        let yaml_accounts: YamlAccountsData = serde_yaml::from_str(content)
            .map_err(|e| IamError::ParseError(format!("Failed to parse accounts file: {}", e)))?;

        let mut accounts = AccountsData::new();
        for (username, yaml_account) in yaml_accounts {
            accounts.insert(username.clone(), yaml_account.into_account(username));
        }
        Ok(accounts)
    }

    fn serialize_accounts(accounts: &AccountsData) -> Result<String, IamError> {
        let yaml_accounts: YamlAccountsData = accounts
            .iter()
            .map(|(username, account)| (username.clone(), YamlAccount::from_account(account)))
            .collect();

        serde_yaml::to_string(&yaml_accounts)
            .map_err(|e| IamError::ParseError(format!("Failed to serialize accounts: {}", e)))
    }

    fn read_accounts_file(&self) -> Result<String, IamError> {
        std::fs::read_to_string(&self.accounts_file)
            .map_err(|e| IamError::FileError(format!("Failed to read accounts file: {}", e)))
    }

    fn write_accounts_file(&self, content: &str) -> Result<(), IamError> {
        let parent = self.accounts_file.parent().ok_or_else(|| {
            IamError::FileError("Accounts file path has no parent directory".to_string())
        })?;
        let file_name = self.accounts_file.file_name().ok_or_else(|| {
            IamError::FileError("Accounts file path has no file name".to_string())
        })?;
        let (mut file, temp_path) = create_temp_file(parent, file_name)?;

        if let Err(err) = file.write_all(content.as_bytes()) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(IamError::FileError(format!(
                "Failed to write accounts temp file: {}",
                err
            )));
        }
        if let Err(err) = file.sync_all() {
            let _ = std::fs::remove_file(&temp_path);
            return Err(IamError::FileError(format!(
                "Failed to sync accounts temp file: {}",
                err
            )));
        }

        if let Err(err) = std::fs::rename(&temp_path, &self.accounts_file) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(IamError::FileError(format!(
                "Failed to replace accounts file: {}",
                err
            )));
        }

        #[cfg(unix)]
        {
            if let Err(err) = sync_parent_dir(parent) {
                log::warn!("Accounts directory sync failed: {}", err);
            }
        }

        Ok(())
    }
}

fn create_temp_file(
    dir: &Path,
    file_name: &std::ffi::OsStr,
) -> Result<(std::fs::File, PathBuf), IamError> {
    use std::fs::OpenOptions;
    const MAX_ATTEMPTS: u32 = 100;
    let base = file_name.to_string_lossy();
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = dir.join(format!(".{}.tmp.{}.{}", base, std::process::id(), attempt));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((file, candidate)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(IamError::FileError(format!(
                    "Failed to create temp accounts file: {}",
                    err
                )));
            }
        }
    }
    Err(IamError::FileError(
        "Failed to create temp accounts file after repeated attempts".to_string(),
    ))
}

#[cfg(unix)]
fn sync_parent_dir(parent: &Path) -> Result<(), IamError> {
    let dir = std::fs::File::open(parent).map_err(|err| {
        IamError::FileError(format!("Failed to open accounts directory for sync: {}", err))
    })?;
    dir.sync_all()
        .map_err(|err| IamError::FileError(format!("Failed to sync accounts directory: {}", err)))
}

impl AccountStore for FileAccountStore {
    fn load(&self) -> Result<AccountsData, IamError> {
        let content = self.read_accounts_file()?;
        Self::parse_accounts(&content)
    }

    fn save(&self, accounts: &AccountsData) -> Result<(), IamError> {
        let content = Self::serialize_accounts(accounts)?;
        self.write_accounts_file(&content)
    }
}

pub struct MemoryAccountStore {
    accounts: Arc<RwLock<AccountsData>>,
}

impl MemoryAccountStore {
    pub fn new(initial: AccountsData) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn empty() -> Self {
        Self::new(AccountsData::new())
    }
}

impl AccountStore for MemoryAccountStore {
    fn load(&self) -> Result<AccountsData, IamError> {
        match self.accounts.read() {
            Ok(guard) => Ok(guard.clone()),
            Err(poisoned) => {
                log::error!("MemoryAccountStore lock poisoned on read; recovering");
                Ok(poisoned.into_inner().clone())
            }
        }
    }

    fn save(&self, accounts: &AccountsData) -> Result<(), IamError> {
        match self.accounts.write() {
            Ok(mut guard) => {
                *guard = accounts.clone();
                Ok(())
            }
            Err(poisoned) => {
                log::error!("MemoryAccountStore lock poisoned on write; recovering");
                let mut guard = poisoned.into_inner();
                *guard = accounts.clone();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iam::types::Account;
    use crate::roles::Role;
    use std::collections::HashMap;

    fn sample_account() -> Account {
        Account {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$fake".to_string(),
            role: Role::Student,
            full_name: "Alice Example".to_string(),
            avatar_url: None,
            gender: None,
            phone: Some("555-0100".to_string()),
            email_verified: false,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("users.yaml");
        std::fs::write(&path, "{}\n").expect("seed file");

        let store = FileAccountStore::new(path).expect("store");
        let mut accounts = HashMap::new();
        accounts.insert("alice".to_string(), sample_account());
        store.save(&accounts).expect("save");

        let loaded = store.load().expect("load");
        let alice = loaded.get("alice").expect("alice");
        assert_eq!(alice.email, "alice@example.com");
        assert_eq!(alice.role, Role::Student);
        assert_eq!(alice.phone.as_deref(), Some("555-0100"));
        assert!(!alice.email_verified);
    }

    #[test]
    fn load_defaults_missing_optional_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("users.yaml");
        let yaml = "alice:\n  email: \"alice@example.com\"\n  password_hash: \"h\"\n  full_name: \"Alice\"\n";
        std::fs::write(&path, yaml).expect("seed file");

        let store = FileAccountStore::new(path).expect("store");
        let loaded = store.load().expect("load");
        let alice = loaded.get("alice").expect("alice");
        assert_eq!(alice.role, Role::Student);
        assert!(alice.avatar_url.is_none());
        assert!(!alice.email_verified);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileAccountStore::new(temp.path().join("missing.yaml")).expect("store");
        assert!(store.load().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn save_does_not_modify_existing_file_on_dir_permission_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("users.yaml");
        std::fs::write(&path, "original\n").expect("seed file");

        let store = FileAccountStore::new(path.clone()).expect("store");
        let mut accounts = HashMap::new();
        accounts.insert("alice".to_string(), sample_account());

        let dir = temp.path();
        let original_permissions = std::fs::metadata(dir)
            .expect("metadata")
            .permissions()
            .mode();
        let read_only = std::fs::Permissions::from_mode(original_permissions & 0o555);
        std::fs::set_permissions(dir, read_only).expect("set read-only");

        // Root bypasses directory permissions; nothing to observe there
        let denied = std::fs::write(dir.join("write-check"), b"x").is_err();
        if denied {
            let result = store.save(&accounts);
            assert!(result.is_err());

            let content = std::fs::read_to_string(&path).expect("read accounts");
            assert_eq!(content, "original\n");
        }

        let restore = std::fs::Permissions::from_mode(original_permissions);
        std::fs::set_permissions(dir, restore).expect("restore permissions");
    }
}
