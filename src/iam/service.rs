// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::store::AccountStore;
use super::types::{Account, AccountMutation, AccountMutationResult, AccountsData, IamError};
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, oneshot};

// Type aliases for complex channel types
type MutationRequest = (
    AccountMutation,
    oneshot::Sender<Result<AccountMutationResult, IamError>>,
);
type MutationSender = mpsc::UnboundedSender<MutationRequest>;
type MutationReceiver = mpsc::UnboundedReceiver<MutationRequest>;

/// User directory: cached reads, mutations serialized through a background
/// task so uniqueness checks and the store write are observed atomically.
#[derive(Clone)]
pub struct DirectoryService {
    accounts_data: Arc<RwLock<AccountsData>>,
    mutation_sender: MutationSender,
    store: Arc<dyn AccountStore>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn AccountStore>) -> Result<Self, IamError> {
        let accounts = store.load()?;
        let accounts_data = Arc::new(RwLock::new(accounts));

        let (mutation_sender, mut mutation_receiver): (MutationSender, MutationReceiver) =
            mpsc::unbounded_channel();

        let accounts_data_clone = accounts_data.clone();
        let store_clone = store.clone();

        tokio::spawn(async move {
            while let Some((mutation, response_sender)) = mutation_receiver.recv().await {
                let result = Self::handle_mutation(&mutation, &accounts_data_clone, &store_clone);
                let _ = response_sender.send(result);
            }
        });

        Ok(DirectoryService {
            accounts_data,
            mutation_sender,
            store,
        })
    }

    fn reload_from_store(
        accounts_data: &Arc<RwLock<AccountsData>>,
        store: &Arc<dyn AccountStore>,
    ) -> Result<(), IamError> {
        let accounts = store.load()?;
        match accounts_data.write() {
            Ok(mut guard) => {
                *guard = accounts;
                accounts_data.clear_poison();
                Ok(())
            }
            Err(poisoned) => {
                log::error!("Accounts lock poisoned during reload; recovering");
                let mut guard = poisoned.into_inner();
                *guard = accounts;
                accounts_data.clear_poison();
                Ok(())
            }
        }
    }

    fn with_accounts_read<T>(
        &self,
        f: impl FnOnce(&AccountsData) -> Result<T, IamError>,
    ) -> Result<T, IamError> {
        match self.accounts_data.read() {
            Ok(guard) => f(&guard),
            Err(_) => {
                log::error!("Accounts lock poisoned on read; reloading from store");
                Self::reload_from_store(&self.accounts_data, &self.store)?;
                let guard = self.accounts_data.read().map_err(|_| {
                    IamError::ConfigurationError(
                        "Accounts lock poisoned after recovery attempt".to_string(),
                    )
                })?;
                f(&guard)
            }
        }
    }

    fn with_accounts_write<T>(
        accounts_data: &Arc<RwLock<AccountsData>>,
        store: &Arc<dyn AccountStore>,
        f: impl FnOnce(&mut AccountsData) -> Result<T, IamError>,
    ) -> Result<T, IamError> {
        let mut guard = match accounts_data.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("Accounts lock poisoned on write; reloading from store");
                let mut guard = poisoned.into_inner();
                let accounts = store.load()?;
                *guard = accounts;
                accounts_data.clear_poison();
                guard
            }
        };

        f(&mut guard)
    }

    /// Handle an account mutation (runs in the background task). The
    /// in-memory map is only replaced after the store write succeeds.
    fn handle_mutation(
        mutation: &AccountMutation,
        accounts_data: &Arc<RwLock<AccountsData>>,
        store: &Arc<dyn AccountStore>,
    ) -> Result<AccountMutationResult, IamError> {
        match mutation {
            AccountMutation::Create { account } => {
                Self::with_accounts_write(accounts_data, store, |accounts| {
                    if accounts.contains_key(&account.username) {
                        return Err(IamError::UsernameTaken(account.username.clone()));
                    }
                    if accounts
                        .values()
                        .any(|existing| existing.email == account.email)
                    {
                        return Err(IamError::EmailTaken(account.email.clone()));
                    }

                    let mut updated = accounts.clone();
                    updated.insert(account.username.clone(), account.clone());

                    store.save(&updated)?;
                    *accounts = updated;
                    Ok(AccountMutationResult::Created)
                })
            }
            AccountMutation::SetEmailVerified { username } => {
                Self::with_accounts_write(accounts_data, store, |accounts| {
                    let mut updated = accounts.clone();
                    let account = match updated.get_mut(username) {
                        Some(account) => account,
                        None => return Err(IamError::AccountNotFound(username.clone())),
                    };
                    account.email_verified = true;

                    store.save(&updated)?;
                    *accounts = updated;
                    Ok(AccountMutationResult::Updated)
                })
            }
            AccountMutation::SetPasswordHash {
                username,
                password_hash,
            } => Self::with_accounts_write(accounts_data, store, |accounts| {
                let mut updated = accounts.clone();
                let account = match updated.get_mut(username) {
                    Some(account) => account,
                    None => return Err(IamError::AccountNotFound(username.clone())),
                };
                account.password_hash = password_hash.clone();

                store.save(&updated)?;
                *accounts = updated;
                Ok(AccountMutationResult::Updated)
            }),
        }
    }

    pub fn get_by_username(&self, username: &str) -> Result<Option<Account>, IamError> {
        self.with_accounts_read(|accounts| Ok(accounts.get(username).cloned()))
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<Account>, IamError> {
        self.with_accounts_read(|accounts| {
            Ok(accounts
                .values()
                .find(|account| account.email == email)
                .cloned())
        })
    }

    pub fn exists_by_username(&self, username: &str) -> Result<bool, IamError> {
        self.with_accounts_read(|accounts| Ok(accounts.contains_key(username)))
    }

    pub fn exists_by_email(&self, email: &str) -> Result<bool, IamError> {
        self.with_accounts_read(|accounts| {
            Ok(accounts.values().any(|account| account.email == email))
        })
    }

    async fn send_mutation(
        &self,
        mutation: AccountMutation,
    ) -> Result<AccountMutationResult, IamError> {
        let (response_sender, response_receiver) = oneshot::channel();

        self.mutation_sender
            .send((mutation, response_sender))
            .map_err(|_| IamError::ServiceNotInitialized)?;

        response_receiver
            .await
            .map_err(|_| IamError::ServiceNotInitialized)?
    }

    /// Create a new account. Username and email uniqueness are re-checked
    /// inside the mutation task, so concurrent registrations cannot both win.
    pub async fn create_account(&self, account: Account) -> Result<(), IamError> {
        match self.send_mutation(AccountMutation::Create { account }).await? {
            AccountMutationResult::Created => Ok(()),
            _ => Err(IamError::ConfigurationError(
                "Unexpected mutation result".to_string(),
            )),
        }
    }

    pub async fn set_email_verified(&self, username: &str) -> Result<(), IamError> {
        match self
            .send_mutation(AccountMutation::SetEmailVerified {
                username: username.to_string(),
            })
            .await?
        {
            AccountMutationResult::Updated => Ok(()),
            _ => Err(IamError::ConfigurationError(
                "Unexpected mutation result".to_string(),
            )),
        }
    }

    pub async fn set_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), IamError> {
        match self
            .send_mutation(AccountMutation::SetPasswordHash {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            })
            .await?
        {
            AccountMutationResult::Updated => Ok(()),
            _ => Err(IamError::ConfigurationError(
                "Unexpected mutation result".to_string(),
            )),
        }
    }
}
