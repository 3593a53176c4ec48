// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::token_store::{
    ConsumeOutcome, SecondaryToken, SecondaryTokenStore, TokenPurpose, TokenStoreError,
};
use crate::config::TokensConfig;
use chrono::Duration;

/// Token lifecycle policy on top of the raw store: each purpose gets its
/// configured validity window.
#[derive(Clone)]
pub struct TokenService {
    store: SecondaryTokenStore,
    verification_window: Duration,
    reset_window: Duration,
    cleanup_interval_minutes: u64,
}

impl TokenService {
    pub fn new(config: &TokensConfig) -> Self {
        Self {
            store: SecondaryTokenStore::new(),
            verification_window: Duration::hours(config.verification_hours),
            reset_window: Duration::minutes(config.reset_minutes),
            cleanup_interval_minutes: config.cleanup_interval_minutes,
        }
    }

    fn window_for(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::EmailVerification => self.verification_window,
            TokenPurpose::PasswordReset => self.reset_window,
        }
    }

    pub async fn issue(
        &self,
        username: &str,
        purpose: TokenPurpose,
    ) -> Result<String, TokenStoreError> {
        let (token, _) = self
            .store
            .issue(username, purpose, self.window_for(purpose))
            .await?;
        Ok(token)
    }

    pub async fn consume(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<SecondaryToken>, TokenStoreError> {
        match self.store.consume(token, purpose).await? {
            ConsumeOutcome::Consumed(record) => Ok(Some(record)),
            ConsumeOutcome::NotFound => {
                log::debug!("Secondary token consume failed: unknown token");
                Ok(None)
            }
            ConsumeOutcome::Rejected => {
                log::debug!("Secondary token consume failed: used, expired or wrong purpose");
                Ok(None)
            }
        }
    }

    /// Put a consumed token back so the holder can retry. Used when the
    /// side effect the consumption paid for could not be applied.
    pub async fn restore(&self, token: &str) -> Result<(), TokenStoreError> {
        if !self.store.restore(token).await? {
            log::warn!("Secondary token could not be restored after a failed update");
        }
        Ok(())
    }

    /// Invalidate every outstanding token for the account and purpose.
    pub async fn invalidate_all(
        &self,
        username: &str,
        purpose: TokenPurpose,
    ) -> Result<usize, TokenStoreError> {
        self.store.mark_all_used(username, purpose).await
    }

    /// Spawn the periodic expired-token sweep. Runs until the process exits.
    pub fn spawn_cleanup_task(&self) {
        let store = self.store.clone();
        let interval =
            std::time::Duration::from_secs(self.cleanup_interval_minutes.max(1) * 60);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match store.cleanup_expired().await {
                    Ok(removed) if removed > 0 => {
                        log::info!("Removed {} expired secondary tokens", removed);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        log::error!("Secondary token cleanup failed: {}", err.message());
                        break;
                    }
                }
            }
        });
    }
}
