// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

const TOKEN_CHANNEL_DEPTH: usize = 64;

/// What a secondary token is good for. A token issued for one purpose can
/// never be consumed for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

#[derive(Debug, Clone)]
pub struct SecondaryToken {
    pub username: String,
    pub purpose: TokenPurpose,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

/// Outcome of a consume attempt. `NotFound` and `Rejected` are reported to
/// callers identically; the distinction exists for logging.
#[derive(Debug)]
pub enum ConsumeOutcome {
    Consumed(SecondaryToken),
    NotFound,
    Rejected,
}

#[derive(Debug)]
pub enum TokenStoreError {
    Unavailable,
}

impl TokenStoreError {
    pub fn message(&self) -> &'static str {
        match self {
            TokenStoreError::Unavailable => "Secondary token store unavailable",
        }
    }
}

impl std::fmt::Display for TokenStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for TokenStoreError {}

/// In-memory store for single-use secondary tokens. All state lives in a
/// background task; issue-with-invalidation and check-then-consume are each
/// a single command, so concurrent callers cannot interleave inside them.
#[derive(Clone)]
pub struct SecondaryTokenStore {
    sender: mpsc::Sender<TokenCommand>,
}

impl SecondaryTokenStore {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(TOKEN_CHANNEL_DEPTH);
        tokio::spawn(async move {
            let mut state = TokenState::new();
            state.run(receiver).await;
        });
        Self { sender }
    }

    /// Issue a fresh token for the account, invalidating any still-valid
    /// token the account holds for the same purpose.
    pub async fn issue(
        &self,
        username: &str,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<(String, SecondaryToken), TokenStoreError> {
        let (reply, receive) = oneshot::channel();
        let command = TokenCommand::Issue {
            username: username.to_string(),
            purpose,
            ttl,
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return Err(TokenStoreError::Unavailable);
        }
        receive.await.unwrap_or(Err(TokenStoreError::Unavailable))
    }

    /// Consume a token for the given purpose. Succeeds at most once per
    /// token value, no matter how many callers race on it.
    pub async fn consume(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<ConsumeOutcome, TokenStoreError> {
        let (reply, receive) = oneshot::channel();
        let command = TokenCommand::Consume {
            token: token.to_string(),
            purpose,
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return Err(TokenStoreError::Unavailable);
        }
        receive.await.unwrap_or(Err(TokenStoreError::Unavailable))
    }

    /// Mark every still-valid token for the account and purpose as used.
    /// Returns how many tokens were invalidated.
    pub async fn mark_all_used(
        &self,
        username: &str,
        purpose: TokenPurpose,
    ) -> Result<usize, TokenStoreError> {
        let (reply, receive) = oneshot::channel();
        let command = TokenCommand::MarkAllUsed {
            username: username.to_string(),
            purpose,
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return Err(TokenStoreError::Unavailable);
        }
        receive.await.unwrap_or(Err(TokenStoreError::Unavailable))
    }

    /// Drop expired tokens. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> Result<usize, TokenStoreError> {
        let (reply, receive) = oneshot::channel();
        let command = TokenCommand::CleanupExpired { reply };
        if self.sender.send(command).await.is_err() {
            return Err(TokenStoreError::Unavailable);
        }
        receive.await.unwrap_or(Err(TokenStoreError::Unavailable))
    }

    /// Flip a consumed token back to unused so it can be retried. Only
    /// meaningful while the token is still within its validity window;
    /// returns whether the token was restored.
    pub async fn restore(&self, token: &str) -> Result<bool, TokenStoreError> {
        let (reply, receive) = oneshot::channel();
        let command = TokenCommand::Restore {
            token: token.to_string(),
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return Err(TokenStoreError::Unavailable);
        }
        receive.await.unwrap_or(Err(TokenStoreError::Unavailable))
    }

    pub async fn get(&self, token: &str) -> Result<Option<SecondaryToken>, TokenStoreError> {
        let (reply, receive) = oneshot::channel();
        let command = TokenCommand::Get {
            token: token.to_string(),
            reply,
        };
        if self.sender.send(command).await.is_err() {
            return Err(TokenStoreError::Unavailable);
        }
        receive.await.unwrap_or(Err(TokenStoreError::Unavailable))
    }
}

impl Default for SecondaryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

enum TokenCommand {
    Issue {
        username: String,
        purpose: TokenPurpose,
        ttl: Duration,
        reply: oneshot::Sender<Result<(String, SecondaryToken), TokenStoreError>>,
    },
    Consume {
        token: String,
        purpose: TokenPurpose,
        reply: oneshot::Sender<Result<ConsumeOutcome, TokenStoreError>>,
    },
    MarkAllUsed {
        username: String,
        purpose: TokenPurpose,
        reply: oneshot::Sender<Result<usize, TokenStoreError>>,
    },
    Restore {
        token: String,
        reply: oneshot::Sender<Result<bool, TokenStoreError>>,
    },
    CleanupExpired {
        reply: oneshot::Sender<Result<usize, TokenStoreError>>,
    },
    Get {
        token: String,
        reply: oneshot::Sender<Result<Option<SecondaryToken>, TokenStoreError>>,
    },
}

struct TokenState {
    tokens: HashMap<String, SecondaryToken>,
}

impl TokenState {
    fn new() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    async fn run(&mut self, mut receiver: mpsc::Receiver<TokenCommand>) {
        while let Some(command) = receiver.recv().await {
            match command {
                TokenCommand::Issue {
                    username,
                    purpose,
                    ttl,
                    reply,
                } => {
                    self.invalidate_for(&username, purpose);
                    let now = Utc::now();
                    let token_value = generate_token();
                    let token = SecondaryToken {
                        username,
                        purpose,
                        issued_at: now,
                        expires_at: now + ttl,
                        used: false,
                    };
                    self.tokens.insert(token_value.clone(), token.clone());
                    let _ = reply.send(Ok((token_value, token)));
                }
                TokenCommand::Consume {
                    token,
                    purpose,
                    reply,
                } => {
                    let outcome = match self.tokens.get_mut(&token) {
                        None => ConsumeOutcome::NotFound,
                        Some(record) => {
                            if record.purpose != purpose
                                || record.used
                                || record.expires_at <= Utc::now()
                            {
                                ConsumeOutcome::Rejected
                            } else {
                                record.used = true;
                                ConsumeOutcome::Consumed(record.clone())
                            }
                        }
                    };
                    let _ = reply.send(Ok(outcome));
                }
                TokenCommand::MarkAllUsed {
                    username,
                    purpose,
                    reply,
                } => {
                    let count = self.invalidate_for(&username, purpose);
                    let _ = reply.send(Ok(count));
                }
                TokenCommand::Restore { token, reply } => {
                    let restored = match self.tokens.get_mut(&token) {
                        Some(record) if record.used && record.expires_at > Utc::now() => {
                            record.used = false;
                            true
                        }
                        _ => false,
                    };
                    let _ = reply.send(Ok(restored));
                }
                TokenCommand::CleanupExpired { reply } => {
                    let now = Utc::now();
                    let before = self.tokens.len();
                    self.tokens.retain(|_, token| token.expires_at > now);
                    let _ = reply.send(Ok(before - self.tokens.len()));
                }
                TokenCommand::Get { token, reply } => {
                    let record = self.tokens.get(&token).cloned();
                    let _ = reply.send(Ok(record));
                }
            }
        }
    }

    fn invalidate_for(&mut self, username: &str, purpose: TokenPurpose) -> usize {
        let mut count = 0;
        for token in self.tokens.values_mut() {
            if token.username == username && token.purpose == purpose && !token.used {
                token.used = true;
                count += 1;
            }
        }
        count
    }
}

fn generate_token() -> String {
    Uuid::new_v4().to_string()
}
