// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod jwt;
pub mod middleware;
mod password;
mod service;
mod store;
mod token_store;
mod tokens;
pub(crate) mod types;

pub use middleware::{AuthRequest, BearerAuthMiddlewareFactory, Identity};
pub use password::{CredentialHasher, PasswordError};
#[cfg(test)]
pub(crate) use password::test_hashing_params;
pub use service::DirectoryService;
pub use store::{AccountStore, FileAccountStore, MemoryAccountStore};
pub use token_store::{SecondaryToken, TokenPurpose, TokenStoreError};
pub use tokens::TokenService;
pub use types::{Account, IamError};
