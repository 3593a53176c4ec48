// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    4
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,
    #[serde(default = "default_jwt_audience")]
    pub audience: String,
    #[serde(default = "default_jwt_expiration_hours")]
    pub expiration_hours: u64,
}

fn default_jwt_issuer() -> String {
    "examport".to_string()
}

fn default_jwt_audience() -> String {
    "examport-users".to_string()
}

fn default_jwt_expiration_hours() -> u64 {
    12
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokensConfig {
    /// Validity window for email verification tokens.
    #[serde(default = "default_verification_hours")]
    pub verification_hours: i64,
    /// Validity window for password reset tokens.
    #[serde(default = "default_reset_minutes")]
    pub reset_minutes: i64,
    /// Interval of the expired-token sweep. Hygiene, not correctness.
    #[serde(default = "default_cleanup_interval_minutes")]
    pub cleanup_interval_minutes: u64,
}

fn default_verification_hours() -> i64 {
    24
}

fn default_reset_minutes() -> i64 {
    30
}

fn default_cleanup_interval_minutes() -> u64 {
    60
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            verification_hours: default_verification_hours(),
            reset_minutes: default_reset_minutes(),
            cleanup_interval_minutes: default_cleanup_interval_minutes(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub sender_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default = "default_email_api_url")]
    pub api_url: String,
    #[serde(default = "default_frontend_base_url")]
    pub frontend_base_url: String,
}

fn default_email_api_url() -> String {
    "https://api.brevo.com/v3/smtp/email".to_string()
}

fn default_frontend_base_url() -> String {
    "http://localhost:5173".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            sender_email: String::new(),
            sender_name: None,
            api_url: default_email_api_url(),
            frontend_base_url: default_frontend_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PasswordHashingConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    19456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Default for PasswordHashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    #[serde(default = "default_min_password_chars")]
    pub min_password_chars: usize,
    #[serde(default)]
    pub password_hashing: PasswordHashingConfig,
}

fn default_min_password_chars() -> usize {
    6
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            min_password_chars: default_min_password_chars(),
            password_hashing: PasswordHashingConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_accounts_file")]
    pub accounts_file: String,
}

fn default_accounts_file() -> String {
    "users.yaml".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            accounts_file: default_accounts_file(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub tokens: TokensConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: AppConfig = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::LoadError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "jwt.secret must not be empty".to_string(),
            ));
        }
        if self.jwt.expiration_hours == 0 {
            return Err(ConfigError::ValidationError(
                "jwt.expiration_hours must be at least 1".to_string(),
            ));
        }
        if self.tokens.verification_hours < 0 || self.tokens.reset_minutes < 0 {
            return Err(ConfigError::ValidationError(
                "token validity windows must not be negative".to_string(),
            ));
        }
        if self.email.enabled {
            if self.email.api_key.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "email.api_key is required when email.enabled is true".to_string(),
                ));
            }
            if self.email.sender_email.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "email.sender_email is required when email.enabled is true".to_string(),
                ));
            }
        }
        if self.security.min_password_chars == 0 {
            return Err(ConfigError::ValidationError(
                "security.min_password_chars must be at least 1".to_string(),
            ));
        }
        if self.server.workers == 0 {
            return Err(ConfigError::ValidationError(
                "server.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
