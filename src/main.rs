// This file is part of the product ExamPort.
// SPDX-FileCopyrightText: 2025-2026 ExamPort Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{App, HttpServer, middleware::Logger, web};
use examport::auth::AuthService;
use examport::config::AppConfig;
use examport::email;
use examport::iam::{BearerAuthMiddlewareFactory, DirectoryService, FileAccountStore};
use examport::security::PolicyEnforcementMiddlewareFactory;
use log::{LevelFilter, info};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

struct ParsedArgs {
    config_file: PathBuf,
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut config_file = PathBuf::from(DEFAULT_CONFIG_FILE);
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-C" | "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("Missing value for {}", arg))?;
                config_file = PathBuf::from(value);
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    Ok(ParsedArgs { config_file })
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn init_logging(level: &str) {
    let log_level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);

    // Stable log format
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn generate_jwt_secret() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

fn default_config_yaml(jwt_secret: &str) -> String {
    format!(
        "server:\n  host: \"127.0.0.1\"\n  port: 8080\n  workers: 4\n\nlogging:\n  level: \"info\"\n\njwt:\n  secret: \"{jwt_secret}\"\n  expiration_hours: 12\n\ntokens:\n  verification_hours: 24\n  reset_minutes: 30\n  cleanup_interval_minutes: 60\n\nemail:\n  enabled: false\n  api_key: \"\"\n  sender_email: \"\"\n  frontend_base_url: \"http://localhost:5173\"\n\nsecurity:\n  min_password_chars: 6\n\nstorage:\n  accounts_file: \"users.yaml\"\n",
    )
}

/// Write a default config.yaml with a generated signing secret on first run.
fn bootstrap_config_file(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let contents = default_config_yaml(&generate_jwt_secret());
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(err),
    };
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    Ok(true)
}

/// Create the accounts file with an empty document if it does not exist yet.
fn bootstrap_accounts_file(path: &PathBuf) -> std::io::Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, "{}\n")?;
    info!("Created empty accounts file at {}", path.display());
    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Usage: examport [-C <config.yaml>]");
            std::process::exit(2);
        }
    };

    match bootstrap_config_file(&parsed_args.config_file) {
        Ok(true) => eprintln!(
            "Created {} with a generated JWT secret",
            parsed_args.config_file.display()
        ),
        Ok(false) => {}
        Err(err) => {
            eprintln!(
                "Failed to create {}: {}",
                parsed_args.config_file.display(),
                err
            );
            std::process::exit(1);
        }
    }

    let config = match AppConfig::load(&parsed_args.config_file) {
        Ok(config) => config,
        Err(err) => {
            eprintln!(
                "Failed to load configuration from {}: {}",
                parsed_args.config_file.display(),
                err
            );
            std::process::exit(1);
        }
    };

    init_logging(&config.logging.level);

    let accounts_file = PathBuf::from(&config.storage.accounts_file);
    bootstrap_accounts_file(&accounts_file)?;

    let store = Arc::new(FileAccountStore::new(accounts_file).map_err(std::io::Error::other)?);
    let directory = DirectoryService::new(store).map_err(std::io::Error::other)?;
    let mailer = email::build_mailer(&config.email).map_err(std::io::Error::other)?;
    let auth_service =
        AuthService::new(&config, directory, mailer).map_err(std::io::Error::other)?;
    auth_service.token_service().spawn_cleanup_task();

    let auth_data = web::Data::new(auth_service);

    let host = config.server.host.clone();
    let port = config.server.port;
    let workers = config.server.workers;

    info!("Starting ExamPort auth server on {}:{}", host, port);
    info!("Workers: {}", workers);
    info!("Accounts file: {}", config.storage.accounts_file);
    info!(
        "Email delivery: {}",
        if config.email.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    HttpServer::new(move || {
        App::new()
            .app_data(auth_data.clone())
            .configure(examport::auth::configure)
            // Outermost wrap runs first: request log, then bearer auth,
            // then the route policy.
            .wrap(PolicyEnforcementMiddlewareFactory)
            .wrap(BearerAuthMiddlewareFactory)
            .wrap(Logger::default())
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
