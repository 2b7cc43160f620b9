//! `stratai` server binary.
//!
//! # Responsibility
//! - Resolve configuration from file and flags.
//! - Initialize logging, open the database, and serve the HTTP API.
//! - Provision users and groups for environments without an identity hook.

mod config;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use config::{Config, Overrides};
use log::info;
use std::path::PathBuf;
use stratai_api::AppState;
use stratai_core::repo::user_repo::UserRepository;
use stratai_core::{default_log_level, init_logging, open_db, share, SqliteStore};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "stratai", version, about = "StratAI workspace backend")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// SQLite database path
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute directory for log files (stderr when omitted)
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve {
        /// Listen address, e.g. 127.0.0.1:8080
        #[arg(long)]
        bind: Option<String>,
    },
    /// Create a user and print its id
    AddUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
    },
    /// Create a group and print its id
    AddGroup {
        #[arg(long)]
        name: String,
        /// Users to add to the group
        #[arg(long = "member", value_name = "USER_ID")]
        members: Vec<uuid::Uuid>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve { bind: None });
    let bind = match &command {
        Command::Serve { bind } => bind.clone(),
        _ => None,
    };

    let config = Config::resolve(
        cli.config.as_deref(),
        Overrides {
            bind,
            db: cli.db,
            log_level: cli.log_level,
            log_dir: cli.log_dir,
        },
    )?;
    let level = config
        .logging
        .level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level, config.logging.dir.as_deref()).map_err(|err| anyhow!(err))?;

    match command {
        Command::Serve { .. } => serve(config),
        Command::AddUser { email, name } => add_user(&config, &email, &name),
        Command::AddGroup { name, members } => add_group(&config, &name, &members),
    }
}

fn serve(config: Config) -> Result<()> {
    let conn = open_db(&config.database.path)
        .with_context(|| format!("failed to open {}", config.database.path.display()))?;
    let state = AppState::new(share(conn), config.export.gotenberg_url.clone())?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(async move {
        let listener = TcpListener::bind(&config.server.bind)
            .await
            .with_context(|| format!("failed to bind {}", config.server.bind))?;
        info!(
            "event=server_start module=cli status=ok bind={} db={} pdf_export={}",
            config.server.bind,
            config.database.path.display(),
            config.export.gotenberg_url.is_some()
        );
        stratai_api::serve(listener, state)
            .await
            .context("http server failed")
    })
}

fn add_user(config: &Config, email: &str, name: &str) -> Result<()> {
    let conn = open_db(&config.database.path)?;
    let store = SqliteStore::try_new(&conn)?;
    let user = store.create_user(email, name)?;
    info!("event=user_provision module=cli status=ok user_id={}", user.id);
    println!("{}", user.id);
    Ok(())
}

fn add_group(config: &Config, name: &str, members: &[uuid::Uuid]) -> Result<()> {
    let conn = open_db(&config.database.path)?;
    let group = SqliteStore::try_new(&conn)?
        .create_group(name, members)
        .with_context(|| format!("failed to create group `{name}`"))?;
    info!(
        "event=group_provision module=cli status=ok group_id={} members={}",
        group.id,
        members.len()
    );
    println!("{}", group.id);
    Ok(())
}
