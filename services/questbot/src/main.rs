//! questbot
//!
//! Command-line automation for a game's reward web service:
//! 1. Loads config and the account file (cookie per account)
//! 2. Validates each account's session cookie, asking on the terminal for
//!    a replacement when the service rejects it
//! 3. Runs one mode across all accounts: reward tasks, token pairs on a
//!    fixed cadence, or lootbox opening
//! 4. Backs off on rate limits and stops cleanly on the first interrupt

mod api;
mod cli;
mod config;
mod console;
mod error;
mod orchestrator;
mod runners;
mod signal;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, info, info_span, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use account_store::AccountStore;
use remote::HttpTransport;
use session::{CancellationToken, RunState, Session};

use crate::cli::{AccountsCommand, Cli, Command};
use crate::config::Config;
use crate::console::ConsoleOperator;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.remote.base_url,
        accounts = %config.accounts.path.display(),
        "configuration loaded"
    );

    let store = AccountStore::load(config.accounts.path.clone())
        .await
        .with_context(|| {
            format!(
                "failed to load accounts from {}",
                config.accounts.path.display()
            )
        })?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.remote.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;
    let transport = Arc::new(HttpTransport::new(
        client,
        &config.remote.base_url,
        &config.remote.referer,
    )?);
    let operator = Arc::new(ConsoleOperator::stdio());
    let mut session = Session::new(store, transport, operator, &config.session_limits());

    let cancel = CancellationToken::new();
    signal::spawn_handler(cancel.clone());

    let run_id = uuid::Uuid::new_v4().as_simple().to_string();
    let span = info_span!("run", run_id = %run_id, mode = cli.command.name());
    execute(cli.command, &config, &mut session, cancel)
        .instrument(span)
        .await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn execute(
    command: Command,
    config: &Config,
    session: &mut Session,
    cancel: CancellationToken,
) -> Result<()> {
    if session.store().is_empty() && !matches!(command, Command::Accounts { .. }) {
        let id = session.store_mut().add(None)?;
        warn!(account = %session.label(id), "no accounts stored, created one");
    }

    let settings = config.runner_settings();

    let summary = match command {
        Command::Tasks => orchestrator::run_tasks(session, &settings, &cancel).await,
        Command::Tokens => {
            let mut state = RunState::new(cancel);
            orchestrator::run_token_pairs(session, &settings, &mut state).await
        }
        Command::Lootbox { item, repeat, once } => {
            orchestrator::run_lootbox(session, &settings, item.as_deref(), repeat, once, &cancel)
                .await?
        }
        Command::Accounts { command } => return accounts(command, session, &cancel).await,
    };

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "run complete"
    );
    Ok(())
}

async fn accounts(
    command: AccountsCommand,
    session: &mut Session,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        AccountsCommand::List => {
            let store = session.store();
            if store.is_empty() {
                println!("no accounts in {}", store.path().display());
            }
            for id in store.ids() {
                let cookie = store.credential(id);
                let status = if cookie.is_empty() {
                    "no cookie".to_string()
                } else {
                    common::Secret::new(cookie.to_string()).hint()
                };
                println!("{}\t{status}", store.label(id));
            }
        }
        AccountsCommand::Add { label } => {
            let id = session.store_mut().add(label)?;
            session
                .ensure_valid(id)
                .await
                .with_context(|| format!("account {} was not added", session.label(id)))?;
            info!(account = %session.label(id), "account added");
        }
        AccountsCommand::Check => {
            let summary = orchestrator::check_accounts(session, cancel).await;
            if summary.failed > 0 {
                anyhow::bail!("{} account(s) failed validation", summary.failed);
            }
        }
    }
    Ok(())
}
