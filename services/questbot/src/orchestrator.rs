//! Multi-account orchestration
//!
//! Runs a mode across every stored account in order. Errors are isolated
//! per account: a failure is logged, counted, and the next account runs.
//! Cancellation is checked before each account and stops the whole run.

use session::{CancellationToken, RunState, Session};
use tracing::{error, info, warn};

use crate::api::Lootbox;
use crate::error::{Error, Result};
use crate::runners::lootbox::{self, OpenMode};
use crate::runners::{Settings, tasks, tokens};

/// Per-account outcome counts for one pass over the accounts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Accounts not reached because the run was cancelled
    pub skipped: usize,
}

impl RunSummary {
    fn absorb(&mut self, other: &RunSummary) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

pub async fn run_tasks(
    session: &mut Session,
    settings: &Settings,
    cancel: &CancellationToken,
) -> RunSummary {
    let ids = session.store().ids();
    let mut summary = RunSummary::default();

    for (i, id) in ids.iter().copied().enumerate() {
        if cancel.is_cancelled() {
            summary.skipped = ids.len() - i;
            break;
        }
        let label = session.label(id).to_string();
        info!(account = %label, "running tasks");
        match tasks::run(session, id, settings, cancel).await {
            Ok(_) => summary.succeeded += 1,
            Err(e) => {
                error!(account = %label, error = %e, "account failed, moving on");
                summary.failed += 1;
            }
        }
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "tasks finished"
    );
    summary
}

/// Run token cycles until cancelled. Returns the totals over all cycles.
pub async fn run_token_pairs(
    session: &mut Session,
    settings: &Settings,
    state: &mut RunState,
) -> RunSummary {
    let mut total = RunSummary::default();

    while !state.is_cancelled() {
        let phase = state.advance_cycle();
        info!(
            cycle = state.cycle_index,
            pair = state.pair_index,
            phase = phase.label(),
            "token cycle starting"
        );

        let cycle = token_cycle(session, settings, &state.cancel).await;
        total.absorb(&cycle);
        if settings.pacing.report_balances && !state.is_cancelled() {
            tokens::report_balances(session).await;
        }
        if state.is_cancelled() {
            break;
        }

        let pause = tokens::pause_after(phase, settings);
        info!(
            cycle = state.cycle_index,
            min_secs = pause.min_ms / 1000,
            max_secs = pause.max_ms / 1000,
            "waiting for next cycle"
        );
        if pause.sleep(Some(&state.cancel)).await == session::DelayOutcome::Cancelled {
            break;
        }
    }

    info!(
        cycles = state.cycle_index,
        created = total.succeeded,
        failed = total.failed,
        "token run stopped"
    );
    total
}

async fn token_cycle(
    session: &mut Session,
    settings: &Settings,
    cancel: &CancellationToken,
) -> RunSummary {
    let ids = session.store().ids();
    let mut summary = RunSummary::default();

    for (i, id) in ids.iter().copied().enumerate() {
        if cancel.is_cancelled() {
            summary.skipped = ids.len() - i;
            break;
        }
        match tokens::create_token(session, id, settings).await {
            Ok(_) => summary.succeeded += 1,
            Err(e) => {
                warn!(account = %session.label(id), error = %e, "token not created");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Open lootboxes on every account.
///
/// The catalogue is fetched with the first account that can reach it; an
/// account that cannot is counted as failed and the next one is tried.
/// Item and mode are resolved once, then apply to every remaining account.
pub async fn run_lootbox(
    session: &mut Session,
    settings: &Settings,
    wanted: Option<&str>,
    repeat: bool,
    once: bool,
    cancel: &CancellationToken,
) -> Result<RunSummary> {
    let ids = session.store().ids();
    let mut summary = RunSummary::default();
    let mut chosen: Option<(Lootbox, OpenMode)> = None;

    for (i, id) in ids.iter().copied().enumerate() {
        if cancel.is_cancelled() {
            summary.skipped = ids.len() - i;
            break;
        }
        let label = session.label(id).to_string();

        if chosen.is_none() {
            let catalogue = match lootbox::fetch_catalogue(session, id, settings).await {
                Ok(catalogue) => catalogue,
                Err(e) => {
                    error!(account = %label, error = %e, "catalogue unavailable, trying next account");
                    summary.failed += 1;
                    continue;
                }
            };
            let item = lootbox::pick_item(&catalogue, wanted, session.operator())?;
            let mode = lootbox::choose_mode(repeat, once, session.operator());
            info!(lootbox = %item.name, price = item.price, ?mode, "opening lootboxes");
            chosen = Some((item, mode));
        }
        let Some((item, mode)) = chosen.as_ref() else {
            continue;
        };

        match lootbox::run(session, id, item, *mode, settings, cancel).await {
            Ok(report) => {
                info!(account = %label, opened = report.opened, jackpots = report.jackpots, "account done");
                summary.succeeded += 1;
            }
            Err(e) => {
                error!(account = %label, error = %e, "account failed, moving on");
                summary.failed += 1;
            }
        }
    }

    if chosen.is_none() && summary.failed > 0 {
        return Err(Error::CatalogueUnavailable {
            failed: summary.failed,
        });
    }
    Ok(summary)
}

/// Validate every stored cookie, prompting for replacements as needed.
pub async fn check_accounts(session: &mut Session, cancel: &CancellationToken) -> RunSummary {
    let ids = session.store().ids();
    let mut summary = RunSummary::default();

    for (i, id) in ids.iter().copied().enumerate() {
        if cancel.is_cancelled() {
            summary.skipped = ids.len() - i;
            break;
        }
        let label = session.label(id).to_string();
        match session.ensure_valid(id).await {
            Ok(credential) => {
                info!(account = %label, cookie = %credential.hint(), "account ok");
                summary.succeeded += 1;
            }
            Err(e) => {
                error!(account = %label, error = %e, "account check failed");
                summary.failed += 1;
            }
        }
    }
    summary
}
