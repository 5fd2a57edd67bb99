//! Lootbox runner
//!
//! Check the balance, open one lootbox if it is affordable, and in repeat
//! mode pause and go again until the balance no longer covers the price.

use account_store::AccountId;
use remote::ApiRequest;
use session::{CancellationToken, DelayOutcome, Operator, Session};
use tracing::{info, warn};

use super::Settings;
use crate::api::{self, Lootbox};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Once,
    Repeat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// Single-open mode finished its one open
    Once,
    InsufficientBalance { balance: f64, price: f64 },
    /// The identity payload carried no balance
    BalanceUnknown,
    /// An open failed after retries; the message is the failure
    OpenFailed(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LootboxReport {
    pub opened: u32,
    pub jackpots: u32,
    pub stop: StopReason,
}

/// Fetch the lootbox catalogue with `id`'s session.
pub async fn fetch_catalogue(
    session: &mut Session,
    id: AccountId,
    settings: &Settings,
) -> session::Result<Vec<Lootbox>> {
    session.ensure_valid(id).await?;
    let payload = session
        .with_retry(
            id,
            "list lootboxes",
            &ApiRequest::list_lootboxes(),
            settings.lootbox_attempts,
        )
        .await?;
    Ok(api::parse_lootboxes(&payload))
}

/// Resolve the lootbox to open from `catalogue`.
///
/// `wanted` matches an id or name; without it the operator picks from a menu.
pub fn pick_item(
    catalogue: &[Lootbox],
    wanted: Option<&str>,
    operator: &dyn Operator,
) -> Result<Lootbox> {
    if catalogue.is_empty() {
        return Err(Error::EmptyCatalogue);
    }

    if let Some(wanted) = wanted {
        return api::find_lootbox(catalogue, wanted)
            .cloned()
            .ok_or_else(|| Error::UnknownItem(wanted.to_string()));
    }

    let options: Vec<String> = catalogue.iter().map(Lootbox::describe).collect();
    let index = operator
        .select("Which lootbox should be opened?", &options)
        .ok_or(Error::NoSelection)?;
    Ok(catalogue[index].clone())
}

/// Resolve the open mode from CLI flags, asking the operator when neither is set.
pub fn choose_mode(repeat: bool, once: bool, operator: &dyn Operator) -> OpenMode {
    if repeat {
        return OpenMode::Repeat;
    }
    if once {
        return OpenMode::Once;
    }
    if operator.confirm("Keep opening until the balance runs out?", false) {
        OpenMode::Repeat
    } else {
        OpenMode::Once
    }
}

pub async fn run(
    session: &mut Session,
    id: AccountId,
    item: &Lootbox,
    mode: OpenMode,
    settings: &Settings,
    cancel: &CancellationToken,
) -> session::Result<LootboxReport> {
    let label = session.label(id).to_string();
    session.ensure_valid(id).await?;

    let mut opened = 0;
    let mut jackpots = 0;
    let stop = loop {
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }

        let identity = session
            .with_retry(id, "check balance", &ApiRequest::identity(), settings.identity_attempts)
            .await?;
        let Some(balance) = api::parse_balance(&identity) else {
            warn!(account = %label, "identity carried no balance");
            break StopReason::BalanceUnknown;
        };
        if balance < item.price {
            info!(account = %label, balance, price = item.price, "balance too low for {}", item.name);
            break StopReason::InsufficientBalance {
                balance,
                price: item.price,
            };
        }

        match session
            .with_retry(
                id,
                "open lootbox",
                &ApiRequest::open_lootbox(&item.id),
                settings.lootbox_attempts,
            )
            .await
        {
            Ok(payload) => {
                opened += 1;
                let result = api::parse_open(&payload);
                if result.jackpot {
                    jackpots += 1;
                    info!(account = %label, lootbox = %item.name, prize = %result.prize, "JACKPOT");
                } else {
                    info!(account = %label, lootbox = %item.name, prize = %result.prize, "lootbox opened");
                }
            }
            Err(e) if e.is_account_fatal() => return Err(e),
            Err(e) => {
                warn!(account = %label, lootbox = %item.name, error = %e, "open failed");
                break StopReason::OpenFailed(e.to_string());
            }
        }

        if mode == OpenMode::Once {
            break StopReason::Once;
        }
        if settings.pacing.lootbox_delay.sleep(Some(cancel)).await == DelayOutcome::Cancelled {
            break StopReason::Cancelled;
        }
    };

    info!(account = %label, opened, jackpots, stop = ?stop, "lootbox run finished");
    Ok(LootboxReport {
        opened,
        jackpots,
        stop,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runners::test_support::{fast_settings, scripted_session};
    use remote::RemoteOutcome;
    use remote::constants::{IDENTITY_PATH, LOOTBOXES_PATH};
    use serde_json::json;
    use session::testing::{ScriptedOperator, ScriptedTransport, ok};
    use std::sync::Arc;

    const OPEN_PATH: &str = "/api/lootboxes/bronze/open";

    fn bronze() -> Lootbox {
        Lootbox {
            id: "bronze".into(),
            name: "Bronze".into(),
            price: 100.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_stops_when_balance_runs_out() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport
            // ensure_valid, then one balance check per loop
            .push(IDENTITY_PATH, ok(json!({"balance": 250})))
            .push(IDENTITY_PATH, ok(json!({"balance": 250})))
            .push(IDENTITY_PATH, ok(json!({"balance": 150})))
            .always(IDENTITY_PATH, ok(json!({"balance": 50})))
            .push(OPEN_PATH, ok(json!({"prize": "Hat", "jackpot": true})))
            .always(OPEN_PATH, ok(json!({"prize": "Coin"})));
        let operator = Arc::new(ScriptedOperator::new());
        let mut session = scripted_session(&dir, &["c=1"], &transport, &operator);
        let id = session.store().ids()[0];

        let report = run(
            &mut session,
            id,
            &bronze(),
            OpenMode::Repeat,
            &fast_settings(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.opened, 2);
        assert_eq!(report.jackpots, 1);
        assert_eq!(
            report.stop,
            StopReason::InsufficientBalance {
                balance: 50.0,
                price: 100.0
            }
        );
        assert_eq!(transport.calls_to(OPEN_PATH).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn once_mode_opens_one() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .always(IDENTITY_PATH, ok(json!({"balance": 1000})))
            .always(OPEN_PATH, ok(json!({"prize": "Coin"})));
        let operator = Arc::new(ScriptedOperator::new());
        let mut session = scripted_session(&dir, &["c=1"], &transport, &operator);
        let id = session.store().ids()[0];

        let report = run(
            &mut session,
            id,
            &bronze(),
            OpenMode::Once,
            &fast_settings(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.opened, 1);
        assert_eq!(report.stop, StopReason::Once);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_open_stops_the_account() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .always(IDENTITY_PATH, ok(json!({"balance": 1000})))
            .always(OPEN_PATH, RemoteOutcome::Failure("HTTP 409: sold out".into()));
        let operator = Arc::new(ScriptedOperator::new());
        let mut session = scripted_session(&dir, &["c=1"], &transport, &operator);
        let id = session.store().ids()[0];

        let report = run(
            &mut session,
            id,
            &bronze(),
            OpenMode::Repeat,
            &fast_settings(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.opened, 0);
        assert!(matches!(report.stop, StopReason::OpenFailed(ref m) if m.contains("sold out")));
    }

    #[tokio::test]
    async fn missing_balance_stops() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.always(IDENTITY_PATH, ok(json!({"username": "x"})));
        let operator = Arc::new(ScriptedOperator::new());
        let mut session = scripted_session(&dir, &["c=1"], &transport, &operator);
        let id = session.store().ids()[0];

        let report = run(
            &mut session,
            id,
            &bronze(),
            OpenMode::Repeat,
            &fast_settings(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.stop, StopReason::BalanceUnknown);
        assert!(transport.calls_to(OPEN_PATH).is_empty());
    }

    #[tokio::test]
    async fn catalogue_is_fetched_with_a_validated_session() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .always(IDENTITY_PATH, ok(json!({"success": true})))
            .always(
                LOOTBOXES_PATH,
                ok(json!({"lootboxes": [
                    {"id": "bronze", "name": "Bronze", "price": 100},
                    {"id": "silver", "name": "Silver", "price": 300}
                ]})),
            );
        let operator = Arc::new(ScriptedOperator::new());
        let mut session = scripted_session(&dir, &["c=1"], &transport, &operator);
        let id = session.store().ids()[0];

        let catalogue = fetch_catalogue(&mut session, id, &fast_settings())
            .await
            .unwrap();

        assert_eq!(catalogue.len(), 2);
        assert_eq!(transport.calls_to(IDENTITY_PATH).len(), 1);
        assert_eq!(transport.calls_to(LOOTBOXES_PATH)[0].credential, "c=1");
    }

    #[test]
    fn pick_item_by_flag_and_menu() {
        let catalogue = vec![
            bronze(),
            Lootbox {
                id: "silver".into(),
                name: "Silver".into(),
                price: 300.0,
            },
        ];
        let operator = ScriptedOperator::new();
        operator.push_selection(Some(1));

        let by_name = pick_item(&catalogue, Some("silver"), &operator).unwrap();
        assert_eq!(by_name.id, "silver");
        assert_eq!(operator.prompt_count(), 0);

        let picked = pick_item(&catalogue, None, &operator).unwrap();
        assert_eq!(picked.name, "Silver");
        assert_eq!(operator.prompt_count(), 1);

        let err = pick_item(&catalogue, Some("diamond"), &operator).unwrap_err();
        assert!(matches!(err, Error::UnknownItem(_)));

        // menu dismissed
        let err = pick_item(&catalogue, None, &operator).unwrap_err();
        assert!(matches!(err, Error::NoSelection));

        let err = pick_item(&[], Some("bronze"), &operator).unwrap_err();
        assert!(matches!(err, Error::EmptyCatalogue));
    }

    #[test]
    fn mode_from_flags_or_prompt() {
        let operator = ScriptedOperator::new();
        assert_eq!(choose_mode(true, false, &operator), OpenMode::Repeat);
        assert_eq!(choose_mode(false, true, &operator), OpenMode::Once);
        assert_eq!(operator.prompt_count(), 0);

        operator.push_confirm(true);
        assert_eq!(choose_mode(false, false, &operator), OpenMode::Repeat);
        // no scripted answer: default is a single open
        assert_eq!(choose_mode(false, false, &operator), OpenMode::Once);
    }
}
