//! Token-pair runner
//!
//! Tokens are created in pairs: every account gets one token per cycle,
//! a short pause separates the two halves of a pair and a long pause follows
//! the second half. The cycle loop itself lives in the orchestrator.

use account_store::AccountId;
use remote::{ApiRequest, RemoteOutcome};
use session::{DelayWindow, PairPhase, Session};
use tracing::{info, warn};

use super::Settings;
use crate::api;

/// Validate the account's cookie, then create one token.
pub async fn create_token(
    session: &mut Session,
    id: AccountId,
    settings: &Settings,
) -> session::Result<serde_json::Value> {
    let label = session.label(id).to_string();
    session.ensure_valid(id).await?;

    let payload = session
        .with_retry(id, "create token", &ApiRequest::create_token(), settings.token_attempts)
        .await?;
    let token_id = api::token_id(&payload);
    info!(
        account = %label,
        token_id = token_id.as_deref().unwrap_or("?"),
        "token created"
    );
    Ok(payload)
}

/// Pause that follows a cycle in `phase`.
pub fn pause_after(phase: PairPhase, settings: &Settings) -> DelayWindow {
    match phase {
        PairPhase::First => settings.pacing.short_pair_delay,
        PairPhase::Second => settings.pacing.long_pair_delay,
    }
}

/// Log each account's balance.
///
/// One send per account with the stored cookie. Anything but success is
/// logged and skipped; the operator is never asked for a replacement here.
pub async fn report_balances(session: &Session) {
    for id in session.store().ids() {
        let label = session.label(id);
        if session.store().credential(id).is_empty() {
            warn!(account = %label, "no session cookie, balance skipped");
            continue;
        }
        match session.send_once(id, &ApiRequest::identity()).await {
            RemoteOutcome::Ok(identity) => info!(
                account = %label,
                user = api::parse_username(&identity).unwrap_or("?"),
                balance = api::parse_balance(&identity),
                "balance"
            ),
            other => warn!(account = %label, outcome = other.label(), "balance unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runners::test_support::scripted_session;
    use remote::constants::{IDENTITY_PATH, TOKENS_PATH};
    use serde_json::json;
    use session::testing::{ScriptedOperator, ScriptedTransport, ok};
    use std::sync::Arc;

    #[test]
    fn pause_follows_pair_phase() {
        let settings = Settings::default();
        assert_eq!(
            pause_after(PairPhase::First, &settings),
            DelayWindow::new(300_000, 330_000)
        );
        assert_eq!(
            pause_after(PairPhase::Second, &settings),
            DelayWindow::new(3_600_000, 3_660_000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn creates_token_after_validation() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .always(IDENTITY_PATH, ok(json!({"success": true})))
            .always(TOKENS_PATH, ok(json!({"success": true, "token": {"id": "t1"}})));
        let operator = Arc::new(ScriptedOperator::new());
        let mut session = scripted_session(&dir, &["c=1"], &transport, &operator);
        let id = session.store().ids()[0];

        let payload = create_token(&mut session, id, &Settings::default())
            .await
            .unwrap();

        assert_eq!(api::token_id(&payload).as_deref(), Some("t1"));
        let paths: Vec<String> = transport.calls().into_iter().map(|c| c.path).collect();
        assert_eq!(paths, vec![IDENTITY_PATH, TOKENS_PATH]);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_token_is_skipped_after_budget() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .always(IDENTITY_PATH, ok(json!({"success": true})))
            .always(
                TOKENS_PATH,
                RemoteOutcome::RateLimited {
                    wait_hint: Some(std::time::Duration::from_secs(2)),
                    raw: Some("2".into()),
                },
            );
        let operator = Arc::new(ScriptedOperator::new());
        let mut session = scripted_session(&dir, &["c=1"], &transport, &operator);
        let id = session.store().ids()[0];

        let err = create_token(&mut session, id, &Settings::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            session::SessionError::RateLimitExhausted { attempts: 3, .. }
        ));
        assert!(!err.is_account_fatal());
        assert_eq!(transport.calls_to(TOKENS_PATH).len(), 3);
    }

    #[tokio::test]
    async fn balance_report_skips_empty_and_survives_failures() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(IDENTITY_PATH, RemoteOutcome::Failure("HTTP 502: bad gateway".into()));
        transport.always(IDENTITY_PATH, ok(json!({"balance": 5})));
        let operator = Arc::new(ScriptedOperator::new());
        let session = scripted_session(&dir, &["c=1", "", "c=3"], &transport, &operator);

        report_balances(&session).await;

        let sent: Vec<String> = transport
            .calls_to(IDENTITY_PATH)
            .into_iter()
            .map(|c| c.credential)
            .collect();
        assert_eq!(sent, vec!["c=1", "c=3"]);
        assert_eq!(operator.prompt_count(), 0);
    }

    #[tokio::test]
    async fn balance_report_never_asks_for_a_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.always(IDENTITY_PATH, RemoteOutcome::AuthInvalid(401));
        let operator = Arc::new(ScriptedOperator::with_lines(&["c=pasted"]));
        let session = scripted_session(&dir, &["c=expired"], &transport, &operator);

        report_balances(&session).await;

        assert_eq!(operator.prompt_count(), 0);
        assert_eq!(transport.calls_to(IDENTITY_PATH).len(), 1);
        let id = session.store().ids()[0];
        assert_eq!(session.store().credential(id), "c=expired");
    }
}
