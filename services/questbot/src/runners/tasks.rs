//! Reward task runner
//!
//! Fetch the task list, then for every pending task: pause, complete it,
//! and refresh the identity so the log shows the new balance. A failed
//! completion or refresh is logged and the loop moves on; only an
//! account-fatal error stops it.

use account_store::AccountId;
use remote::ApiRequest;
use session::{CancellationToken, DelayOutcome, Session};
use tracing::{info, warn};

use super::Settings;
use crate::api;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub listed: usize,
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: bool,
}

pub async fn run(
    session: &mut Session,
    id: AccountId,
    settings: &Settings,
    cancel: &CancellationToken,
) -> session::Result<TaskReport> {
    let label = session.label(id).to_string();
    session.ensure_valid(id).await?;

    let payload = session
        .with_retry(id, "list tasks", &ApiRequest::list_tasks(), settings.task_attempts)
        .await?;
    let tasks = api::parse_tasks(&payload);
    let pending: Vec<_> = tasks.iter().filter(|t| t.is_pending()).collect();

    let mut report = TaskReport {
        listed: tasks.len(),
        pending: pending.len(),
        ..Default::default()
    };
    info!(account = %label, listed = report.listed, pending = report.pending, "tasks fetched");

    for task in pending {
        if settings.pacing.task_delay.sleep(Some(cancel)).await == DelayOutcome::Cancelled {
            report.cancelled = true;
            break;
        }

        match session
            .with_retry(
                id,
                "complete task",
                &ApiRequest::complete_task(&task.id),
                settings.task_attempts,
            )
            .await
        {
            Ok(_) => {
                report.completed += 1;
                info!(account = %label, task_id = %task.id, title = %task.title, "task completed");
            }
            Err(e) if e.is_account_fatal() => return Err(e),
            Err(e) => {
                report.failed += 1;
                warn!(account = %label, task_id = %task.id, error = %e, "task failed");
            }
        }

        match session
            .with_retry(
                id,
                "refresh identity",
                &ApiRequest::identity(),
                settings.identity_attempts,
            )
            .await
        {
            Ok(identity) => {
                info!(account = %label, balance = api::parse_balance(&identity), "balance updated");
            }
            Err(e) if e.is_account_fatal() => return Err(e),
            Err(e) => warn!(account = %label, error = %e, "identity refresh failed"),
        }
    }

    info!(
        account = %label,
        completed = report.completed,
        failed = report.failed,
        cancelled = report.cancelled,
        "task run finished"
    );
    Ok(report)
}
