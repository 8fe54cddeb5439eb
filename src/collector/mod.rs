pub mod pending;
pub mod session;

use crate::analyzer::categorizer::CategoryRules;
use crate::collector::pending::PendingEntries;
use crate::collector::session::{EntryDraft, TabEvent, TrackingSession};
use crate::config::Config;
use anyhow::{Context, Result};
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, info, warn};

const SUBMIT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Deserialize)]
struct CreatedEntry {
    id: i64,
}

/// Reads tab events line by line from `input`, times the active tab and
/// submits every finished session to the API. Runs until `input` closes.
/// Entries the API does not accept are kept in the pending file and retried
/// after the next successful submit.
pub async fn run_tab_collector<R>(
    config: Arc<Config>,
    rules: Arc<CategoryRules>,
    input: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(SUBMIT_TIMEOUT_SECONDS))
        .build()
        .context("Failed to build HTTP client")?;
    let endpoint = format!("{}/api/time-entry", config.server_base_url());
    let pending = PendingEntries::new(&config.pending_path);
    let mut session = TrackingSession::default();
    let mut lines = input.lines();

    info!(endpoint = %endpoint, "tab collector started");

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read tab event")?
    {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event = match serde_json::from_str::<TabEvent>(trimmed) {
            Ok(event) => event,
            Err(error) => {
                warn!(error = %error, line = trimmed, "ignoring malformed tab event");
                continue;
            }
        };

        if let Some(draft) = session.handle(event, Local::now(), &rules) {
            submit_logged(&client, &endpoint, &pending, &draft).await;
        }

        if let Some(tab) = session.active() {
            debug!(domain = %tab.domain, timing = session.is_timing(), "tab session updated");
        }
    }

    if let Some(draft) = session.close(Local::now(), &rules) {
        submit_logged(&client, &endpoint, &pending, &draft).await;
    }

    info!("tab collector stopped");
    Ok(())
}

async fn submit_logged(
    client: &reqwest::Client,
    endpoint: &str,
    pending: &PendingEntries,
    draft: &EntryDraft,
) {
    match submit_entry(client, endpoint, draft).await {
        Ok(id) => {
            info!(
                id,
                domain = %draft.domain,
                category = %draft.category,
                time_spent = draft.time_spent,
                "time entry submitted"
            );
            replay_pending(client, endpoint, pending).await;
        }
        Err(submit_error) => {
            warn!(error = %submit_error, domain = %draft.domain, "backend not available");
            if let Err(error) = pending.append(draft) {
                error!(error = %format!("{error:#}"), "failed to keep pending entry");
            }
        }
    }
}

async fn replay_pending(client: &reqwest::Client, endpoint: &str, pending: &PendingEntries) {
    let drafts = match pending.load() {
        Ok(drafts) => drafts,
        Err(error) => {
            error!(error = %format!("{error:#}"), "failed to read pending entries");
            return;
        }
    };
    if drafts.is_empty() {
        return;
    }

    let total = drafts.len();
    let mut remaining = Vec::new();
    for draft in drafts {
        if let Err(error) = submit_entry(client, endpoint, &draft).await {
            debug!(error = %error, domain = %draft.domain, "pending entry not accepted yet");
            remaining.push(draft);
        }
    }

    info!(
        replayed = total - remaining.len(),
        remaining = remaining.len(),
        "pending entries replayed"
    );
    if let Err(error) = pending.replace(&remaining) {
        error!(error = %format!("{error:#}"), "failed to update pending entries");
    }
}

pub async fn submit_entry(
    client: &reqwest::Client,
    endpoint: &str,
    draft: &EntryDraft,
) -> Result<i64> {
    let created = client
        .post(endpoint)
        .json(draft)
        .send()
        .await
        .with_context(|| format!("Failed to reach {endpoint}"))?
        .error_for_status()
        .context("Server rejected time entry")?
        .json::<CreatedEntry>()
        .await
        .context("Failed to parse time entry response")?;

    Ok(created.id)
}
