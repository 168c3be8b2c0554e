use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::gmail::MailSource;
use crate::models::crm::{Channel, RelationshipStage};
use crate::sync::attachments::has_resume_attachment;
use crate::sync::checkpoint;
use crate::sync::recipients::parse_recipients;
use crate::sync::recorder::{record_outreach, truncate_preview, OutreachOutcome, OutreachParams};
use crate::sync::resolver::resolve_contact;
use crate::sync::store::CrmStore;

/// One page of the Gmail list call; the engine does not paginate beyond it.
pub const LIST_PAGE_SIZE: u32 = 100;

/// Counters accumulated over one run. `hard_errors` gates the checkpoint
/// and stays internal; the other three are returned to the caller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: u32,
    pub contacts_created: u32,
    pub skipped: u32,
    pub hard_errors: u32,
}

/// Runs one sync for one user: resolve the window, list sent mail, fold
/// every message/recipient into the CRM, and advance the checkpoint only
/// when nothing failed to persist. Per-message and per-recipient trouble
/// is counted, not propagated; only a failed listing call aborts the run.
pub async fn run_sync(
    store: &dyn CrmStore,
    mail: &dyn MailSource,
    provider_token: &str,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<SyncReport, AppError> {
    let window_start = checkpoint::window_start(store, user_id, now).await;

    let message_ids = mail
        .list_sent_message_ids(provider_token, window_start.timestamp(), LIST_PAGE_SIZE)
        .await?;
    info!(
        "found {} candidate messages for user {user_id} after {window_start}",
        message_ids.len()
    );

    let mut report = SyncReport::default();

    if message_ids.is_empty() {
        // An empty window is a successful run.
        advance_checkpoint_or_warn(store, user_id, now).await;
        return Ok(report);
    }

    for message_id in &message_ids {
        let message = match mail.fetch_message(provider_token, message_id).await {
            Ok(m) => m,
            Err(e) => {
                warn!("failed to fetch message {message_id}: {e}");
                report.skipped += 1;
                continue;
            }
        };

        let recipients = parse_recipients(message.header("To"));
        if recipients.is_empty() {
            report.skipped += 1;
            continue;
        }

        let subject = message.header("Subject");
        let sent_date = parse_sent_date(message.header("Date"), now);
        let preview = truncate_preview(message.snippet.as_deref().unwrap_or(""));

        if has_resume_attachment(message.payload.as_ref()) {
            // Signal only; nothing links resumes to outreach yet.
            debug!("message {message_id} carries a resume-like attachment");
        }

        for recipient in &recipients {
            let resolution =
                match resolve_contact(store, recipient, sent_date, user_id).await {
                    Ok(r) => r,
                    Err(e) => {
                        error!("failed to resolve contact {}: {e}", recipient.email);
                        report.hard_errors += 1;
                        report.skipped += 1;
                        continue;
                    }
                };
            if resolution.created {
                report.contacts_created += 1;
            }

            let dedup_key = format!("{message_id}-{}", recipient.email);
            let outcome = record_outreach(
                store,
                OutreachParams {
                    user_id,
                    contact_id: resolution.contact_id,
                    channel: Channel::Email,
                    date: sent_date,
                    stage: RelationshipStage::Cold,
                    preview,
                    dedup_key: &dedup_key,
                    subject: (!subject.is_empty()).then_some(subject),
                },
            )
            .await;

            match outcome {
                OutreachOutcome::Created => report.synced += 1,
                OutreachOutcome::Duplicate => report.skipped += 1,
                OutreachOutcome::Failed => {
                    report.hard_errors += 1;
                    report.skipped += 1;
                }
            }
        }
    }

    // A run with hard errors keeps the old watermark so the next run
    // re-observes the same window; dedup keys absorb the overlap.
    if report.hard_errors == 0 {
        advance_checkpoint_or_warn(store, user_id, now).await;
    } else {
        warn!(
            "run for user {user_id} had {} hard errors; checkpoint not advanced",
            report.hard_errors
        );
    }

    Ok(report)
}

/// The CRM rows are already durable by the time the watermark is written,
/// so a failed write is a warning, not a run failure: the counters still
/// go back to the caller, and the next run re-observes a window the dedup
/// key absorbs.
async fn advance_checkpoint_or_warn(store: &dyn CrmStore, user_id: Uuid, now: DateTime<Utc>) {
    if let Err(e) = store.advance_checkpoint(user_id, now).await {
        warn!("failed to advance checkpoint for user {user_id}: {e}");
    }
}

fn parse_sent_date(date_header: &str, now: DateTime<Utc>) -> NaiveDate {
    DateTime::parse_from_rfc2822(date_header.trim())
        .map(|d| d.date_naive())
        .unwrap_or_else(|_| now.date_naive())
}
