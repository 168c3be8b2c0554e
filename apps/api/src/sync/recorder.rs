use chrono::NaiveDate;
use tracing::{error, warn};
use uuid::Uuid;

use crate::models::crm::{Channel, Direction, RelationshipStage};
use crate::sync::store::{CrmStore, InsertOutcome, NewOutreach};

/// Outreach previews keep at most this many characters of the snippet.
pub const PREVIEW_MAX_CHARS: usize = 200;

pub struct OutreachParams<'a> {
    pub user_id: Uuid,
    pub contact_id: Uuid,
    pub channel: Channel,
    pub date: NaiveDate,
    pub stage: RelationshipStage,
    pub preview: &'a str,
    pub dedup_key: &'a str,
    pub subject: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutreachOutcome {
    /// Row inserted; counts toward `synced`.
    Created,
    /// Store rejected the dedup key; expected on re-runs, counts as a skip.
    Duplicate,
    /// Non-duplicate persistence failure; counts as a skip AND a hard error.
    Failed,
}

/// Inserts one sent-direction outreach event, then nudges the contact's
/// `last_contacted` forward if this message is newer. A failed nudge is
/// logged and swallowed: the outreach row is already durable and the next
/// newer message will retry the same conditional update.
pub async fn record_outreach(store: &dyn CrmStore, params: OutreachParams<'_>) -> OutreachOutcome {
    let insert = store
        .insert_outreach(NewOutreach {
            user_id: params.user_id,
            contact_id: params.contact_id,
            channel: params.channel,
            date: params.date,
            stage: params.stage,
            preview: params.preview,
            dedup_key: params.dedup_key,
            direction: Direction::Sent,
            subject: params.subject,
        })
        .await;

    match insert {
        Ok(InsertOutcome::Created) => {
            if let Err(e) = store.touch_last_contacted(params.contact_id, params.date).await {
                warn!(
                    "failed to refresh last_contacted for contact {}: {e}",
                    params.contact_id
                );
            }
            OutreachOutcome::Created
        }
        Ok(InsertOutcome::DuplicateKey) => OutreachOutcome::Duplicate,
        Err(e) => {
            error!("outreach insert failed for key {}: {e}", params.dedup_key);
            OutreachOutcome::Failed
        }
    }
}

/// Truncates a snippet to the preview budget on a char boundary.
pub fn truncate_preview(snippet: &str) -> &str {
    match snippet.char_indices().nth(PREVIEW_MAX_CHARS) {
        Some((i, _)) => &snippet[..i],
        None => snippet,
    }
}
