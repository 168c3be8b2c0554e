use chrono::{DateTime, Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::sync::store::CrmStore;

/// How far back the first sync reaches when a user has no watermark yet.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Returns the start of the sync window: the stored watermark if present,
/// else `now` minus the default lookback. Absence is the normal state for
/// a first sync, and a failed read degrades to the default window — the
/// worst case is re-observing messages the outreach dedup key already
/// rejects.
pub async fn window_start(store: &dyn CrmStore, user_id: Uuid, now: DateTime<Utc>) -> DateTime<Utc> {
    match store.last_synced_at(user_id).await {
        Ok(Some(watermark)) => watermark,
        Ok(None) => now - Duration::days(DEFAULT_LOOKBACK_DAYS),
        Err(e) => {
            warn!("checkpoint read failed for user {user_id}, using default lookback: {e}");
            now - Duration::days(DEFAULT_LOOKBACK_DAYS)
        }
    }
}
