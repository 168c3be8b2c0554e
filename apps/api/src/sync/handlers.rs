use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;
use crate::sync::engine::run_sync;
use crate::sync::store::PgStore;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    #[serde(default)]
    pub provider_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub synced: u32,
    pub contacts_created: u32,
    pub skipped: u32,
}

/// POST /api/v1/gmail/sync
///
/// Runs one Gmail sync for the authenticated caller. The delegated Google
/// OAuth token comes in the body; without it nothing is ever listed.
pub async fn handle_gmail_sync(
    State(state): State<AppState>,
    user: AuthUser,
    body: Option<Json<SyncRequest>>,
) -> Result<Json<SyncResponse>, AppError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let provider_token = request
        .provider_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Validation(
                "providerToken is required — sign in with Google first".to_string(),
            )
        })?;

    let store = PgStore::new(state.db.clone());
    let report = run_sync(
        &store,
        &state.gmail,
        &provider_token,
        user.user_id,
        Utc::now(),
    )
    .await?;

    info!(
        "gmail sync for user {} finished: synced={} contacts_created={} skipped={}",
        user.user_id, report.synced, report.contacts_created, report.skipped
    );

    Ok(Json(SyncResponse {
        synced: report.synced,
        contacts_created: report.contacts_created,
        skipped: report.skipped,
    }))
}
