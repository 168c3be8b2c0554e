use sqlx::PgPool;

use crate::config::Config;
use crate::gmail::GmailClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub gmail: GmailClient,
    pub config: Config,
}
