use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::crm::{Channel, Direction, RelationshipStage};

/// Insert result for outreach rows. Duplicate-key rejection is an expected
/// outcome on re-runs, so it is a variant here rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    DuplicateKey,
}

/// Parameters for creating a new contact.
pub struct NewContact<'a> {
    pub user_id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub company_id: Uuid,
    pub stage: RelationshipStage,
    pub last_contacted: NaiveDate,
}

/// Parameters for inserting one outreach event.
pub struct NewOutreach<'a> {
    pub user_id: Uuid,
    pub contact_id: Uuid,
    pub channel: Channel,
    pub date: NaiveDate,
    pub stage: RelationshipStage,
    pub preview: &'a str,
    /// `"{message_id}-{recipient_email}"`, enforced unique by the store.
    pub dedup_key: &'a str,
    pub direction: Direction,
    pub subject: Option<&'a str>,
}

/// Persistence seam for the sync engine. The engine only ever talks to the
/// CRM tables through this trait, which keeps the orchestrator testable
/// against an in-memory store.
#[async_trait]
pub trait CrmStore: Send + Sync {
    /// Reads the per-user sync watermark. `None` is the normal state before
    /// the first successful run.
    async fn last_synced_at(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>, sqlx::Error>;

    /// Unconditional upsert of the sync watermark. Last writer wins; dedup
    /// at the outreach layer, not the checkpoint, prevents duplicates when
    /// runs overlap.
    async fn advance_checkpoint(&self, user_id: Uuid, ts: DateTime<Utc>)
        -> Result<(), sqlx::Error>;

    /// Contact lookup by email. Deliberately not scoped to a user: contact
    /// identity is global and backed by `UNIQUE (email)` in the schema.
    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Uuid>, sqlx::Error>;

    /// Case-insensitive company lookup, scoped to the owning user.
    async fn find_company_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Uuid>, sqlx::Error>;

    async fn create_company(&self, user_id: Uuid, name: &str) -> Result<Uuid, sqlx::Error>;

    async fn create_contact(&self, new: NewContact<'_>) -> Result<Uuid, sqlx::Error>;

    async fn insert_outreach(&self, new: NewOutreach<'_>) -> Result<InsertOutcome, sqlx::Error>;

    /// Moves `last_contacted` forward to `date` if (and only if) it is
    /// newer than the current value.
    async fn touch_last_contacted(
        &self,
        contact_id: Uuid,
        date: NaiveDate,
    ) -> Result<(), sqlx::Error>;
}

/// Production store backed by the Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrmStore for PgStore {
    async fn last_synced_at(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
        let row: Option<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT last_gmail_sync_at FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.flatten())
    }

    async fn advance_checkpoint(
        &self,
        user_id: Uuid,
        ts: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, last_gmail_sync_at)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET last_gmail_sync_at = EXCLUDED.last_gmail_sync_at
            "#,
        )
        .bind(user_id)
        .bind(ts)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM contacts WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_company_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM companies WHERE user_id = $1 AND name ILIKE $2")
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_company(&self, user_id: Uuid, name: &str) -> Result<Uuid, sqlx::Error> {
        sqlx::query_scalar("INSERT INTO companies (name, user_id) VALUES ($1, $2) RETURNING id")
            .bind(name)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn create_contact(&self, new: NewContact<'_>) -> Result<Uuid, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO contacts
                (name, email, company_id, relationship_stage, last_contacted, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(new.name)
        .bind(new.email)
        .bind(new.company_id)
        .bind(new.stage.as_str())
        .bind(new.last_contacted)
        .bind(new.user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn insert_outreach(&self, new: NewOutreach<'_>) -> Result<InsertOutcome, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO outreach
                (contact_id, channel, date, stage, preview,
                 gmail_message_id, direction, subject, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(new.contact_id)
        .bind(new.channel.as_str())
        .bind(new.date)
        .bind(new.stage.as_str())
        .bind(new.preview)
        .bind(new.dedup_key)
        .bind(new.direction.as_str())
        .bind(new.subject)
        .bind(new.user_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Created),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(InsertOutcome::DuplicateKey)
            }
            Err(e) => Err(e),
        }
    }

    async fn touch_last_contacted(
        &self,
        contact_id: Uuid,
        date: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE contacts
            SET last_contacted = $2
            WHERE id = $1
              AND (last_contacted IS NULL OR last_contacted < $2)
            "#,
        )
        .bind(contact_id)
        .bind(date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
