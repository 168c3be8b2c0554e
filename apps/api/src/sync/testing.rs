//! In-memory fakes for the persistence and mail-source seams, used by the
//! unit tests across this module.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::gmail::{GmailMessage, MailSource, MessageHeader, MessagePart, UpstreamError};
use crate::sync::store::{CrmStore, InsertOutcome, NewContact, NewOutreach};

fn forced_failure(what: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("forced {what} failure"))
}

#[derive(Debug, Clone)]
pub struct MemCompany {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct MemContact {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub company_id: Uuid,
    pub stage: String,
    pub last_contacted: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct MemOutreach {
    pub user_id: Uuid,
    pub contact_id: Uuid,
    pub channel: String,
    pub date: NaiveDate,
    pub stage: String,
    pub preview: String,
    pub dedup_key: String,
    pub direction: String,
    pub subject: Option<String>,
}

#[derive(Debug, Default)]
pub struct MemState {
    pub checkpoints: HashMap<Uuid, DateTime<Utc>>,
    pub companies: Vec<MemCompany>,
    pub contacts: Vec<MemContact>,
    pub outreach: Vec<MemOutreach>,
    // Failure injection switches.
    pub fail_checkpoint_read: bool,
    pub fail_checkpoint_write: bool,
    pub fail_company_insert: bool,
    pub fail_contact_insert: bool,
    pub fail_outreach_insert: bool,
}

#[derive(Debug, Default)]
pub struct MemStore {
    pub state: Mutex<MemState>,
}

impl MemStore {
    pub fn seed_company(&self, user_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().companies.push(MemCompany {
            id,
            user_id,
            name: name.to_string(),
        });
        id
    }

    pub fn seed_contact(
        &self,
        user_id: Uuid,
        email: &str,
        last_contacted: Option<NaiveDate>,
    ) -> Uuid {
        let company_id = self.seed_company(user_id, "seeded");
        let id = Uuid::new_v4();
        self.state.lock().unwrap().contacts.push(MemContact {
            id,
            user_id,
            name: email.split('@').next().unwrap_or("").to_string(),
            email: email.to_string(),
            company_id,
            stage: "Cold".to_string(),
            last_contacted,
        });
        id
    }

    pub fn last_contacted(&self, contact_id: Uuid) -> Option<NaiveDate> {
        self.state
            .lock()
            .unwrap()
            .contacts
            .iter()
            .find(|c| c.id == contact_id)
            .and_then(|c| c.last_contacted)
    }

    pub fn checkpoint(&self, user_id: Uuid) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().checkpoints.get(&user_id).copied()
    }
}

#[async_trait]
impl CrmStore for MemStore {
    async fn last_synced_at(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        if state.fail_checkpoint_read {
            return Err(forced_failure("checkpoint read"));
        }
        Ok(state.checkpoints.get(&user_id).copied())
    }

    async fn advance_checkpoint(
        &self,
        user_id: Uuid,
        ts: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_checkpoint_write {
            return Err(forced_failure("checkpoint write"));
        }
        state.checkpoints.insert(user_id, ts);
        Ok(())
    }

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Uuid>, sqlx::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .contacts
            .iter()
            .find(|c| c.email == email)
            .map(|c| c.id))
    }

    async fn find_company_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .companies
            .iter()
            .find(|c| c.user_id == user_id && c.name.eq_ignore_ascii_case(name))
            .map(|c| c.id))
    }

    async fn create_company(&self, user_id: Uuid, name: &str) -> Result<Uuid, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_company_insert {
            return Err(forced_failure("company insert"));
        }
        let id = Uuid::new_v4();
        state.companies.push(MemCompany {
            id,
            user_id,
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn create_contact(&self, new: NewContact<'_>) -> Result<Uuid, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_contact_insert {
            return Err(forced_failure("contact insert"));
        }
        let id = Uuid::new_v4();
        state.contacts.push(MemContact {
            id,
            user_id: new.user_id,
            name: new.name.to_string(),
            email: new.email.to_string(),
            company_id: new.company_id,
            stage: new.stage.as_str().to_string(),
            last_contacted: Some(new.last_contacted),
        });
        Ok(id)
    }

    async fn insert_outreach(&self, new: NewOutreach<'_>) -> Result<InsertOutcome, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.outreach.iter().any(|o| o.dedup_key == new.dedup_key) {
            return Ok(InsertOutcome::DuplicateKey);
        }
        if state.fail_outreach_insert {
            return Err(forced_failure("outreach insert"));
        }
        state.outreach.push(MemOutreach {
            user_id: new.user_id,
            contact_id: new.contact_id,
            channel: new.channel.as_str().to_string(),
            date: new.date,
            stage: new.stage.as_str().to_string(),
            preview: new.preview.to_string(),
            dedup_key: new.dedup_key.to_string(),
            direction: new.direction.as_str().to_string(),
            subject: new.subject.map(str::to_string),
        });
        Ok(InsertOutcome::Created)
    }

    async fn touch_last_contacted(
        &self,
        contact_id: Uuid,
        date: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(contact) = state.contacts.iter_mut().find(|c| c.id == contact_id) {
            if contact.last_contacted.is_none_or(|current| current < date) {
                contact.last_contacted = Some(date);
            }
        }
        Ok(())
    }
}

/// Stub mail source serving canned messages.
#[derive(Debug, Default)]
pub struct StubMail {
    pub messages: Vec<GmailMessage>,
    /// Ids included in listings whose fetch fails.
    pub unfetchable: Vec<String>,
    pub fail_listing: bool,
}

impl StubMail {
    pub fn with_messages(messages: Vec<GmailMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }
}

#[async_trait]
impl MailSource for StubMail {
    async fn list_sent_message_ids(
        &self,
        _token: &str,
        _after_unix: i64,
        _max_results: u32,
    ) -> Result<Vec<String>, UpstreamError> {
        if self.fail_listing {
            return Err(UpstreamError::Api {
                status: 500,
                body: "listing unavailable".to_string(),
            });
        }
        Ok(self
            .messages
            .iter()
            .map(|m| m.id.clone())
            .chain(self.unfetchable.iter().cloned())
            .collect())
    }

    async fn fetch_message(&self, _token: &str, id: &str) -> Result<GmailMessage, UpstreamError> {
        self.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(UpstreamError::Api {
                status: 404,
                body: format!("message {id} not found"),
            })
    }
}

/// Builds a full sent message the way the Gmail API would return it.
pub fn sent_message(id: &str, to: &str, subject: &str, date: &str, snippet: &str) -> GmailMessage {
    let headers = [("To", to), ("Subject", subject), ("Date", date)]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| MessageHeader {
            name: name.to_string(),
            value: value.to_string(),
        })
        .collect();

    GmailMessage {
        id: id.to_string(),
        snippet: Some(snippet.to_string()),
        payload: Some(MessagePart {
            filename: None,
            headers,
            parts: None,
        }),
    }
}
