/// Gmail Client — the single point of entry for all Gmail API calls.
///
/// Every call is made with a caller-supplied delegated OAuth token; this
/// module never holds credentials of its own. List failures surface as
/// typed `UpstreamError`s; fetch failures are absorbed per-message by the
/// sync engine.
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

const GMAIL_API: &str = "https://gmail.googleapis.com/gmail/v1";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

/// One node of the message MIME tree. Gmail omits `parts` on leaf nodes
/// and `filename` on container nodes, so everything is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePart {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub headers: Vec<MessageHeader>,
    #[serde(default)]
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GmailMessage {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

impl GmailMessage {
    /// Case-insensitive lookup of a top-level message header ("To",
    /// "Subject", "Date"). Returns the empty string when absent.
    pub fn header(&self, name: &str) -> &str {
        self.payload
            .as_ref()
            .and_then(|p| {
                p.headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(name))
            })
            .map(|h| h.value.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Deserialize)]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

/// Seam between the sync engine and the external mail API, so the engine
/// is testable against a stub source.
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Lists ids of sent messages after the given unix time, bounded by
    /// `max_results`.
    async fn list_sent_message_ids(
        &self,
        token: &str,
        after_unix: i64,
        max_results: u32,
    ) -> Result<Vec<String>, UpstreamError>;

    /// Fetches the full message (headers, snippet, MIME tree) by id.
    async fn fetch_message(&self, token: &str, id: &str) -> Result<GmailMessage, UpstreamError>;
}

#[derive(Clone)]
pub struct GmailClient {
    client: reqwest::Client,
    base_url: String,
}

impl GmailClient {
    pub fn new() -> Self {
        Self::with_base_url(GMAIL_API.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
        }
    }
}

impl Default for GmailClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailSource for GmailClient {
    async fn list_sent_message_ids(
        &self,
        token: &str,
        after_unix: i64,
        max_results: u32,
    ) -> Result<Vec<String>, UpstreamError> {
        let url = format!(
            "{}/users/me/messages?q=in:sent+after:{}&maxResults={}",
            self.base_url, after_unix, max_results
        );
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let list: ListMessagesResponse = response.json().await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn fetch_message(&self, token: &str, id: &str) -> Result<GmailMessage, UpstreamError> {
        let url = format!("{}/users/me/messages/{}?format=full", self.base_url, id);
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
