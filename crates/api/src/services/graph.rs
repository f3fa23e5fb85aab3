//! Microsoft Graph client for the practice mailbox and calendar.
//!
//! Uses the OAuth2 client-credentials flow. The access token is cached until
//! shortly before it expires.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use domain::services::reply_matching::InboundEmail;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::GraphConfig;

const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
const LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Refresh the token this long before Graph says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Errors from Graph API calls.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Graph is not configured")]
    NotConfigured,

    #[error("Token request failed: {0}")]
    Token(String),

    #[error("Graph request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Graph returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected Graph response: {0}")]
    InvalidResponse(String),
}

/// One file attached to an outgoing message.
#[derive(Debug, Clone)]
pub struct GraphAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// An outgoing message sent from the practice mailbox.
#[derive(Debug, Clone)]
pub struct GraphMail {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
    pub reply_to: Option<String>,
    pub attachments: Vec<GraphAttachment>,
}

/// An unread inbox message together with its Graph id.
#[derive(Debug, Clone)]
pub struct MailboxMessage {
    /// Graph object id, needed to mark the message read.
    pub graph_id: String,
    pub email: InboundEmail,
}

/// A calendar event for a confirmed booking.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub subject: String,
    pub body: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: Option<String>,
    pub attendee_email: String,
    pub attendee_name: String,
    /// Idempotency key so a retried create does not duplicate the event.
    pub transaction_id: String,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    value: Vec<GraphMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphMessage {
    id: String,
    internet_message_id: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    from: Option<Recipient>,
    body: Option<ItemBody>,
    received_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    internet_message_headers: Vec<MessageHeader>,
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct Recipient {
    email_address: EmailAddress,
}

#[derive(Deserialize, Serialize)]
struct EmailAddress {
    #[serde(default)]
    address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

#[derive(Deserialize)]
struct CreatedEvent {
    id: String,
}

/// Graph API client bound to one mailbox.
pub struct GraphClient {
    http: reqwest::Client,
    config: GraphConfig,
    token: Mutex<Option<CachedToken>>,
}

impl GraphClient {
    pub fn new(config: GraphConfig) -> Result<Self, GraphError> {
        if !config.is_configured() {
            return Err(GraphError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    pub fn mailbox(&self) -> &str {
        &self.config.mailbox
    }

    fn user_url(&self, path: &str) -> String {
        format!("{}/users/{}{}", GRAPH_BASE_URL, self.config.mailbox, path)
    }

    async fn access_token(&self) -> Result<String, GraphError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_EXPIRY_MARGIN < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            LOGIN_BASE_URL, self.config.tenant_id
        );
        let response = self
            .http
            .post(url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Token(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Token(e.to_string()))?;
        tracing::debug!(expires_in = token.expires_in, "Fetched Graph access token");

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(access_token)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GraphError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(GraphError::Api { status, body })
    }

    /// Sends a message from the configured mailbox.
    pub async fn send_mail(&self, mail: &GraphMail) -> Result<(), GraphError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.user_url("/sendMail"))
            .bearer_auth(token)
            .json(&send_mail_payload(mail))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Lists unread inbox messages, oldest first, starting after the first
    /// `skip` of them.
    pub async fn list_unread_messages(
        &self,
        limit: u32,
        skip: u32,
    ) -> Result<Vec<MailboxMessage>, GraphError> {
        let token = self.access_token().await?;
        let top = limit.to_string();
        let skip = skip.to_string();
        let response = self
            .http
            .get(self.user_url("/mailFolders/inbox/messages"))
            .bearer_auth(token)
            .header("Prefer", "outlook.body-content-type=\"text\"")
            .query(&[
                // Graph only sorts a filtered list by a property that also
                // leads the filter
                (
                    "$filter",
                    "receivedDateTime ge 1900-01-01T00:00:00Z and isRead eq false",
                ),
                ("$orderby", "receivedDateTime asc"),
                ("$top", top.as_str()),
                ("$skip", skip.as_str()),
                (
                    "$select",
                    "id,internetMessageId,subject,from,body,receivedDateTime,internetMessageHeaders",
                ),
            ])
            .send()
            .await?;

        let list: MessageList = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| GraphError::InvalidResponse(e.to_string()))?;

        Ok(list.value.into_iter().map(into_mailbox_message).collect())
    }

    pub async fn mark_read(&self, graph_id: &str) -> Result<(), GraphError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .patch(self.user_url(&format!("/messages/{}", graph_id)))
            .bearer_auth(token)
            .json(&json!({ "isRead": true }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Creates an event in the practitioner's calendar and returns its id.
    pub async fn create_event(&self, event: &CalendarEvent) -> Result<String, GraphError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.user_url("/events"))
            .bearer_auth(token)
            .json(&event_payload(event))
            .send()
            .await?;

        let created: CreatedEvent = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| GraphError::InvalidResponse(e.to_string()))?;
        Ok(created.id)
    }

    /// Deletes a calendar event. An event that is already gone counts as deleted.
    pub async fn delete_event(&self, event_id: &str) -> Result<(), GraphError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .delete(self.user_url(&format!("/events/{}", event_id)))
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(event_id = %event_id, "Calendar event already deleted");
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("mailbox", &self.config.mailbox)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

fn send_mail_payload(mail: &GraphMail) -> Value {
    let (content_type, content) = match &mail.body_html {
        Some(html) => ("HTML", html.as_str()),
        None => ("Text", mail.body_text.as_str()),
    };

    let mut message = json!({
        "subject": mail.subject,
        "body": { "contentType": content_type, "content": content },
        "toRecipients": [Recipient {
            email_address: EmailAddress {
                address: Some(mail.to.clone()),
                name: mail.to_name.clone(),
            },
        }],
    });

    if let Some(reply_to) = &mail.reply_to {
        message["replyTo"] = json!([{ "emailAddress": { "address": reply_to } }]);
    }

    if !mail.attachments.is_empty() {
        message["attachments"] = Value::Array(
            mail.attachments
                .iter()
                .map(|a| {
                    json!({
                        "@odata.type": "#microsoft.graph.fileAttachment",
                        "name": a.filename,
                        "contentType": a.content_type,
                        "contentBytes": BASE64.encode(&a.content),
                    })
                })
                .collect(),
        );
    }

    json!({ "message": message, "saveToSentItems": true })
}

fn event_payload(event: &CalendarEvent) -> Value {
    let mut payload = json!({
        "subject": event.subject,
        "body": { "contentType": "Text", "content": event.body },
        "start": {
            "dateTime": event.starts_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "timeZone": "UTC",
        },
        "end": {
            "dateTime": event.ends_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "timeZone": "UTC",
        },
        "attendees": [{
            "emailAddress": { "address": event.attendee_email, "name": event.attendee_name },
            "type": "required",
        }],
        "transactionId": event.transaction_id,
    });
    if let Some(location) = &event.location {
        payload["location"] = json!({ "displayName": location });
    }
    payload
}

/// Messages without a sender keep an empty `from_address` so the caller can
/// still mark them read.
fn into_mailbox_message(message: GraphMessage) -> MailboxMessage {
    let (from_address, from_name) = match message.from {
        Some(recipient) => (
            recipient
                .email_address
                .address
                .map(|a| a.trim().to_lowercase())
                .unwrap_or_default(),
            recipient.email_address.name.filter(|n| !n.trim().is_empty()),
        ),
        None => (String::new(), None),
    };

    let external_id = message
        .internet_message_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| message.id.clone());

    MailboxMessage {
        graph_id: message.id,
        email: InboundEmail {
            external_id,
            from_address,
            from_name,
            subject: message.subject.unwrap_or_default(),
            body: message.body.map(|b| b.content).unwrap_or_default(),
            received_at: message.received_date_time.unwrap_or_else(Utc::now),
            headers: message
                .internet_message_headers
                .into_iter()
                .map(|h| (h.name, h.value))
                .collect(),
        },
    }
}
