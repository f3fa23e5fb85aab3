//! Attaches client replies from the practice mailbox to booking and contact
//! conversations.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use domain::models::message::{ConversationOwner, MessageDirection, NewConversationMessage};
use domain::services::reply_matching::{
    classify, strip_quoted_reply, ConversationRef, InboundEmail, MatchDecision,
};
use persistence::repositories::{BookingRepository, ContactRepository, MessageRepository};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::middleware::metrics::record_inbox_message;
use crate::services::graph::{GraphClient, GraphError, MailboxMessage};

#[derive(Debug, thiserror::Error)]
pub enum InboxSyncError {
    #[error("Mailbox access is not configured")]
    NotConfigured,

    #[error("Mailbox error: {0}")]
    Graph(#[from] GraphError),
}

/// Counters for one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InboxSyncSummary {
    pub scanned: u32,
    pub matched: u32,
    pub duplicates: u32,
    pub auto_replies: u32,
    pub unmatched: u32,
    /// Messages without a sender address.
    pub skipped: u32,
    /// Messages left unread because storing them failed.
    pub failed: u32,
}

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxOutcome {
    Matched,
    Duplicate,
    AutoReply,
    Unmatched,
    /// No sender address to reply to or match on.
    Skipped,
}

impl InboxOutcome {
    fn label(self) -> &'static str {
        match self {
            InboxOutcome::Matched => "matched",
            InboxOutcome::Duplicate => "duplicate",
            InboxOutcome::AutoReply => "auto_reply",
            InboxOutcome::Unmatched => "unmatched",
            InboxOutcome::Skipped => "skipped",
        }
    }
}

impl InboxSyncSummary {
    fn count(&mut self, outcome: InboxOutcome) {
        match outcome {
            InboxOutcome::Matched => self.matched += 1,
            InboxOutcome::Duplicate => self.duplicates += 1,
            InboxOutcome::AutoReply => self.auto_replies += 1,
            InboxOutcome::Unmatched => self.unmatched += 1,
            InboxOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Pages fetched per run at most.
const MAX_PAGES_PER_RUN: u32 = 10;

/// The unread side of the practice mailbox.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Unread messages, oldest first, starting after the first `skip`.
    async fn list_unread(&self, limit: u32, skip: u32) -> Result<Vec<MailboxMessage>, GraphError>;

    async fn mark_read(&self, graph_id: &str) -> Result<(), GraphError>;
}

#[async_trait]
impl Mailbox for GraphClient {
    async fn list_unread(&self, limit: u32, skip: u32) -> Result<Vec<MailboxMessage>, GraphError> {
        self.list_unread_messages(limit, skip).await
    }

    async fn mark_read(&self, graph_id: &str) -> Result<(), GraphError> {
        GraphClient::mark_read(self, graph_id).await
    }
}

pub struct InboxSyncService {
    mailbox: Option<Arc<dyn Mailbox>>,
    bookings: BookingRepository,
    contacts: ContactRepository,
    messages: MessageRepository,
    own_addresses: Vec<String>,
    mailbox_address: String,
    page_size: u32,
    fallback_window: Duration,
}

impl InboxSyncService {
    pub fn new(pool: PgPool, config: &Config, graph: Option<Arc<GraphClient>>) -> Self {
        Self::with_mailbox(pool, config, graph.map(|g| g as Arc<dyn Mailbox>))
    }

    pub fn with_mailbox(pool: PgPool, config: &Config, mailbox: Option<Arc<dyn Mailbox>>) -> Self {
        Self {
            mailbox,
            bookings: BookingRepository::new(pool.clone()),
            contacts: ContactRepository::new(pool.clone()),
            messages: MessageRepository::new(pool),
            own_addresses: config.own_addresses(),
            mailbox_address: config.graph.mailbox.clone(),
            page_size: config.inbox.max_messages.max(1),
            fallback_window: Duration::days(config.inbox.fallback_window_days),
        }
    }

    /// Processes unread mailbox messages page by page.
    ///
    /// Handled messages are marked read and drop out of the unread list.
    /// Messages that stay unread (store or mark-read failed) are skipped on
    /// the following pages so they cannot hide newer mail.
    pub async fn run_once(&self) -> Result<InboxSyncSummary, InboxSyncError> {
        let mailbox = self.mailbox.as_ref().ok_or(InboxSyncError::NotConfigured)?;

        let mut summary = InboxSyncSummary::default();
        let mut left_unread = 0u32;
        for _ in 0..MAX_PAGES_PER_RUN {
            let page = mailbox.list_unread(self.page_size, left_unread).await?;
            let full_page = page.len() >= self.page_size as usize;

            for message in page {
                summary.scanned += 1;

                let outcome = match self.handle(&message.email).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(
                            external_id = %message.email.external_id,
                            error = %e,
                            "Failed to store inbound message, leaving it unread"
                        );
                        summary.failed += 1;
                        left_unread += 1;
                        continue;
                    }
                };

                summary.count(outcome);
                record_inbox_message(outcome.label());
                if let Err(e) = mailbox.mark_read(&message.graph_id).await {
                    warn!(graph_id = %message.graph_id, error = %e, "Failed to mark mailbox message read");
                    left_unread += 1;
                }
            }

            if !full_page {
                break;
            }
        }

        if summary.scanned > 0 {
            info!(
                scanned = summary.scanned,
                matched = summary.matched,
                duplicates = summary.duplicates,
                auto_replies = summary.auto_replies,
                unmatched = summary.unmatched,
                skipped = summary.skipped,
                failed = summary.failed,
                "Inbox sync finished"
            );
        }
        Ok(summary)
    }

    /// Attaches one inbound message to its conversation.
    ///
    /// Stores it as an INBOUND message and flags the booking or contact as
    /// having an unread reply. Does not touch the mailbox.
    pub async fn handle(&self, email: &InboundEmail) -> Result<InboxOutcome, sqlx::Error> {
        if email.from_address.trim().is_empty() {
            debug!(external_id = %email.external_id, "Inbound message has no sender");
            return Ok(InboxOutcome::Skipped);
        }

        if self.messages.exists_external_id(&email.external_id).await? {
            return Ok(InboxOutcome::Duplicate);
        }

        let owner = match classify(email, &self.own_addresses) {
            MatchDecision::Skip(reason) => {
                debug!(external_id = %email.external_id, reason = ?reason, "Skipping automatic message");
                return Ok(InboxOutcome::AutoReply);
            }
            MatchDecision::Tagged(reference) => self.find_tagged(&reference).await?,
            MatchDecision::Untagged => self.find_by_sender(email).await?,
        };

        let Some(owner) = owner else {
            debug!(external_id = %email.external_id, from = %email.from_address, "No conversation for inbound message");
            return Ok(InboxOutcome::Unmatched);
        };

        let body = match strip_quoted_reply(&email.body) {
            stripped if stripped.is_empty() => email.body.trim().to_string(),
            stripped => stripped,
        };

        let stored = self
            .messages
            .create(&NewConversationMessage {
                owner,
                direction: MessageDirection::Inbound,
                from_address: email.from_address.trim().to_lowercase(),
                to_address: self.mailbox_address.clone(),
                subject: email.subject.clone(),
                body,
                external_message_id: Some(email.external_id.clone()),
                created_at: email.received_at,
            })
            .await?;

        if stored.is_none() {
            return Ok(InboxOutcome::Duplicate);
        }

        match owner {
            ConversationOwner::Booking(id) => self.bookings.set_unread_reply(id, true).await?,
            ConversationOwner::Contact(id) => self.contacts.set_unread_reply(id, true).await?,
        }

        info!(external_id = %email.external_id, owner = ?owner, "Inbound reply attached");
        Ok(InboxOutcome::Matched)
    }

    async fn find_tagged(
        &self,
        reference: &ConversationRef,
    ) -> Result<Option<ConversationOwner>, sqlx::Error> {
        Ok(match reference {
            ConversationRef::Booking(r) => self
                .bookings
                .find_by_reference(r)
                .await?
                .map(|b| ConversationOwner::Booking(b.id)),
            ConversationRef::Contact(r) => self
                .contacts
                .find_by_reference(r)
                .await?
                .map(|c| ConversationOwner::Contact(c.id)),
        })
    }

    /// Most recent booking, then contact submission, from the same address.
    async fn find_by_sender(
        &self,
        email: &InboundEmail,
    ) -> Result<Option<ConversationOwner>, sqlx::Error> {
        let since = Utc::now() - self.fallback_window;

        if let Some(booking) = self
            .bookings
            .find_recent_by_email(&email.from_address, since)
            .await?
        {
            return Ok(Some(ConversationOwner::Booking(booking.id)));
        }

        Ok(self
            .contacts
            .find_recent_by_email(&email.from_address, since)
            .await?
            .map(|c| ConversationOwner::Contact(c.id)))
    }
}
