//! Email service for transactional booking and contact emails.
//!
//! Supports multiple email providers:
//! - `console`: Logs emails to console (development)
//! - `smtp`: Sends via an SMTP relay with STARTTLS
//! - `graph`: Sends from the practice mailbox via Microsoft Graph
//!
//! [`EmailService::in_memory`] keeps messages in an [`Outbox`] instead of
//! delivering them.

use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::EmailConfig;
use crate::middleware::metrics::record_email_sent;
use crate::services::graph::{GraphAttachment, GraphClient, GraphMail};

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// A file attached to an email (calendar invites).
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl EmailAttachment {
    /// An iCalendar attachment with the given `METHOD`.
    pub fn ics(filename: &str, method: &str, content: String) -> Self {
        Self {
            filename: filename.to_string(),
            content_type: format!("text/calendar; charset=utf-8; method={}", method),
            content: content.into_bytes(),
        }
    }
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Recipient name (optional)
    pub to_name: Option<String>,
    pub subject: String,
    /// Plain text body
    pub body_text: String,
    /// HTML body (optional)
    pub body_html: Option<String>,
    /// Overrides the configured Reply-To
    pub reply_to: Option<String>,
    pub attachments: Vec<EmailAttachment>,
}

/// Messages captured by an in-memory email service, in send order.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    messages: Arc<Mutex<Vec<EmailMessage>>>,
}

impl Outbox {
    pub async fn messages(&self) -> Vec<EmailMessage> {
        self.messages.lock().await.clone()
    }

    async fn push(&self, message: EmailMessage) {
        self.messages.lock().await.push(message);
    }
}

enum Provider {
    Console,
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Graph(Arc<GraphClient>),
    Memory(Outbox),
}

impl Provider {
    fn name(&self) -> &'static str {
        match self {
            Provider::Console => "console",
            Provider::Smtp(_) => "smtp",
            Provider::Graph(_) => "graph",
            Provider::Memory(_) => "memory",
        }
    }
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    provider: Arc<Provider>,
}

impl EmailService {
    /// Creates the service for the configured provider.
    ///
    /// The `graph` provider needs a Graph client; `smtp` builds its transport
    /// up front so a bad relay host fails at startup.
    pub fn new(config: EmailConfig, graph: Option<Arc<GraphClient>>) -> Result<Self, EmailError> {
        let provider = match config.provider.as_str() {
            "console" => Provider::Console,
            "smtp" => Provider::Smtp(build_smtp_transport(&config)?),
            "graph" => Provider::Graph(graph.ok_or_else(|| {
                EmailError::NotConfigured("graph provider requires [graph] settings".into())
            })?),
            other => {
                return Err(EmailError::NotConfigured(format!(
                    "unknown email provider '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            config: Arc::new(config),
            provider: Arc::new(provider),
        })
    }

    /// A service that only logs. Used when email is disabled.
    pub fn console(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            provider: Arc::new(Provider::Console),
        }
    }

    /// An enabled service that records every message in `outbox`.
    pub fn in_memory(config: EmailConfig, outbox: Outbox) -> Self {
        Self {
            config: Arc::new(EmailConfig {
                enabled: true,
                ..config
            }),
            provider: Arc::new(Provider::Memory(outbox)),
        }
    }

    /// Check if email service is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn sender_email(&self) -> &str {
        &self.config.sender_email
    }

    /// Send an email message. A disabled service silently succeeds.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        let provider = self.provider.name();
        let result = match self.provider.as_ref() {
            Provider::Console => {
                self.send_console(&message);
                Ok(())
            }
            Provider::Smtp(transport) => self.send_smtp(transport, &message).await,
            Provider::Graph(client) => self.send_graph(client, &message).await,
            Provider::Memory(outbox) => {
                outbox.push(message.clone()).await;
                Ok(())
            }
        };

        record_email_sent(provider, result.is_ok());
        match &result {
            Ok(()) => info!(
                provider = provider,
                to = %message.to,
                subject = %message.subject,
                "Email sent"
            ),
            Err(e) => error!(
                provider = provider,
                to = %message.to,
                error = %e,
                "Email send failed"
            ),
        }
        result
    }

    fn reply_to<'a>(&'a self, message: &'a EmailMessage) -> Option<&'a str> {
        message
            .reply_to
            .as_deref()
            .or(self.config.reply_to.as_deref())
    }

    fn send_console(&self, message: &EmailMessage) {
        info!(
            from = %self.config.sender_email,
            to = %message.to,
            reply_to = ?self.reply_to(message),
            subject = %message.subject,
            attachments = message.attachments.len(),
            body = %message.body_text,
            "Email (console provider)"
        );
    }

    async fn send_smtp(
        &self,
        transport: &AsyncSmtpTransport<Tokio1Executor>,
        message: &EmailMessage,
    ) -> Result<(), EmailError> {
        let email = self.build_mime(message)?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn send_graph(&self, client: &GraphClient, message: &EmailMessage) -> Result<(), EmailError> {
        let mail = GraphMail {
            to: message.to.clone(),
            to_name: message.to_name.clone(),
            subject: message.subject.clone(),
            body_text: message.body_text.clone(),
            body_html: message.body_html.clone(),
            reply_to: self.reply_to(message).map(str::to_string),
            attachments: message
                .attachments
                .iter()
                .map(|a| GraphAttachment {
                    filename: a.filename.clone(),
                    content_type: a.content_type.clone(),
                    content: a.content.clone(),
                })
                .collect(),
        };
        client
            .send_mail(&mail)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))
    }

    fn build_mime(&self, message: &EmailMessage) -> Result<Message, EmailError> {
        let from = mailbox(Some(&self.config.sender_name), &self.config.sender_email)?;
        let to = mailbox(message.to_name.as_deref(), &message.to)?;

        let mut builder = Message::builder().from(from).to(to).subject(&message.subject);
        if let Some(reply_to) = self.reply_to(message) {
            builder = builder.reply_to(mailbox(None, reply_to)?);
        }

        let body = match &message.body_html {
            Some(html) => MultiPart::alternative_plain_html(message.body_text.clone(), html.clone()),
            None => MultiPart::alternative().singlepart(SinglePart::plain(message.body_text.clone())),
        };

        let mut mixed = MultiPart::mixed().multipart(body);
        for attachment in &message.attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| EmailError::Build(e.to_string()))?;
            mixed = mixed.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), content_type),
            );
        }

        builder
            .multipart(mixed)
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("enabled", &self.config.enabled)
            .field("provider", &self.provider.name())
            .finish()
    }
}

fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, EmailError> {
    let address = address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))?;
    Ok(Mailbox::new(name.map(str::to_string), address))
}

fn build_smtp_transport(config: &EmailConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
    if config.smtp_host.is_empty() {
        return Err(EmailError::NotConfigured("smtp_host is empty".into()));
    }

    let builder = if config.smtp_starttls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| EmailError::NotConfigured(e.to_string()))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
    };

    let mut builder = builder.port(config.smtp_port);
    if !config.smtp_username.is_empty() {
        builder = builder.credentials(Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        ));
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            sender_email: "praxis@example.com".to_string(),
            sender_name: "Praxis".to_string(),
            reply_to: Some("inbox@example.com".to_string()),
            ..EmailConfig::default()
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: "client@example.com".to_string(),
            to_name: Some("Client".to_string()),
            subject: "Booking received [BK-ABC234]".to_string(),
            body_text: "Thanks".to_string(),
            body_html: Some("<p>Thanks</p>".to_string()),
            reply_to: None,
            attachments: vec![EmailAttachment::ics(
                "invite.ics",
                "REQUEST",
                "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n".to_string(),
            )],
        }
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config = EmailConfig {
            provider: "pigeon".to_string(),
            ..test_config()
        };
        assert!(matches!(
            EmailService::new(config, None),
            Err(EmailError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_graph_provider_requires_client() {
        let config = EmailConfig {
            provider: "graph".to_string(),
            ..test_config()
        };
        assert!(EmailService::new(config, None).is_err());
    }

    #[test]
    fn test_smtp_requires_host() {
        let config = EmailConfig {
            provider: "smtp".to_string(),
            ..test_config()
        };
        assert!(EmailService::new(config, None).is_err());
    }

    #[tokio::test]
    async fn test_send_console_email() {
        let service = EmailService::new(test_config(), None).unwrap();
        assert!(service.is_enabled());
        assert!(service.send(message()).await.is_ok());
    }

    #[tokio::test]
    async fn test_send_disabled_silently_succeeds() {
        let config = EmailConfig {
            enabled: false,
            ..test_config()
        };
        let service = EmailService::console(config);
        assert!(!service.is_enabled());
        assert!(service.send(message()).await.is_ok());
    }

    #[tokio::test]
    async fn test_in_memory_records_messages() {
        let outbox = Outbox::default();
        let config = EmailConfig {
            enabled: false,
            ..test_config()
        };
        let service = EmailService::in_memory(config, outbox.clone());
        assert!(service.is_enabled());
        assert_eq!(service.provider_name(), "memory");

        service.send(message()).await.unwrap();
        let sent = outbox.messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "client@example.com");
        assert!(sent[0].attachments[0].content_type.ends_with("method=REQUEST"));
    }

    #[test]
    fn test_reply_to_falls_back_to_config() {
        let service = EmailService::console(test_config());
        let mut msg = message();
        assert_eq!(service.reply_to(&msg), Some("inbox@example.com"));
        msg.reply_to = Some("other@example.com".to_string());
        assert_eq!(service.reply_to(&msg), Some("other@example.com"));
    }

    #[test]
    fn test_build_mime_includes_attachment() {
        let service = EmailService::console(test_config());
        let formatted = String::from_utf8(service.build_mime(&message()).unwrap().formatted()).unwrap();
        assert!(formatted.contains("Subject: Booking received [BK-ABC234]"));
        assert!(formatted.contains("Reply-To: inbox@example.com"));
        assert!(formatted.contains("text/calendar"));
        assert!(formatted.contains("invite.ics"));
    }

    #[test]
    fn test_build_mime_rejects_bad_address() {
        let service = EmailService::console(test_config());
        let mut msg = message();
        msg.to = "not an address".to_string();
        assert!(matches!(
            service.build_mime(&msg),
            Err(EmailError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_ics_attachment_content_type() {
        let attachment = EmailAttachment::ics("cancel.ics", "CANCEL", "x".into());
        assert_eq!(
            attachment.content_type,
            "text/calendar; charset=utf-8; method=CANCEL"
        );
    }
}
