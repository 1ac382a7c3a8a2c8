use async_trait::async_trait;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

use crate::error::AppError;
use crate::notify::limiter::RateLimiter;
use crate::notify::templates::wrap_html;
use crate::settings::EmailSettings;

/// A rendered email ready for dispatch. `html` is the body fragment;
/// the channel implementation applies the shared HTML shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Trait for the transactional email channel, enabling recording fakes in
/// tests.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message. Implementations may block on rate-limit admission.
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

/// SES implementation of the Mailer.
///
/// Every send passes through the rate limiter first, so a large batch is
/// spread across admission windows instead of tripping the provider's
/// throughput ceiling.
pub struct SesMailer {
    client: aws_sdk_sesv2::Client,
    sender: String,
    bcc: Option<String>,
    limiter: RateLimiter,
}

impl SesMailer {
    pub fn new(client: aws_sdk_sesv2::Client, settings: &EmailSettings) -> Self {
        Self {
            client,
            sender: settings.sender.clone(),
            bcc: settings.bcc.clone(),
            limiter: RateLimiter::new(
                settings.per_window,
                std::time::Duration::from_millis(settings.window_ms),
            ),
        }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        self.limiter.acquire().await;

        let subject = Content::builder()
            .data(&message.subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| AppError::Send(format!("Invalid subject: {}", e)))?;
        let body_html = Content::builder()
            .data(wrap_html(&message.html))
            .charset("UTF-8")
            .build()
            .map_err(|e| AppError::Send(format!("Invalid body: {}", e)))?;

        let mut destination = Destination::builder().to_addresses(&message.to);
        if let Some(bcc) = &self.bcc {
            destination = destination.bcc_addresses(bcc);
        }

        let simple = Message::builder()
            .subject(subject)
            .body(Body::builder().html(body_html).build())
            .build();
        let content = EmailContent::builder().simple(simple).build();

        self.client
            .send_email()
            .from_email_address(&self.sender)
            .destination(destination.build())
            .content(content)
            .send()
            .await
            .map_err(|e| {
                AppError::Send(format!("Failed to send email to {}: {}", message.to, e))
            })?;

        Ok(())
    }
}
