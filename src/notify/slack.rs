use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::settings::SlackSettings;

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Trait for the chat channel, enabling recording fakes in tests.
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// Post one structured message to the configured channel.
    async fn post(&self, text: &str, blocks: &serde_json::Value) -> Result<(), AppError>;
}

/// Slack `chat.postMessage` implementation of the ChatNotifier.
///
/// One fixed channel per instance; the whole batch for a job goes into a
/// single message. The API reports failures in the response body with
/// HTTP 200, so `ok` is checked explicitly.
pub struct SlackNotifier {
    http: reqwest::Client,
    bot_token: String,
    channel_id: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    pub fn new(settings: &SlackSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token: settings.bot_token.clone(),
            channel_id: settings.channel_id.clone(),
        }
    }
}

#[async_trait]
impl ChatNotifier for SlackNotifier {
    async fn post(&self, text: &str, blocks: &serde_json::Value) -> Result<(), AppError> {
        let payload = serde_json::json!({
            "channel": self.channel_id,
            "text": text,
            "blocks": blocks,
        });

        let response = self
            .http
            .post(POST_MESSAGE_URL)
            .bearer_auth(&self.bot_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Send(format!("Slack request failed: {}", e)))?;

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| AppError::Send(format!("Invalid Slack response: {}", e)))?;

        if !body.ok {
            return Err(AppError::Send(format!(
                "Slack rejected the message: {}",
                body.error.unwrap_or_else(|| "unknown error".into())
            )));
        }

        Ok(())
    }
}
