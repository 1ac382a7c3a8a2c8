use config::{Config, Environment};
use serde::Deserialize;

use crate::error::AppError;

/// Runtime configuration for the job handler.
///
/// Settings are read once per cold start from environment variables with the
/// `PORTAL` prefix and `__` as the nesting separator, e.g.
/// `PORTAL__DB__NAME`, `PORTAL__EXPORT__SNAPSHOT_BUCKET`,
/// `PORTAL__EMAIL__SENDER`. AWS region and credentials come from the
/// standard SDK environment.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_log")]
    pub log: String,
    pub db: DbSettings,
    pub export: ExportSettings,
    /// Base URL of the portal, used to build deep links in notifications.
    pub portal_origin: String,
    pub email: EmailSettings,
    #[serde(default)]
    pub slack: Option<SlackSettings>,
}

impl Settings {
    pub fn new() -> Result<Self, AppError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("PORTAL")
                    .separator("__")
                    .prefix_separator("__"),
            )
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| AppError::Config(e.to_string()))
    }
}

fn default_log() -> String {
    "portal_jobs=info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbSettings {
    /// Name of the database to select after connecting.
    pub name: String,
    /// Secrets Manager secret holding the connection string.
    pub uri_secret_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportSettings {
    /// Bucket for the full transformed snapshot.
    pub snapshot_bucket: String,
    /// Bucket consumed by the downstream data pipeline.
    pub pipeline_bucket: String,
    /// Comma-separated allow-list of collections for the pipeline export.
    /// Empty means all collections.
    #[serde(default)]
    pub pipeline_collections: String,
}

impl ExportSettings {
    pub fn pipeline_allow_list(&self) -> Vec<String> {
        self.pipeline_collections
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailSettings {
    /// Sender address, e.g. `Portal Team <no-reply@example.com>`.
    pub sender: String,
    /// Optional BCC mirror of every outgoing reminder.
    #[serde(default)]
    pub bcc: Option<String>,
    /// Sends admitted per rate-limit window. The upstream provider caps
    /// throughput at 14 messages per second; 14 per 1100 ms stays under it.
    #[serde(default = "default_per_window")]
    pub per_window: u32,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

fn default_per_window() -> u32 {
    14
}

fn default_window_ms() -> u64 {
    1100
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackSettings {
    pub bot_token: String,
    pub channel_id: String,
    /// Comma-separated member ids tagged on the urgent tier.
    #[serde(default)]
    pub mention_urgent: String,
    /// Comma-separated member ids tagged on the standard tier.
    #[serde(default)]
    pub mention_standard: String,
}

impl SlackSettings {
    pub fn urgent_mentions(&self) -> Vec<String> {
        split_members(&self.mention_urgent)
    }

    pub fn standard_mentions(&self) -> Vec<String> {
        split_members(&self.mention_standard)
    }
}

fn split_members(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
