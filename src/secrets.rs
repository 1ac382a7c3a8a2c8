use async_trait::async_trait;

use crate::error::AppError;

/// Trait for secret retrieval, enabling tests to inject fixed values.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Fetch the secret string stored under the given name.
    async fn fetch(&self, name: &str) -> Result<String, AppError>;
}

/// AWS Secrets Manager implementation of SecretProvider.
pub struct SecretsManagerProvider {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerProvider {
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretProvider for SecretsManagerProvider {
    async fn fetch(&self, name: &str) -> Result<String, AppError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| {
                AppError::Connection(format!("Failed to fetch secret '{}': {}", name, e))
            })?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| AppError::Connection(format!("Secret '{}' has no string value", name)))
    }
}

/// Extract the database connection string from a secret payload.
///
/// The secret is a JSON object holding the URI under the `MONGODB_URI` key.
pub fn connection_uri_from_secret(raw: &str) -> Result<String, AppError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| AppError::Connection(format!("Secret is not valid JSON: {}", e)))?;

    value
        .get("MONGODB_URI")
        .and_then(|uri| uri.as_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::Connection("MONGODB_URI not found in secret".into()))
}
