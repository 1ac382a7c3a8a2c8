use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::AppError;
use crate::secrets::{connection_uri_from_secret, SecretProvider};

/// Lazily-initialized, process-cached handle to the portal database.
///
/// Execution environments are reused across invocations, so the secret
/// round trip and the connection handshake happen only on a cold start;
/// every later call returns the cached database. There is no invalidation:
/// a rotated credential requires an environment restart.
///
/// Constructed once in `main` and shared by reference through the job
/// context rather than living in module-level state.
pub struct DbHandle {
    secrets: Arc<dyn SecretProvider>,
    secret_name: String,
    db_name: String,
    cell: OnceCell<mongodb::Database>,
}

impl DbHandle {
    pub fn new(secrets: Arc<dyn SecretProvider>, secret_name: String, db_name: String) -> Self {
        Self {
            secrets,
            secret_name,
            db_name,
            cell: OnceCell::new(),
        }
    }

    /// Return the cached database, connecting on first use.
    ///
    /// Fails with `AppError::Connection` if the secret is missing or
    /// malformed, or if the connect call fails. A failed initialization is
    /// not cached; the next call retries from the secret lookup.
    pub async fn database(&self) -> Result<&mongodb::Database, AppError> {
        self.cell
            .get_or_try_init(|| async {
                let raw = self.secrets.fetch(&self.secret_name).await?;
                let uri = connection_uri_from_secret(&raw)?;

                let client = mongodb::Client::with_uri_str(&uri).await.map_err(|e| {
                    AppError::Connection(format!("Failed to connect to MongoDB: {}", e))
                })?;

                tracing::info!(database = %self.db_name, "Connected to MongoDB");
                Ok(client.database(&self.db_name))
            })
            .await
    }
}
