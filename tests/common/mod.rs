#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::minio::MinIO;
use testcontainers_modules::mongo::Mongo;

use portal_jobs::db::client::DbHandle;
use portal_jobs::error::AppError;
use portal_jobs::export::snapshot::{S3StorageClient, StorageClient};
use portal_jobs::jobs::router::JobContext;
use portal_jobs::notify::email::{EmailMessage, Mailer};
use portal_jobs::notify::slack::ChatNotifier;
use portal_jobs::notify::templates::PortalLinks;
use portal_jobs::secrets::SecretProvider;
use portal_jobs::settings::{DbSettings, EmailSettings, ExportSettings, Settings, SlackSettings};

pub const PORTAL_ORIGIN: &str = "https://portal.example.com";
pub const SNAPSHOT_BUCKET: &str = "portal-snapshot-test";
pub const PIPELINE_BUCKET: &str = "portal-pipeline-test";

/// Secret provider returning a fixed connection-string secret, exercising
/// the same JSON indirection as production.
pub struct FixedSecrets {
    pub uri: String,
}

#[async_trait]
impl SecretProvider for FixedSecrets {
    async fn fetch(&self, _name: &str) -> Result<String, AppError> {
        Ok(serde_json::json!({ "MONGODB_URI": self.uri }).to_string())
    }
}

/// Secret provider that fails the test if the database is ever touched.
pub struct UnreachableSecrets;

#[async_trait]
impl SecretProvider for UnreachableSecrets {
    async fn fetch(&self, name: &str) -> Result<String, AppError> {
        panic!("unexpected secret lookup for '{name}'");
    }
}

/// Mailer fake recording every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

impl RecordingMailer {
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

/// Chat fake recording every posted payload.
#[derive(Default)]
pub struct RecordingChat {
    pub posts: Mutex<Vec<(String, serde_json::Value)>>,
}

#[async_trait]
impl ChatNotifier for RecordingChat {
    async fn post(&self, text: &str, blocks: &serde_json::Value) -> Result<(), AppError> {
        self.posts
            .lock()
            .unwrap()
            .push((text.to_string(), blocks.clone()));
        Ok(())
    }
}

impl RecordingChat {
    pub fn posts(&self) -> Vec<(String, serde_json::Value)> {
        self.posts.lock().unwrap().clone()
    }
}

/// Mailer fake that rejects one recipient address and records every other
/// send, for exercising per-recipient failure isolation.
pub struct FlakyMailer {
    failing: String,
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl FlakyMailer {
    pub fn rejecting(failing: &str) -> Self {
        Self {
            failing: failing.to_string(),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for FlakyMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        if message.to == self.failing {
            return Err(AppError::Send(format!("mailbox unavailable: {}", message.to)));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Chat fake whose every post fails, the way Slack answers an unknown
/// channel.
pub struct FailingChat;

#[async_trait]
impl ChatNotifier for FailingChat {
    async fn post(&self, _text: &str, _blocks: &serde_json::Value) -> Result<(), AppError> {
        Err(AppError::Send("channel_not_found".into()))
    }
}

/// Storage fake for contexts where no export should happen.
pub struct NullStorage;

#[async_trait]
impl StorageClient for NullStorage {
    async fn put_object(&self, key: &str, _content: Vec<u8>) -> Result<(), AppError> {
        panic!("unexpected upload to '{key}'");
    }
}

pub fn test_settings() -> Settings {
    Settings {
        log: "portal_jobs=debug".into(),
        db: DbSettings {
            name: "portal_test".into(),
            uri_secret_name: "portal/mongodb".into(),
        },
        export: ExportSettings {
            snapshot_bucket: SNAPSHOT_BUCKET.into(),
            pipeline_bucket: PIPELINE_BUCKET.into(),
            pipeline_collections: String::new(),
        },
        portal_origin: PORTAL_ORIGIN.into(),
        email: EmailSettings {
            sender: "Portal Team <no-reply@example.com>".into(),
            bcc: None,
            per_window: 14,
            window_ms: 1100,
        },
        slack: Some(SlackSettings {
            bot_token: "xoxb-test".into(),
            channel_id: "C0TEST".into(),
            mention_urgent: "U_URGENT".into(),
            mention_standard: "U_STANDARD".into(),
        }),
    }
}

/// Holds running containers and the fakes wired into the job context.
///
/// Containers stay alive for as long as this struct lives and are cleaned
/// up automatically on drop.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    _minio: ContainerAsync<MinIO>,
    pub mongo_uri: String,
    pub db_name: String,
    pub mongo: mongodb::Client,
    pub s3: aws_sdk_s3::Client,
    pub mailer: Arc<RecordingMailer>,
    pub chat: Arc<RecordingChat>,
}

impl TestEnv {
    pub async fn start() -> Self {
        let (mongo_container, minio_container) =
            tokio::join!(Mongo::default().start(), MinIO::default().start());
        let mongo_container = mongo_container.expect("Failed to start MongoDB container");
        let minio_container = minio_container.expect("Failed to start MinIO container");

        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let mongo = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");

        let minio_port = minio_container
            .get_host_port_ipv4(9000)
            .await
            .expect("Failed to get MinIO port");
        let minio_endpoint = format!("http://127.0.0.1:{}", minio_port);

        unsafe {
            std::env::set_var("AWS_ACCESS_KEY_ID", "minioadmin");
            std::env::set_var("AWS_SECRET_ACCESS_KEY", "minioadmin");
            std::env::set_var("AWS_REGION", "us-east-1");
        }

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .endpoint_url(&minio_endpoint)
            .region(aws_config::Region::new("us-east-1"))
            .load()
            .await;
        let s3 = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::config::Builder::from(&s3_config)
                .force_path_style(true)
                .build(),
        );

        for bucket in [SNAPSHOT_BUCKET, PIPELINE_BUCKET] {
            let _ = s3.create_bucket().bucket(bucket).send().await;
        }

        Self {
            _mongo: mongo_container,
            _minio: minio_container,
            mongo_uri,
            db_name: format!("portal_test_{}", uuid::Uuid::new_v4().simple()),
            mongo,
            s3,
            mailer: Arc::new(RecordingMailer::default()),
            chat: Arc::new(RecordingChat::default()),
        }
    }

    pub fn database(&self) -> mongodb::Database {
        self.mongo.database(&self.db_name)
    }

    /// Build a job context wired to the containers and recording fakes.
    pub fn context(&self) -> JobContext {
        self.context_with_channels(
            self.mailer.clone() as Arc<dyn Mailer>,
            Some(self.chat.clone() as Arc<dyn ChatNotifier>),
        )
    }

    /// Like [`Self::context`], with caller-supplied notification channels.
    pub fn context_with_channels(
        &self,
        mailer: Arc<dyn Mailer>,
        chat: Option<Arc<dyn ChatNotifier>>,
    ) -> JobContext {
        let mut settings = test_settings();
        settings.db.name = self.db_name.clone();

        JobContext {
            db: DbHandle::new(
                Arc::new(FixedSecrets {
                    uri: self.mongo_uri.clone(),
                }),
                settings.db.uri_secret_name.clone(),
                self.db_name.clone(),
            ),
            links: PortalLinks::new(PORTAL_ORIGIN).unwrap(),
            snapshot_storage: Arc::new(S3StorageClient::new(
                self.s3.clone(),
                SNAPSHOT_BUCKET.to_string(),
            )),
            pipeline_storage: Arc::new(S3StorageClient::new(
                self.s3.clone(),
                PIPELINE_BUCKET.to_string(),
            )),
            mailer,
            chat,
            settings,
        }
    }

    /// Fetch an uploaded snapshot object as parsed JSON.
    pub async fn fetch_json(&self, bucket: &str, key: &str) -> serde_json::Value {
        let output = self
            .s3
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .unwrap_or_else(|e| panic!("missing object '{key}': {e}"));
        let bytes = output.body.collect().await.expect("Failed to read body");
        serde_json::from_slice(&bytes.into_bytes()).expect("Invalid JSON body")
    }
}
