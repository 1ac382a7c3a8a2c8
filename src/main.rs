use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};

use portal_jobs::db::client::DbHandle;
use portal_jobs::export::snapshot::S3StorageClient;
use portal_jobs::jobs::router::{self, JobContext, JobRequest, JobResponse};
use portal_jobs::notify::email::SesMailer;
use portal_jobs::notify::slack::{ChatNotifier, SlackNotifier};
use portal_jobs::notify::templates::PortalLinks;
use portal_jobs::secrets::SecretsManagerProvider;
use portal_jobs::settings::Settings;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log)),
        )
        .without_time()
        .init();

    // Clients are built once per cold start; warm invocations reuse them,
    // including the lazily-connected database handle.
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;

    let secrets = Arc::new(SecretsManagerProvider::new(
        aws_sdk_secretsmanager::Client::new(&aws_config),
    ));
    let db = DbHandle::new(
        secrets,
        settings.db.uri_secret_name.clone(),
        settings.db.name.clone(),
    );

    let s3 = aws_sdk_s3::Client::new(&aws_config);
    let snapshot_storage = Arc::new(S3StorageClient::new(
        s3.clone(),
        settings.export.snapshot_bucket.clone(),
    ));
    let pipeline_storage = Arc::new(S3StorageClient::new(
        s3,
        settings.export.pipeline_bucket.clone(),
    ));

    let mailer = Arc::new(SesMailer::new(
        aws_sdk_sesv2::Client::new(&aws_config),
        &settings.email,
    ));
    let chat = settings
        .slack
        .as_ref()
        .map(|slack| Arc::new(SlackNotifier::new(slack)) as Arc<dyn ChatNotifier>);

    let links = PortalLinks::new(&settings.portal_origin)?;

    let ctx = JobContext {
        settings,
        db,
        links,
        snapshot_storage,
        pipeline_storage,
        mailer,
        chat,
    };
    let ctx = &ctx;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<JobRequest>| async move {
        let (request, _context) = event.into_parts();
        tracing::info!(job_type = %request.job_type, "Received scheduled event");
        let response: JobResponse = router::route(ctx, &request).await?;
        Ok::<JobResponse, Error>(response)
    }))
    .await
}
