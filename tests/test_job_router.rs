mod common;

use std::sync::Arc;

use portal_jobs::db::client::DbHandle;
use portal_jobs::jobs::router::{self, JobContext, JobRequest};
use portal_jobs::notify::templates::PortalLinks;

/// A context whose every collaborator panics on use: the unknown-job path
/// must not touch the database, storage, or either channel.
fn untouchable_context() -> JobContext {
    let settings = common::test_settings();
    JobContext {
        db: DbHandle::new(
            Arc::new(common::UnreachableSecrets),
            settings.db.uri_secret_name.clone(),
            settings.db.name.clone(),
        ),
        links: PortalLinks::new(common::PORTAL_ORIGIN).unwrap(),
        snapshot_storage: Arc::new(common::NullStorage),
        pipeline_storage: Arc::new(common::NullStorage),
        mailer: Arc::new(common::RecordingMailer::default()),
        chat: Some(Arc::new(common::RecordingChat::default()) as _),
        settings,
    }
}

#[tokio::test]
async fn unknown_job_type_is_a_successful_no_op() {
    let ctx = untouchable_context();
    let response = router::route(
        &ctx,
        &JobRequest {
            job_type: "NotARealJob".into(),
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status_code, 200);
    assert!(
        response.body.message.contains("NotARealJob"),
        "message should reference the job type: {}",
        response.body.message
    );
}

#[tokio::test]
async fn empty_job_type_is_also_a_no_op() {
    let ctx = untouchable_context();
    let response = router::route(&ctx, &JobRequest { job_type: String::new() })
        .await
        .unwrap();
    assert_eq!(response.status_code, 200);
}
