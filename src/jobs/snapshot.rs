use crate::error::AppError;
use crate::export::snapshot::{SnapshotExporter, SnapshotScope};
use crate::jobs::router::JobContext;

/// Full transformed snapshot of every collection into the snapshot bucket.
pub async fn database_daily_snapshot(ctx: &JobContext) -> Result<(), AppError> {
    let db = ctx.db.database().await?;
    SnapshotExporter::new(db, ctx.snapshot_storage.as_ref())
        .export(SnapshotScope::All)
        .await
}

/// Allow-listed snapshot into the bucket consumed by the data pipeline.
pub async fn data_pipeline_daily_snapshot(ctx: &JobContext) -> Result<(), AppError> {
    let db = ctx.db.database().await?;
    let scope = SnapshotScope::from_allow_list(ctx.settings.export.pipeline_allow_list());
    SnapshotExporter::new(db, ctx.pipeline_storage.as_ref())
        .export(scope)
        .await
}
