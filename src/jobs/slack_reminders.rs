use chrono::Utc;

use crate::db::queries;
use crate::error::AppError;
use crate::jobs::router::JobContext;
use crate::notify::templates;
use crate::reminders::matcher::{self, AssignmentTier};

/// Tiered Slack reminder for students whose earliest file upload has gone
/// unassigned: one message for the whole batch, with an urgent section
/// (over 7 days) and a standard section (over 3 days), each tagging its
/// own audience.
///
/// A failed post is logged and swallowed; only the database read can fail
/// the invocation.
pub async fn run(ctx: &JobContext) -> Result<(), AppError> {
    let Some(chat) = &ctx.chat else {
        tracing::warn!("Slack is not configured; skipping SlackAssignmentReminders");
        return Ok(());
    };
    let Some(slack) = &ctx.settings.slack else {
        tracing::warn!("Slack is not configured; skipping SlackAssignmentReminders");
        return Ok(());
    };

    let db = ctx.db.database().await?;
    let students = queries::students_with_active_threads(db).await?;

    let now = Utc::now();
    let mut tiers = matcher::match_assignment_tiers(&students, now);
    let urgent = tiers.remove(&AssignmentTier::Urgent).unwrap_or_default();
    let standard = tiers.remove(&AssignmentTier::Standard).unwrap_or_default();

    let Some(blocks) = templates::assignment_reminder_blocks(
        &urgent,
        &standard,
        &slack.urgent_mentions(),
        &slack.standard_mentions(),
        &ctx.links,
        now,
    ) else {
        tracing::info!("No unassigned students past the reminder thresholds");
        return Ok(());
    };

    tracing::info!(
        urgent = urgent.len(),
        standard = standard.len(),
        "Posting assignment reminder to Slack"
    );

    if let Err(e) = chat
        .post("Request for Essay Writer Assignment", &blocks)
        .await
    {
        tracing::error!(error = %e, "Failed to post Slack reminder");
    }

    Ok(())
}
