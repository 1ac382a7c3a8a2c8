use chrono::Utc;

use crate::db::queries;
use crate::error::AppError;
use crate::jobs::router::JobContext;
use crate::notify::email::EmailMessage;
use crate::notify::templates;
use crate::reminders::matcher;

/// Exact-day survey reminders: day 3 after the interview gets the first
/// reminder, day 7 the second, and interviews with a recorded survey
/// response get neither.
///
/// Send failures are per-recipient: one bad address is logged and the
/// loop moves on. Query failures propagate and fail the invocation.
pub async fn run(ctx: &JobContext) -> Result<(), AppError> {
    let db = ctx.db.database().await?;

    let interviews = queries::open_interviews(db).await?;
    let responded = queries::survey_responded_interview_ids(db).await?;
    let matched = matcher::match_interviews(interviews, &responded, Utc::now());

    tracing::info!(count = matched.len(), "Interviews due for a survey reminder");

    for reminder in &matched {
        let (subject, html) = templates::interview_survey_reminder(reminder, &ctx.links);
        let message = EmailMessage {
            to: reminder.student.email.clone(),
            subject,
            html,
        };

        match ctx.mailer.send(&message).await {
            Ok(()) => {
                tracing::info!(
                    recipient = %reminder.student.email,
                    kind = ?reminder.reminder,
                    "Sent interview survey reminder"
                );
            }
            Err(e) => {
                tracing::error!(
                    recipient = %reminder.student.email,
                    error = %e,
                    "Failed to send interview survey reminder"
                );
            }
        }
    }

    Ok(())
}
