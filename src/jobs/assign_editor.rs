use crate::db::queries;
use crate::error::AppError;
use crate::jobs::router::JobContext;
use crate::notify::email::EmailMessage;
use crate::notify::templates;
use crate::reminders::matcher;

/// Reminders for students flagged as needing an editor with none assigned:
/// one batched email per active agent listing that agent's students, plus
/// a broadcast to every permission holder who can assign editors.
///
/// Send failures are isolated per recipient so one bad address does not
/// block the rest of the batch.
pub async fn run(ctx: &JobContext) -> Result<(), AppError> {
    let db = ctx.db.database().await?;

    let students = queries::students_needing_editor(db).await?;
    let matches = matcher::match_students_needing_editor(students);

    if matches.all_students.is_empty() {
        tracing::info!("No students waiting for an editor assignment");
        return Ok(());
    }

    tracing::info!(
        students = matches.all_students.len(),
        agents = matches.per_agent.len(),
        "Students waiting for an editor assignment"
    );

    for (agent, students) in matches.per_agent.values() {
        let (subject, html) = templates::assign_editor_reminder(&agent.full_name(), students, &ctx.links);
        send_logged(ctx, &agent.email, subject, html).await;
    }

    let leads = queries::editor_assignment_leads(db).await?;
    for lead in &leads {
        let (subject, html) =
            templates::assign_editor_reminder(&lead.full_name(), &matches.all_students, &ctx.links);
        send_logged(ctx, &lead.email, subject, html).await;
    }

    Ok(())
}

async fn send_logged(ctx: &JobContext, to: &str, subject: String, html: String) {
    let message = EmailMessage {
        to: to.to_string(),
        subject,
        html,
    };

    match ctx.mailer.send(&message).await {
        Ok(()) => tracing::info!(recipient = %to, "Sent assign-editor reminder"),
        Err(e) => {
            tracing::error!(recipient = %to, error = %e, "Failed to send assign-editor reminder")
        }
    }
}
