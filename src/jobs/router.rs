use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::db::client::DbHandle;
use crate::error::AppError;
use crate::export::snapshot::StorageClient;
use crate::jobs::{assign_editor, interview_survey, slack_reminders, snapshot};
use crate::notify::email::Mailer;
use crate::notify::slack::ChatNotifier;
use crate::notify::templates::PortalLinks;
use crate::settings::Settings;

/// Everything a job needs, built once per cold start and shared across
/// invocations of the same execution environment.
pub struct JobContext {
    pub settings: Settings,
    pub db: DbHandle,
    pub links: PortalLinks,
    pub snapshot_storage: Arc<dyn StorageClient>,
    pub pipeline_storage: Arc<dyn StorageClient>,
    pub mailer: Arc<dyn Mailer>,
    pub chat: Option<Arc<dyn ChatNotifier>>,
}

/// The invocation payload. `jobType` is the sole addressing mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    #[serde(rename = "jobType", default)]
    pub job_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: JobResponseBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponseBody {
    pub message: String,
}

impl JobResponse {
    fn completed(job_type: &str) -> Self {
        Self {
            status_code: 200,
            body: JobResponseBody {
                message: format!("Job {} completed", job_type),
            },
        }
    }

    fn skipped(job_type: &str) -> Self {
        Self {
            status_code: 200,
            body: JobResponseBody {
                message: format!("No matching job for jobType: {}", job_type),
            },
        }
    }
}

/// Dispatch one invocation to the job matching its identifier.
///
/// Unknown identifiers are a warning and a successful no-op, not a
/// failure; errors raised inside a known job propagate so the platform
/// marks the invocation failed.
pub async fn route(ctx: &JobContext, request: &JobRequest) -> Result<JobResponse, AppError> {
    let job_type = request.job_type.as_str();

    match job_type {
        "MongoDBDatabaseDailySnapshot" => {
            tracing::info!("Running job MongoDBDatabaseDailySnapshot");
            snapshot::database_daily_snapshot(ctx).await?;
        }
        "MongoDBDataPipelineDailySnapshot" => {
            tracing::info!("Running job MongoDBDataPipelineDailySnapshot");
            snapshot::data_pipeline_daily_snapshot(ctx).await?;
        }
        "AssignEditorTasksReminderEmails" => {
            tracing::info!("Running job AssignEditorTasksReminderEmails");
            assign_editor::run(ctx).await?;
        }
        "InterviewSurveyReminderEmails" => {
            tracing::info!("Running job InterviewSurveyReminderEmails");
            interview_survey::run(ctx).await?;
        }
        "SlackAssignmentReminders" => {
            tracing::info!("Running job SlackAssignmentReminders");
            slack_reminders::run(ctx).await?;
        }
        unknown => {
            tracing::warn!(job_type = %unknown, "No matching job for jobType");
            return Ok(JobResponse::skipped(unknown));
        }
    }

    Ok(JobResponse::completed(job_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_deserializes_from_event_payload() {
        let request: JobRequest =
            serde_json::from_str(r#"{ "jobType": "MongoDBDatabaseDailySnapshot" }"#).unwrap();
        assert_eq!(request.job_type, "MongoDBDatabaseDailySnapshot");
    }

    #[test]
    fn response_serializes_with_status_code_field() {
        let response = JobResponse::completed("X");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"]["message"], "Job X completed");
    }
}
