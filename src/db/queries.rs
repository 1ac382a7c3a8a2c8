use std::collections::HashSet;

use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::Database;

use crate::db::models::{
    InterviewCandidate, PermissionHolder, Role, StudentCandidate, StudentThreads, SurveyResponse,
    UserRef,
};
use crate::error::AppError;

/// Filter clause matching non-archived users. Legacy records have no
/// `archiv` field at all, so absence counts as active.
fn not_archived() -> bson::Document {
    doc! { "$or": [ { "archiv": { "$exists": false } }, { "archiv": false } ] }
}

/// Students with no assigned editor, with their agent and editor records
/// joined in. Archived students are filtered out inside the pipeline,
/// before any matching logic runs.
pub async fn students_needing_editor(db: &Database) -> Result<Vec<StudentCandidate>, AppError> {
    let pipeline = vec![
        doc! {
            "$match": {
                "role": Role::Student.as_str(),
                "$and": [
                    not_archived(),
                    { "$or": [ { "editors": { "$size": 0 } }, { "editors": { "$exists": false } } ] }
                ]
            }
        },
        doc! {
            "$lookup": {
                "from": "users",
                "localField": "agents",
                "foreignField": "_id",
                "as": "agents"
            }
        },
        doc! {
            "$lookup": {
                "from": "users",
                "localField": "editors",
                "foreignField": "_id",
                "as": "editors"
            }
        },
        doc! {
            "$project": {
                "_id": 1,
                "firstname": 1,
                "lastname": 1,
                "archiv": 1,
                "needEditor": 1,
                "agents": 1,
                "editors": 1
            }
        },
    ];

    db.collection::<bson::Document>("users")
        .aggregate(pipeline)
        .with_type::<StudentCandidate>()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .try_collect()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Active students with no editor, at least one application, and at least
/// one document thread holding messages. Feeds the tiered Slack reminder.
pub async fn students_with_active_threads(db: &Database) -> Result<Vec<StudentThreads>, AppError> {
    let pipeline = vec![
        doc! {
            "$match": {
                "role": Role::Student.as_str(),
                "$and": [
                    not_archived(),
                    { "$or": [ { "editors": { "$size": 0 } }, { "editors": { "$exists": false } } ] }
                ],
                "$expr": { "$gt": [ { "$size": { "$ifNull": ["$applications", []] } }, 0 ] }
            }
        },
        doc! {
            "$lookup": {
                "from": "documentthreads",
                "let": { "studentId": "$_id" },
                "pipeline": [
                    {
                        "$match": {
                            "$expr": {
                                "$and": [
                                    { "$eq": ["$student_id", "$$studentId"] },
                                    { "$gt": [ { "$size": { "$ifNull": ["$messages", []] } }, 0 ] }
                                ]
                            }
                        }
                    }
                ],
                "as": "documentthreads"
            }
        },
        doc! {
            "$match": { "$expr": { "$gt": [ { "$size": "$documentthreads" }, 0 ] } }
        },
        doc! {
            "$project": {
                "_id": 1,
                "firstname": 1,
                "lastname": 1,
                "documentthreads": 1
            }
        },
    ];

    db.collection::<bson::Document>("users")
        .aggregate(pipeline)
        .with_type::<StudentThreads>()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .try_collect()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Open interviews with a scheduled date, joined onto the student and
/// program records. Interviews whose student is archived are dropped
/// inside the pipeline, before any date arithmetic.
pub async fn open_interviews(db: &Database) -> Result<Vec<InterviewCandidate>, AppError> {
    let pipeline = vec![
        doc! {
            "$match": {
                "isClosed": false,
                "interview_date": { "$exists": true, "$ne": null }
            }
        },
        doc! {
            "$lookup": {
                "from": "users",
                "localField": "student_id",
                "foreignField": "_id",
                "as": "student"
            }
        },
        // The join yields at most one element; an empty join (deleted
        // student) still passes and is skipped by the matcher.
        doc! {
            "$match": { "student.archiv": { "$ne": true } }
        },
        doc! {
            "$lookup": {
                "from": "programs",
                "localField": "program_id",
                "foreignField": "_id",
                "as": "program"
            }
        },
    ];

    db.collection::<bson::Document>("interviews")
        .aggregate(pipeline)
        .with_type::<InterviewCandidate>()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .try_collect()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Ids of interviews that already have a survey response. Dedupe is by
/// foreign-key equality, not by timestamp.
pub async fn survey_responded_interview_ids(db: &Database) -> Result<HashSet<ObjectId>, AppError> {
    let responses: Vec<SurveyResponse> = db
        .collection::<SurveyResponse>("interviewsurveyresponses")
        .find(doc! {})
        .projection(doc! { "interview_id": 1 })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .try_collect()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(responses.into_iter().map(|r| r.interview_id).collect())
}

/// Active users holding the `canAssignEditors` capability, resolved
/// through the permission → user join.
pub async fn editor_assignment_leads(db: &Database) -> Result<Vec<UserRef>, AppError> {
    let pipeline = vec![
        doc! { "$match": { "canAssignEditors": true } },
        doc! {
            "$lookup": {
                "from": "users",
                "localField": "user_id",
                "foreignField": "_id",
                "as": "user"
            }
        },
    ];

    let holders: Vec<PermissionHolder> = db
        .collection::<bson::Document>("permissions")
        .aggregate(pipeline)
        .with_type::<PermissionHolder>()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .try_collect()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    // A permission pointing at a deleted user joins to an empty vector
    // and is skipped.
    Ok(holders
        .into_iter()
        .filter_map(|holder| holder.user.into_iter().next())
        .filter(UserRef::is_active)
        .collect())
}
