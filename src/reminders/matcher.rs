use std::collections::HashMap;
use std::collections::HashSet;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};

use crate::db::models::{InterviewCandidate, Program, StudentCandidate, StudentThreads, UserRef};

/// Whole days elapsed between an event and `now`, floored.
pub fn days_between(event: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - event).num_days()
}

/// Elapsed-time tier for the assignment reminder. Each tier has its own
/// notification audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentTier {
    /// More than 7 days without an assignment.
    Urgent,
    /// More than 3 and at most 7 days.
    Standard,
}

/// Classify elapsed days into an assignment tier. Fewer than 4 days means
/// no reminder yet.
pub fn classify_assignment_age(days: i64) -> Option<AssignmentTier> {
    if days > 7 {
        Some(AssignmentTier::Urgent)
    } else if days > 3 {
        Some(AssignmentTier::Standard)
    } else {
        None
    }
}

/// Which interview-survey reminder fires for a given elapsed-day count.
/// Only exact matches against the fixed schedule trigger anything, so a
/// reminder fires on at most two occasions per interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyReminder {
    First,
    Second,
}

pub fn classify_interview_age(days: i64) -> Option<SurveyReminder> {
    match days {
        3 => Some(SurveyReminder::First),
        7 => Some(SurveyReminder::Second),
        _ => None,
    }
}

/// The earliest file-bearing message authored by the student across all of
/// their threads, together with the thread holding it. A student with no
/// such message has no qualifying event and is excluded, not defaulted to
/// day zero.
pub fn earliest_student_file_upload(
    student: &StudentThreads,
) -> Option<(DateTime<Utc>, ObjectId)> {
    student
        .documentthreads
        .iter()
        .filter_map(|thread| {
            thread
                .messages
                .iter()
                .find(|msg| msg.user_id == thread.student_id && !msg.file.is_empty())
                .map(|msg| (msg.created_at.to_chrono(), thread.id))
        })
        .min_by_key(|(uploaded_at, _)| *uploaded_at)
}

/// A student matched into an assignment tier, with the anchor timestamp.
#[derive(Debug, Clone)]
pub struct TieredStudent {
    pub id: ObjectId,
    pub name: String,
    pub thread_id: ObjectId,
    pub uploaded_at: DateTime<Utc>,
}

/// Bucket students into assignment tiers by the age of their earliest
/// file upload.
pub fn match_assignment_tiers(
    students: &[StudentThreads],
    now: DateTime<Utc>,
) -> HashMap<AssignmentTier, Vec<TieredStudent>> {
    let mut tiers: HashMap<AssignmentTier, Vec<TieredStudent>> = HashMap::new();

    for student in students {
        let Some((uploaded_at, thread_id)) = earliest_student_file_upload(student) else {
            continue;
        };
        let Some(tier) = classify_assignment_age(days_between(uploaded_at, now)) else {
            continue;
        };

        tiers.entry(tier).or_default().push(TieredStudent {
            id: student.id,
            name: format!("{} {}", student.firstname, student.lastname),
            thread_id,
            uploaded_at,
        });
    }

    tiers
}

/// An interview due for a survey reminder, with the joined display data.
#[derive(Debug, Clone)]
pub struct InterviewReminder {
    pub interview_id: ObjectId,
    pub reminder: SurveyReminder,
    pub student: UserRef,
    pub program: Option<Program>,
}

/// Match open interviews against the exact-day reminder schedule.
///
/// Skips interviews whose student join is missing, whose student is
/// archived, or whose id already appears in the survey-response set — the
/// day condition is never even evaluated for those.
pub fn match_interviews(
    interviews: Vec<InterviewCandidate>,
    responded: &HashSet<ObjectId>,
    now: DateTime<Utc>,
) -> Vec<InterviewReminder> {
    let mut matched = Vec::new();

    for interview in interviews {
        let Some(student) = interview.student.into_iter().next() else {
            continue;
        };
        if !student.is_active() {
            continue;
        }
        if responded.contains(&interview.id) {
            continue;
        }
        let Some(interview_date) = interview.interview_date else {
            continue;
        };

        let days = days_between(interview_date.to_chrono(), now);
        if let Some(reminder) = classify_interview_age(days) {
            matched.push(InterviewReminder {
                interview_id: interview.id,
                reminder,
                student,
                program: interview.program.into_iter().next(),
            });
        }
    }

    matched
}

/// A student listed in an assign-editor reminder email.
#[derive(Debug, Clone)]
pub struct UnassignedStudent {
    pub id: ObjectId,
    pub firstname: String,
    pub lastname: String,
}

impl UnassignedStudent {
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.firstname, self.lastname)
    }
}

/// Matched assign-editor work: one batched email per active agent, plus
/// the full list for the permission-holder broadcast.
#[derive(Debug, Default)]
pub struct AssignEditorMatches {
    pub per_agent: HashMap<ObjectId, (UserRef, Vec<UnassignedStudent>)>,
    pub all_students: Vec<UnassignedStudent>,
}

/// Students flagged as needing an editor with none assigned, grouped by
/// their active agents. Archived students and archived agents never make
/// it into the result.
pub fn match_students_needing_editor(students: Vec<StudentCandidate>) -> AssignEditorMatches {
    let mut matches = AssignEditorMatches::default();

    for student in students {
        if student.archiv || !student.need_editor || !student.editors.is_empty() {
            continue;
        }

        let entry = UnassignedStudent {
            id: student.id,
            firstname: student.firstname,
            lastname: student.lastname,
        };

        for agent in student.agents.iter().filter(|agent| agent.is_active()) {
            matches
                .per_agent
                .entry(agent.id)
                .or_insert_with(|| (agent.clone(), Vec::new()))
                .1
                .push(entry.clone());
        }

        matches.all_students.push(entry);
    }

    matches
}
