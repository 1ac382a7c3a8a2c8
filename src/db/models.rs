use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// The closed set of user roles stored in the `users` collection.
///
/// Stored as PascalCase strings; serde keeps the wire format aligned with
/// the `doc!` filters in the query layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student,
    Agent,
    Editor,
    Admin,
}

impl Role {
    /// The string form used in query filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Agent => "Agent",
            Role::Editor => "Editor",
            Role::Admin => "Admin",
        }
    }
}

/// A user referenced from another record (agent, editor, permission holder).
///
/// Legacy documents may lack `archiv`; absence means active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    #[serde(default)]
    pub archiv: bool,
}

impl UserRef {
    /// Archived users are excluded from every notification target set.
    pub fn is_active(&self) -> bool {
        !self.archiv
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// Aggregation output for the assign-editor reminder: a student with the
/// joined agent and editor records.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentCandidate {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub firstname: String,
    pub lastname: String,
    #[serde(default)]
    pub archiv: bool,
    #[serde(rename = "needEditor", default)]
    pub need_editor: bool,
    #[serde(default)]
    pub agents: Vec<UserRef>,
    #[serde(default)]
    pub editors: Vec<UserRef>,
}

/// A message inside a document thread. Only the fields the matcher needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    pub user_id: ObjectId,
    #[serde(default)]
    pub file: Vec<MessageFile>,
    #[serde(rename = "createdAt")]
    pub created_at: bson::DateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageFile {
    #[serde(default)]
    pub name: Option<String>,
}

/// A document thread joined onto its student for the tiered Slack reminder.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentThread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub student_id: ObjectId,
    #[serde(default)]
    pub messages: Vec<ThreadMessage>,
}

/// Aggregation output for the Slack reminder: a student with every thread
/// of theirs that holds at least one message.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentThreads {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub firstname: String,
    pub lastname: String,
    #[serde(default)]
    pub documentthreads: Vec<DocumentThread>,
}

/// Aggregation output for the interview-survey reminder. `student` and
/// `program` are `$lookup` results; an empty vector means the join target
/// is missing and the record is skipped by the matcher.
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewCandidate {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub interview_date: Option<bson::DateTime>,
    #[serde(default)]
    pub student: Vec<UserRef>,
    #[serde(default)]
    pub program: Vec<Program>,
}

/// A study program. All display fields are optional in legacy records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub program_name: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
}

impl Program {
    /// Human-readable program label used in notification bodies.
    pub fn display_name(&self) -> String {
        [&self.school, &self.program_name, &self.degree, &self.semester]
            .iter()
            .filter_map(|part| part.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Aggregation output for permission holders with the joined user record.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionHolder {
    #[serde(default)]
    pub user: Vec<UserRef>,
}

/// A survey response, projected down to the interview it answers.
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyResponse {
    pub interview_id: ObjectId,
}
