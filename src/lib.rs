pub mod error;
pub mod settings;
pub mod secrets;
pub mod db {
    pub mod client;
    pub mod models;
    pub mod queries;
}
pub mod reminders {
    pub mod matcher;
}
pub mod notify {
    pub mod email;
    pub mod limiter;
    pub mod slack;
    pub mod templates;
}
pub mod export {
    pub mod snapshot;
    pub mod transform;
}
pub mod jobs {
    pub mod assign_editor;
    pub mod interview_survey;
    pub mod router;
    pub mod slack_reminders;
    pub mod snapshot;
}
