use chrono::{DateTime, Utc};
use url::Url;

use crate::error::AppError;
use crate::reminders::matcher::{InterviewReminder, SurveyReminder, TieredStudent, UnassignedStudent};

pub const ENGLISH_BELOW: &str = "English below";
pub const SPLIT_LINE: &str = "----------------------------------------";

/// Deep-link builder rooted at the portal origin. Validated once at
/// startup so the template layer never fails on a malformed base URL.
#[derive(Debug, Clone)]
pub struct PortalLinks {
    origin: Url,
}

impl PortalLinks {
    pub fn new(origin: &str) -> Result<Self, AppError> {
        let origin = Url::parse(origin)
            .map_err(|e| AppError::Config(format!("Invalid portal origin '{}': {}", origin, e)))?;
        Ok(Self { origin })
    }

    fn join(&self, path: &str) -> String {
        self.origin
            .join(path)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.origin, path.trim_start_matches('/')))
    }

    pub fn student_profile(&self, student_id: &bson::oid::ObjectId) -> String {
        self.join(&format!("/student-database/{}#profile", student_id))
    }

    pub fn document_thread(&self, thread_id: &bson::oid::ObjectId) -> String {
        self.join(&format!("/document-modification/{}", thread_id))
    }

    pub fn interview_survey(&self, interview_id: &bson::oid::ObjectId) -> String {
        self.join(&format!("/interview-training/{}/survey", interview_id))
    }
}

/// Shared HTML shell for every outgoing email: button styling plus the
/// team signature.
pub fn wrap_html(body: &str) -> String {
    format!(
        r#"<html>
<head>
<style>
  body {{ font-family: Arial, Helvetica, sans-serif; color: #1a1a1a; }}
  .mui-button {{
    display: inline-block; padding: 10px 20px; margin: 8px 0;
    background-color: #1565c0; color: #ffffff; text-decoration: none;
    border-radius: 4px; font-weight: bold;
  }}
</style>
</head>
<body>
{body}
<br />
<p><b>Your Portal Team</b></p>
</body>
</html>"#
    )
}

/// Subject and body for the batched assign-editor reminder. One email per
/// agent (or permission holder), listing every matched student.
pub fn assign_editor_reminder(
    recipient_name: &str,
    students: &[UnassignedStudent],
    links: &PortalLinks,
) -> (String, String) {
    let subject = "[DO NOT IGNORE] Assign Editor Reminder".to_string();

    let student_list: String = students
        .iter()
        .map(|student| {
            let link = links.student_profile(&student.id);
            format!(
                "<li><a href=\"{}\">{}</a></li>",
                link,
                student.display_name()
            )
        })
        .collect();

    let body = format!(
        r#"<p>Hi {recipient_name},</p>

<p>The following students have uploaded input to their CV/ML/RL center <b>but do not have any Editor assigned yet</b>:</p>

<ul>{student_list}</ul>

<p><b>Please assign an Editor to each student above.</b></p>

<p>{SPLIT_LINE}</p>

<p>以下學生已上傳文件，但目前並無任何編輯：</p>

<ul>{student_list}</ul>

<p><b>請儘速指派編輯。</b></p>
"#
    );

    (subject, body)
}

/// Subject and body for an interview-survey reminder, bilingual with the
/// target language first and one primary call-to-action link.
pub fn interview_survey_reminder(
    reminder: &InterviewReminder,
    links: &PortalLinks,
) -> (String, String) {
    let student_name = reminder.student.full_name();
    let program_name = reminder
        .program
        .as_ref()
        .map(|program| program.display_name())
        .unwrap_or_else(|| "your program".to_string());
    let survey_url = links.interview_survey(&reminder.interview_id);

    match reminder.reminder {
        SurveyReminder::First => {
            let subject = format!("[TODO][Urgent] Interview Survey for {program_name}");
            let body = format!(
                r#"<p>{ENGLISH_BELOW}</p>

<p>嗨 {student_name},</p>

<p>幾天前，您參加了 <b>{program_name}</b> 的面試。</p>

<p>我們誠摯地邀請您花費2分鐘完成這份簡短的問卷。您的回饋對我們來說非常寶貴，將幫助我們更好地支持未來的學生完成他們的申請之旅。</p>

<a href="{survey_url}" class="mui-button" target="_blank">開啟面試問卷</a>

<p>謝謝您的參與！</p>

<br />

<p>{SPLIT_LINE}</p>

<p>Hi {student_name},</p>

<p>A few days ago, you had your interview for <b>{program_name}</b>.</p>

<p>We would greatly appreciate it if you could take <b>2 minutes</b> to complete our <b>short survey</b>. Your feedback is incredibly valuable and will help us better support future students on their application journey.</p>

<a href="{survey_url}" class="mui-button" target="_blank">CLICK TO OPEN THE SURVEY</a>

<p>Thank you for your participation!</p>"#
            );
            (subject, body)
        }
        SurveyReminder::Second => {
            let subject = "Final Reminder - Interview Training Survey".to_string();
            let body = format!(
                r#"<p>{ENGLISH_BELOW}</p>

<p>嗨 {student_name},</p>

<p>您參加 <b>{program_name}</b> 的面試已經幾天了。您是否已經有機會分享您對面試訓練的回饋？</p>

<p>我們非常重視您的意見，因為這將幫助我們改進並更好地支持未來的學生完成他們的申請過程。</p>

<a href="{survey_url}" class="mui-button" target="_blank">開啟面試問卷</a>

<p>如果您有任何問題，請隨時聯繫您的訓練官或顧問。</p>

<p>謝謝您的參與！</p>

<br />

<p>{SPLIT_LINE}</p>

<p>Hi {student_name},</p>

<p>Your interview for <b>{program_name}</b> was a few days ago. Have you had a chance to share your feedback on the interview training?</p>

<p>We truly appreciate your input, as it helps us improve and better support future students in their application process.</p>

<a href="{survey_url}" class="mui-button" target="_blank">CLICK TO OPEN THE SURVEY</a>

<p>If you have any questions, feel free to reach out to your trainer or agent.</p>

<p>Thank you for your participation!</p>"#
            );
            (subject, body)
        }
    }
}

fn tier_section(
    students: &[TieredStudent],
    days: u32,
    mentions: &[String],
    links: &PortalLinks,
) -> Option<String> {
    if students.is_empty() {
        return None;
    }

    let list: Vec<String> = students
        .iter()
        .map(|student| {
            let profile = links.student_profile(&student.id);
            let thread = links.document_thread(&student.thread_id);
            format!("- <{}|{}> — <{}|thread>", profile, student.name, thread)
        })
        .collect();

    let tags = if mentions.is_empty() {
        String::new()
    } else {
        let tagged: Vec<String> = mentions.iter().map(|id| format!("<@{}>", id)).collect();
        format!("\n\n cc: {}", tagged.join(" "))
    };

    Some(format!(
        "📌 *Over {days} Days - Editor or Essay Writer Not Assigned* \n*超過{days}天未指派顧問或編輯：* \n\n{}{tags}",
        list.join("\n\n")
    ))
}

/// Slack Block Kit payload for the tiered assignment reminder: header,
/// generated-on context, intro, one divider+section per non-empty tier,
/// closing context. All matched students for a tier share one message so
/// the channel is not flooded.
pub fn assignment_reminder_blocks(
    urgent: &[TieredStudent],
    standard: &[TieredStudent],
    urgent_mentions: &[String],
    standard_mentions: &[String],
    links: &PortalLinks,
    now: DateTime<Utc>,
) -> Option<serde_json::Value> {
    let urgent_section = tier_section(urgent, 7, urgent_mentions, links);
    let standard_section = tier_section(standard, 3, standard_mentions, links);

    if urgent_section.is_none() && standard_section.is_none() {
        return None;
    }

    let generated = now.format("%Y-%m-%d %H:%M UTC").to_string();

    let mut blocks = vec![
        serde_json::json!({
            "type": "header",
            "text": {
                "type": "plain_text",
                "text": "🔔 [Attention] Request for Essay Writer Assignment | 指派提醒通知"
            }
        }),
        serde_json::json!({
            "type": "context",
            "elements": [{
                "type": "mrkdwn",
                "text": format!("*Generated on:* {generated} | *生成時間:* {generated}")
            }]
        }),
        serde_json::json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": "*Hi team*,\nThe following student cases have *not been assigned* within the expected timeframe.\n*以下學生案件尚未完成指派，請儘速處理，謝謝！*"
            }
        }),
    ];

    for section in [urgent_section, standard_section].into_iter().flatten() {
        blocks.push(serde_json::json!({ "type": "divider" }));
        blocks.push(serde_json::json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": section }
        }));
    }

    blocks.push(serde_json::json!({
        "type": "context",
        "elements": [{
            "type": "mrkdwn",
            "text": "Please check these cases and follow up accordingly. 請確認以上案件並盡快跟進處理。"
        }]
    }));

    Some(serde_json::Value::Array(blocks))
}
