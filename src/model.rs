//! Circular document model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority classification driving visual emphasis in consuming clients.
///
/// The set is closed; documents carrying anything else are rejected at
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Urgent,
    Informational,
    ActionRequired,
}

impl Priority {
    /// Stable wire name, e.g. `action-required`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::Informational => "informational",
            Priority::ActionRequired => "action-required",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(Priority::Urgent),
            "informational" => Ok(Priority::Informational),
            "action-required" => Ok(Priority::ActionRequired),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Caller role embedded in an authentication credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Attachment metadata only; no binary content is stored anywhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    /// Display file name, e.g. `Exam_Schedule.pdf`.
    pub name: String,
    /// File kind label such as `pdf`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable size string such as `2.4 MB`.
    pub size: String,
}

/// One entry in a circular's append-only read log.
///
/// The same name may appear more than once; the log records read events,
/// not a deduplicated reader set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub name: String,
    pub read_at: DateTime<Utc>,
}

/// Comment owned by its parent circular; it cannot exist independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub author: String,
    /// Always the authenticated caller's role at append time.
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Published notice document, the root entity of the store.
///
/// ```json
/// {
///   "id": "4cd0f4e2b0a44f6e9d1a2c3b4e5f6a7b",
///   "title": "End Semester Examination Schedule",
///   "content": "All students are hereby informed...",
///   "priority": "urgent",
///   "department": "All",
///   "year": "All",
///   "author": "Dr. Rajesh Kumar",
///   "publishedAt": "2025-11-20T09:00:00Z",
///   "readBy": [{ "name": "Priya Sharma", "readAt": "2025-11-20T10:30:00Z" }],
///   "totalRecipients": 450,
///   "attachments": [{ "name": "Exam_Schedule.pdf", "type": "pdf", "size": "2.4 MB" }],
///   "comments": [],
///   "tags": ["examination", "schedule"],
///   "version": 1
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Circular {
    /// Opaque unique identifier assigned at creation; immutable.
    pub id: String,
    pub title: String,
    pub content: String,
    pub priority: Priority,
    /// Free-form classification, e.g. a department code or `All`.
    pub department: String,
    /// Free-form classification, e.g. `3rd` or `All`.
    pub year: String,
    /// Display name of the creator; not tied to the caller identity.
    pub author: String,
    pub published_at: DateTime<Utc>,
    /// Stored for authoring purposes; no scheduler acts on it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Append-only log of read events.
    #[serde(default)]
    pub read_by: Vec<ReadReceipt>,
    /// Denominator for read-rate derivations; never reconciled against an
    /// actual audience.
    #[serde(default)]
    pub total_recipients: u32,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Append-only comment sequence.
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Manual revision counter; nothing auto-increments it.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Authoring template name, when one was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

fn default_version() -> u32 {
    1
}

/// Creation payload accepted by the store and the HTTP API.
///
/// Required fields are validated by [`crate::storage::Store::insert`];
/// everything else defaults. The priority stays a raw string here so an
/// out-of-set value surfaces as a validation failure rather than a
/// deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CircularDraft {
    pub title: String,
    pub content: String,
    pub priority: Option<String>,
    pub department: String,
    pub year: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub read_by: Vec<ReadReceipt>,
    pub total_recipients: u32,
    pub attachments: Vec<Attachment>,
    pub comments: Vec<Comment>,
    pub tags: Vec<String>,
    pub version: Option<u32>,
    pub template: Option<String>,
}

/// Authoring templates offering a pre-filled title, body stub, and priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeTemplate {
    Custom,
    ExamNotice,
    EventNotice,
    FeeNotice,
}

/// Preset values produced by [`NoticeTemplate::prefill`].
#[derive(Debug, Clone, Copy)]
pub struct Prefill {
    pub title: &'static str,
    pub content: &'static str,
    pub priority: Priority,
}

impl NoticeTemplate {
    /// Display name stored in the circular's `template` field.
    pub fn name(&self) -> &'static str {
        match self {
            NoticeTemplate::Custom => "Custom",
            NoticeTemplate::ExamNotice => "Exam Notice",
            NoticeTemplate::EventNotice => "Event Notice",
            NoticeTemplate::FeeNotice => "Fee Notice",
        }
    }

    /// Preset title, content stub, and priority for this template.
    pub fn prefill(&self) -> Prefill {
        match self {
            NoticeTemplate::Custom => Prefill {
                title: "",
                content: "",
                priority: Priority::Informational,
            },
            NoticeTemplate::ExamNotice => Prefill {
                title: "End Semester Examination Schedule",
                content:
                    "All students are hereby informed that the end semester examinations \
                     will commence from...",
                priority: Priority::Urgent,
            },
            NoticeTemplate::EventNotice => Prefill {
                title: "",
                content: "We are pleased to announce...",
                priority: Priority::Informational,
            },
            NoticeTemplate::FeeNotice => Prefill {
                title: "Fee Payment Reminder",
                content: "Students are reminded that the last date for fee payment is...",
                priority: Priority::ActionRequired,
            },
        }
    }

    /// Build a draft carrying the preset values, addressed to everyone.
    pub fn draft(&self) -> CircularDraft {
        let prefill = self.prefill();
        CircularDraft {
            title: prefill.title.into(),
            content: prefill.content.into(),
            priority: Some(prefill.priority.as_str().into()),
            department: "All".into(),
            year: "All".into(),
            template: Some(self.name().into()),
            ..CircularDraft::default()
        }
    }
}

impl std::str::FromStr for NoticeTemplate {
    type Err = String;

    /// Accepts both the display form (`Exam Notice`) and a slug
    /// (`exam-notice`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' { '-' } else { c })
            .collect();
        match slug.as_str() {
            "custom" => Ok(NoticeTemplate::Custom),
            "exam-notice" => Ok(NoticeTemplate::ExamNotice),
            "event-notice" => Ok(NoticeTemplate::EventNotice),
            "fee-notice" => Ok(NoticeTemplate::FeeNotice),
            other => Err(format!("unknown template: {other}")),
        }
    }
}
