use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved id of the synthetic stale-companies alert. There is at most one
/// record with this id in any feed, and it can never be archived.
pub const INACTIVITY_ALERT_ID: &str = "inactivity-alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Task,
    Event,
    Contact,
    Company,
    Deal,
    Email,
    Activity,
    System,
    Reminder,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Event => "event",
            Self::Contact => "contact",
            Self::Company => "company",
            Self::Deal => "deal",
            Self::Email => "email",
            Self::Activity => "activity",
            Self::System => "system",
            Self::Reminder => "reminder",
        }
    }
}

/// The canonical feed unit. `read` and `archived` are the only fields whose
/// authoritative value survives a refresh; everything else is recomputed from
/// the latest fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Notification {
    pub fn is_inactivity_alert(&self) -> bool {
        self.id == INACTIVITY_ALERT_ID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityKind {
    Call,
    Email,
    Note,
    Meeting,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Email => "email",
            Self::Note => "note",
            Self::Meeting => "meeting",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: i64,
    pub summary: String,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDto {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDto {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDto {
    pub id: i64,
    pub kind: ActivityKind,
    pub subject: String,
    pub created_at: DateTime<Utc>,
    pub contact_id: Option<i64>,
    pub company_id: Option<i64>,
    pub deal_id: Option<i64>,
}

/// Everything a source fetch can hand to the canonicalizer. One variant per
/// source kind so a missing or renamed upstream field fails at this boundary
/// instead of producing a malformed feed record.
#[derive(Debug, Clone)]
pub enum RawRecord {
    Task(TaskDto),
    Event(EventDto),
    Contact(ContactDto),
    Company(CompanyDto),
    Deal(DealDto),
    Activity(ActivityDto),
    Inactivity { stale_companies: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmUser {
    pub id: i64,
    pub display_name: String,
}

/// Payload of the process-wide "activity completed" signal. Consumed once per
/// emission; injection is idempotent by synthesized id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCompleted {
    pub title: String,
    pub completed_at: DateTime<Utc>,
}

impl ActivityCompleted {
    /// Deterministic feed id for this signal. Two emissions with the same
    /// timestamp collapse into one record.
    pub fn feed_id(&self) -> String {
        format!("activity-{}", self.completed_at.timestamp_millis())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    pub refresh_interval_secs: u64,
    pub upcoming_window_days: i64,
    pub recent_window_hours: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 300,
            upcoming_window_days: 7,
            recent_window_hours: 24,
        }
    }
}
