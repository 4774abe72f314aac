use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type NotificationId = i64;

/// Notification category. Unknown server values land in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TicketAssigned,
    TaskAssigned,
    StatusChanged,
    SystemAlert,
    Mention,
    DeadlineReminder,
    #[default]
    #[serde(other)]
    Other,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TicketAssigned => "ticket_assigned",
            Self::TaskAssigned => "task_assigned",
            Self::StatusChanged => "status_changed",
            Self::SystemAlert => "system_alert",
            Self::Mention => "mention",
            Self::DeadlineReminder => "deadline_reminder",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Unread,
    Read,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type", alias = "notification_type", default)]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: NotificationStatus,
    #[serde(default, alias = "senderName")]
    pub sender_name: Option<String>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "readAt")]
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.status == NotificationStatus::Unread
    }

    /// Transition to read. `read_at` is only set on the first transition.
    pub fn mark_read(&mut self, at: DateTime<Utc>) {
        if self.status == NotificationStatus::Read && self.read_at.is_some() {
            return;
        }
        self.status = NotificationStatus::Read;
        self.read_at = Some(at);
    }

    /// Restores `read_at.is_some() == (status == Read)` on payloads that break it.
    pub fn normalize(mut self, now: DateTime<Utc>) -> Self {
        match self.status {
            NotificationStatus::Unread => self.read_at = None,
            NotificationStatus::Read => {
                if self.read_at.is_none() {
                    self.read_at = Some(now);
                }
            }
        }
        self
    }
}

/// `GET /notifications/unread-count`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum UnreadCountResponse {
    Bare(u64),
    Object {
        #[serde(alias = "unread_count", alias = "unreadCount")]
        count: u64,
    },
}

impl UnreadCountResponse {
    pub fn count(&self) -> u64 {
        match self {
            Self::Bare(count) | Self::Object { count } => *count,
        }
    }
}

/// `GET /notifications/check-new`: a bare flag, a bare count, or an object.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum CheckNewResponse {
    Flag(bool),
    Count(u64),
    Object {
        #[serde(default, alias = "hasNew")]
        has_new: bool,
        #[serde(default, alias = "new_count", alias = "newCount")]
        count: u64,
    },
}

impl CheckNewResponse {
    pub fn has_new(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Count(count) => *count > 0,
            Self::Object { has_new, count } => *has_new || *count > 0,
        }
    }
}

/// `GET /notifications/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotificationStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub unread: u64,
    #[serde(default)]
    pub read: u64,
    #[serde(default)]
    pub deleted: u64,
}
