use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Info,
    Warning,
    Reminder,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Absent when the server does not expose it
    #[serde(default)]
    pub id: Option<i64>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read: bool,
    #[serde(rename = "notification_type")]
    pub kind: NotificationKind,
    pub sender: Option<UserSummary>,
}

impl Notification {
    pub fn headline(&self) -> &str {
        self.title
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("(no title)")
    }
}
