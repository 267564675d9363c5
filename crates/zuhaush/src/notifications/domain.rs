use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::builders::BuilderId;
use crate::accounts::users::UserId;
use crate::store::record_id;

record_id!(NotificationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    User,
    Builder,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    pub kind: RecipientKind,
    pub id: String,
}

impl Recipient {
    pub fn user(id: &UserId) -> Self {
        Self {
            kind: RecipientKind::User,
            id: id.to_string(),
        }
    }

    pub fn builder(id: &BuilderId) -> Self {
        Self {
            kind: RecipientKind::Builder,
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Welcome,
    VisitRequest,
    VisitScheduled,
    VisitConfirmed,
    VisitCancelled,
    VisitRescheduled,
    VisitCompleted,
    BuilderMessage,
    UserMessage,
    ProfileApproved,
    ProfileRejected,
    PropertyApproved,
    PropertyRejected,
    NewProperty,
    PriceDrop,
    SystemAnnouncement,
    General,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    #[default]
    System,
    User,
    Builder,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: Recipient,
    pub title: String,
    pub description: String,
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub sender: SenderKind,
    pub sender_id: Option<String>,
    pub action_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for a new notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewNotification {
    pub recipient: Recipient,
    pub title: String,
    pub description: String,
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub sender: SenderKind,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub action_url: Option<String>,
}

impl NewNotification {
    pub fn system(
        recipient: Recipient,
        notification_type: NotificationType,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            recipient,
            title: title.into(),
            description: description.into(),
            notification_type,
            priority: Priority::Medium,
            sender: SenderKind::System,
            sender_id: None,
            action_url: None,
        }
    }

    pub fn from_sender(mut self, sender: SenderKind, sender_id: impl Into<String>) -> Self {
        self.sender = sender;
        self.sender_id = Some(sender_id.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_action(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }
}
