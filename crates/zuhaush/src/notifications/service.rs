use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    NewNotification, Notification, NotificationId, NotificationType, Priority, Recipient,
};
use super::repository::NotificationRepository;
use crate::error::ServiceError;
use crate::pagination::{Page, PageRequest};
use crate::validation::required_text;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFilter {
    pub is_read: Option<bool>,
    pub notification_type: Option<NotificationType>,
}

impl NotificationFilter {
    fn matches(&self, notification: &Notification) -> bool {
        self.is_read.map_or(true, |read| notification.is_read == read)
            && self
                .notification_type
                .map_or(true, |kind| notification.notification_type == kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationStats {
    pub total: u64,
    pub unread: u64,
    pub by_type: BTreeMap<NotificationType, u64>,
    pub by_priority: BTreeMap<Priority, u64>,
}

/// In-app notification inbox for users and builders.
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repository: Arc<dyn NotificationRepository>) -> Self {
        Self { repository }
    }

    /// Validate and store a notification.
    pub fn notify(&self, input: NewNotification) -> Result<Notification, ServiceError> {
        let title = required_text("Title", &input.title, 200)?;
        let description = required_text("Description", &input.description, 1000)?;
        if input.recipient.id.trim().is_empty() {
            return Err(ServiceError::validation("Recipient is required"));
        }

        let notification = Notification {
            id: NotificationId::generate(),
            recipient: input.recipient,
            title,
            description,
            notification_type: input.notification_type,
            priority: input.priority,
            is_read: false,
            read_at: None,
            sender: input.sender,
            sender_id: input.sender_id,
            action_url: input.action_url,
            created_at: Utc::now(),
        };
        Ok(self.repository.insert(notification)?)
    }

    /// Side-channel delivery: a failure is logged and never fails the caller.
    pub fn notify_quietly(&self, input: NewNotification) -> Option<Notification> {
        let kind = input.notification_type;
        match self.notify(input) {
            Ok(notification) => Some(notification),
            Err(err) => {
                warn!(?kind, error = %err, "notification dropped");
                None
            }
        }
    }

    pub fn list(
        &self,
        recipient: &Recipient,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> Result<Page<Notification>, ServiceError> {
        let mut items: Vec<Notification> = self
            .repository
            .for_recipient(recipient)?
            .into_iter()
            .filter(|notification| filter.matches(notification))
            .collect();

        if let Some(sort) = &page.sort {
            sort.apply(&mut items, &["created_at", "priority"], |field, a, b| match field {
                "created_at" => Some(a.created_at.cmp(&b.created_at)),
                "priority" => Some(a.priority.cmp(&b.priority)),
                _ => None,
            })?;
        }
        Ok(Page::paginate(items, page))
    }

    pub fn unread_count(&self, recipient: &Recipient) -> Result<u64, ServiceError> {
        Ok(self
            .repository
            .for_recipient(recipient)?
            .iter()
            .filter(|notification| !notification.is_read)
            .count() as u64)
    }

    /// Fetch a notification addressed to `recipient`; others look missing.
    pub fn get(
        &self,
        recipient: &Recipient,
        id: &NotificationId,
    ) -> Result<Notification, ServiceError> {
        self.repository
            .fetch(id)?
            .filter(|notification| &notification.recipient == recipient)
            .ok_or_else(|| ServiceError::not_found("Notification not found"))
    }

    pub fn mark_read(
        &self,
        recipient: &Recipient,
        id: &NotificationId,
    ) -> Result<Notification, ServiceError> {
        let mut notification = self.get(recipient, id)?;
        if !notification.is_read {
            notification.is_read = true;
            notification.read_at = Some(Utc::now());
            notification = self.repository.update(notification)?;
        }
        Ok(notification)
    }

    pub fn mark_all_read(&self, recipient: &Recipient) -> Result<usize, ServiceError> {
        Ok(self.repository.mark_all_read(recipient, Utc::now())?)
    }

    pub fn delete(&self, recipient: &Recipient, id: &NotificationId) -> Result<(), ServiceError> {
        let notification = self.get(recipient, id)?;
        self.repository.delete(&notification.id)?;
        Ok(())
    }

    pub fn delete_all(&self, recipient: &Recipient) -> Result<usize, ServiceError> {
        Ok(self.repository.delete_for_recipient(recipient)?)
    }

    pub fn stats(&self) -> Result<NotificationStats, ServiceError> {
        let mut stats = NotificationStats::default();
        for notification in self.repository.all()? {
            stats.total += 1;
            if !notification.is_read {
                stats.unread += 1;
            }
            *stats
                .by_type
                .entry(notification.notification_type)
                .or_default() += 1;
            *stats.by_priority.entry(notification.priority).or_default() += 1;
        }
        Ok(stats)
    }
}
