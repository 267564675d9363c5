use chrono::{DateTime, Utc};

use super::domain::{Notification, NotificationId, Recipient};
use crate::store::RepositoryError;

pub trait NotificationRepository: Send + Sync {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError>;
    fn update(&self, notification: Notification) -> Result<Notification, RepositoryError>;
    fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError>;
    /// Newest first.
    fn for_recipient(&self, recipient: &Recipient) -> Result<Vec<Notification>, RepositoryError>;
    fn mark_all_read(
        &self,
        recipient: &Recipient,
        now: DateTime<Utc>,
    ) -> Result<usize, RepositoryError>;
    fn delete(&self, id: &NotificationId) -> Result<bool, RepositoryError>;
    fn delete_for_recipient(&self, recipient: &Recipient) -> Result<usize, RepositoryError>;
    fn all(&self) -> Result<Vec<Notification>, RepositoryError>;
}
