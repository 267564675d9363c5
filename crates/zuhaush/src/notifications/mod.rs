//! In-app notifications. Other services deliver through
//! [`NotificationService::notify_quietly`], so a failed notification never fails the
//! operation that triggered it.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    NewNotification, Notification, NotificationId, NotificationType, Priority, Recipient,
    RecipientKind, SenderKind,
};
pub use repository::NotificationRepository;
pub use router::notification_router;
pub use service::{NotificationFilter, NotificationService, NotificationStats};
