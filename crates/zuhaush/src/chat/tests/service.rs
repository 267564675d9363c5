use super::common::*;
use crate::chat::ChatSender;
use crate::error::ServiceError;
use crate::notifications::{NotificationFilter, NotificationType, Recipient};
use crate::pagination::PageRequest;

#[test]
fn user_message_notifies_the_builder() {
    let fx = fixture();
    let message = fx
        .harness
        .app
        .chat
        .send(
            fx.user_party(),
            to(fx.builder.builder.id.as_str(), "  Is the 3 BHK still available?  "),
        )
        .expect("sent");
    assert_eq!(message.sender, ChatSender::User);
    assert_eq!(message.body, "Is the 3 BHK still available?");

    let inbox = fx
        .harness
        .app
        .notifications
        .list(
            &Recipient::builder(&fx.builder.builder.id),
            &NotificationFilter {
                notification_type: Some(NotificationType::UserMessage),
                ..NotificationFilter::default()
            },
            &PageRequest::default(),
        )
        .expect("inbox");
    assert_eq!(inbox.total_results, 1);
    let notice = &inbox.results[0];
    assert_eq!(notice.title, "New message from Asha Verma");
    assert_eq!(
        notice.action_url.as_deref(),
        Some(format!("/chat/{}", fx.user.user.id).as_str())
    );
}

#[test]
fn long_messages_are_previewed_in_notifications() {
    let fx = fixture();
    let body = "x".repeat(150);
    fx.harness
        .app
        .chat
        .send(fx.builder_party(), to(fx.user.user.id.as_str(), &body))
        .expect("sent");

    let inbox = fx
        .harness
        .app
        .notifications
        .list(
            &Recipient::user(&fx.user.user.id),
            &NotificationFilter {
                notification_type: Some(NotificationType::BuilderMessage),
                ..NotificationFilter::default()
            },
            &PageRequest::default(),
        )
        .expect("inbox");
    assert_eq!(inbox.results[0].description, format!("{}...", "x".repeat(100)));
}

#[test]
fn unknown_recipients_are_not_found() {
    let fx = fixture();
    let chat = &fx.harness.app.chat;
    assert!(matches!(
        chat.send(fx.user_party(), to("missing", "hello")),
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        chat.send(fx.builder_party(), to("missing", "hello")),
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        chat.send(fx.user_party(), to(fx.builder.builder.id.as_str(), "   ")),
        Err(ServiceError::Validation(_))
    ));
}

#[test]
fn history_pages_back_from_the_newest_message() {
    let fx = fixture();
    fx.exchange(5);
    let chat = &fx.harness.app.chat;

    let latest = chat
        .history(fx.user_party(), fx.builder.builder.id.as_str(), &PageRequest::new(1, 2))
        .expect("history");
    assert_eq!(latest.total_results, 5);
    let bodies: Vec<&str> = latest.results.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, ["message 3", "message 4"]);

    let earliest = chat
        .history(fx.builder_party(), fx.user.user.id.as_str(), &PageRequest::new(3, 2))
        .expect("history");
    let bodies: Vec<&str> = earliest.results.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, ["message 0"]);
}

#[test]
fn conversations_keep_the_latest_message_per_counterpart() {
    let fx = fixture();
    fx.exchange(3);
    let other = fx.harness.verified_builder("hello@other.test");
    std::thread::sleep(std::time::Duration::from_millis(2));
    fx.harness
        .app
        .chat
        .send(fx.user_party(), to(other.builder.id.as_str(), "Hi there"))
        .expect("sent");

    let page = fx
        .harness
        .app
        .chat
        .conversations(fx.user_party(), &PageRequest::default())
        .expect("conversations");
    assert_eq!(page.total_results, 2);
    assert_eq!(page.results[0].counterpart_id, other.builder.id.as_str());
    assert_eq!(page.results[1].last_message.body, "message 2");

    let builder_side = fx
        .harness
        .app
        .chat
        .conversations(fx.builder_party(), &PageRequest::default())
        .expect("conversations");
    assert_eq!(builder_side.total_results, 1);
    assert_eq!(builder_side.results[0].counterpart_id, fx.user.user.id.as_str());
}
