use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{ChatSender, Message, MessageId, MESSAGE_MAX_CHARS};
use super::repository::MessageRepository;
use crate::accounts::builders::{BuilderId, BuilderRepository};
use crate::accounts::users::{UserId, UserRepository};
use crate::error::ServiceError;
use crate::notifications::{
    NewNotification, NotificationService, NotificationType, Recipient, SenderKind,
};
use crate::pagination::{Page, PageRequest};
use crate::validation::required_text;

/// Messages per page when the client does not ask for a size.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

const PREVIEW_CHARS: usize = 100;

/// The signed-in side of a conversation.
#[derive(Debug, Clone, Copy)]
pub enum ChatParty<'a> {
    User(&'a UserId),
    Builder(&'a BuilderId),
}

impl ChatParty<'_> {
    fn side(&self) -> ChatSender {
        match self {
            Self::User(_) => ChatSender::User,
            Self::Builder(_) => ChatSender::Builder,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessage {
    pub recipient_id: String,
    pub message: String,
}

/// Latest message exchanged with one counterpart.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub counterpart_id: String,
    pub last_message: Message,
}

fn preview(body: &str) -> String {
    if body.chars().count() <= PREVIEW_CHARS {
        return body.to_string();
    }
    let mut short: String = body.chars().take(PREVIEW_CHARS).collect();
    short.push_str("...");
    short
}

pub struct ChatService {
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    builders: Arc<dyn BuilderRepository>,
    notifications: Arc<NotificationService>,
}

impl ChatService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
        builders: Arc<dyn BuilderRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            messages,
            users,
            builders,
            notifications,
        }
    }

    pub fn send(&self, party: ChatParty<'_>, input: SendMessage) -> Result<Message, ServiceError> {
        let body = required_text("Message", &input.message, MESSAGE_MAX_CHARS)?;

        let (message, notice) = match party {
            ChatParty::User(user_id) => {
                let builder = self
                    .builders
                    .fetch(&BuilderId(input.recipient_id))?
                    .filter(|builder| builder.is_active)
                    .ok_or_else(|| ServiceError::not_found("Builder not found"))?;
                let sender_name = self
                    .users
                    .fetch(user_id)?
                    .and_then(|user| user.name)
                    .unwrap_or_else(|| "A user".to_string());
                let message = Message {
                    id: MessageId::generate(),
                    user_id: user_id.clone(),
                    builder_id: builder.id.clone(),
                    body,
                    sender: ChatSender::User,
                    created_at: Utc::now(),
                };
                let notice = NewNotification::system(
                    Recipient::builder(&builder.id),
                    NotificationType::UserMessage,
                    format!("New message from {sender_name}"),
                    preview(&message.body),
                )
                .from_sender(SenderKind::User, user_id.to_string())
                .with_action(format!("/chat/{user_id}"));
                (message, notice)
            }
            ChatParty::Builder(builder_id) => {
                let user = self
                    .users
                    .fetch(&UserId(input.recipient_id))?
                    .filter(|user| user.is_active)
                    .ok_or_else(|| ServiceError::not_found("User not found"))?;
                let sender_name = self
                    .builders
                    .fetch(builder_id)?
                    .map(|builder| builder.name)
                    .unwrap_or_else(|| "A builder".to_string());
                let message = Message {
                    id: MessageId::generate(),
                    user_id: user.id.clone(),
                    builder_id: builder_id.clone(),
                    body,
                    sender: ChatSender::Builder,
                    created_at: Utc::now(),
                };
                let notice = NewNotification::system(
                    Recipient::user(&user.id),
                    NotificationType::BuilderMessage,
                    format!("New message from {sender_name}"),
                    preview(&message.body),
                )
                .from_sender(SenderKind::Builder, builder_id.to_string())
                .with_action(format!("/chat/{builder_id}"));
                (message, notice)
            }
        };

        let message = self.messages.insert(message)?;
        info!(message = %message.id, sender = ?message.sender, "chat message sent");
        self.notifications.notify_quietly(notice);
        Ok(message)
    }

    /// Conversation with one counterpart. Pages count back from the newest message; each
    /// page is returned oldest first.
    pub fn history(
        &self,
        party: ChatParty<'_>,
        counterpart: &str,
        page: &PageRequest,
    ) -> Result<Page<Message>, ServiceError> {
        let mut messages = match party {
            ChatParty::User(user) => self.messages.between(user, &BuilderId::from(counterpart))?,
            ChatParty::Builder(builder) => {
                self.messages.between(&UserId::from(counterpart), builder)?
            }
        };
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut page = Page::paginate(messages, page);
        page.results.reverse();
        Ok(page)
    }

    /// One entry per counterpart carrying the latest message, most recent first.
    pub fn conversations(
        &self,
        party: ChatParty<'_>,
        page: &PageRequest,
    ) -> Result<Page<Conversation>, ServiceError> {
        let messages = match party {
            ChatParty::User(user) => self.messages.for_user(user)?,
            ChatParty::Builder(builder) => self.messages.for_builder(builder)?,
        };

        let side = party.side();
        let mut latest: HashMap<String, Message> = HashMap::new();
        for message in messages {
            let counterpart = message.counterpart_of(side).to_string();
            match latest.get(&counterpart) {
                Some(current) if current.created_at >= message.created_at => {}
                _ => {
                    latest.insert(counterpart, message);
                }
            }
        }

        let mut conversations: Vec<Conversation> = latest
            .into_iter()
            .map(|(counterpart_id, last_message)| Conversation {
                counterpart_id,
                last_message,
            })
            .collect();
        conversations.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
        Ok(Page::paginate(conversations, page))
    }
}
