//! Direct messaging between users and builders. Each message notifies the other side.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{ChatSender, Message, MessageId};
pub use repository::MessageRepository;
pub use router::chat_router;
pub use service::{ChatParty, ChatService, Conversation, SendMessage};
