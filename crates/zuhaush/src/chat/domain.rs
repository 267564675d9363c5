use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::builders::BuilderId;
use crate::accounts::users::UserId;
use crate::store::record_id;

record_id!(MessageId);

pub const MESSAGE_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatSender {
    User,
    Builder,
}

/// One message in a user/builder conversation. Both ends are always recorded, whichever
/// side wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub user_id: UserId,
    pub builder_id: BuilderId,
    pub body: String,
    pub sender: ChatSender,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Id of the party on the other side from `sender`'s point of view.
    pub fn counterpart_of(&self, side: ChatSender) -> &str {
        match side {
            ChatSender::User => self.builder_id.as_str(),
            ChatSender::Builder => self.user_id.as_str(),
        }
    }
}
