use std::thread;
use std::time::Duration;

use crate::accounts::builders::BuilderSession;
use crate::accounts::users::UserSession;
use crate::chat::{ChatParty, SendMessage};
use crate::testing::Harness;

pub(super) struct ChatFixture {
    pub(super) harness: Harness,
    pub(super) user: UserSession,
    pub(super) builder: BuilderSession,
}

pub(super) fn fixture() -> ChatFixture {
    let harness = Harness::new();
    let user = harness.registered_user("asha@example.com");
    let builder = harness.verified_builder("sales@skyline.test");
    ChatFixture {
        harness,
        user,
        builder,
    }
}

pub(super) fn to(recipient: &str, body: &str) -> SendMessage {
    SendMessage {
        recipient_id: recipient.to_string(),
        message: body.to_string(),
    }
}

impl ChatFixture {
    pub(super) fn user_party(&self) -> ChatParty<'_> {
        ChatParty::User(&self.user.user.id)
    }

    pub(super) fn builder_party(&self) -> ChatParty<'_> {
        ChatParty::Builder(&self.builder.builder.id)
    }

    /// Sends alternate messages, spaced so timestamps are strictly increasing.
    pub(super) fn exchange(&self, count: usize) {
        let chat = &self.harness.app.chat;
        for index in 0..count {
            let result = if index % 2 == 0 {
                chat.send(
                    self.user_party(),
                    to(self.builder.builder.id.as_str(), &format!("message {index}")),
                )
            } else {
                chat.send(
                    self.builder_party(),
                    to(self.user.user.id.as_str(), &format!("message {index}")),
                )
            };
            result.expect("message sent");
            thread::sleep(Duration::from_millis(2));
        }
    }
}
