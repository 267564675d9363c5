use std::sync::Arc;

use crate::auth::{OtpService, TokenService};
use crate::config::{AuthConfig, OtpConfig};
use crate::mail::{templates, MemoryMailer};
use crate::store::memory::MemoryStore;

pub(super) const SECRET: &str = "auth-test-secret";

pub(super) struct AuthKit {
    pub(super) store: MemoryStore,
    pub(super) tokens: Arc<TokenService>,
    pub(super) otp: OtpService,
    pub(super) mailer: Arc<MemoryMailer>,
}

pub(super) fn kit() -> AuthKit {
    let store = MemoryStore::default();
    let tokens = Arc::new(TokenService::new(
        &AuthConfig::for_secret(SECRET),
        Arc::new(store.tokens.clone()),
    ));
    let mailer = Arc::new(MemoryMailer::default());
    let otp = OtpService::new(
        tokens.clone(),
        Arc::new(store.otp_throttle.clone()),
        mailer.clone(),
        OtpConfig::default(),
    );
    AuthKit {
        store,
        tokens,
        otp,
        mailer,
    }
}

impl AuthKit {
    pub(super) fn code_for(&self, email: &str) -> String {
        let message = self.mailer.last_to(email).expect("code mailed");
        templates::extract_code(&message.text).expect("code in body")
    }
}

/// A six-digit code guaranteed to differ from `code`.
pub(super) fn wrong(code: &str) -> String {
    if code == "123456" {
        "654321".to_string()
    } else {
        "123456".to_string()
    }
}
