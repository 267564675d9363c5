use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::tokens::{Audience, TokenKind};
use crate::store::RepositoryError;

/// Server-side copy of a refresh or one-time-code token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub audience: Audience,
    /// Account id for refresh tokens, normalized e-mail for one-time codes.
    pub subject: String,
    pub kind: TokenKind,
    pub expires_at: DateTime<Utc>,
    pub blacklisted: bool,
    pub created_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.blacklisted && self.expires_at > now
    }
}

/// Token persistence.
pub trait TokenRepository: Send + Sync {
    fn save(&self, token: StoredToken) -> Result<(), RepositoryError>;
    fn find(&self, token: &str) -> Result<Option<StoredToken>, RepositoryError>;
    /// Newest usable token for the subject, by insertion order.
    fn latest_usable(
        &self,
        audience: Audience,
        subject: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Option<StoredToken>, RepositoryError>;
    fn blacklist(&self, token: &str) -> Result<(), RepositoryError>;
    fn remove(&self, token: &str) -> Result<bool, RepositoryError>;
    /// Blacklist every token of `kind` for the subject, returning how many changed.
    fn revoke_all(
        &self,
        audience: Audience,
        subject: &str,
        kind: TokenKind,
    ) -> Result<usize, RepositoryError>;
}

/// Shared counters behind OTP rate limiting and the verification attempt cap.
pub trait OtpThrottle: Send + Sync {
    /// Count a send request; `false` once `limit` requests already fall inside `window`.
    fn register_request(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
        limit: u32,
    ) -> Result<bool, RepositoryError>;
    /// Failed verifications recorded inside the current window.
    fn failures(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<u32, RepositoryError>;
    fn record_failure(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<u32, RepositoryError>;
    fn clear_failures(&self, key: &str) -> Result<(), RepositoryError>;
}
