use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::repository::{OtpThrottle, StoredToken, TokenRepository};
use super::tokens::{Audience, TokenKind, TokenService};
use crate::config::OtpConfig;
use crate::error::ServiceError;
use crate::mail::{templates, Mailer};

/// What a one-time code unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Registration,
    Login,
    PasswordReset,
}

impl OtpPurpose {
    pub const fn token_kind(self) -> TokenKind {
        match self {
            Self::Registration => TokenKind::RegistrationOtp,
            Self::Login => TokenKind::LoginOtp,
            Self::PasswordReset => TokenKind::PasswordResetOtp,
        }
    }

    const fn action(self) -> &'static str {
        match self {
            Self::Registration => "complete your registration",
            Self::Login => "sign in",
            Self::PasswordReset => "reset your password",
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Login => "login",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// Returned to callers after a code is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpDispatch {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues, mails and verifies six-digit codes wrapped in short-lived signed tokens.
pub struct OtpService {
    tokens: Arc<TokenService>,
    throttle: Arc<dyn OtpThrottle>,
    mailer: Arc<dyn Mailer>,
    config: OtpConfig,
}

fn generate_code() -> String {
    let code = 100_000 + OsRng.next_u32() % 900_000;
    code.to_string()
}

impl OtpService {
    pub fn new(
        tokens: Arc<TokenService>,
        throttle: Arc<dyn OtpThrottle>,
        mailer: Arc<dyn Mailer>,
        config: OtpConfig,
    ) -> Self {
        Self {
            tokens,
            throttle,
            mailer,
            config,
        }
    }

    fn store(&self) -> &Arc<dyn TokenRepository> {
        self.tokens.store()
    }

    fn request_key(audience: Audience, email: &str) -> String {
        format!("{}:{email}", audience.as_str())
    }

    fn attempt_key(audience: Audience, email: &str, purpose: OtpPurpose) -> String {
        format!("{}:{email}:{}", audience.as_str(), purpose.as_str())
    }

    fn attempt_window(&self) -> Duration {
        Duration::minutes(self.config.attempt_window_minutes)
    }

    fn ensure_attempts_left(&self, key: &str, now: DateTime<Utc>) -> Result<(), ServiceError> {
        let failures = self.throttle.failures(key, now, self.attempt_window())?;
        if failures >= self.config.max_attempts {
            return Err(ServiceError::RateLimited(
                "Too many failed OTP attempts. Please try again later.".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate a code for `email`, store its token and mail it.
    pub fn send(
        &self,
        audience: Audience,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<OtpDispatch, ServiceError> {
        let now = Utc::now();
        self.ensure_attempts_left(&Self::attempt_key(audience, email, purpose), now)?;

        let allowed = self.throttle.register_request(
            &Self::request_key(audience, email),
            now,
            Duration::hours(1),
            self.config.max_requests_per_hour,
        )?;
        if !allowed {
            return Err(ServiceError::RateLimited(
                "Too many OTP requests. Please try again later.".to_string(),
            ));
        }

        let code = generate_code();
        let ttl = Duration::minutes(self.config.ttl_minutes);
        let kind = purpose.token_kind();
        let mut claims = TokenService::claims(audience, email, kind, now, ttl);
        claims.otp = Some(code.clone());
        let token = self.tokens.sign(&claims)?;

        // Only the newest code of a purpose stays valid.
        self.store().revoke_all(audience, email, kind)?;
        self.store().save(StoredToken {
            token,
            audience,
            subject: email.to_string(),
            kind,
            expires_at: now + ttl,
            blacklisted: false,
            created_at: now,
        })?;

        let message = templates::one_time_code(email, purpose.action(), &code, self.config.ttl_minutes);
        self.mailer.send(message).map_err(|err| {
            warn!(%email, error = %err, "one-time code e-mail failed");
            ServiceError::Internal("Failed to send OTP email".to_string())
        })?;

        info!(audience = audience.as_str(), purpose = purpose.as_str(), "one-time code sent");
        Ok(OtpDispatch {
            email: email.to_string(),
            expires_at: now + ttl,
        })
    }

    /// Verify and consume the newest code.
    pub fn verify(
        &self,
        audience: Audience,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<(), ServiceError> {
        let stored = self.check_code(audience, email, purpose, code)?;
        self.store().blacklist(&stored.token)?;
        Ok(())
    }

    /// Verify without consuming, so a later step can present the same code again.
    pub fn check(
        &self,
        audience: Audience,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<(), ServiceError> {
        self.check_code(audience, email, purpose, code).map(|_| ())
    }

    /// Blacklist every outstanding code of a purpose.
    pub fn invalidate(
        &self,
        audience: Audience,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<(), ServiceError> {
        self.store()
            .revoke_all(audience, email, purpose.token_kind())?;
        Ok(())
    }

    fn check_code(
        &self,
        audience: Audience,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<StoredToken, ServiceError> {
        let now = Utc::now();
        let key = Self::attempt_key(audience, email, purpose);
        self.ensure_attempts_left(&key, now)?;

        let stored = match self
            .store()
            .latest_usable(audience, email, purpose.token_kind(), now)?
        {
            Some(stored) => stored,
            None => {
                self.throttle.record_failure(&key, now, self.attempt_window())?;
                return Err(ServiceError::unauthorized("OTP expired or not found"));
            }
        };

        let matches = self
            .tokens
            .decode(&stored.token, audience)
            .ok()
            .filter(|claims| claims.sub == email && claims.typ == purpose.token_kind())
            .and_then(|claims| claims.otp)
            .is_some_and(|expected| expected == code.trim());

        if !matches {
            let failures = self
                .throttle
                .record_failure(&key, now, self.attempt_window())?;
            warn!(audience = audience.as_str(), purpose = purpose.as_str(), failures, "invalid one-time code");
            return Err(ServiceError::unauthorized("Invalid OTP"));
        }

        self.throttle.clear_failures(&key)?;
        Ok(stored)
    }
}
