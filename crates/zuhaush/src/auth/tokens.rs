use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::repository::{StoredToken, TokenRepository};
use crate::config::AuthConfig;
use crate::error::ServiceError;
use crate::store::new_id;

/// Kind of principal a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    User,
    Builder,
    Admin,
}

impl Audience {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Builder => "builder",
            Self::Admin => "admin",
        }
    }

    fn from_claim(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "builder" => Some(Self::Builder),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    RegistrationOtp,
    LoginOtp,
    PasswordResetOtp,
}

/// JWT payload shared by session and one-time-code tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub aud: String,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    /// Team member acting on behalf of the builder in `sub`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

impl Claims {
    pub fn audience(&self) -> Option<Audience> {
        Audience::from_claim(&self.aud)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Signs, verifies and tracks JWTs for every audience.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    store: Arc<dyn TokenRepository>,
}

impl TokenService {
    pub fn new(config: &AuthConfig, store: Arc<dyn TokenRepository>) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::minutes(config.access_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_ttl_days),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenRepository> {
        &self.store
    }

    pub(crate) fn claims(
        audience: Audience,
        subject: &str,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Claims {
        Claims {
            sub: subject.to_string(),
            aud: audience.as_str().to_string(),
            typ: kind,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: new_id(),
            member: None,
            otp: None,
        }
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, ServiceError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|err| ServiceError::Internal(format!("token signing failed: {err}")))
    }

    /// Verify signature, expiry and audience.
    pub fn decode(&self, token: &str, audience: Audience) -> Result<Claims, ServiceError> {
        self.decode_for(token, &[audience.as_str()])
    }

    /// Verify a token issued for any audience.
    pub fn decode_any(&self, token: &str) -> Result<Claims, ServiceError> {
        self.decode_for(
            token,
            &[
                Audience::User.as_str(),
                Audience::Builder.as_str(),
                Audience::Admin.as_str(),
            ],
        )
    }

    fn decode_for(&self, token: &str, audiences: &[&str]) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(audiences);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!(error = %err, "token rejected");
                ServiceError::unauthorized("Please authenticate")
            })
    }

    pub fn access_token(
        &self,
        audience: Audience,
        subject: &str,
        member: Option<&str>,
    ) -> Result<IssuedToken, ServiceError> {
        let now = Utc::now();
        let mut claims = Self::claims(audience, subject, TokenKind::Access, now, self.access_ttl);
        claims.member = member.map(str::to_string);
        Ok(IssuedToken {
            token: self.sign(&claims)?,
            expires: now + self.access_ttl,
        })
    }

    /// Issue an access/refresh pair and persist the refresh half.
    pub fn issue_session(
        &self,
        audience: Audience,
        subject: &str,
        member: Option<&str>,
    ) -> Result<TokenPair, ServiceError> {
        let now = Utc::now();
        let access = self.access_token(audience, subject, member)?;

        let mut claims = Self::claims(audience, subject, TokenKind::Refresh, now, self.refresh_ttl);
        claims.member = member.map(str::to_string);
        let refresh = IssuedToken {
            token: self.sign(&claims)?,
            expires: now + self.refresh_ttl,
        };

        self.store.save(StoredToken {
            token: refresh.token.clone(),
            audience,
            subject: subject.to_string(),
            kind: TokenKind::Refresh,
            expires_at: refresh.expires,
            blacklisted: false,
            created_at: now,
        })?;

        Ok(TokenPair { access, refresh })
    }

    /// Exchange a stored refresh token for a new pair; the old token stops working.
    pub fn rotate(
        &self,
        audience: Audience,
        refresh_token: &str,
    ) -> Result<(Claims, TokenPair), ServiceError> {
        let claims = self.decode(refresh_token, audience)?;
        if claims.typ != TokenKind::Refresh {
            return Err(ServiceError::unauthorized("Please authenticate"));
        }

        let stored = self
            .store
            .find(refresh_token)?
            .filter(|stored| stored.is_usable(Utc::now()) && stored.audience == audience)
            .ok_or_else(|| ServiceError::unauthorized("Please authenticate"))?;

        self.store.remove(&stored.token)?;
        let pair = self.issue_session(audience, &claims.sub, claims.member.as_deref())?;
        Ok((claims, pair))
    }

    /// Forget a refresh token (logout).
    pub fn revoke(&self, audience: Audience, refresh_token: &str) -> Result<(), ServiceError> {
        let stored = self
            .store
            .find(refresh_token)?
            .filter(|stored| {
                stored.kind == TokenKind::Refresh
                    && stored.audience == audience
                    && !stored.blacklisted
            })
            .ok_or_else(|| ServiceError::not_found("Not found"))?;
        self.store.remove(&stored.token)?;
        Ok(())
    }

    /// Drop every refresh token of an account, e.g. after a password reset.
    pub fn revoke_sessions(&self, audience: Audience, subject: &str) -> Result<usize, ServiceError> {
        Ok(self
            .store
            .revoke_all(audience, subject, TokenKind::Refresh)?)
    }
}
