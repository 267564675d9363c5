use chrono::Utc;
use tracing::info;

use super::domain::{Builder, BuilderId, TeamMemberId};
use super::service::{builder_not_found, email_taken, BuilderService, BuilderSession, NewBuilder};
use crate::auth::{hash_password, verify_password, Audience, OtpDispatch, OtpPurpose, TokenPair};
use crate::error::ServiceError;
use crate::validation::normalize_email;

fn bad_credentials() -> ServiceError {
    ServiceError::unauthorized("Incorrect email or password")
}

/// Self-registration, login (owner and team member) and password recovery for builders.
impl BuilderService {
    fn by_email(&self, email: &str) -> Result<Builder, ServiceError> {
        self.builders
            .find_by_email(email)?
            .ok_or_else(builder_not_found)
    }

    /// Create a draft profile and mail a registration code. An unverified earlier
    /// attempt with the same e-mail is replaced.
    pub fn register_with_otp(&self, input: NewBuilder) -> Result<OtpDispatch, ServiceError> {
        let draft = self.draft(input)?;
        let email = draft.email.clone();

        match self.builders.find_by_email(&email)? {
            Some(existing) if existing.is_otp_verified => {
                return Err(ServiceError::conflict("Email already taken"));
            }
            Some(existing) => {
                let builder = Builder {
                    id: existing.id,
                    created_at: existing.created_at,
                    ..draft
                };
                self.save(builder)?;
            }
            None => {
                let builder = self.builders.insert(draft).map_err(email_taken)?;
                info!(builder = %builder.id, "builder registered");
            }
        }
        self.otp
            .send(Audience::Builder, &email, OtpPurpose::Registration)
    }

    pub fn verify_registration_otp(
        &self,
        email: &str,
        code: &str,
    ) -> Result<BuilderSession, ServiceError> {
        let email = normalize_email(email)?;
        let mut builder = self.by_email(&email)?;
        if builder.is_otp_verified {
            return Err(ServiceError::conflict("Email already verified"));
        }
        self.otp
            .verify(Audience::Builder, &email, OtpPurpose::Registration, code)?;
        self.otp
            .invalidate(Audience::Builder, &email, OtpPurpose::Registration)?;

        builder.is_otp_verified = true;
        self.session(builder)
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<Builder, ServiceError> {
        let email = normalize_email(email).map_err(|_| bad_credentials())?;
        let builder = self
            .builders
            .find_by_email(&email)?
            .filter(|builder| verify_password(password, &builder.password_hash))
            .ok_or_else(bad_credentials)?;
        if !builder.is_active {
            return Err(ServiceError::unauthorized("Account is deactivated"));
        }
        if !builder.is_otp_verified {
            return Err(ServiceError::forbidden("Please verify your email first"));
        }
        Ok(builder)
    }

    fn session(&self, mut builder: Builder) -> Result<BuilderSession, ServiceError> {
        builder.last_login_at = Some(Utc::now());
        let builder = self.save(builder)?;
        let tokens = self
            .tokens
            .issue_session(Audience::Builder, builder.id.as_str(), None)?;
        Ok(BuilderSession {
            builder,
            member: None,
            tokens,
        })
    }

    pub fn login(&self, email: &str, password: &str) -> Result<BuilderSession, ServiceError> {
        let builder = self.authenticate(email, password)?;
        info!(builder = %builder.id, "builder logged in");
        self.session(builder)
    }

    pub fn login_with_otp(&self, email: &str, password: &str) -> Result<OtpDispatch, ServiceError> {
        let builder = self.authenticate(email, password)?;
        self.otp
            .send(Audience::Builder, &builder.email, OtpPurpose::Login)
    }

    pub fn complete_login_otp(
        &self,
        email: &str,
        code: &str,
    ) -> Result<BuilderSession, ServiceError> {
        let email = normalize_email(email)?;
        let builder = self.by_email(&email)?;
        if !builder.is_active {
            return Err(ServiceError::unauthorized("Account is deactivated"));
        }
        self.otp
            .verify(Audience::Builder, &email, OtpPurpose::Login, code)?;
        self.otp
            .invalidate(Audience::Builder, &email, OtpPurpose::Login)?;
        info!(builder = %builder.id, "builder logged in with one-time code");
        self.session(builder)
    }

    /// Team members sign in with their own credentials and act for the builder.
    pub fn team_member_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<BuilderSession, ServiceError> {
        let email = normalize_email(email).map_err(|_| bad_credentials())?;
        let mut builder = self
            .builders
            .find_by_member_email(&email)?
            .ok_or_else(bad_credentials)?;
        let member_id: TeamMemberId = builder
            .member_by_email(&email)
            .filter(|member| verify_password(password, &member.password_hash))
            .map(|member| member.id.clone())
            .ok_or_else(bad_credentials)?;

        if !builder.is_active {
            return Err(ServiceError::unauthorized("Account is deactivated"));
        }
        let member = builder.member_mut(&member_id).ok_or_else(bad_credentials)?;
        if !member.is_active {
            return Err(ServiceError::unauthorized("Account is deactivated"));
        }
        member.last_login_at = Some(Utc::now());
        let member = member.clone();

        let builder = self.save(builder)?;
        let tokens = self.tokens.issue_session(
            Audience::Builder,
            builder.id.as_str(),
            Some(member.id.as_str()),
        )?;
        info!(builder = %builder.id, member = %member.id, "team member logged in");
        Ok(BuilderSession {
            builder,
            member: Some(member),
            tokens,
        })
    }

    pub fn forgot_password(&self, email: &str) -> Result<OtpDispatch, ServiceError> {
        let email = normalize_email(email)?;
        let builder = self
            .builders
            .find_by_email(&email)?
            .ok_or_else(|| ServiceError::not_found("No builder found with this email"))?;
        self.otp
            .send(Audience::Builder, &builder.email, OtpPurpose::PasswordReset)
    }

    pub fn verify_forgot_password_otp(&self, email: &str, code: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email)?;
        self.by_email(&email)?;
        self.otp
            .check(Audience::Builder, &email, OtpPurpose::PasswordReset, code)
    }

    pub fn reset_password(&self, email: &str, code: &str, password: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email)?;
        let mut builder = self.by_email(&email)?;
        let password_hash = hash_password(password)?;
        self.otp
            .verify(Audience::Builder, &email, OtpPurpose::PasswordReset, code)?;

        builder.password_hash = password_hash;
        let builder = self.save(builder)?;
        self.otp
            .invalidate(Audience::Builder, &email, OtpPurpose::PasswordReset)?;
        self.tokens
            .revoke_sessions(Audience::Builder, builder.id.as_str())?;
        info!(builder = %builder.id, "builder password reset");
        Ok(())
    }

    pub fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let (claims, pair) = self.tokens.rotate(Audience::Builder, refresh_token)?;
        let active = self
            .builders
            .fetch(&BuilderId(claims.sub.clone()))?
            .is_some_and(|builder| {
                builder.is_active
                    && claims.member.as_ref().map_or(true, |member| {
                        builder
                            .member(&TeamMemberId(member.clone()))
                            .is_some_and(|member| member.is_active)
                    })
            });
        if !active {
            self.tokens.revoke(Audience::Builder, &pair.refresh.token)?;
            return Err(ServiceError::unauthorized("Please authenticate"));
        }
        Ok(pair)
    }

    pub fn logout(&self, refresh_token: &str) -> Result<(), ServiceError> {
        self.tokens.revoke(Audience::Builder, refresh_token)
    }
}
