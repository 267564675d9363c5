use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{User, UserId, UserRole};
use super::service::{user_not_found, UserService, UserSession};
use crate::auth::{hash_password, verify_password, Audience, OtpDispatch, OtpPurpose, TokenPair};
use crate::error::ServiceError;
use crate::mail::templates;
use crate::notifications::{NewNotification, NotificationType, Recipient};
use crate::store::RepositoryError;
use crate::validation::{normalize_email, required_text, validate_phone};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailCheck {
    pub exists: bool,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePasswordRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteRegistrationRequest {
    pub email: String,
    pub name: String,
    pub contact_number: String,
    pub city_of_interest: String,
}

fn bad_credentials() -> ServiceError {
    ServiceError::unauthorized("Incorrect email or password")
}

/// Registration, login and password recovery for users.
impl UserService {
    fn by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users.find_by_email(email)?)
    }

    fn require_by_email(&self, email: &str) -> Result<User, ServiceError> {
        self.by_email(email)?.ok_or_else(user_not_found)
    }

    pub fn check_email(&self, email: &str) -> Result<EmailCheck, ServiceError> {
        let email = normalize_email(email)?;
        let registered = self
            .by_email(&email)?
            .is_some_and(|user| user.is_registered());
        let message = if registered {
            "Email is already registered"
        } else {
            "Email is available"
        };
        Ok(EmailCheck {
            exists: registered,
            message: message.to_string(),
        })
    }

    /// Start sign-up: reuse or create a partial account and mail a registration code.
    pub fn send_registration_otp(&self, email: &str) -> Result<OtpDispatch, ServiceError> {
        let email = normalize_email(email)?;
        match self.by_email(&email)? {
            Some(user) if user.is_registered() => {
                return Err(ServiceError::conflict("Email already taken"));
            }
            Some(_) => {}
            None => match self.users.insert(User::partial(&email, Utc::now())) {
                Ok(user) => info!(user = %user.id, "partial user created"),
                // Lost a race with a concurrent request for the same address.
                Err(RepositoryError::Conflict(_)) => {}
                Err(err) => return Err(err.into()),
            },
        }
        self.otp.send(Audience::User, &email, OtpPurpose::Registration)
    }

    pub fn verify_registration_otp(&self, email: &str, code: &str) -> Result<User, ServiceError> {
        let email = normalize_email(email)?;
        let mut user = self.require_by_email(&email)?;
        self.otp
            .verify(Audience::User, &email, OtpPurpose::Registration, code)?;

        user.is_otp_verified = true;
        user.is_email_verified = true;
        user.sync_registration_status();
        self.save(user)
    }

    pub fn create_password(&self, request: CreatePasswordRequest) -> Result<User, ServiceError> {
        let email = normalize_email(&request.email)?;
        let mut user = self.require_by_email(&email)?;
        if user.is_registered() {
            return Err(ServiceError::conflict("Registration already completed"));
        }
        if !user.is_otp_verified {
            return Err(ServiceError::validation("Please verify your email first"));
        }

        user.password_hash = Some(hash_password(&request.password)?);
        if let Some(role) = request.role {
            user.role = role;
        }
        self.save(user)
    }

    pub fn complete_registration(
        &self,
        request: CompleteRegistrationRequest,
    ) -> Result<UserSession, ServiceError> {
        let email = normalize_email(&request.email)?;
        let mut user = self.require_by_email(&email)?;
        if !user.is_otp_verified {
            return Err(ServiceError::validation("Please verify your email first"));
        }
        if user.password_hash.is_none() {
            return Err(ServiceError::validation("Please create a password first"));
        }

        user.name = Some(required_text("Name", &request.name, 100)?);
        user.contact_number = Some(validate_phone(&request.contact_number)?);
        user.city_of_interest = Some(required_text(
            "City of interest",
            &request.city_of_interest,
            100,
        )?);
        user.sync_registration_status();

        let session = self.session(user)?;
        self.otp
            .invalidate(Audience::User, &email, OtpPurpose::Registration)?;

        let name = session.user.display_name().to_string();
        self.notifications.notify_quietly(NewNotification::system(
            Recipient::user(&session.user.id),
            NotificationType::Welcome,
            "Welcome to Zuhaush",
            format!("Hi {name}, your account is ready. Start exploring properties near you."),
        ));
        if let Err(err) = self.mailer.send(templates::welcome(&email, &name)) {
            warn!(user = %session.user.id, error = %err, "welcome e-mail failed");
        }
        info!(user = %session.user.id, "user registration completed");
        Ok(session)
    }

    /// Password check shared by both login flows.
    fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let email = normalize_email(email).map_err(|_| bad_credentials())?;
        let user = self.by_email(&email)?.ok_or_else(bad_credentials)?;
        let matches = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(password, hash));
        if !matches {
            return Err(bad_credentials());
        }
        if !user.is_active {
            return Err(ServiceError::unauthorized("Account is deactivated"));
        }
        if !user.is_registered() {
            return Err(ServiceError::forbidden("Please complete your registration"));
        }
        Ok(user)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<UserSession, ServiceError> {
        let user = self.authenticate(email, password)?;
        info!(user = %user.id, "user logged in");
        self.session(user)
    }

    pub fn login_with_otp(&self, email: &str, password: &str) -> Result<OtpDispatch, ServiceError> {
        let user = self.authenticate(email, password)?;
        self.otp.send(Audience::User, &user.email, OtpPurpose::Login)
    }

    pub fn complete_login_otp(&self, email: &str, code: &str) -> Result<UserSession, ServiceError> {
        let email = normalize_email(email)?;
        let user = self.require_by_email(&email)?;
        if !user.is_active {
            return Err(ServiceError::unauthorized("Account is deactivated"));
        }
        self.otp.verify(Audience::User, &email, OtpPurpose::Login, code)?;
        self.otp.invalidate(Audience::User, &email, OtpPurpose::Login)?;
        info!(user = %user.id, "user logged in with one-time code");
        self.session(user)
    }

    pub fn forgot_password(&self, email: &str) -> Result<OtpDispatch, ServiceError> {
        let email = normalize_email(email)?;
        let user = self
            .by_email(&email)?
            .filter(|user| user.password_hash.is_some())
            .ok_or_else(|| ServiceError::not_found("No users found with this email"))?;
        self.otp
            .send(Audience::User, &user.email, OtpPurpose::PasswordReset)
    }

    /// Confirms the code is right but leaves it usable for the reset itself.
    pub fn verify_forgot_password_otp(&self, email: &str, code: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email)?;
        self.require_by_email(&email)?;
        self.otp
            .check(Audience::User, &email, OtpPurpose::PasswordReset, code)
    }

    pub fn reset_password(&self, email: &str, code: &str, password: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email)?;
        let mut user = self.require_by_email(&email)?;
        let password_hash = hash_password(password)?;
        self.otp
            .verify(Audience::User, &email, OtpPurpose::PasswordReset, code)?;

        user.password_hash = Some(password_hash);
        let user = self.save(user)?;
        self.otp
            .invalidate(Audience::User, &email, OtpPurpose::PasswordReset)?;
        self.tokens.revoke_sessions(Audience::User, user.id.as_str())?;
        info!(user = %user.id, "user password reset");
        Ok(())
    }

    pub fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let (claims, pair) = self.tokens.rotate(Audience::User, refresh_token)?;
        let active = self
            .users
            .fetch(&UserId(claims.sub.clone()))?
            .is_some_and(|user| user.is_active);
        if !active {
            self.tokens.revoke(Audience::User, &pair.refresh.token)?;
            return Err(ServiceError::unauthorized("Please authenticate"));
        }
        Ok(pair)
    }

    pub fn logout(&self, refresh_token: &str) -> Result<(), ServiceError> {
        self.tokens.revoke(Audience::User, refresh_token)
    }
}
