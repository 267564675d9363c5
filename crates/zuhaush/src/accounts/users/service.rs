use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{NotificationSettings, User, UserId, UserPreferences, UserRole};
use super::repository::{UserFilter, UserRepository};
use crate::auth::{hash_password, verify_password, Audience, OtpService, TokenPair, TokenService};
use crate::catalog::{Property, PropertyId, PropertyRepository};
use crate::error::ServiceError;
use crate::mail::Mailer;
use crate::notifications::NotificationService;
use crate::pagination::{Page, PageRequest};
use crate::store::RepositoryError;
use crate::validation::{normalize_email, optional_text, validate_phone};

const USER_SORT_FIELDS: &[&str] = &["name", "email", "created_at", "last_login_at"];

/// Authenticated user plus freshly issued tokens.
#[derive(Debug, Clone, Serialize)]
pub struct UserSession {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub contact_number: Option<String>,
    pub city_of_interest: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub contact_number: Option<String>,
    pub city_of_interest: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub partial: u64,
    pub otp_verified: u64,
    pub completed: u64,
    pub agents: u64,
}

pub(super) fn user_not_found() -> ServiceError {
    ServiceError::not_found("User not found")
}

fn email_taken(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict(_) => ServiceError::conflict("Email already taken"),
        other => other.into(),
    }
}

/// User accounts: OTP onboarding, sessions, profile, preferences and shortlist.
pub struct UserService {
    pub(super) users: Arc<dyn UserRepository>,
    pub(super) properties: Arc<dyn PropertyRepository>,
    pub(super) tokens: Arc<TokenService>,
    pub(super) otp: Arc<OtpService>,
    pub(super) notifications: Arc<NotificationService>,
    pub(super) mailer: Arc<dyn Mailer>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        properties: Arc<dyn PropertyRepository>,
        tokens: Arc<TokenService>,
        otp: Arc<OtpService>,
        notifications: Arc<NotificationService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            users,
            properties,
            tokens,
            otp,
            notifications,
            mailer,
        }
    }

    pub fn get(&self, id: &UserId) -> Result<User, ServiceError> {
        self.users.fetch(id)?.ok_or_else(user_not_found)
    }

    pub(super) fn save(&self, mut user: User) -> Result<User, ServiceError> {
        user.updated_at = Utc::now();
        self.users.update(user).map_err(email_taken)
    }

    pub(super) fn session(&self, mut user: User) -> Result<UserSession, ServiceError> {
        user.last_login_at = Some(Utc::now());
        let user = self.save(user)?;
        let tokens = self.tokens.issue_session(Audience::User, user.id.as_str(), None)?;
        Ok(UserSession { user, tokens })
    }

    /// Self-service profile edit. E-mail and role changes go through admins.
    pub fn update_profile(&self, id: &UserId, update: ProfileUpdate) -> Result<User, ServiceError> {
        let mut user = self.get(id)?;
        if let Some(name) = update.name {
            user.name = optional_text("Name", Some(&name), 100)?;
        }
        if let Some(contact) = update.contact_number {
            user.contact_number = Some(validate_phone(&contact)?);
        }
        if let Some(city) = update.city_of_interest {
            user.city_of_interest = optional_text("City of interest", Some(&city), 100)?;
        }
        if let Some(image) = update.image {
            user.image = optional_text("Image", Some(&image), 2048)?;
        }
        user.sync_registration_status();
        self.save(user)
    }

    pub fn admin_update(&self, id: &UserId, update: AdminUserUpdate) -> Result<User, ServiceError> {
        let mut user = self.get(id)?;
        if let Some(email) = update.email {
            let email = normalize_email(&email)?;
            if email != user.email && self.users.find_by_email(&email)?.is_some() {
                return Err(ServiceError::conflict("Email already taken"));
            }
            user.email = email;
        }
        if let Some(name) = update.name {
            user.name = optional_text("Name", Some(&name), 100)?;
        }
        if let Some(contact) = update.contact_number {
            user.contact_number = Some(validate_phone(&contact)?);
        }
        if let Some(city) = update.city_of_interest {
            user.city_of_interest = optional_text("City of interest", Some(&city), 100)?;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(active) = update.is_active {
            user.is_active = active;
        }
        user.sync_registration_status();
        self.save(user)
    }

    pub fn change_password(
        &self,
        id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let mut user = self.get(id)?;
        let matches = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(current_password, hash));
        if !matches {
            return Err(ServiceError::unauthorized("Current password is incorrect"));
        }
        user.password_hash = Some(hash_password(new_password)?);
        self.save(user)?;
        self.tokens.revoke_sessions(Audience::User, id.as_str())?;
        Ok(())
    }

    pub fn update_preferences(
        &self,
        id: &UserId,
        preferences: UserPreferences,
    ) -> Result<UserPreferences, ServiceError> {
        if let (Some(min), Some(max)) = (preferences.budget.min, preferences.budget.max) {
            if min > max {
                return Err(ServiceError::validation(
                    "Budget minimum cannot exceed the maximum",
                ));
            }
        }
        if [preferences.budget.min, preferences.budget.max]
            .into_iter()
            .flatten()
            .any(|value| !value.is_finite() || value < 0.0)
        {
            return Err(ServiceError::validation("Budget must be non-negative"));
        }

        let mut user = self.get(id)?;
        user.preferences = preferences;
        Ok(self.save(user)?.preferences)
    }

    pub fn update_notification_settings(
        &self,
        id: &UserId,
        settings: NotificationSettings,
    ) -> Result<NotificationSettings, ServiceError> {
        let mut user = self.get(id)?;
        user.notification_settings = settings;
        Ok(self.save(user)?.notification_settings)
    }

    pub fn list(&self, filter: &UserFilter, page: &PageRequest) -> Result<Page<User>, ServiceError> {
        let mut items = self.users.list(filter)?;
        match &page.sort {
            Some(sort) => sort.apply(&mut items, USER_SORT_FIELDS, |field, a: &User, b: &User| match field {
                "name" => Some(a.name.cmp(&b.name)),
                "email" => Some(a.email.cmp(&b.email)),
                "created_at" => Some(a.created_at.cmp(&b.created_at)),
                "last_login_at" => Some(a.last_login_at.cmp(&b.last_login_at)),
                _ => None,
            })?,
            None => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        Ok(Page::paginate(items, page))
    }

    pub fn set_active(&self, id: &UserId, active: bool) -> Result<User, ServiceError> {
        let mut user = self.get(id)?;
        user.is_active = active;
        let user = self.save(user)?;
        if !active {
            self.tokens.revoke_sessions(Audience::User, id.as_str())?;
        }
        info!(user = %id, active, "user activation changed");
        Ok(user)
    }

    pub fn delete(&self, id: &UserId) -> Result<(), ServiceError> {
        if !self.users.delete(id)? {
            return Err(user_not_found());
        }
        self.tokens.revoke_sessions(Audience::User, id.as_str())?;
        info!(user = %id, "user deleted");
        Ok(())
    }

    pub fn stats(&self) -> Result<UserStats, ServiceError> {
        let mut stats = UserStats::default();
        for user in self.users.list(&UserFilter::default())? {
            stats.total += 1;
            if user.is_active {
                stats.active += 1;
            } else {
                stats.inactive += 1;
            }
            match user.registration_status {
                super::RegistrationStatus::Partial => stats.partial += 1,
                super::RegistrationStatus::OtpVerified => stats.otp_verified += 1,
                super::RegistrationStatus::Completed => stats.completed += 1,
            }
            if user.role == UserRole::Agent {
                stats.agents += 1;
            }
        }
        Ok(stats)
    }

    pub fn add_to_shortlist(
        &self,
        id: &UserId,
        property_id: &PropertyId,
    ) -> Result<Vec<PropertyId>, ServiceError> {
        self.properties
            .fetch(property_id)?
            .ok_or_else(|| ServiceError::not_found("Property not found"))?;

        let mut user = self.get(id)?;
        if user.shortlist.contains(property_id) {
            return Err(ServiceError::conflict("Property already in shortlist"));
        }
        user.shortlist.push(property_id.clone());
        Ok(self.save(user)?.shortlist)
    }

    pub fn remove_from_shortlist(
        &self,
        id: &UserId,
        property_id: &PropertyId,
    ) -> Result<Vec<PropertyId>, ServiceError> {
        let mut user = self.get(id)?;
        let before = user.shortlist.len();
        user.shortlist.retain(|entry| entry != property_id);
        if user.shortlist.len() == before {
            return Err(ServiceError::not_found("Property not in shortlist"));
        }
        Ok(self.save(user)?.shortlist)
    }

    pub fn is_shortlisted(&self, id: &UserId, property_id: &PropertyId) -> Result<bool, ServiceError> {
        Ok(self.get(id)?.shortlist.contains(property_id))
    }

    /// Shortlisted properties that still exist, in the order they were saved.
    pub fn shortlist(&self, id: &UserId) -> Result<Vec<Property>, ServiceError> {
        let user = self.get(id)?;
        let mut properties = Vec::with_capacity(user.shortlist.len());
        for property_id in &user.shortlist {
            if let Some(property) = self.properties.fetch(property_id)? {
                properties.push(property);
            }
        }
        Ok(properties)
    }
}
