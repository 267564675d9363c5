use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{PropertyId, PropertyType};
use crate::store::record_id;

record_id!(
    /// Identifier of a marketplace user (buyer, tenant or agent).
    UserId
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Agent,
}

/// Progress through the OTP-first sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Partial,
    OtpVerified,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub property_types: Vec<PropertyType>,
    #[serde(default)]
    pub budget: BudgetRange,
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Which notification categories the user wants to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub new_properties: bool,
    pub visit_confirmation: bool,
    pub visit_reminder: bool,
    pub release_messages: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            new_properties: true,
            visit_confirmation: true,
            visit_reminder: true,
            release_messages: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub contact_number: Option<String>,
    pub city_of_interest: Option<String>,
    pub image: Option<String>,
    pub role: UserRole,
    pub registration_status: RegistrationStatus,
    pub is_otp_verified: bool,
    pub is_email_verified: bool,
    pub is_active: bool,
    pub preferences: UserPreferences,
    pub notification_settings: NotificationSettings,
    pub shortlist: Vec<PropertyId>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Placeholder account created when a registration code is first requested.
    pub fn partial(email: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::generate(),
            email: email.to_string(),
            password_hash: None,
            name: None,
            contact_number: None,
            city_of_interest: None,
            image: None,
            role: UserRole::User,
            registration_status: RegistrationStatus::Partial,
            is_otp_verified: false,
            is_email_verified: false,
            is_active: true,
            preferences: UserPreferences::default(),
            notification_settings: NotificationSettings::default(),
            shortlist: Vec::new(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_complete_profile(&self) -> bool {
        [&self.name, &self.contact_number, &self.city_of_interest]
            .iter()
            .all(|field| field.as_deref().is_some_and(|value| !value.trim().is_empty()))
    }

    /// Recompute the status from the verification flag and profile fields.
    pub fn sync_registration_status(&mut self) {
        self.registration_status = match (self.is_otp_verified, self.has_complete_profile()) {
            (true, true) => RegistrationStatus::Completed,
            (true, false) => RegistrationStatus::OtpVerified,
            (false, _) => RegistrationStatus::Partial,
        };
    }

    pub fn is_registered(&self) -> bool {
        self.registration_status == RegistrationStatus::Completed
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tracks_verification_and_profile() {
        let mut user = User::partial("asha@example.com", Utc::now());
        user.sync_registration_status();
        assert_eq!(user.registration_status, RegistrationStatus::Partial);

        user.is_otp_verified = true;
        user.sync_registration_status();
        assert_eq!(user.registration_status, RegistrationStatus::OtpVerified);

        user.name = Some("Asha".into());
        user.contact_number = Some("+919812345678".into());
        user.city_of_interest = Some("  ".into());
        user.sync_registration_status();
        assert_eq!(user.registration_status, RegistrationStatus::OtpVerified);

        user.city_of_interest = Some("Pune".into());
        user.sync_registration_status();
        assert_eq!(user.registration_status, RegistrationStatus::Completed);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let mut user = User::partial("asha@example.com", Utc::now());
        user.password_hash = Some("$argon2id$secret".into());
        let value = serde_json::to_value(&user).expect("serializes");
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["registration_status"], "partial");
    }
}
