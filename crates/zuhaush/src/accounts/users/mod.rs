//! Marketplace users: OTP-first registration, sessions, profile and shortlist.

pub mod domain;
pub mod onboarding;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    BudgetRange, NotificationSettings, RegistrationStatus, User, UserId, UserPreferences,
    UserRole,
};
pub use onboarding::{CompleteRegistrationRequest, CreatePasswordRequest, EmailCheck};
pub use repository::{UserFilter, UserRepository};
pub use router::user_router;
pub use service::{AdminUserUpdate, ProfileUpdate, UserService, UserSession, UserStats};
