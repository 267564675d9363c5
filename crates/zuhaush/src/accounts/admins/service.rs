use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{Admin, AdminId, AdminPermission, AdminPermissions, AdminRole};
use super::repository::AdminRepository;
use crate::auth::{hash_password, verify_password, Audience, TokenPair, TokenService};
use crate::error::ServiceError;
use crate::pagination::{Page, PageRequest};
use crate::store::RepositoryError;
use crate::validation::{normalize_email, required_text};

const ADMIN_SORT_FIELDS: &[&str] = &["name", "email", "created_at"];

#[derive(Debug, Clone, Serialize)]
pub struct AdminSession {
    pub admin: Admin,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub role: AdminRole,
    #[serde(default)]
    pub permissions: Option<AdminPermissions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<AdminRole>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub super_admins: u64,
}

fn admin_not_found() -> ServiceError {
    ServiceError::not_found("Admin not found")
}

fn email_taken(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict(_) => ServiceError::conflict("Email already taken"),
        other => other.into(),
    }
}

/// Console administrators: password sessions, management and navigation permissions.
pub struct AdminService {
    admins: Arc<dyn AdminRepository>,
    tokens: Arc<TokenService>,
}

impl AdminService {
    pub fn new(admins: Arc<dyn AdminRepository>, tokens: Arc<TokenService>) -> Self {
        Self { admins, tokens }
    }

    pub fn get(&self, id: &AdminId) -> Result<Admin, ServiceError> {
        self.admins.fetch(id)?.ok_or_else(admin_not_found)
    }

    fn save(&self, mut admin: Admin) -> Result<Admin, ServiceError> {
        admin.updated_at = Utc::now();
        self.admins.update(admin).map_err(email_taken)
    }

    pub fn create(&self, input: NewAdmin) -> Result<Admin, ServiceError> {
        let now = Utc::now();
        let admin = Admin {
            id: AdminId::generate(),
            email: normalize_email(&input.email)?,
            password_hash: hash_password(&input.password)?,
            name: required_text("Name", &input.name, 100)?,
            role: input.role,
            permissions: input.permissions.unwrap_or_default(),
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let admin = self.admins.insert(admin).map_err(email_taken)?;
        info!(admin = %admin.id, role = ?admin.role, "admin created");
        Ok(admin)
    }

    /// Bootstrap a super admin unless one with this e-mail already exists.
    pub fn create_default_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Admin, ServiceError> {
        let email = normalize_email(email)?;
        if let Some(existing) = self.admins.find_by_email(&email)? {
            info!(admin = %existing.id, "default admin already present");
            return Ok(existing);
        }
        self.create(NewAdmin {
            email,
            password: password.to_string(),
            name: name.to_string(),
            role: AdminRole::SuperAdmin,
            permissions: None,
        })
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AdminSession, ServiceError> {
        let bad_credentials = || ServiceError::unauthorized("Incorrect email or password");
        let email = normalize_email(email).map_err(|_| bad_credentials())?;
        let mut admin = self
            .admins
            .find_by_email(&email)?
            .filter(|admin| verify_password(password, &admin.password_hash))
            .ok_or_else(bad_credentials)?;
        if !admin.is_active {
            return Err(ServiceError::unauthorized("Account is deactivated"));
        }

        admin.last_login_at = Some(Utc::now());
        let admin = self.save(admin)?;
        let tokens = self
            .tokens
            .issue_session(Audience::Admin, admin.id.as_str(), None)?;
        info!(admin = %admin.id, "admin logged in");
        Ok(AdminSession { admin, tokens })
    }

    pub fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let (claims, pair) = self.tokens.rotate(Audience::Admin, refresh_token)?;
        let active = self
            .admins
            .fetch(&AdminId(claims.sub.clone()))?
            .is_some_and(|admin| admin.is_active);
        if !active {
            self.tokens.revoke(Audience::Admin, &pair.refresh.token)?;
            return Err(ServiceError::unauthorized("Please authenticate"));
        }
        Ok(pair)
    }

    pub fn logout(&self, refresh_token: &str) -> Result<(), ServiceError> {
        self.tokens.revoke(Audience::Admin, refresh_token)
    }

    pub fn list(&self, page: &PageRequest) -> Result<Page<Admin>, ServiceError> {
        let mut items = self.admins.list()?;
        match &page.sort {
            Some(sort) => sort.apply(&mut items, ADMIN_SORT_FIELDS, |field, a: &Admin, b: &Admin| match field {
                "name" => Some(a.name.cmp(&b.name)),
                "email" => Some(a.email.cmp(&b.email)),
                "created_at" => Some(a.created_at.cmp(&b.created_at)),
                _ => None,
            })?,
            None => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        Ok(Page::paginate(items, page))
    }

    pub fn update(&self, id: &AdminId, update: AdminUpdate) -> Result<Admin, ServiceError> {
        let mut admin = self.get(id)?;
        if let Some(email) = update.email {
            admin.email = normalize_email(&email)?;
        }
        if let Some(name) = update.name {
            admin.name = required_text("Name", &name, 100)?;
        }
        if let Some(role) = update.role {
            admin.role = role;
        }
        self.save(admin)
    }

    /// Name-only edit of the caller's own record.
    pub fn update_profile(&self, id: &AdminId, name: &str) -> Result<Admin, ServiceError> {
        let mut admin = self.get(id)?;
        admin.name = required_text("Name", name, 100)?;
        self.save(admin)
    }

    pub fn delete(&self, actor: &AdminId, id: &AdminId) -> Result<(), ServiceError> {
        if actor == id {
            return Err(ServiceError::validation("You cannot delete your own account"));
        }
        if !self.admins.delete(id)? {
            return Err(admin_not_found());
        }
        self.tokens.revoke_sessions(Audience::Admin, id.as_str())?;
        info!(admin = %id, by = %actor, "admin deleted");
        Ok(())
    }

    pub fn set_active(
        &self,
        actor: &AdminId,
        id: &AdminId,
        active: bool,
    ) -> Result<Admin, ServiceError> {
        if actor == id && !active {
            return Err(ServiceError::validation(
                "You cannot deactivate your own account",
            ));
        }
        let mut admin = self.get(id)?;
        admin.is_active = active;
        let admin = self.save(admin)?;
        if !active {
            self.tokens.revoke_sessions(Audience::Admin, id.as_str())?;
        }
        Ok(admin)
    }

    pub fn permissions(&self, id: &AdminId) -> Result<AdminPermissions, ServiceError> {
        Ok(self.get(id)?.permissions)
    }

    pub fn update_permissions(
        &self,
        id: &AdminId,
        permissions: AdminPermissions,
    ) -> Result<AdminPermissions, ServiceError> {
        let mut admin = self.get(id)?;
        admin.permissions = permissions;
        Ok(self.save(admin)?.permissions)
    }

    pub fn has_permission(
        &self,
        id: &AdminId,
        permission: AdminPermission,
    ) -> Result<bool, ServiceError> {
        Ok(self.get(id)?.has_permission(permission))
    }

    pub fn change_password(
        &self,
        id: &AdminId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let mut admin = self.get(id)?;
        if !verify_password(current_password, &admin.password_hash) {
            return Err(ServiceError::unauthorized("Current password is incorrect"));
        }
        admin.password_hash = hash_password(new_password)?;
        self.save(admin)?;
        self.tokens.revoke_sessions(Audience::Admin, id.as_str())?;
        Ok(())
    }

    pub fn stats(&self) -> Result<AdminStats, ServiceError> {
        let mut stats = AdminStats::default();
        for admin in self.admins.list()? {
            stats.total += 1;
            if admin.is_active {
                stats.active += 1;
            } else {
                stats.inactive += 1;
            }
            if admin.role == AdminRole::SuperAdmin {
                stats.super_admins += 1;
            }
        }
        Ok(stats)
    }
}
