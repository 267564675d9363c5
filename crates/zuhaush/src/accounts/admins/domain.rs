use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::record_id;

record_id!(AdminId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    #[default]
    Admin,
    SuperAdmin,
}

/// Console sections an admin may open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPermission {
    Dashboard,
    Builders,
    Users,
    Properties,
    Analytics,
    Messages,
    Appointments,
    Comments,
    Settings,
    Others,
}

impl AdminPermission {
    pub const ALL: [AdminPermission; 10] = [
        Self::Dashboard,
        Self::Builders,
        Self::Users,
        Self::Properties,
        Self::Analytics,
        Self::Messages,
        Self::Appointments,
        Self::Comments,
        Self::Settings,
        Self::Others,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminPermissions {
    pub dashboard: bool,
    pub builders: bool,
    pub users: bool,
    pub properties: bool,
    pub analytics: bool,
    pub messages: bool,
    pub appointments: bool,
    pub comments: bool,
    pub settings: bool,
    pub others: bool,
}

impl Default for AdminPermissions {
    fn default() -> Self {
        Self {
            dashboard: true,
            builders: true,
            users: true,
            properties: true,
            analytics: true,
            messages: true,
            appointments: true,
            comments: true,
            settings: true,
            others: false,
        }
    }
}

impl AdminPermissions {
    pub fn allows(&self, permission: AdminPermission) -> bool {
        match permission {
            AdminPermission::Dashboard => self.dashboard,
            AdminPermission::Builders => self.builders,
            AdminPermission::Users => self.users,
            AdminPermission::Properties => self.properties,
            AdminPermission::Analytics => self.analytics,
            AdminPermission::Messages => self.messages,
            AdminPermission::Appointments => self.appointments,
            AdminPermission::Comments => self.comments,
            AdminPermission::Settings => self.settings,
            AdminPermission::Others => self.others,
        }
    }

    pub fn enabled(&self) -> Vec<AdminPermission> {
        AdminPermission::ALL
            .into_iter()
            .filter(|permission| self.allows(*permission))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Admin {
    pub id: AdminId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: AdminRole,
    pub permissions: AdminPermissions,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    /// Super admins pass every permission check.
    pub fn has_permission(&self, permission: AdminPermission) -> bool {
        self.role == AdminRole::SuperAdmin || self.permissions.allows(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything_but_others() {
        let enabled = AdminPermissions::default().enabled();
        assert_eq!(enabled.len(), 9);
        assert!(!enabled.contains(&AdminPermission::Others));
    }

    #[test]
    fn super_admin_bypasses_flags() {
        let now = Utc::now();
        let mut admin = Admin {
            id: AdminId::generate(),
            email: "root@zuhaush.com".into(),
            password_hash: String::new(),
            name: "Root".into(),
            role: AdminRole::Admin,
            permissions: AdminPermissions::default(),
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!admin.has_permission(AdminPermission::Others));
        admin.role = AdminRole::SuperAdmin;
        assert!(admin.has_permission(AdminPermission::Others));
    }
}
