use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::workflow::{BuilderStatus, TransitionError};
use crate::accounts::admins::AdminId;
use crate::store::record_id;

record_id!(
    /// Identifier of a builder (developer / listing owner) account.
    BuilderId
);
record_id!(TeamMemberId);
record_id!(DocumentId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    License,
    Certificate,
    Registration,
    Contract,
    Other,
}

/// Metadata for a file the builder uploaded to object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingDocument {
    pub id: DocumentId,
    pub url: String,
    pub key: Option<String>,
    pub original_name: Option<String>,
    pub document_type: DocumentType,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Approved,
    Rejected,
}

/// Outcome of the last admin review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminDecision {
    pub status: DecisionStatus,
    pub notes: Option<String>,
    pub reviewed_by: AdminId,
    pub reviewed_at: DateTime<Utc>,
}

/// Builder dashboard sections a team member may open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamPermission {
    Dashboard,
    MyProperties,
    Analytics,
    Messages,
    MyProfile,
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamPermissions {
    pub dashboard: bool,
    pub my_properties: bool,
    pub analytics: bool,
    pub messages: bool,
    pub my_profile: bool,
    pub users: bool,
}

impl Default for TeamPermissions {
    fn default() -> Self {
        Self {
            dashboard: true,
            my_properties: true,
            analytics: true,
            messages: true,
            my_profile: true,
            users: true,
        }
    }
}

impl TeamPermissions {
    pub fn allows(&self, permission: TeamPermission) -> bool {
        match permission {
            TeamPermission::Dashboard => self.dashboard,
            TeamPermission::MyProperties => self.my_properties,
            TeamPermission::Analytics => self.analytics,
            TeamPermission::Messages => self.messages,
            TeamPermission::MyProfile => self.my_profile,
            TeamPermission::Users => self.users,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamMember {
    pub id: TeamMemberId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub permissions: TeamPermissions,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Builder {
    pub id: BuilderId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub contact_info: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub logo: Option<String>,
    pub rera_registration_id: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub supporting_documents: Vec<SupportingDocument>,
    pub status: BuilderStatus,
    pub admin_decision: Option<AdminDecision>,
    pub team_members: Vec<TeamMember>,
    pub is_otp_verified: bool,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Builder {
    pub fn submit_for_review(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.status = self.status.transition(BuilderStatus::Submitted)?;
        self.updated_at = now;
        Ok(())
    }

    pub fn approve(
        &mut self,
        admin: &AdminId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.status = self.status.transition(BuilderStatus::Approved)?;
        self.admin_decision = Some(AdminDecision {
            status: DecisionStatus::Approved,
            notes,
            reviewed_by: admin.clone(),
            reviewed_at: now,
        });
        self.updated_at = now;
        Ok(())
    }

    /// Callers validate that `notes` is non-empty.
    pub fn reject(
        &mut self,
        admin: &AdminId,
        notes: String,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.status = self.status.transition(BuilderStatus::Rejected)?;
        self.admin_decision = Some(AdminDecision {
            status: DecisionStatus::Rejected,
            notes: Some(notes),
            reviewed_by: admin.clone(),
            reviewed_at: now,
        });
        self.updated_at = now;
        Ok(())
    }

    pub fn reset_to_draft(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.status = self.status.transition(BuilderStatus::Draft)?;
        self.admin_decision = None;
        self.updated_at = now;
        Ok(())
    }

    pub fn member(&self, id: &TeamMemberId) -> Option<&TeamMember> {
        self.team_members.iter().find(|member| &member.id == id)
    }

    pub fn member_mut(&mut self, id: &TeamMemberId) -> Option<&mut TeamMember> {
        self.team_members.iter_mut().find(|member| &member.id == id)
    }

    pub fn member_by_email(&self, email: &str) -> Option<&TeamMember> {
        self.team_members.iter().find(|member| member.email == email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::builders::BuilderStatus;

    fn builder() -> Builder {
        let now = Utc::now();
        Builder {
            id: BuilderId::generate(),
            name: "Skyline Developers".into(),
            email: "sales@skyline.in".into(),
            password_hash: String::new(),
            contact_info: None,
            address: None,
            company: Some("Skyline".into()),
            city: Some("Pune".into()),
            logo: None,
            rera_registration_id: None,
            contact_person: None,
            phone: None,
            website: None,
            supporting_documents: Vec::new(),
            status: BuilderStatus::Draft,
            admin_decision: None,
            team_members: Vec::new(),
            is_otp_verified: true,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn failed_transition_leaves_record_untouched() {
        let mut record = builder();
        let before = record.updated_at;
        let admin = AdminId::from("admin-1");

        assert!(record.approve(&admin, None, Utc::now()).is_err());
        assert_eq!(record.status, BuilderStatus::Draft);
        assert!(record.admin_decision.is_none());
        assert_eq!(record.updated_at, before);
    }

    #[test]
    fn reject_then_reset_clears_decision() {
        let mut record = builder();
        let admin = AdminId::from("admin-1");
        record.submit_for_review(Utc::now()).expect("draft submits");
        record
            .reject(&admin, "Missing RERA certificate".into(), Utc::now())
            .expect("submitted can be rejected");

        let decision = record.admin_decision.clone().expect("decision recorded");
        assert_eq!(decision.status, DecisionStatus::Rejected);
        assert_eq!(decision.reviewed_by, admin);

        record.reset_to_draft(Utc::now()).expect("rejected resets");
        assert_eq!(record.status, BuilderStatus::Draft);
        assert!(record.admin_decision.is_none());
    }

    #[test]
    fn permissions_default_to_full_access() {
        let permissions = TeamPermissions::default();
        assert!(permissions.allows(TeamPermission::Users));
        let restricted = TeamPermissions {
            users: false,
            ..TeamPermissions::default()
        };
        assert!(!restricted.allows(TeamPermission::Users));
        assert!(restricted.allows(TeamPermission::Messages));
    }
}
