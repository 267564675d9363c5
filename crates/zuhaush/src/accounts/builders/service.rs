use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Builder, BuilderId, DocumentId, DocumentType, SupportingDocument, TeamMember, TeamMemberId,
    TeamPermissions,
};
use super::repository::{BuilderFilter, BuilderRepository};
use super::workflow::BuilderStatus;
use crate::accounts::admins::AdminId;
use crate::auth::{
    hash_password, verify_password, Audience, BuilderPrincipal, OtpService, TokenPair,
    TokenService,
};
use crate::error::ServiceError;
use crate::notifications::{
    NewNotification, NotificationService, NotificationType, Priority, Recipient, SenderKind,
};
use crate::pagination::{Page, PageRequest};
use crate::store::RepositoryError;
use crate::validation::{normalize_email, optional_text, required_text, validate_phone};

const BUILDER_SORT_FIELDS: &[&str] = &["name", "email", "status", "created_at"];

#[derive(Debug, Clone, Serialize)]
pub struct BuilderSession {
    pub builder: Builder,
    /// Set when a team member signed in on the builder's behalf.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<TeamMember>,
    pub tokens: TokenPair,
}

/// Profile fields shared by self-registration, admin creation and updates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuilderProfile {
    pub contact_info: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub logo: Option<String>,
    pub rera_registration_id: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBuilder {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: BuilderProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuilderUpdate {
    pub name: Option<String>,
    #[serde(flatten)]
    pub profile: BuilderProfile,
}

/// Admin edit: profile plus account fields builders cannot change themselves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminBuilderUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub profile: BuilderProfile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentInput {
    pub url: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    pub document_type: DocumentType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTeamMember {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: TeamPermissions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamMemberUpdate {
    pub name: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<TeamPermissions>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuilderStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub by_status: BTreeMap<BuilderStatus, u64>,
}

pub(super) fn builder_not_found() -> ServiceError {
    ServiceError::not_found("Builder not found")
}

fn member_not_found() -> ServiceError {
    ServiceError::not_found("Team member not found")
}

pub(super) fn email_taken(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict(_) => ServiceError::conflict("Email already taken"),
        other => other.into(),
    }
}

impl BuilderProfile {
    /// Overwrite the fields present in `self`; blank strings clear a field.
    pub(super) fn apply(self, builder: &mut Builder) -> Result<(), ServiceError> {
        fn set(
            target: &mut Option<String>,
            field: &str,
            value: Option<String>,
            max: usize,
        ) -> Result<(), ServiceError> {
            if let Some(value) = value {
                *target = optional_text(field, Some(&value), max)?;
            }
            Ok(())
        }

        set(&mut builder.contact_info, "Contact info", self.contact_info, 500)?;
        set(&mut builder.address, "Address", self.address, 500)?;
        set(&mut builder.company, "Company", self.company, 200)?;
        set(&mut builder.city, "City", self.city, 100)?;
        set(&mut builder.logo, "Logo", self.logo, 2048)?;
        set(
            &mut builder.rera_registration_id,
            "RERA registration id",
            self.rera_registration_id,
            100,
        )?;
        set(&mut builder.contact_person, "Contact person", self.contact_person, 100)?;
        set(&mut builder.website, "Website", self.website, 2048)?;
        if let Some(phone) = self.phone {
            builder.phone = match phone.trim() {
                "" => None,
                phone => Some(validate_phone(phone)?),
            };
        }
        Ok(())
    }
}

/// Builder accounts: profile, approval workflow, documents and team members.
pub struct BuilderService {
    pub(super) builders: Arc<dyn BuilderRepository>,
    pub(super) tokens: Arc<TokenService>,
    pub(super) otp: Arc<OtpService>,
    pub(super) notifications: Arc<NotificationService>,
}

impl BuilderService {
    pub fn new(
        builders: Arc<dyn BuilderRepository>,
        tokens: Arc<TokenService>,
        otp: Arc<OtpService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            builders,
            tokens,
            otp,
            notifications,
        }
    }

    pub fn get(&self, id: &BuilderId) -> Result<Builder, ServiceError> {
        self.builders.fetch(id)?.ok_or_else(builder_not_found)
    }

    pub(super) fn save(&self, mut builder: Builder) -> Result<Builder, ServiceError> {
        builder.updated_at = Utc::now();
        self.builders.update(builder).map_err(email_taken)
    }

    /// Fresh, unverified draft with a hashed password and validated profile.
    pub(super) fn draft(&self, input: NewBuilder) -> Result<Builder, ServiceError> {
        let now = Utc::now();
        let mut builder = Builder {
            id: BuilderId::generate(),
            name: required_text("Name", &input.name, 200)?,
            email: normalize_email(&input.email)?,
            password_hash: hash_password(&input.password)?,
            contact_info: None,
            address: None,
            company: None,
            city: None,
            logo: None,
            rera_registration_id: None,
            contact_person: None,
            phone: None,
            website: None,
            supporting_documents: Vec::new(),
            status: BuilderStatus::Draft,
            admin_decision: None,
            team_members: Vec::new(),
            is_otp_verified: false,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        input.profile.apply(&mut builder)?;
        Ok(builder)
    }

    /// Admin-created builders skip e-mail verification.
    pub fn create(&self, input: NewBuilder) -> Result<Builder, ServiceError> {
        let mut builder = self.draft(input)?;
        builder.is_otp_verified = true;
        let builder = self.builders.insert(builder).map_err(email_taken)?;
        info!(builder = %builder.id, "builder created by admin");
        Ok(builder)
    }

    pub fn list(
        &self,
        filter: &BuilderFilter,
        page: &PageRequest,
    ) -> Result<Page<Builder>, ServiceError> {
        let mut items = self.builders.list(filter)?;
        match &page.sort {
            Some(sort) => sort.apply(&mut items, BUILDER_SORT_FIELDS, |field, a: &Builder, b: &Builder| match field {
                "name" => Some(a.name.cmp(&b.name)),
                "email" => Some(a.email.cmp(&b.email)),
                "status" => Some(a.status.label().cmp(b.status.label())),
                "created_at" => Some(a.created_at.cmp(&b.created_at)),
                _ => None,
            })?,
            None => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        Ok(Page::paginate(items, page))
    }

    pub fn update_profile(
        &self,
        id: &BuilderId,
        update: BuilderUpdate,
    ) -> Result<Builder, ServiceError> {
        let mut builder = self.get(id)?;
        if let Some(name) = update.name {
            builder.name = required_text("Name", &name, 200)?;
        }
        update.profile.apply(&mut builder)?;
        self.save(builder)
    }

    pub fn admin_update(
        &self,
        id: &BuilderId,
        update: AdminBuilderUpdate,
    ) -> Result<Builder, ServiceError> {
        let mut builder = self.get(id)?;
        if let Some(name) = update.name {
            builder.name = required_text("Name", &name, 200)?;
        }
        if let Some(email) = update.email {
            builder.email = normalize_email(&email)?;
        }
        if let Some(active) = update.is_active {
            builder.is_active = active;
        }
        update.profile.apply(&mut builder)?;
        self.save(builder)
    }

    pub fn delete(&self, id: &BuilderId) -> Result<(), ServiceError> {
        if !self.builders.delete(id)? {
            return Err(builder_not_found());
        }
        self.tokens.revoke_sessions(Audience::Builder, id.as_str())?;
        info!(builder = %id, "builder deleted");
        Ok(())
    }

    pub fn set_active(&self, id: &BuilderId, active: bool) -> Result<Builder, ServiceError> {
        let mut builder = self.get(id)?;
        builder.is_active = active;
        let builder = self.save(builder)?;
        if !active {
            self.tokens.revoke_sessions(Audience::Builder, id.as_str())?;
        }
        info!(builder = %id, active, "builder activation changed");
        Ok(builder)
    }

    /// Owners change the account password; team members change their own.
    pub fn change_password(
        &self,
        principal: &BuilderPrincipal,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let mut builder = self.get(&principal.id)?;
        let incorrect = || ServiceError::unauthorized("Current password is incorrect");

        match &principal.member {
            Some(member_id) => {
                let member = builder.member_mut(member_id).ok_or_else(member_not_found)?;
                if !verify_password(current_password, &member.password_hash) {
                    return Err(incorrect());
                }
                member.password_hash = hash_password(new_password)?;
            }
            None => {
                if !verify_password(current_password, &builder.password_hash) {
                    return Err(incorrect());
                }
                builder.password_hash = hash_password(new_password)?;
            }
        }
        self.save(builder)?;
        if principal.is_owner() {
            self.tokens
                .revoke_sessions(Audience::Builder, principal.id.as_str())?;
        }
        Ok(())
    }

    pub fn submit_for_review(&self, id: &BuilderId) -> Result<Builder, ServiceError> {
        let mut builder = self.get(id)?;
        builder.submit_for_review(Utc::now())?;
        let builder = self.save(builder)?;
        info!(builder = %id, "builder submitted for review");
        Ok(builder)
    }

    pub fn reset_to_draft(&self, id: &BuilderId) -> Result<Builder, ServiceError> {
        let mut builder = self.get(id)?;
        builder.reset_to_draft(Utc::now())?;
        self.save(builder)
    }

    pub fn approve(
        &self,
        admin: &AdminId,
        id: &BuilderId,
        notes: Option<&str>,
    ) -> Result<Builder, ServiceError> {
        let notes = optional_text("Notes", notes, 1000)?;
        let mut builder = self.get(id)?;
        builder.approve(admin, notes, Utc::now())?;
        let builder = self.save(builder)?;
        info!(builder = %id, admin = %admin, "builder approved");

        self.notifications.notify_quietly(
            NewNotification::system(
                Recipient::builder(&builder.id),
                NotificationType::ProfileApproved,
                "Profile approved",
                "Your builder profile has been approved. You can now publish properties.",
            )
            .from_sender(SenderKind::Admin, admin.as_str())
            .with_priority(Priority::High),
        );
        Ok(builder)
    }

    pub fn reject(
        &self,
        admin: &AdminId,
        id: &BuilderId,
        notes: &str,
    ) -> Result<Builder, ServiceError> {
        let notes = optional_text("Notes", Some(notes), 1000)?
            .ok_or_else(|| ServiceError::validation("Rejection notes are required"))?;
        let mut builder = self.get(id)?;
        builder.reject(admin, notes.clone(), Utc::now())?;
        let builder = self.save(builder)?;
        info!(builder = %id, admin = %admin, "builder rejected");

        self.notifications.notify_quietly(
            NewNotification::system(
                Recipient::builder(&builder.id),
                NotificationType::ProfileRejected,
                "Profile rejected",
                format!("Your builder profile was rejected: {notes}"),
            )
            .from_sender(SenderKind::Admin, admin.as_str())
            .with_priority(Priority::High),
        );
        Ok(builder)
    }

    pub fn stats(&self) -> Result<BuilderStats, ServiceError> {
        let mut stats = BuilderStats::default();
        for builder in self.builders.list(&BuilderFilter::default())? {
            stats.total += 1;
            if builder.is_active {
                stats.active += 1;
            } else {
                stats.inactive += 1;
            }
            *stats.by_status.entry(builder.status).or_default() += 1;
        }
        Ok(stats)
    }

    pub fn add_document(
        &self,
        id: &BuilderId,
        input: DocumentInput,
    ) -> Result<SupportingDocument, ServiceError> {
        let mut builder = self.get(id)?;
        let document = SupportingDocument {
            id: DocumentId::generate(),
            url: required_text("Document url", &input.url, 2048)?,
            key: optional_text("Document key", input.key.as_deref(), 1024)?,
            original_name: optional_text("Original name", input.original_name.as_deref(), 255)?,
            document_type: input.document_type,
            uploaded_at: Utc::now(),
        };
        builder.supporting_documents.push(document.clone());
        self.save(builder)?;
        Ok(document)
    }

    pub fn remove_document(&self, id: &BuilderId, document: &DocumentId) -> Result<(), ServiceError> {
        let mut builder = self.get(id)?;
        let before = builder.supporting_documents.len();
        builder.supporting_documents.retain(|entry| &entry.id != document);
        if builder.supporting_documents.len() == before {
            return Err(ServiceError::not_found("Document not found"));
        }
        self.save(builder)?;
        Ok(())
    }

    pub fn team_members(&self, id: &BuilderId) -> Result<Vec<TeamMember>, ServiceError> {
        Ok(self.get(id)?.team_members)
    }

    pub fn team_member(
        &self,
        id: &BuilderId,
        member: &TeamMemberId,
    ) -> Result<TeamMember, ServiceError> {
        self.get(id)?
            .member(member)
            .cloned()
            .ok_or_else(member_not_found)
    }

    pub fn add_team_member(
        &self,
        id: &BuilderId,
        input: NewTeamMember,
    ) -> Result<TeamMember, ServiceError> {
        let mut builder = self.get(id)?;
        let email = normalize_email(&input.email)?;
        if email == builder.email || builder.member_by_email(&email).is_some() {
            return Err(ServiceError::conflict("Email already taken"));
        }

        let member = TeamMember {
            id: TeamMemberId::generate(),
            name: required_text("Name", &input.name, 100)?,
            email,
            password_hash: hash_password(&input.password)?,
            role: optional_text("Role", input.role.as_deref(), 50)?
                .unwrap_or_else(|| "team_member".to_string()),
            permissions: input.permissions,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
        };
        builder.team_members.push(member.clone());
        self.save(builder)?;
        info!(builder = %id, member = %member.id, "team member added");
        Ok(member)
    }

    pub fn update_team_member(
        &self,
        id: &BuilderId,
        member_id: &TeamMemberId,
        update: TeamMemberUpdate,
    ) -> Result<TeamMember, ServiceError> {
        let mut builder = self.get(id)?;
        let member = builder.member_mut(member_id).ok_or_else(member_not_found)?;
        if let Some(name) = update.name {
            member.name = required_text("Name", &name, 100)?;
        }
        if let Some(role) = update.role {
            member.role = required_text("Role", &role, 50)?;
        }
        if let Some(permissions) = update.permissions {
            member.permissions = permissions;
        }
        if let Some(active) = update.is_active {
            member.is_active = active;
        }
        if let Some(password) = update.password {
            member.password_hash = hash_password(&password)?;
        }
        let member = member.clone();
        self.save(builder)?;
        Ok(member)
    }

    pub fn remove_team_member(
        &self,
        id: &BuilderId,
        member_id: &TeamMemberId,
    ) -> Result<(), ServiceError> {
        let mut builder = self.get(id)?;
        let before = builder.team_members.len();
        builder.team_members.retain(|member| &member.id != member_id);
        if builder.team_members.len() == before {
            return Err(member_not_found());
        }
        self.save(builder)?;
        info!(builder = %id, member = %member_id, "team member removed");
        Ok(())
    }
}
