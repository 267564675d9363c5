//! Builder accounts: registration, the admin approval workflow, supporting documents and
//! embedded team members that sign in on the builder's behalf.

pub mod domain;
pub mod onboarding;
pub mod repository;
pub mod router;
pub mod service;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use domain::{
    AdminDecision, Builder, BuilderId, DecisionStatus, DocumentId, DocumentType,
    SupportingDocument, TeamMember, TeamMemberId, TeamPermission, TeamPermissions,
};
pub use repository::{BuilderFilter, BuilderRepository};
pub use router::builder_router;
pub use service::{
    AdminBuilderUpdate, BuilderProfile, BuilderService, BuilderSession, BuilderStats,
    BuilderUpdate, DocumentInput, NewBuilder, NewTeamMember, TeamMemberUpdate,
};
pub use workflow::{BuilderStatus, TransitionError};
