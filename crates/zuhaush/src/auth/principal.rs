use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::tokens::{Audience, Claims, TokenKind, TokenService};
use crate::accounts::admins::{AdminId, AdminPermission, AdminPermissions, AdminRepository, AdminRole};
use crate::accounts::builders::{
    BuilderId, BuilderRepository, TeamMemberId, TeamPermission, TeamPermissions,
};
use crate::accounts::users::{UserId, UserRepository};
use crate::error::ServiceError;

fn unauthenticated() -> ServiceError {
    ServiceError::unauthorized("Please authenticate")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPrincipal {
    pub id: UserId,
    pub email: String,
}

/// A builder account, or one of its team members acting for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderPrincipal {
    pub id: BuilderId,
    pub member: Option<TeamMemberId>,
    /// `None` for the owning account, which holds every permission.
    pub permissions: Option<TeamPermissions>,
}

impl BuilderPrincipal {
    pub fn is_owner(&self) -> bool {
        self.member.is_none()
    }

    pub fn require(&self, permission: TeamPermission) -> Result<(), ServiceError> {
        match &self.permissions {
            Some(permissions) if !permissions.allows(permission) => Err(
                ServiceError::forbidden("You do not have access to this section"),
            ),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub id: AdminId,
    pub role: AdminRole,
    pub permissions: AdminPermissions,
}

impl AdminPrincipal {
    pub fn require(&self, permission: AdminPermission) -> Result<(), ServiceError> {
        if self.role == AdminRole::SuperAdmin || self.permissions.allows(permission) {
            Ok(())
        } else {
            Err(ServiceError::forbidden("Forbidden"))
        }
    }

    pub fn require_super_admin(&self) -> Result<(), ServiceError> {
        if self.role == AdminRole::SuperAdmin {
            Ok(())
        } else {
            Err(ServiceError::forbidden("Forbidden"))
        }
    }
}

/// Caller of an endpoint open to every audience. Identification only: holding one
/// variant never grants the rights of another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyPrincipal {
    User(UserPrincipal),
    Builder(BuilderPrincipal),
    Admin(AdminPrincipal),
}

/// Resolves bearer tokens into principals, checking the account is still active.
pub struct Authenticator {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserRepository>,
    builders: Arc<dyn BuilderRepository>,
    admins: Arc<dyn AdminRepository>,
}

impl Authenticator {
    pub fn new(
        tokens: Arc<TokenService>,
        users: Arc<dyn UserRepository>,
        builders: Arc<dyn BuilderRepository>,
        admins: Arc<dyn AdminRepository>,
    ) -> Self {
        Self {
            tokens,
            users,
            builders,
            admins,
        }
    }

    fn access_claims(&self, token: &str, audience: Audience) -> Result<Claims, ServiceError> {
        let claims = self.tokens.decode(token, audience)?;
        if claims.typ != TokenKind::Access {
            return Err(unauthenticated());
        }
        Ok(claims)
    }

    pub fn user(&self, token: &str) -> Result<UserPrincipal, ServiceError> {
        let claims = self.access_claims(token, Audience::User)?;
        self.resolve_user(&claims)
    }

    pub fn builder(&self, token: &str) -> Result<BuilderPrincipal, ServiceError> {
        let claims = self.access_claims(token, Audience::Builder)?;
        self.resolve_builder(&claims)
    }

    pub fn admin(&self, token: &str) -> Result<AdminPrincipal, ServiceError> {
        let claims = self.access_claims(token, Audience::Admin)?;
        self.resolve_admin(&claims)
    }

    /// Dispatch on the audience the token was issued for.
    pub fn any(&self, token: &str) -> Result<AnyPrincipal, ServiceError> {
        let claims = self.tokens.decode_any(token)?;
        if claims.typ != TokenKind::Access {
            return Err(unauthenticated());
        }
        match claims.audience().ok_or_else(unauthenticated)? {
            Audience::User => self.resolve_user(&claims).map(AnyPrincipal::User),
            Audience::Builder => self.resolve_builder(&claims).map(AnyPrincipal::Builder),
            Audience::Admin => self.resolve_admin(&claims).map(AnyPrincipal::Admin),
        }
    }

    fn resolve_user(&self, claims: &Claims) -> Result<UserPrincipal, ServiceError> {
        let user = self
            .users
            .fetch(&UserId(claims.sub.clone()))?
            .filter(|user| user.is_active)
            .ok_or_else(unauthenticated)?;
        Ok(UserPrincipal {
            id: user.id,
            email: user.email,
        })
    }

    fn resolve_builder(&self, claims: &Claims) -> Result<BuilderPrincipal, ServiceError> {
        let builder = self
            .builders
            .fetch(&BuilderId(claims.sub.clone()))?
            .filter(|builder| builder.is_active)
            .ok_or_else(unauthenticated)?;

        match &claims.member {
            Some(member_id) => {
                let member_id = TeamMemberId(member_id.clone());
                let member = builder
                    .member(&member_id)
                    .filter(|member| member.is_active)
                    .ok_or_else(unauthenticated)?;
                Ok(BuilderPrincipal {
                    id: builder.id.clone(),
                    member: Some(member_id),
                    permissions: Some(member.permissions),
                })
            }
            None => Ok(BuilderPrincipal {
                id: builder.id,
                member: None,
                permissions: None,
            }),
        }
    }

    fn resolve_admin(&self, claims: &Claims) -> Result<AdminPrincipal, ServiceError> {
        let admin = self
            .admins
            .fetch(&AdminId(claims.sub.clone()))?
            .filter(|admin| admin.is_active)
            .ok_or_else(unauthenticated)?;
        Ok(AdminPrincipal {
            id: admin.id,
            role: admin.role,
            permissions: admin.permissions,
        })
    }
}

fn credentials(parts: &Parts) -> Result<(Arc<Authenticator>, String), ServiceError> {
    let authenticator = parts
        .extensions
        .get::<Arc<Authenticator>>()
        .cloned()
        .ok_or_else(|| ServiceError::Internal("authenticator extension missing".to_string()))?;

    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(unauthenticated)?;

    Ok((authenticator, token.to_string()))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for UserPrincipal
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (authenticator, token) = credentials(parts)?;
        authenticator.user(&token)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for BuilderPrincipal
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (authenticator, token) = credentials(parts)?;
        authenticator.builder(&token)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (authenticator, token) = credentials(parts)?;
        authenticator.admin(&token)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AnyPrincipal
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (authenticator, token) = credentials(parts)?;
        authenticator.any(&token)
    }
}
