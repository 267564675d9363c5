//! Service graph and route composition for the marketplace API.

use std::sync::Arc;

use axum::{Extension, Router};

use crate::accounts::admins::{admin_router, AdminRepository, AdminService};
use crate::accounts::builders::{builder_router, BuilderRepository, BuilderService};
use crate::accounts::users::{user_router, UserRepository, UserService};
use crate::auth::{Authenticator, OtpService, OtpThrottle, TokenRepository, TokenService};
use crate::catalog::{property_router, PropertyRepository, PropertyService};
use crate::chat::{chat_router, ChatService, MessageRepository};
use crate::cities::{city_router, CityRepository, CityService};
use crate::config::AppConfig;
use crate::engagement::{
    comment_router, like_router, property_view_router, CommentRepository, CommentService,
    LikeRepository, LikeService, PropertyViewRepository, PropertyViewService,
};
use crate::mail::Mailer;
use crate::notifications::{notification_router, NotificationRepository, NotificationService};
use crate::store::memory::MemoryStore;
use crate::visits::{visit_router, VisitRepository, VisitService};

/// Storage collaborators for every service.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub builders: Arc<dyn BuilderRepository>,
    pub admins: Arc<dyn AdminRepository>,
    pub properties: Arc<dyn PropertyRepository>,
    pub visits: Arc<dyn VisitRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub views: Arc<dyn PropertyViewRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub cities: Arc<dyn CityRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub otp_throttle: Arc<dyn OtpThrottle>,
}

impl From<&MemoryStore> for Repositories {
    fn from(store: &MemoryStore) -> Self {
        Self {
            users: Arc::new(store.users.clone()),
            builders: Arc::new(store.builders.clone()),
            admins: Arc::new(store.admins.clone()),
            properties: Arc::new(store.properties.clone()),
            visits: Arc::new(store.visits.clone()),
            likes: Arc::new(store.likes.clone()),
            comments: Arc::new(store.comments.clone()),
            views: Arc::new(store.views.clone()),
            messages: Arc::new(store.messages.clone()),
            notifications: Arc::new(store.notifications.clone()),
            cities: Arc::new(store.cities.clone()),
            tokens: Arc::new(store.tokens.clone()),
            otp_throttle: Arc::new(store.otp_throttle.clone()),
        }
    }
}

/// Every domain service, wired once at startup.
#[derive(Clone)]
pub struct Marketplace {
    pub authenticator: Arc<Authenticator>,
    pub tokens: Arc<TokenService>,
    pub otp: Arc<OtpService>,
    pub notifications: Arc<NotificationService>,
    pub users: Arc<UserService>,
    pub builders: Arc<BuilderService>,
    pub admins: Arc<AdminService>,
    pub properties: Arc<PropertyService>,
    pub visits: Arc<VisitService>,
    pub likes: Arc<LikeService>,
    pub comments: Arc<CommentService>,
    pub views: Arc<PropertyViewService>,
    pub chat: Arc<ChatService>,
    pub cities: Arc<CityService>,
}

impl Marketplace {
    pub fn new(config: &AppConfig, repositories: Repositories, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = Arc::new(TokenService::new(&config.auth, repositories.tokens.clone()));
        let otp = Arc::new(OtpService::new(
            tokens.clone(),
            repositories.otp_throttle.clone(),
            mailer.clone(),
            config.otp.clone(),
        ));
        let notifications = Arc::new(NotificationService::new(repositories.notifications.clone()));
        let authenticator = Arc::new(Authenticator::new(
            tokens.clone(),
            repositories.users.clone(),
            repositories.builders.clone(),
            repositories.admins.clone(),
        ));

        Self {
            users: Arc::new(UserService::new(
                repositories.users.clone(),
                repositories.properties.clone(),
                tokens.clone(),
                otp.clone(),
                notifications.clone(),
                mailer,
            )),
            builders: Arc::new(BuilderService::new(
                repositories.builders.clone(),
                tokens.clone(),
                otp.clone(),
                notifications.clone(),
            )),
            admins: Arc::new(AdminService::new(repositories.admins.clone(), tokens.clone())),
            properties: Arc::new(PropertyService::new(
                repositories.properties.clone(),
                repositories.builders.clone(),
                notifications.clone(),
            )),
            visits: Arc::new(VisitService::new(
                repositories.visits.clone(),
                repositories.properties.clone(),
                notifications.clone(),
            )),
            likes: Arc::new(LikeService::new(
                repositories.likes.clone(),
                repositories.properties.clone(),
            )),
            comments: Arc::new(CommentService::new(
                repositories.comments.clone(),
                repositories.properties.clone(),
            )),
            views: Arc::new(PropertyViewService::new(
                repositories.views.clone(),
                repositories.properties.clone(),
            )),
            chat: Arc::new(ChatService::new(
                repositories.messages.clone(),
                repositories.users.clone(),
                repositories.builders.clone(),
                notifications.clone(),
            )),
            cities: Arc::new(CityService::new(repositories.cities.clone())),
            authenticator,
            tokens,
            otp,
            notifications,
        }
    }

    /// Services backed by a fresh in-memory store.
    pub fn in_memory(config: &AppConfig, mailer: Arc<dyn Mailer>) -> (Self, MemoryStore) {
        let store = MemoryStore::default();
        let marketplace = Self::new(config, Repositories::from(&store), mailer);
        (marketplace, store)
    }

    /// All `/v1` routes with the bearer-token authenticator attached.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(user_router(self.users.clone()))
            .merge(builder_router(self.builders.clone()))
            .merge(admin_router(self.admins.clone()))
            .merge(property_router(self.properties.clone()))
            .merge(visit_router(self.visits.clone()))
            .merge(like_router(self.likes.clone()))
            .merge(comment_router(self.comments.clone()))
            .merge(property_view_router(self.views.clone()))
            .merge(chat_router(self.chat.clone()))
            .merge(city_router(self.cities.clone()))
            .merge(notification_router(self.notifications.clone()))
            .layer(Extension(self.authenticator.clone()))
    }
}
