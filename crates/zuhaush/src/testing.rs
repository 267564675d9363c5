//! Fixtures shared by the in-crate test suites.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use tower::ServiceExt;

use crate::accounts::admins::{AdminId, AdminSession};
use crate::accounts::builders::{BuilderId, BuilderProfile, BuilderSession, NewBuilder};
use crate::accounts::users::{
    CompleteRegistrationRequest, CreatePasswordRequest, UserSession,
};
use crate::app::Marketplace;
use crate::catalog::{Price, PriceUnit, Property, PropertyInput, PropertyStatus, PropertyType};
use crate::config::AppConfig;
use crate::mail::{templates, MemoryMailer};
use crate::store::memory::MemoryStore;

pub(crate) const PASSWORD: &str = "secret123";
pub(crate) const ADMIN_EMAIL: &str = "root@zuhaush.test";

pub(crate) struct Harness {
    pub(crate) app: Marketplace,
    pub(crate) store: MemoryStore,
    pub(crate) mailer: Arc<MemoryMailer>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let mailer = Arc::new(MemoryMailer::default());
        let config = AppConfig::for_tests("test-secret");
        let (app, store) = Marketplace::in_memory(&config, mailer.clone());
        Self { app, store, mailer }
    }

    pub(crate) fn router(&self) -> Router {
        self.app.router()
    }

    /// Code from the newest one-time-code mail sent to `email`.
    pub(crate) fn last_code(&self, email: &str) -> String {
        let message = self.mailer.last_to(email).expect("a mail was sent");
        templates::extract_code(&message.text).expect("mail carries a code")
    }

    pub(crate) fn registered_user(&self, email: &str) -> UserSession {
        let users = &self.app.users;
        users.send_registration_otp(email).expect("otp sent");
        users
            .verify_registration_otp(email, &self.last_code(email))
            .expect("otp verified");
        users
            .create_password(CreatePasswordRequest {
                email: email.to_string(),
                password: PASSWORD.to_string(),
                role: None,
            })
            .expect("password set");
        users
            .complete_registration(CompleteRegistrationRequest {
                email: email.to_string(),
                name: "Asha Verma".to_string(),
                contact_number: "+919876543210".to_string(),
                city_of_interest: "Pune".to_string(),
            })
            .expect("registration completed")
    }

    pub(crate) fn verified_builder(&self, email: &str) -> BuilderSession {
        let builders = &self.app.builders;
        builders
            .register_with_otp(new_builder(email))
            .expect("builder registered");
        builders
            .verify_registration_otp(email, &self.last_code(email))
            .expect("builder verified")
    }

    pub(crate) fn approved_builder(&self, email: &str, admin: &AdminId) -> BuilderSession {
        let session = self.verified_builder(email);
        let builders = &self.app.builders;
        builders
            .submit_for_review(&session.builder.id)
            .expect("submitted");
        builders
            .approve(admin, &session.builder.id, None)
            .expect("approved");
        builders.login(email, PASSWORD).expect("builder login")
    }

    pub(crate) fn super_admin(&self) -> AdminSession {
        self.app
            .admins
            .create_default_admin(ADMIN_EMAIL, PASSWORD, "Root")
            .expect("admin created");
        self.app.admins.login(ADMIN_EMAIL, PASSWORD).expect("admin login")
    }

    /// Active, approved listing visible to the public.
    pub(crate) fn listed_property(&self, builder: &BuilderId, admin: &AdminId, name: &str) -> Property {
        let property = self
            .app
            .properties
            .create(builder, property_input(name))
            .expect("property created");
        self.app
            .properties
            .approve(admin, &property.id)
            .expect("property approved")
    }
}

pub(crate) fn new_builder(email: &str) -> NewBuilder {
    NewBuilder {
        name: "Skyline Developers".to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        profile: BuilderProfile {
            company: Some("Skyline Developers Pvt Ltd".to_string()),
            city: Some("Pune".to_string()),
            phone: Some("+912012345678".to_string()),
            ..BuilderProfile::default()
        },
    }
}

pub(crate) fn property_input(name: &str) -> PropertyInput {
    PropertyInput {
        name: name.to_string(),
        property_type: PropertyType::Apartment,
        bhk: Some("2 bhk".to_string()),
        area: None,
        price: Price {
            value: 85.0,
            unit: PriceUnit::Lakh,
        },
        city: "Pune".to_string(),
        locality: "Baner".to_string(),
        geo: None,
        amenities: Vec::new(),
        description: None,
        availability: None,
        slug: None,
        status: Some(PropertyStatus::Active),
    }
}

pub(crate) fn tomorrow() -> NaiveDate {
    (Utc::now() + Duration::days(1)).date_naive()
}

pub(crate) fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("json body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Send one request through the router and decode the JSON reply (`Null` when empty).
pub(crate) async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}
