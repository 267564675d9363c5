use crate::cli::{AdminSeed, ServeArgs};
use crate::infra::AppState;
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use zuhaush::config::{AppConfig, AppEnvironment};
use zuhaush::error::AppError;
use zuhaush::{mail, telemetry, Marketplace};

pub(crate) async fn run(mut args: ServeArgs, admin: Option<AdminSeed>) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let mailer = mail::from_config(&config.mail)?;
    if config.mail.api_key.is_none() {
        warn!("MAIL_API_KEY not set; outbound mail is only logged");
    }
    let (marketplace, _store) = Marketplace::in_memory(&config, mailer);
    if config.environment == AppEnvironment::Production {
        warn!("running with the in-memory store; data is lost on restart");
    }

    if let Some(seed) = admin {
        let admin = marketplace
            .admins
            .create_default_admin(&seed.email, &seed.password, &seed.name)?;
        info!(admin = %admin.id, email = %admin.email, "super admin available");
    }

    let app = with_operational_routes(marketplace.router())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "zuhaush marketplace api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
