use crate::cli::ServeArgs;
use crate::infra::{AppState, TracingNoticePublisher};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use placement_portal::config::AppConfig;
use placement_portal::error::AppError;
use placement_portal::telemetry;
use placement_portal::workflows::placement::{
    InMemoryPortalStore, PlacementPortalService, PRINCIPAL_HEADER, ROLE_HEADER,
};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
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

    let store = Arc::new(InMemoryPortalStore::new());
    let notices = Arc::new(TracingNoticePublisher);
    let portal = Arc::new(PlacementPortalService::new(store, notices));

    let bootstrap = &config.portal.bootstrap_admin;
    if bootstrap.uses_development_password() {
        warn!(
            username = %bootstrap.username,
            "bootstrap administrator uses the development password; set PORTAL_ADMIN_PASSWORD"
        );
    }
    portal.bootstrap_admin(bootstrap)?;

    let app = with_portal_routes(portal)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    warn_if_exposed(addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "placement portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Principal headers are taken as sent, so anything beyond loopback must sit behind the
/// session proxy that sets them. Returns whether the warning fired.
fn warn_if_exposed(addr: SocketAddr) -> bool {
    if addr.ip().is_loopback() {
        return false;
    }
    warn!(
        %addr,
        role_header = ROLE_HEADER,
        principal_header = PRINCIPAL_HEADER,
        "listening beyond loopback; a trusted session proxy must set the principal headers"
    );
    true
}
