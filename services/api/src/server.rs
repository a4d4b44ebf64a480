use crate::cli::ServeArgs;
use crate::infra::{
    demo_requirements, AppState, InMemoryApplicationRepository, InMemoryRequirementsStore,
};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use kitchen_intake::config::{AppConfig, AppEnvironment};
use kitchen_intake::error::AppError;
use kitchen_intake::telemetry;
use kitchen_intake::workflows::intake::KitchenApplicationService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

const DEMO_LOCATION: &str = "loc-demo";

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

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let requirements = Arc::new(InMemoryRequirementsStore::default());
    let service = Arc::new(KitchenApplicationService::new(repository, requirements));

    if config.environment == AppEnvironment::Development {
        service.configure_requirements(DEMO_LOCATION, demo_requirements())?;
        info!(location = DEMO_LOCATION, "seeded demo requirements");
    }

    let app = with_intake_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "kitchen intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
