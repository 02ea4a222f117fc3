use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryApplicationRepository, LocalAssetStore};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use waitlist::config::AppConfig;
use waitlist::error::AppError;
use waitlist::telemetry;
use waitlist::workflows::waitlist::{WaitlistIntakeService, WaitlistPolicy};

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
    let assets = Arc::new(LocalAssetStore::new(config.intake.photo_dir.clone()));
    let policy = WaitlistPolicy::from(&config.intake);
    let intake_service = Arc::new(WaitlistIntakeService::new(repository, assets, policy));

    let app = with_intake_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        base_offset = policy.base_offset,
        photo_dir = %config.intake.photo_dir.display(),
        "waitlist intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
