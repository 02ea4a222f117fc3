use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use waitlist::workflows::waitlist::{
    intake_router, ApplicationRepository, AssetStore, WaitlistIntakeService,
};

pub(crate) fn with_intake_routes<R, S>(service: Arc<WaitlistIntakeService<R, S>>) -> axum::Router
where
    R: ApplicationRepository + 'static,
    S: AssetStore + 'static,
{
    intake_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryApplicationRepository, LocalAssetStore};
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;
    use waitlist::workflows::waitlist::WaitlistPolicy;

    fn app(ready: bool) -> axum::Router {
        let service = Arc::new(WaitlistIntakeService::new(
            Arc::new(InMemoryApplicationRepository::default()),
            Arc::new(LocalAssetStore::new(std::env::temp_dir().join("waitlist-routes"))),
            WaitlistPolicy::default(),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_intake_routes(service).layer(Extension(state))
    }

    async fn status_of(router: axum::Router, uri: &str) -> StatusCode {
        router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("router response")
            .status()
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
        assert_eq!(status_of(app(false), "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_tracks_the_listener_flag() {
        assert_eq!(
            status_of(app(false), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_of(app(true), "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn intake_probe_is_mounted() {
        assert_eq!(status_of(app(true), "/api/test").await, StatusCode::OK);
        assert_eq!(status_of(app(true), "/metrics").await, StatusCode::OK);
    }
}
