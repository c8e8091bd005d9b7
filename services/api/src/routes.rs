use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use leave_flow::workflows::leave::{
    leave_router, LeaveStore, LeaveWorkflowService, NotificationSink,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_leave_routes<S, N>(service: Arc<LeaveWorkflowService<S, N>>) -> axum::Router
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    leave_router(service)
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
    use crate::infra::OutboxNotifier;
    use axum::body::Body;
    use axum::http::Request;
    use leave_flow::workflows::leave::{InMemoryLeaveStore, LeavePolicy};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    fn app(state: AppState) -> axum::Router {
        let (notifier, _worker) = OutboxNotifier::spawn(8);
        let service = Arc::new(LeaveWorkflowService::new(
            Arc::new(InMemoryLeaveStore::default()),
            Arc::new(notifier),
            LeavePolicy::default(),
        ));
        with_leave_routes(service).layer(Extension(state))
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(app_state(true))
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_tracks_the_startup_flag() {
        let state = app_state(false);
        let router = app(state.clone());

        let before = router
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(before.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let after = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(after.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn leave_routes_are_mounted_alongside_probes() {
        let response = app(app_state(true))
            .oneshot(
                Request::get("/api/v1/leaves/summary")
                    .header("x-actor-id", "m-1")
                    .header("x-actor-role", "manager")
                    .header("x-actor-department", "Engineering")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
