use crate::cli::ServeArgs;
use crate::infra::{AppState, OutboxNotifier};
use crate::routes::with_leave_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use leave_flow::config::AppConfig;
use leave_flow::error::AppError;
use leave_flow::telemetry;
use leave_flow::workflows::leave::{InMemoryLeaveStore, LeaveWorkflowService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let store = Arc::new(InMemoryLeaveStore::new(config.leave.policy.allowance));
    let (notifier, outbox) = OutboxNotifier::spawn(config.leave.notify_buffer);
    let leave_service = Arc::new(LeaveWorkflowService::new(
        store,
        Arc::new(notifier),
        config.leave.policy.clone(),
    ));

    let app = with_leave_routes(leave_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_span_days = config.leave.policy.max_span_days,
        "leave workflow service ready"
    );

    axum::serve(listener, app).await?;

    if let Ok(delivered) = outbox.await {
        info!(delivered, "notification outbox drained");
    }
    Ok(())
}
