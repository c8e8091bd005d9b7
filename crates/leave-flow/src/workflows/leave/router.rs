use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::application::{LeaveApplication, LeaveView};
use super::domain::{Actor, LeaveId, LeaveRequest, LeaveStatus, ReviewDecision, Role, UserId};
use super::repository::{LeaveStore, NotificationSink};
use super::service::{LeaveServiceError, LeaveWorkflowService};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_DEPARTMENT_HEADER: &str = "x-actor-department";
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";

/// Router builder exposing the leave workflow over HTTP.
pub fn leave_router<S, N>(service: Arc<LeaveWorkflowService<S, N>>) -> Router
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/leaves",
            post(submit_handler::<S, N>).get(list_handler::<S, N>),
        )
        .route("/api/v1/leaves/mine", get(own_handler::<S, N>))
        .route("/api/v1/leaves/summary", get(summary_handler::<S, N>))
        .route(
            "/api/v1/leaves/:leave_id",
            get(detail_handler::<S, N>).delete(cancel_handler::<S, N>),
        )
        .route(
            "/api/v1/leaves/:leave_id/review",
            post(review_handler::<S, N>),
        )
        .route("/api/v1/balances/:year", get(balance_handler::<S, N>))
        .with_state(service)
}

/// Actor asserted by the upstream identity provider.
#[derive(Debug, Clone)]
pub struct ActorHeaders(pub Actor);

#[async_trait]
impl<St> FromRequestParts<St> for ActorHeaders
where
    St: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers)
            .map(ActorHeaders)
            .map_err(|message| {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
            })
    }
}

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, String> {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let id = text(ACTOR_ID_HEADER).ok_or_else(|| format!("missing {ACTOR_ID_HEADER} header"))?;
    let role = text(ACTOR_ROLE_HEADER)
        .ok_or_else(|| format!("missing {ACTOR_ROLE_HEADER} header"))?
        .parse::<Role>()?;

    Ok(Actor {
        id: UserId(id),
        name: text(ACTOR_NAME_HEADER).unwrap_or_default(),
        role,
        department: text(ACTOR_DEPARTMENT_HEADER).unwrap_or_default(),
        email: text(ACTOR_EMAIL_HEADER).unwrap_or_default(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub status: Option<String>,
}

impl ListParams {
    fn status(&self) -> Result<Option<LeaveStatus>, String> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewBody {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    pub user: UserId,
    pub year: i32,
    pub casual: u32,
    pub sick: u32,
    pub earned: u32,
    pub total_available: u32,
}

pub(crate) async fn submit_handler<S, N>(
    State(service): State<Arc<LeaveWorkflowService<S, N>>>,
    ActorHeaders(actor): ActorHeaders,
    Json(request): Json<LeaveRequest>,
) -> Response
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    match service.submit(&actor, request) {
        Ok(application) => (StatusCode::CREATED, Json(application.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<S, N>(
    State(service): State<Arc<LeaveWorkflowService<S, N>>>,
    ActorHeaders(actor): ActorHeaders,
    Query(params): Query<ListParams>,
) -> Response
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    let status = match params.status() {
        Ok(status) => status,
        Err(message) => return unprocessable(message),
    };
    views(service.list_visible(&actor, status))
}

pub(crate) async fn own_handler<S, N>(
    State(service): State<Arc<LeaveWorkflowService<S, N>>>,
    ActorHeaders(actor): ActorHeaders,
    Query(params): Query<ListParams>,
) -> Response
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    let status = match params.status() {
        Ok(status) => status,
        Err(message) => return unprocessable(message),
    };
    views(service.list_own(&actor, status))
}

pub(crate) async fn summary_handler<S, N>(
    State(service): State<Arc<LeaveWorkflowService<S, N>>>,
    ActorHeaders(actor): ActorHeaders,
) -> Response
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    match service.summary(&actor) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn detail_handler<S, N>(
    State(service): State<Arc<LeaveWorkflowService<S, N>>>,
    ActorHeaders(actor): ActorHeaders,
    Path(leave_id): Path<u64>,
) -> Response
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    match service.get(LeaveId(leave_id), &actor) {
        Ok(application) => (StatusCode::OK, Json(application.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<S, N>(
    State(service): State<Arc<LeaveWorkflowService<S, N>>>,
    ActorHeaders(actor): ActorHeaders,
    Path(leave_id): Path<u64>,
) -> Response
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    match service.cancel(LeaveId(leave_id), &actor) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn review_handler<S, N>(
    State(service): State<Arc<LeaveWorkflowService<S, N>>>,
    ActorHeaders(actor): ActorHeaders,
    Path(leave_id): Path<u64>,
    Json(body): Json<ReviewBody>,
) -> Response
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    match service.review(LeaveId(leave_id), &actor, body.decision, body.comment) {
        Ok(application) => (StatusCode::OK, Json(application.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn balance_handler<S, N>(
    State(service): State<Arc<LeaveWorkflowService<S, N>>>,
    ActorHeaders(actor): ActorHeaders,
    Path(year): Path<i32>,
) -> Response
where
    S: LeaveStore + 'static,
    N: NotificationSink + 'static,
{
    match service.balance(&actor.id, year) {
        Ok(balance) => {
            let view = BalanceView {
                total_available: balance.total_available(),
                user: balance.user,
                year: balance.year,
                casual: balance.casual,
                sick: balance.sick,
                earned: balance.earned,
            };
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn views(result: Result<Vec<LeaveApplication>, LeaveServiceError>) -> Response {
    match result {
        Ok(applications) => {
            let views: Vec<LeaveView> = applications.iter().map(LeaveApplication::view).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn unprocessable(message: String) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": message })),
    )
        .into_response()
}

pub(crate) fn status_for(error: &LeaveServiceError) -> StatusCode {
    match error {
        LeaveServiceError::Validation(_) | LeaveServiceError::InsufficientBalance { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LeaveServiceError::Authorization(_) => StatusCode::FORBIDDEN,
        LeaveServiceError::InvalidState { .. } | LeaveServiceError::PendingApplications { .. } => {
            StatusCode::CONFLICT
        }
        LeaveServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        LeaveServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: LeaveServiceError) -> Response {
    let status = status_for(&error);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(%error, "leave workflow storage failure");
    }
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
