use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::coords::{self, LatLon, ManualCoordinates};
use crate::error::{EncodeError, EstimateError};
use crate::map::{base_map, MapView};
use crate::service::FareService;
use crate::session::{SessionHandle, SessionStore};
use crate::types::{ClickReport, EstimateRequest, InteractionResponse, SessionView, Vocabulary};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FareService>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(service: FareService) -> Self {
        Self::with_sessions(service, SessionStore::new())
    }

    pub fn with_sessions(service: FareService, sessions: SessionStore) -> Self {
        Self {
            service: Arc::new(service),
            sessions: Arc::new(sessions),
        }
    }
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(e: EstimateError) -> ApiError {
    let status = match &e {
        EstimateError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EstimateError::UnknownSession(_) => StatusCode::NOT_FOUND,
        EstimateError::Encode(EncodeError::UnknownCategory { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        EstimateError::Encode(_) | EstimateError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("estimate failed: {}", e);
    }
    (status, Json(json!({ "error": e.to_string() })))
}

fn bad_request(text: String) -> ApiError {
    api_error(EstimateError::InvalidInput(text))
}

/// Malformed ids and bodies answer with the same JSON error shape as the
/// estimate failures.
fn session_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id).map_err(|e| bad_request(e.body_text()))
}

fn body<T>(json: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    json.map(|Json(v)| v).map_err(|e| bad_request(e.body_text()))
}

fn session(state: &AppState, id: Uuid) -> Result<SessionHandle, ApiError> {
    state
        .sessions
        .get(&id)
        .ok_or_else(|| api_error(EstimateError::UnknownSession(id.to_string())))
}

// ---------- Handlers ----------

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn vocabulary(State(state): State<AppState>) -> Json<Vocabulary> {
    Json(state.service.vocabulary())
}

async fn click_map() -> Json<MapView> {
    Json(base_map())
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let id = state.sessions.create();
    let view = SessionView {
        session_id: id,
        phase: coords::Phase::AwaitingPickup,
        selection: Default::default(),
        estimate: None,
    };
    (StatusCode::CREATED, Json(view))
}

/// Only stored clicks count toward this phase; manual coordinates live in
/// each `/estimate` request and are never kept.
async fn show_session(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SessionView>, ApiError> {
    let id = session_id(path)?;
    let handle = session(&state, id)?;
    let s = handle.lock().await;
    Ok(Json(SessionView {
        session_id: id,
        phase: coords::phase(&ManualCoordinates::default(), &s.selection),
        selection: s.selection.clone(),
        estimate: s.last_estimate.clone(),
    }))
}

async fn close_session(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = session_id(path)?;
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(EstimateError::UnknownSession(id.to_string())))
    }
}

async fn click(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    point: Result<Json<LatLon>, JsonRejection>,
) -> Result<Json<ClickReport>, ApiError> {
    let id = session_id(path)?;
    let point = body(point)?;
    let handle = session(&state, id)?;
    let mut s = handle.lock().await;
    Ok(Json(state.service.click(&mut s, point)))
}

async fn reset(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SessionView>, ApiError> {
    let id = session_id(path)?;
    let handle = session(&state, id)?;
    let mut s = handle.lock().await;
    s.reset();
    Ok(Json(SessionView {
        session_id: id,
        phase: coords::Phase::AwaitingPickup,
        selection: s.selection.clone(),
        estimate: None,
    }))
}

async fn estimate(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    req: Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<InteractionResponse>, ApiError> {
    let id = session_id(path)?;
    let req = body(req)?;
    let handle = session(&state, id)?;
    let mut s = handle.lock().await;
    state
        .service
        .interact(&mut s, req)
        .await
        .map(Json)
        .map_err(api_error)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/vocabulary", get(vocabulary))
        .route("/map", get(click_map))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(show_session).delete(close_session))
        .route("/sessions/:id/click", post(click))
        .route("/sessions/:id/reset", post(reset))
        .route("/sessions/:id/estimate", post(estimate))
        .with_state(state)
}
