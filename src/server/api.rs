//! REST API for tracked tours
//!
//! # Endpoints
//!
//! | Method | Path                  | Description                            |
//! |--------|-----------------------|----------------------------------------|
//! | GET    | `/health`             | Liveness and uptime                    |
//! | GET    | `/metrics`            | Prometheus text exposition             |
//! | GET    | `/tours`              | List tracked tours                     |
//! | POST   | `/tours`              | Track a tour, then update it once      |
//! | GET    | `/tours/summary`      | Latest availability table (text)       |
//! | GET    | `/tours/{id}`         | Get a tour                             |
//! | PUT    | `/tours/{id}`         | Replace a tour, then update it once    |
//! | DELETE | `/tours/{id}`         | Stop tracking a tour                   |
//! | GET    | `/tours/{id}/summary` | Slot table for the next year (text)    |

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::error::{Error, ErrorCategory, Result};
use crate::metrics::{OUTCOME_ADVANCED, OUTCOME_FAILED, OUTCOME_UNCHANGED};
use crate::models::{DateWindow, Tour};
use crate::summary::collect_latest;

// ============================================================================
// Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /tours` and `PUT /tours/{id}`
#[derive(Debug, Deserialize)]
pub struct TourRequest {
    /// Product id; generated when absent on create, ignored on update
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_url: Option<String>,
}

impl TourRequest {
    fn into_tour(self, id: Uuid) -> Tour {
        Tour {
            id,
            name: self.name,
            url: self.url,
            api_url: self.api_url,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self.category() {
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Config => StatusCode::BAD_REQUEST,
            ErrorCategory::Network => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(category = self.category().as_str(), error = %self, "Request failed");
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/tours", get(list_tours).post(create_tour))
        .route("/tours/summary", get(latest_summary))
        .route(
            "/tours/{id}",
            get(get_tour).put(update_tour).delete(delete_tour),
        )
        .route("/tours/{id}/summary", get(tour_summary))
        .with_state(state)
}

// ============================================================================
// Health Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    }))
}

async fn metrics(State(state): State<AppState>) -> Result<Response> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| Error::other(format!("Failed to encode metrics: {e}")))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response())
}

// ============================================================================
// Tour Handlers
// ============================================================================

async fn list_tours(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Tour>>>> {
    let tours = state.repo.list_tours().await?;
    state.metrics.set_tracked_tours(tours.len());
    Ok(Json(ApiResponse::success(tours)))
}

async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Tour>>> {
    let tour = find_tour(&state, id).await?;
    Ok(Json(ApiResponse::success(tour)))
}

async fn create_tour(
    State(state): State<AppState>,
    Json(request): Json<TourRequest>,
) -> Result<Response> {
    if request.name.trim().is_empty() {
        return Ok(bad_request("Tour name must not be empty"));
    }

    let id = request
        .id
        .filter(|id| !id.is_nil())
        .unwrap_or_else(Uuid::new_v4);
    let tour = request.into_tour(id);

    state.repo.upsert_tour(&tour).await?;
    tracing::info!(tour_id = %tour.id, name = %tour.name, "Tour created");
    refresh(&state, &tour).await;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(tour))).into_response())
}

async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TourRequest>,
) -> Result<Response> {
    if request.name.trim().is_empty() {
        return Ok(bad_request("Tour name must not be empty"));
    }

    find_tour(&state, id).await?;
    let tour = request.into_tour(id);

    state.repo.upsert_tour(&tour).await?;
    tracing::info!(tour_id = %tour.id, name = %tour.name, "Tour updated");
    refresh(&state, &tour).await;

    Ok(Json(ApiResponse::success(tour)).into_response())
}

async fn delete_tour(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    if !state.repo.delete_tour(id).await? {
        return Err(Error::not_found(format!("tour {id}")));
    }

    tracing::info!(tour_id = %id, "Tour deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Summary Handlers
// ============================================================================

async fn latest_summary(State(state): State<AppState>) -> Result<String> {
    let tours = state.repo.list_tours().await?;
    let entries = collect_latest(tours, state.store.as_ref()).await?;
    Ok(state.renderer.render_latest(&entries)?)
}

async fn tour_summary(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<String> {
    let tour = find_tour(&state, id).await?;
    let window = DateWindow::year_from(Local::now().date_naive());
    let slots = state.source.fetch(&tour, &window).await?;
    Ok(state.renderer.render_slots(&slots)?)
}

// ============================================================================
// Helpers
// ============================================================================

async fn find_tour(state: &AppState, id: Uuid) -> Result<Tour> {
    state
        .repo
        .get_tour(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("tour {id}")))
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

/// Run one update for a freshly written tour; failures are logged only
async fn refresh(state: &AppState, tour: &Tour) {
    match state.updater.update(tour, &state.cancel).await {
        Ok(Some(record)) => {
            state.metrics.record_update(OUTCOME_ADVANCED);
            tracing::info!(tour_id = %tour.id, date = %record.date(), "Availability recorded");
        }
        Ok(None) => state.metrics.record_update(OUTCOME_UNCHANGED),
        Err(e) => {
            state.metrics.record_update(OUTCOME_FAILED);
            tracing::warn!(tour_id = %tour.id, error = %e, "Error updating tour");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
