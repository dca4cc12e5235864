pub mod stream;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{error, info, instrument};

use crate::{
    Result,
    config::StreamConfig,
    models::{TripPlan, TripRequest, TripResponse},
    planner::TripPlanner,
    settings::Settings,
    ui,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Planner used by the JSON and SSE endpoints
    pub planner: Arc<dyn TripPlanner>,
    /// Planner used by the HTML form; normally backed by a fallback model
    pub ui_planner: Arc<dyn TripPlanner>,
    pub stream: StreamConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/v1/health", get(health))
        .route("/api/v1/plan-trip", post(plan_trip))
        .route("/api/v1/stream-trip", post(stream::stream_trip))
        .route("/ws/stream", get(stream::ws_stream))
        .merge(ui::router())
        .with_state(state)
}

/// Key check first, then the date check
pub(crate) fn validate_request(settings: &Settings, request: TripRequest) -> Result<TripPlan> {
    settings.require_keys()?;
    TripPlan::try_from(request)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to VacAIgent API",
        "docs_url": "/planner",
        "endpoints": {
            "health": "GET /api/v1/health",
            "plan_trip": "POST /api/v1/plan-trip",
            "stream_trip": "POST /api/v1/stream-trip",
            "websocket": "GET /ws/stream",
            "planner": "GET /planner",
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[instrument(skip_all, fields(destination = %request.destination))]
async fn plan_trip(
    State(state): State<AppState>,
    Json(request): Json<TripRequest>,
) -> Result<Json<TripResponse>> {
    let trip = validate_request(&state.settings, request)?;
    info!(
        "Planning trip {} -> {} ({})",
        trip.origin, trip.destination, trip.dates
    );

    let response = match state.planner.plan(&trip, None).await {
        Ok(output) => TripResponse::success(output.to_string()),
        Err(e) => {
            error!("Trip planning failed: {}", e);
            TripResponse::failure(e)
        }
    };

    Ok(Json(response))
}
