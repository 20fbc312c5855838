//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::error;

use crate::donations;
use crate::errors::ApiError;
use crate::ledger;
use crate::models::{CampaignDetail, CampaignUpdate, NewCampaign};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct DonationRequest {
    pub amount: f64,
    pub donor: String,
}

#[derive(Serialize)]
pub struct CampaignsResponse {
    pub count: usize,
    pub campaigns: Vec<CampaignDetail>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a domain failure to its HTTP representation.
fn error_response(err: ApiError) -> Response {
    let status = match &err {
        ApiError::Validation { .. } | ApiError::InvalidState { .. } => StatusCode::BAD_REQUEST,
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            error!("Request failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /campaigns`
///
/// Returns all campaigns, newest first, each with its donations.
pub async fn list_campaigns(State(state): State<Arc<ApiState>>) -> Response {
    match ledger::list(&state.pool).await {
        Ok(campaigns) => {
            let count = campaigns.len();
            Json(CampaignsResponse { count, campaigns }).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// `GET /campaigns/:id`
pub async fn get_campaign(State(state): State<Arc<ApiState>>, Path(id): Path<i64>) -> Response {
    match ledger::get(&state.pool, id).await {
        Ok(detail) => Json(detail).into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /campaigns`
pub async fn create_campaign(
    State(state): State<Arc<ApiState>>,
    Json(input): Json<NewCampaign>,
) -> Response {
    match ledger::create(&state.pool, input).await {
        Ok(campaign) => (StatusCode::CREATED, Json(campaign)).into_response(),
        Err(e) => error_response(e),
    }
}

/// `PATCH /campaigns/:id`
pub async fn update_campaign(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(patch): Json<CampaignUpdate>,
) -> Response {
    match ledger::update(&state.pool, id, patch).await {
        Ok(campaign) => Json(campaign).into_response(),
        Err(e) => error_response(e),
    }
}

/// `DELETE /campaigns/:id`
pub async fn delete_campaign(State(state): State<Arc<ApiState>>, Path(id): Path<i64>) -> Response {
    match ledger::delete(&state.pool, id).await {
        Ok(()) => Json(serde_json::json!({ "message": "campaign deleted" })).into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /campaigns/:id/donations`
///
/// Records a donation and returns the updated campaign.
pub async fn record_donation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(req): Json<DonationRequest>,
) -> Response {
    match donations::record_donation(&state.pool, id, req.amount, &req.donor).await {
        Ok(campaign) => Json(campaign).into_response(),
        Err(e) => error_response(e),
    }
}
