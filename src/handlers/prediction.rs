//! Prediction routing group: horizons, daily quota, and queued requests.

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::response::{success_many, success_one_ok, success_one_with};
use crate::service::{PredictionBody, PredictionService};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

/// GET /prediction/horizons
pub async fn horizons(State(state): State<AppState>) -> impl IntoResponse {
    success_one_ok(serde_json::json!({
        "prediction_days": state.settings.prediction_days,
    }))
}

/// GET /prediction/quota
pub async fn quota(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let status = PredictionService::quota(&state, &user.id, Utc::now()).await?;
    Ok(success_one_ok(status))
}

/// GET /prediction/requests — the caller's requests, newest first.
pub async fn list_requests(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.predictions.list_for_user(&user.id).await?;
    Ok(success_many(rows))
}

/// POST /prediction/requests — queue a request for the prediction engine.
pub async fn create_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<PredictionBody>,
) -> Result<impl IntoResponse, AppError> {
    let request = PredictionService::submit(&state, &user.id, body).await?;
    Ok(success_one_with(StatusCode::ACCEPTED, request))
}
