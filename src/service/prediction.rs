//! Daily quota accounting and submission of prediction requests.

use crate::error::AppError;
use crate::models::{quota_window, NewPredictionRequest, PredictionRequest};
use crate::service::validation::{PredictionBody, RequestValidator};
use crate::state::AppState;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct QuotaStatus {
    pub limit: u32,
    pub used: u64,
    pub remaining: u64,
    pub resets_at: DateTime<Utc>,
}

pub struct PredictionService;

impl PredictionService {
    pub async fn quota(
        state: &AppState,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<QuotaStatus, AppError> {
        let (start, resets_at) = quota_window(now);
        let used = state.predictions.count_since(user_id, start).await?;
        let limit = state.settings.max_predictions_per_day;
        Ok(QuotaStatus {
            limit,
            used,
            remaining: u64::from(limit).saturating_sub(used),
            resets_at,
        })
    }

    /// Validate, check the daily quota, and queue the request as pending.
    pub async fn submit(
        state: &AppState,
        user_id: &str,
        body: PredictionBody,
    ) -> Result<PredictionRequest, AppError> {
        RequestValidator::prediction(&body, &state.settings)?;
        let (start, _) = quota_window(Utc::now());
        let limit = state.settings.max_predictions_per_day;
        let request = state
            .predictions
            .create_within_limit(
                NewPredictionRequest {
                    user_id: user_id.to_string(),
                    coin_id: body.coin_id,
                    horizon_days: body.horizon_days,
                },
                start,
                limit,
            )
            .await?
            .ok_or(AppError::QuotaExceeded { limit })?;
        tracing::info!(
            user_id = %user_id,
            coin_id = %request.coin_id,
            horizon_days = request.horizon_days,
            "prediction request queued"
        );
        Ok(request)
    }
}
