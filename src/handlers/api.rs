//! API routing group: health, readiness, version, public settings, currency conversion.

use crate::error::AppError;
use crate::response::success_one_ok;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ReadyBody {
    status: &'static str,
    database: &'static str,
}

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

pub async fn ready(State(state): State<AppState>) -> Result<Json<ReadyBody>, (StatusCode, Json<ReadyBody>)> {
    if let Err(e) = state.users.ping().await {
        tracing::warn!(error = %e, "readiness check failed");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: "unavailable",
            }),
        ));
    }
    Ok(Json(ReadyBody {
        status: "ok",
        database: "ok",
    }))
}

pub async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Settings safe to expose. Never includes the secret key or database URL.
#[derive(Serialize)]
pub struct PublicConfig {
    pub profile: String,
    pub coingecko_base_url: String,
    pub usd_to_inr: f64,
    pub prediction_days: Vec<u32>,
    pub max_predictions_per_day: u32,
}

/// GET /api/config
pub async fn public_config(State(state): State<AppState>) -> impl IntoResponse {
    let s = &state.settings;
    success_one_ok(PublicConfig {
        profile: s.profile.clone(),
        coingecko_base_url: s.coingecko_base_url.clone(),
        usd_to_inr: s.usd_to_inr,
        prediction_days: s.prediction_days.clone(),
        max_predictions_per_day: s.max_predictions_per_day,
    })
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub from: String,
}

fn default_currency() -> String {
    "usd".into()
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Conversion {
    pub from: &'static str,
    pub to: &'static str,
    pub amount: f64,
    pub converted: f64,
    pub rate: f64,
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Convert between USD and INR at the configured fixed rate.
pub fn convert(amount: f64, from: &str, usd_to_inr: f64) -> Result<Conversion, AppError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::Validation(
            "amount must be a non-negative number".into(),
        ));
    }
    match from.to_ascii_lowercase().as_str() {
        "usd" => Ok(Conversion {
            from: "usd",
            to: "inr",
            amount,
            converted: round_cents(amount * usd_to_inr),
            rate: usd_to_inr,
        }),
        "inr" => Ok(Conversion {
            from: "inr",
            to: "usd",
            amount,
            converted: round_cents(amount / usd_to_inr),
            rate: usd_to_inr,
        }),
        other => Err(AppError::Validation(format!(
            "unsupported currency: {} (expected usd or inr)",
            other
        ))),
    }
}

/// GET /api/convert?amount=&from=usd|inr
pub async fn convert_currency(
    State(state): State<AppState>,
    Query(q): Query<ConvertQuery>,
) -> Result<impl IntoResponse, AppError> {
    let conversion = convert(q.amount, &q.from, state.settings.usd_to_inr)?;
    Ok(success_one_ok(conversion))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_both_directions() {
        let c = convert(10.0, "usd", 83.12).unwrap();
        assert_eq!(c.to, "inr");
        assert_eq!(c.converted, 831.2);
        let c = convert(831.2, "INR", 83.12).unwrap();
        assert_eq!(c.to, "usd");
        assert_eq!(c.converted, 10.0);
    }

    #[test]
    fn rejects_bad_amounts_and_currencies() {
        assert!(convert(-1.0, "usd", 83.12).is_err());
        assert!(convert(f64::NAN, "usd", 83.12).is_err());
        assert!(convert(1.0, "eur", 83.12).is_err());
    }
}
