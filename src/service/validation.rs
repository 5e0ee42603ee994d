//! Request validation for registration, login and prediction requests.

use crate::config::Settings;
use crate::error::AppError;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PredictionBody {
    pub coin_id: String,
    pub horizon_days: u32,
}

fn username_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{3,32}$").expect("static pattern"))
}

fn coin_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9-]{1,64}$").expect("static pattern"))
}

pub struct RequestValidator;

impl RequestValidator {
    pub fn registration(body: &RegisterBody) -> Result<(), AppError> {
        if !username_pattern().is_match(&body.username) {
            return Err(AppError::Validation(
                "username must be 3-32 letters, digits or underscores".into(),
            ));
        }
        let email = body.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(AppError::Validation("email is not a valid address".into())),
        }
        if body.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    /// Coin ids follow the CoinGecko slug format; horizons must be configured.
    pub fn prediction(body: &PredictionBody, settings: &Settings) -> Result<(), AppError> {
        if !coin_id_pattern().is_match(&body.coin_id) {
            return Err(AppError::Validation(format!(
                "coin_id is not a valid coin identifier: {}",
                body.coin_id
            )));
        }
        if !settings.is_prediction_horizon(body.horizon_days) {
            return Err(AppError::Validation(format!(
                "horizon_days must be one of {:?}",
                settings.prediction_days
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigRegistry;

    fn register(username: &str, email: &str, password: &str) -> RegisterBody {
        RegisterBody {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn registration_rules() {
        assert!(RequestValidator::registration(&register("satoshi", "s@example.com", "hunter2hunter2")).is_ok());
        assert!(RequestValidator::registration(&register("ab", "s@example.com", "longenough")).is_err());
        assert!(RequestValidator::registration(&register("has space", "s@example.com", "longenough")).is_err());
        assert!(RequestValidator::registration(&register("satoshi", "no-at-sign", "longenough")).is_err());
        assert!(RequestValidator::registration(&register("satoshi", "@example.com", "longenough")).is_err());
        assert!(RequestValidator::registration(&register("satoshi", "s@example.com", "short")).is_err());
    }

    #[test]
    fn prediction_rules_follow_configured_horizons() {
        let settings = ConfigRegistry::standard().select("testing", |_| None).unwrap();
        let ok = PredictionBody { coin_id: "bitcoin".into(), horizon_days: 7 };
        assert!(RequestValidator::prediction(&ok, &settings).is_ok());

        let bad_horizon = PredictionBody { coin_id: "bitcoin".into(), horizon_days: 3 };
        let err = RequestValidator::prediction(&bad_horizon, &settings).unwrap_err();
        assert!(err.to_string().contains("[1, 7, 30]"));

        let bad_coin = PredictionBody { coin_id: "Bit Coin".into(), horizon_days: 1 };
        assert!(RequestValidator::prediction(&bad_coin, &settings).is_err());
    }
}
