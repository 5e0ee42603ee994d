//! Settings carried by a configuration profile.

use chrono::Duration;
use serde::Serialize;

pub const DEFAULT_SECRET_KEY: &str = "your-super-secret-key-change-in-production";
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/cryptoscore_pro";
pub const TESTING_DATABASE_URL: &str = "postgres://localhost:5432/cryptoscore_pro_test";
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const USD_TO_INR: f64 = 83.12;
pub const PREDICTION_DAYS: [u32; 3] = [1, 7, 30];
pub const MAX_PREDICTIONS_PER_DAY: u32 = 50;

/// `SameSite` attribute of the session cookie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// One resolved configuration profile. Built once per application instance.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Profile name this value was built from (e.g. "production").
    pub profile: String,
    pub debug: bool,
    pub testing: bool,
    pub secret_key: String,
    pub database_url: String,
    pub permanent_session_lifetime: Duration,
    pub session_cookie_secure: bool,
    pub session_cookie_httponly: bool,
    pub session_cookie_samesite: SameSite,
    pub coingecko_base_url: String,
    pub usd_to_inr: f64,
    /// Prediction horizons in days.
    pub prediction_days: Vec<u32>,
    pub max_predictions_per_day: u32,
    pub csrf_enabled: bool,
    /// Allowed CORS origins; `*` allows any origin.
    pub cors_origins: Vec<String>,
    pub bind_addr: String,
}

impl Settings {
    /// Values shared by every profile before profile-specific and environment overrides.
    pub(crate) fn base(profile: &str) -> Self {
        Settings {
            profile: profile.to_string(),
            debug: false,
            testing: false,
            secret_key: DEFAULT_SECRET_KEY.into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            permanent_session_lifetime: Duration::days(7),
            session_cookie_secure: false,
            session_cookie_httponly: true,
            session_cookie_samesite: SameSite::Lax,
            coingecko_base_url: COINGECKO_BASE_URL.into(),
            usd_to_inr: USD_TO_INR,
            prediction_days: PREDICTION_DAYS.to_vec(),
            max_predictions_per_day: MAX_PREDICTIONS_PER_DAY,
            csrf_enabled: true,
            cors_origins: vec!["*".into()],
            bind_addr: "127.0.0.1:5000".into(),
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }

    pub fn is_prediction_horizon(&self, days: u32) -> bool {
        self.prediction_days.contains(&days)
    }
}
