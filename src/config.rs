use std::sync::Arc;

use anyhow::{Context, Result};
use sea_orm::Database;

use crate::otp::LogMailer;
use crate::schemas::AppState;

/// Default OTP lifetime when `OTP_TTL_MINUTES` is not set.
const DEFAULT_OTP_TTL_MINUTES: i64 = 10;

/// Initialize application state for the given database URL.
///
/// The JWT secret comes from the `JWT_SECRET` environment variable and
/// has no default; refusing to start beats signing tokens with a
/// well-known string.
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
    let otp_ttl_minutes = std::env::var("OTP_TTL_MINUTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_OTP_TTL_MINUTES);

    Ok(AppState {
        db,
        jwt_secret,
        otp_ttl_minutes,
        mailer: Arc::new(LogMailer),
    })
}
