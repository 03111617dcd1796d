use axum::{Json, extract::State};

use crate::error::Result;
use crate::license;
use crate::state::AppState;

use super::{LicenseStatus, get_license_status};

/// Restart the trial window from now. Only routed in dev mode.
pub async fn reset_trial(State(state): State<AppState>) -> Result<Json<LicenseStatus>> {
    license::reset_trial(&state.license).await?;
    tracing::info!("DEV: Trial window restarted");
    Ok(get_license_status(State(state)).await)
}
