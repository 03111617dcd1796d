use axum::{Json, extract::State};

use crate::error::{AppError, Result};
use crate::models::AppSettings;
use crate::state::AppState;

/// Settings double as the license activation screen, so this stays
/// reachable while the gate is locked.
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<AppSettings>> {
    let settings = state.gateway.get_settings().await?;
    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(input): Json<AppSettings>,
) -> Result<Json<AppSettings>> {
    if input.company_name.trim().is_empty() {
        return Err(AppError::Validation("Company name is required".into()));
    }

    state.gateway.save_settings(&input).await?;
    tracing::info!("Settings updated");
    state.license.refresh().await?;

    Ok(Json(input))
}
