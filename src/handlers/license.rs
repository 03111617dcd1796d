use axum::{Json, extract::State};
use serde::Serialize;

use crate::error::Result;
use crate::gate::AccessGate;
use crate::license;
use crate::models::{ActivateLicense, LicensePlan};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LicenseStatus {
    pub time_left: String,
    pub is_expired: bool,
    pub is_locked: bool,
    pub is_active: bool,
    pub is_trial: bool,
    pub plan_type: LicensePlan,
    pub trial_start_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_date: Option<i64>,
}

pub async fn get_license_status(State(state): State<AppState>) -> Json<LicenseStatus> {
    let snapshot = state.license.current();
    let trial = state.trial_status(&snapshot.license);
    let is_locked = AccessGate::new(&snapshot.license, &trial).is_locked();
    let license = snapshot.license;

    Json(LicenseStatus {
        time_left: trial.time_left,
        is_expired: trial.is_expired,
        is_locked,
        is_active: license.is_active,
        is_trial: license.is_trial,
        plan_type: license.plan_type,
        trial_start_date: license.trial_start_date,
        activation_date: license.activation_date,
    })
}

pub async fn activate_license(
    State(state): State<AppState>,
    Json(input): Json<ActivateLicense>,
) -> Result<Json<LicenseStatus>> {
    license::activate(&state.license, &input).await?;
    Ok(get_license_status(State(state)).await)
}
