use axum::{Json, extract::State};

use crate::auth;
use crate::error::Result;
use crate::models::{LoginRequest, User};
use crate::state::AppState;

/// Log in; on first access the submitted password becomes the user's password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = auth::login(state.gateway.as_ref(), &input.username, &input.password).await?;
    Ok(Json(user))
}
