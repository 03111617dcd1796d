mod auth;
mod dev;
mod license;
mod settings;
mod views;

pub use auth::*;
pub use dev::*;
pub use license::*;
pub use settings::*;
pub use views::*;

use axum::{
    Json, Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::gate::{Route, require_unlocked};
use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Unknown paths go back to the dashboard.
async fn fallback() -> Redirect {
    Redirect::temporary(Route::Dashboard.path())
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(Route::Clients.path(), get(clients_view))
        .route(Route::Plans.path(), get(plans_view))
        .route(Route::Payables.path(), get(payables_view))
        .route(Route::Financials.path(), get(financials_view))
        .layer(middleware::from_fn_with_state(state.clone(), require_unlocked));

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/license", get(get_license_status))
        .route("/license/activate", post(activate_license))
        .route("/navigation", get(navigation))
        .route(Route::Dashboard.path(), get(dashboard_view))
        .route(Route::Messages.path(), get(messages_view))
        .route(Route::Settings.path(), get(get_settings).put(update_settings))
        .merge(protected);

    if state.dev_mode {
        tracing::warn!("Dev mode enabled: /dev endpoints are exposed");
        app = app.route("/dev/reset-trial", post(reset_trial));
    }

    app.fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
