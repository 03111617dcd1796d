//! Access gate: decides which dashboard areas are reachable given the
//! license record and the trial countdown.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use crate::models::LicenseState;
use crate::state::AppState;
use crate::trial::TrialStatus;

/// Locked once the trial is over, unless a license is active.
pub fn is_locked(is_expired: bool, is_active: bool) -> bool {
    is_expired && !is_active
}

/// Dashboard areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Dashboard,
    Clients,
    Plans,
    Payables,
    Financials,
    Messages,
    Settings,
}

impl Route {
    /// In navigation order.
    pub const ALL: [Route; 7] = [
        Route::Dashboard,
        Route::Clients,
        Route::Plans,
        Route::Payables,
        Route::Financials,
        Route::Messages,
        Route::Settings,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Clients => "/clients",
            Route::Plans => "/plans",
            Route::Payables => "/payables",
            Route::Financials => "/financials",
            Route::Messages => "/messages",
            Route::Settings => "/settings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::Clients => "Clients",
            Route::Plans => "Plans",
            Route::Payables => "Payables",
            Route::Financials => "Due Dates",
            Route::Messages => "Message Templates",
            Route::Settings => "Settings",
        }
    }

    /// Protected areas are unreachable while the gate is locked.
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            Route::Clients | Route::Plans | Route::Payables | Route::Financials
        )
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        Route::ALL.into_iter().find(|r| r.path() == trimmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(Route),
}

/// One evaluation of the gate. Build a new one per request so it always
/// reflects the latest license and timer output.
#[derive(Debug, Clone, Copy)]
pub struct AccessGate {
    locked: bool,
}

impl AccessGate {
    pub fn new(license: &LicenseState, trial: &TrialStatus) -> Self {
        Self {
            locked: is_locked(trial.is_expired, license.is_active),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn decide(&self, route: Route) -> GateDecision {
        if self.locked && route.is_protected() {
            GateDecision::Redirect(Route::Settings)
        } else {
            GateDecision::Allow
        }
    }
}

/// Middleware for protected routes: redirects to settings while locked.
pub async fn require_unlocked(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(route) = Route::from_path(request.uri().path()) else {
        return next.run(request).await;
    };

    match state.gate().decide(route) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::Redirect(target) => {
            tracing::debug!("Gate locked, redirecting {} to {}", route.path(), target.path());
            Redirect::temporary(target.path()).into_response()
        }
    }
}
