use axum::{Json, extract::State};
use serde::Serialize;

use crate::gate::{AccessGate, GateDecision, Route};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub route: Route,
    pub label: &'static str,
}

fn view(route: Route) -> Json<ViewResponse> {
    Json(ViewResponse {
        route,
        label: route.label(),
    })
}

pub async fn dashboard_view() -> Json<ViewResponse> {
    view(Route::Dashboard)
}

pub async fn clients_view() -> Json<ViewResponse> {
    view(Route::Clients)
}

pub async fn plans_view() -> Json<ViewResponse> {
    view(Route::Plans)
}

pub async fn payables_view() -> Json<ViewResponse> {
    view(Route::Payables)
}

pub async fn financials_view() -> Json<ViewResponse> {
    view(Route::Financials)
}

pub async fn messages_view() -> Json<ViewResponse> {
    view(Route::Messages)
}

#[derive(Debug, Serialize)]
pub struct NavLink {
    pub path: &'static str,
    pub label: &'static str,
    pub locked: bool,
}

#[derive(Debug, Serialize)]
pub struct TrialBanner {
    pub time_left: String,
    pub expired: bool,
}

#[derive(Debug, Serialize)]
pub struct NavigationView {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Countdown, omitted once a license is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial: Option<TrialBanner>,
    pub locked: bool,
    pub links: Vec<NavLink>,
}

/// Sidebar model: links with their lock state and the trial countdown.
pub async fn navigation(State(state): State<AppState>) -> Json<NavigationView> {
    let snapshot = state.license.current();
    let trial = state.trial_status(&snapshot.license);
    let gate = AccessGate::new(&snapshot.license, &trial);

    let links = Route::ALL
        .into_iter()
        .map(|route| NavLink {
            path: route.path(),
            label: route.label(),
            locked: gate.decide(route) != GateDecision::Allow,
        })
        .collect();

    let banner = (!snapshot.license.is_active).then(|| TrialBanner {
        time_left: trial.time_left,
        expired: trial.is_expired,
    });

    Json(NavigationView {
        company_name: snapshot.settings.company_name,
        logo: snapshot.settings.logo,
        trial: banner,
        locked: gate.is_locked(),
        links,
    })
}
