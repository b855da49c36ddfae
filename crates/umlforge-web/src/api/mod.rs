mod diagram;
mod nlp;

use axum::{Json, Router, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(nlp::router())
        .nest("/diagram", diagram::router())
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: &'static str,
    pub message: &'static str,
    pub uptime_secs: i64,
}

pub async fn service_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(ServiceHealth {
        status: "healthy",
        message: "UML Generator API is running",
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    })
}
