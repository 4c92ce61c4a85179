use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;

use crate::api::views::{HtmlTemplate, IndexTemplate};
use crate::domain::DingResponse;
use crate::error::DingError;
use crate::state::AppState;

pub async fn index() -> impl IntoResponse {
    (
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        HtmlTemplate(IndexTemplate {}),
    )
}

pub async fn ding(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Json<DingResponse>, DingError> {
    let ip = addr.ip().to_canonical().to_string();

    if let Err(e) = state.blocks.check(&ip, Utc::now()) {
        state.logger.log(Some(&ip), "DING_BLOCKED", &e.to_string());
        return Err(e);
    }

    if let Err(e) = state.cooldown.try_press(Instant::now()) {
        state.logger.log(Some(&ip), "DING_COOLDOWN", &e.to_string());
        return Err(e);
    }

    match state.invoker.ring().await {
        Ok(()) => {
            state.logger.log(Some(&ip), "DING", "ok");
            Ok(Json(DingResponse { ok: true }))
        }
        Err(e) => {
            tracing::error!("Ding from {} failed: {}", ip, e);
            state.logger.log(Some(&ip), "DING_FAILED", &e.to_string());
            Err(e)
        }
    }
}
