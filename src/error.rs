use std::{path::PathBuf, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DingError {
    #[error("Your IP is blocked from using this button for {minutes} more minute(s).")]
    Blocked { minutes: i64 },

    #[error("cooldown {:.1}s", .cooldown.as_secs_f64())]
    RateLimited { cooldown: Duration },

    #[error("Script not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Script timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Script exited with {0}")]
    CommandFailed(i32),

    #[error("{0}")]
    Generic(String),
}

impl DingError {
    pub fn status(&self) -> StatusCode {
        match self {
            DingError::Blocked { .. } => StatusCode::FORBIDDEN,
            DingError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            DingError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            DingError::NotFound(_) | DingError::CommandFailed(_) | DingError::Generic(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<std::io::Error> for DingError {
    fn from(err: std::io::Error) -> Self {
        DingError::Generic(err.to_string())
    }
}

impl IntoResponse for DingError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "ok": false, "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
