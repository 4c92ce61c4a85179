use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::BlockedIpView;

// Wrapper struct for templates to implement IntoResponse
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!("Failed to render template: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to render template: {}", err),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub ip: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "logs.html")]
pub struct ConsoleTemplate {
    pub ip: String,
    pub message: Option<String>,
    pub uptime: String,
    pub blocks: Vec<BlockedIpView>,
    pub log: String,
}

pub fn format_uptime(secs: u64) -> String {
    let hrs = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{}h {}m {}s", hrs, mins, secs)
}
