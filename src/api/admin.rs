use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Form, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use chrono::Utc;

use crate::api::auth;
use crate::api::views::{format_uptime, ConsoleTemplate, HtmlTemplate, LoginTemplate};
use crate::domain::AdminForm;
use crate::services::sound::{spawn_speaker_test, SpeakerTest};
use crate::state::AppState;

pub const LOGS_PATH: &str = "/admin/logs";

pub async fn logs_page(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: SignedCookieJar,
) -> Response {
    let ip = addr.ip().to_canonical().to_string();

    if !auth::is_authenticated(&jar) {
        return HtmlTemplate(LoginTemplate { ip, error: None }).into_response();
    }

    render_console(&state, ip, None).await
}

pub async fn logs_submit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: SignedCookieJar,
    Form(form): Form<AdminForm>,
) -> Response {
    let ip = addr.ip().to_canonical().to_string();

    if !auth::is_authenticated(&jar) {
        return login_submit(&state, ip, jar, form);
    }

    let message = match form.action.as_deref() {
        Some("block") => Some(block_ip(&state, &ip, &form)),
        Some("test_sound") => Some(test_sound(&state, &ip)),
        _ => None,
    };

    render_console(&state, ip, message).await
}

fn login_submit(state: &AppState, ip: String, jar: SignedCookieJar, form: AdminForm) -> Response {
    let Some(password) = form.password.filter(|p| !p.is_empty()) else {
        return HtmlTemplate(LoginTemplate { ip, error: None }).into_response();
    };

    if auth::password_matches(&password, &state.config.log_password) {
        state.logger.log(Some(&ip), "ADMIN_LOGIN", "ok");
        let jar = auth::sign_in(jar, state.config.session_ttl_minutes);
        return (jar, Redirect::to(LOGS_PATH)).into_response();
    }

    tracing::warn!("Wrong admin password from {}", ip);
    state.logger.log(Some(&ip), "ADMIN_LOGIN_FAILED", "wrong password");
    (
        StatusCode::UNAUTHORIZED,
        HtmlTemplate(LoginTemplate {
            ip,
            error: Some("Wrong password.".to_string()),
        }),
    )
        .into_response()
}

fn block_ip(state: &AppState, admin_ip: &str, form: &AdminForm) -> String {
    // Stored in the same canonical form `/ding` derives from the peer address
    let target = form
        .ip
        .as_deref()
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
        .map(|ip| ip.to_canonical().to_string());
    let minutes = form
        .minutes
        .as_deref()
        .and_then(|m| m.trim().parse::<i64>().ok())
        .filter(|m| *m > 0);

    let (Some(target), Some(minutes)) = (target, minutes) else {
        return "Invalid IP or minutes.".to_string();
    };
    if state.blocks.block(&target, minutes, Utc::now()).is_none() {
        return "Invalid IP or minutes.".to_string();
    }

    tracing::info!("{} blocked {} for {} minute(s)", admin_ip, target, minutes);
    state.logger.log(
        Some(admin_ip),
        "ADMIN_BLOCK",
        &format!("{target} for {minutes} minute(s)"),
    );

    format!("Blocked {} for {} minute(s).", target, minutes)
}

fn test_sound(state: &AppState, admin_ip: &str) -> String {
    let Some(player) = &state.test_player else {
        return "No test sound player configured.".to_string();
    };

    match spawn_speaker_test(
        state.audio.clone(),
        state.logger.clone(),
        player,
        &state.config.test_sound_file,
    ) {
        SpeakerTest::Started => {
            state.logger.log(Some(admin_ip), "ADMIN_TEST_SOUND", "triggered");
            "Test sound triggered.".to_string()
        }
        SpeakerTest::FileMissing => "Test sound file not found.".to_string(),
    }
}

async fn render_console(state: &AppState, ip: String, message: Option<String>) -> Response {
    let repository = state.log_repository.clone();
    let max_chars = state.config.log_tail_chars;
    let tail = tokio::task::spawn_blocking(move || repository.tail(max_chars))
        .await
        .map_err(|e| e.to_string())
        .and_then(|read| read.map_err(|e| e.to_string()));

    let log = match tail {
        Ok(tail) => tail.render(),
        Err(e) => {
            tracing::error!("Failed to read log file: {}", e);
            format!("Failed to read log file: {e}")
        }
    };

    HtmlTemplate(ConsoleTemplate {
        ip,
        message,
        uptime: format_uptime(state.start_time.elapsed().as_secs()),
        blocks: state.blocks.active(Utc::now()),
        log,
    })
    .into_response()
}
