use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use doorbell::{
    build_router,
    config::Config,
    infrastructure::file_logger::FileLogger,
    repositories::log_repository::FileLogRepository,
    state::AppState,
};

const PASSWORD: &str = "letmein";

fn test_config(dir: &Path) -> Config {
    Config {
        ding_script: dir.join("ding.sh"),
        log_path: dir.join("app.log"),
        cooldown: Duration::from_millis(1500),
        command_timeout: Duration::from_secs(5),
        log_password: PASSWORD.to_string(),
        session_secret: "s".repeat(64),
        test_sound_file: dir.join("test_sound.mp3"),
        test_sound_player: "true".to_string(),
        keepalive_interval: Duration::ZERO,
        ..Config::default()
    }
}

fn app_with(config: Config) -> (Router, AppState) {
    let logger = Arc::new(FileLogger::new(&config.log_path).unwrap());
    let repo = Arc::new(FileLogRepository::new(config.log_path.clone()));
    let state = AppState::new(config, logger, repo);
    (build_router(state.clone()), state)
}

fn app_with_script(dir: &Path, body: &str) -> (Router, AppState) {
    std::fs::write(dir.join("ding.sh"), body).unwrap();
    app_with(test_config(dir))
}

fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

async fn send(app: &Router, builder: axum::http::request::Builder, ip: [u8; 4], body: Body) -> Response<Body> {
    let mut req = builder.body(body).unwrap();
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((ip, 50000))));
    app.clone().oneshot(req).await.unwrap()
}

async fn ding(app: &Router, ip: [u8; 4]) -> Response<Body> {
    send(app, request("POST", "/ding"), ip, Body::empty()).await
}

async fn admin_post(app: &Router, cookie: Option<&str>, form: &str) -> Response<Body> {
    let mut builder = request("POST", "/admin/logs")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder, ADMIN_IP, Body::from(form.to_string())).await
}

async fn admin_get(app: &Router, cookie: Option<&str>) -> Response<Body> {
    let mut builder = request("GET", "/admin/logs");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder, ADMIN_IP, Body::empty()).await
}

async fn body_string(res: Response<Body>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn login(app: &Router) -> String {
    let res = admin_post(app, None, &format!("password={PASSWORD}")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    res.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("login sets a session cookie")
}

const ADMIN_IP: [u8; 4] = [192, 168, 1, 2];
const VISITOR: [u8; 4] = [10, 0, 0, 7];
const OTHER_VISITOR: [u8; 4] = [10, 0, 0, 8];

#[tokio::test]
async fn test_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with(test_config(dir.path()));

    let res = send(&app, request("GET", "/health"), VISITOR, Body::empty()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_string(res).await, "OK");
}

#[tokio::test]
async fn test_button_page_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with(test_config(dir.path()));

    let res = send(&app, request("GET", "/"), VISITOR, Body::empty()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CACHE_CONTROL], "no-store");
    assert!(body_string(res).await.contains("DING DONG"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_ding_then_cooldown() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with_script(dir.path(), "exit 0\n");

    let res = ding(&app, VISITOR).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(body["ok"], true);

    // The cooldown is global, a different caller is throttled too
    let res = ding(&app, OTHER_VISITOR).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "cooldown 1.5s");
}

#[cfg(unix)]
#[tokio::test]
async fn test_concurrent_dings_accept_one() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with_script(dir.path(), "exit 0\n");

    let presses = (0..5u8).map(|i| {
        let app = app.clone();
        tokio::spawn(async move { ding(&app, [10, 0, 1, i]).await.status() })
    });

    let mut accepted = 0;
    for press in presses {
        if press.await.unwrap() == StatusCode::OK {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_blocked_ip_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app_with_script(dir.path(), "exit 0\n");
    state.blocks.block("10.0.0.7", 10, chrono::Utc::now());

    let res = ding(&app, VISITOR).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(body_string(res).await.contains("blocked"));

    // A blocked press does not consume the cooldown
    let res = ding(&app, OTHER_VISITOR).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_script_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with(test_config(dir.path()));

    let res = ding(&app, VISITOR).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(res).await.contains("Script not found"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_script_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with_script(dir.path(), "exit 3\n");

    let res = ding(&app, VISITOR).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(res).await.contains("Script exited with 3"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_hung_script_is_gateway_timeout() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ding.sh"), "sleep 5\n").unwrap();
    let (app, _) = app_with(Config {
        command_timeout: Duration::from_millis(200),
        ..test_config(dir.path())
    });

    let res = ding(&app, VISITOR).await;
    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_admin_requires_password() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with(test_config(dir.path()));

    let page = body_string(admin_get(&app, None).await).await;
    assert!(page.contains("Admin Login"));
    assert!(page.contains("192.168.1.2"));

    let res = admin_post(&app, None, "password=wrong").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let page = body_string(res).await;
    assert!(page.contains("Wrong password."));
    assert!(!page.contains("Admin Logs"));
}

#[tokio::test]
async fn test_admin_login_shows_console() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with(test_config(dir.path()));

    let cookie = login(&app).await;
    let res = admin_get(&app, Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let page = body_string(res).await;
    assert!(page.contains("Admin Logs"));
    assert!(page.contains("ADMIN_LOGIN"));
}

#[tokio::test]
async fn test_session_survives_restart_with_same_secret() {
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();
    let (before, _) = app_with(test_config(first_dir.path()));
    let (after, _) = app_with(test_config(second_dir.path()));

    let cookie = login(&before).await;
    let page = body_string(admin_get(&after, Some(&cookie)).await).await;
    assert!(page.contains("Admin Logs"));

    let (rekeyed, _) = app_with(Config {
        session_secret: "t".repeat(64),
        ..test_config(second_dir.path())
    });
    let page = body_string(admin_get(&rekeyed, Some(&cookie)).await).await;
    assert!(page.contains("Admin Login"));
}

#[tokio::test]
async fn test_forged_cookie_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with(test_config(dir.path()));

    let page = body_string(admin_get(&app, Some("logs_authenticated=true")).await).await;
    assert!(page.contains("Admin Login"));
}

#[tokio::test]
async fn test_unauthenticated_actions_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app_with(test_config(dir.path()));

    let page = body_string(admin_post(&app, None, "action=block&ip=10.0.0.7&minutes=5").await).await;
    assert!(page.contains("Admin Login"));
    assert!(state.blocks.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_admin_blocks_ip() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with_script(dir.path(), "exit 0\n");
    let cookie = login(&app).await;

    let page = body_string(
        admin_post(&app, Some(&cookie), "action=block&ip=+10.0.0.7+&minutes=5").await,
    )
    .await;
    assert!(page.contains("Blocked 10.0.0.7 for 5 minute(s)."));
    assert!(page.contains("10.0.0.7 - "));

    let res = ding(&app, VISITOR).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[cfg(unix)]
#[tokio::test]
async fn test_admin_block_matches_canonical_address() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with_script(dir.path(), "exit 0\n");
    let cookie = login(&app).await;

    let page = body_string(
        admin_post(&app, Some(&cookie), "action=block&ip=%3A%3AFFFF%3A10.0.0.7&minutes=5").await,
    )
    .await;
    assert!(page.contains("Blocked 10.0.0.7 for 5 minute(s)."));

    let res = ding(&app, VISITOR).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_rejects_invalid_block() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app_with(test_config(dir.path()));
    let cookie = login(&app).await;

    for form in [
        "action=block&ip=&minutes=5",
        "action=block&ip=10.0.0.7&minutes=0",
        "action=block&ip=10.0.0.7&minutes=soon",
        "action=block&ip=10.0.0.7&minutes=200000000000",
        "action=block&ip=10.0.0.7&minutes=9223372036854775807",
        "action=block&ip=not-an-ip&minutes=5",
    ] {
        let page = body_string(admin_post(&app, Some(&cookie), form).await).await;
        assert!(page.contains("Invalid IP or minutes."), "form {form}");
    }
    assert!(state.blocks.is_empty());
}

#[tokio::test]
async fn test_speaker_test_needs_the_sound_file() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with(test_config(dir.path()));
    let cookie = login(&app).await;

    let page = body_string(admin_post(&app, Some(&cookie), "action=test_sound").await).await;
    assert!(page.contains("Test sound file not found."));

    std::fs::write(dir.path().join("test_sound.mp3"), b"ID3").unwrap();
    let page = body_string(admin_post(&app, Some(&cookie), "action=test_sound").await).await;
    assert!(page.contains("Test sound triggered."));
}

#[cfg(unix)]
#[tokio::test]
async fn test_console_shows_ding_events() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with_script(dir.path(), "exit 0\n");

    assert_eq!(ding(&app, VISITOR).await.status(), StatusCode::OK);
    assert_eq!(ding(&app, VISITOR).await.status(), StatusCode::TOO_MANY_REQUESTS);

    let cookie = login(&app).await;
    let page = body_string(admin_get(&app, Some(&cookie)).await).await;
    assert!(page.contains("10.0.0.7,DING,ok"));
    assert!(page.contains("10.0.0.7,DING_COOLDOWN"));
}
