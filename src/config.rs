use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub ding_script: PathBuf,
    pub python_bin: String,
    pub cooldown: Duration,
    pub command_timeout: Duration,
    pub log_password: String,
    pub session_secret: String,
    pub session_ttl_minutes: i64,
    pub log_path: PathBuf,
    pub log_tail_chars: usize,
    pub max_blocked_ips: usize,
    pub keepalive_wav: PathBuf,
    pub keepalive_player: String,
    /// Zero disables the keepalive loop.
    pub keepalive_interval: Duration,
    pub test_sound_file: PathBuf,
    pub test_sound_player: String,
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            ding_script: PathBuf::from("./dingdong.py"),
            python_bin: "python3".to_string(),
            cooldown: Duration::from_millis(1500),
            command_timeout: Duration::from_secs(10),
            log_password: "123".to_string(),
            session_secret: String::new(),
            session_ttl_minutes: 720,
            log_path: PathBuf::from("app.log"),
            log_tail_chars: 8000,
            max_blocked_ips: 1024,
            keepalive_wav: PathBuf::from("keepalive.wav"),
            keepalive_player: "aplay".to_string(),
            keepalive_interval: Duration::from_secs(10),
            test_sound_file: PathBuf::from("test_sound.mp3"),
            test_sound_player: "mpg321 -q".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let defaults = Self::default();

        Self {
            port: try_load("PORT", defaults.port),
            ding_script: path("DING_SCRIPT", defaults.ding_script),
            python_bin: try_load("PYTHON_BIN", defaults.python_bin),
            cooldown: seconds("COOLDOWN_SEC", defaults.cooldown),
            command_timeout: seconds("CMD_TIMEOUT", defaults.command_timeout),
            log_password: secret("LOG_PASSWORD", defaults.log_password),
            session_secret: secret("SESSION_SECRET", defaults.session_secret),
            session_ttl_minutes: try_load("SESSION_TTL_MINUTES", defaults.session_ttl_minutes),
            log_path: path("LOG_PATH", defaults.log_path),
            log_tail_chars: try_load("LOG_TAIL_CHARS", defaults.log_tail_chars),
            max_blocked_ips: try_load("MAX_BLOCKED_IPS", defaults.max_blocked_ips),
            keepalive_wav: path("KEEPALIVE_WAV", defaults.keepalive_wav),
            keepalive_player: try_load("KEEPALIVE_PLAYER", defaults.keepalive_player),
            keepalive_interval: seconds("KEEPALIVE_INTERVAL_SEC", defaults.keepalive_interval),
            test_sound_file: path("TEST_SOUND_FILE", defaults.test_sound_file),
            test_sound_player: try_load("TEST_SOUND_PLAYER", defaults.test_sound_player),
            allowed_origins: var("ALLOWED_ORIGINS")
                .map(|origins| split_origins(&origins))
                .unwrap_or_default(),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = var(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

fn path(key: &str, default: PathBuf) -> PathBuf {
    var(key).map(PathBuf::from).unwrap_or_else(|| {
        info!("{key} not set, using default: {}", default.display());
        default
    })
}

fn secret(key: &str, default: String) -> String {
    var(key).unwrap_or_else(|| {
        warn!("{key} not set, using built-in default");
        default
    })
}

fn seconds(key: &str, default: Duration) -> Duration {
    let secs = try_load(key, default.as_secs_f64());
    Duration::try_from_secs_f64(secs).unwrap_or_else(|e| {
        warn!("Invalid {key} value {secs}: {e}, using default: {default:?}");
        default
    })
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
