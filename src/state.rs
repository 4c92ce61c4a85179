use crate::config::Config;
use crate::domain::logger::EventLogger;
use crate::domain::repositories::LogRepository;
use crate::services::audio::{AudioDevice, PlayerCommand};
use crate::services::gate::{BlockList, Cooldown};
use crate::services::sound::SoundInvoker;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cooldown: Arc<Cooldown>,
    pub blocks: Arc<BlockList>,
    pub audio: Arc<AudioDevice>,
    pub invoker: Arc<SoundInvoker>,
    pub test_player: Option<PlayerCommand>,
    pub logger: Arc<dyn EventLogger + Send + Sync>,
    pub log_repository: Arc<dyn LogRepository>,
    pub start_time: Instant,
    pub key: Key,
}

impl AppState {
    pub fn new(
        config: Config,
        logger: Arc<dyn EventLogger + Send + Sync>,
        log_repository: Arc<dyn LogRepository>,
    ) -> Self {
        let audio = Arc::new(AudioDevice::new(config.command_timeout));
        let invoker = Arc::new(SoundInvoker::new(
            config.ding_script.clone(),
            config.python_bin.clone(),
            audio.clone(),
        ));

        Self {
            cooldown: Arc::new(Cooldown::new(config.cooldown)),
            blocks: Arc::new(BlockList::new(config.max_blocked_ips)),
            test_player: PlayerCommand::parse(&config.test_sound_player),
            key: session_key(&config.session_secret),
            config: Arc::new(config),
            audio,
            invoker,
            logger,
            log_repository,
            start_time: Instant::now(),
        }
    }
}

fn session_key(secret: &str) -> Key {
    if secret.len() >= 32 {
        Key::derive_from(secret.as_bytes())
    } else {
        tracing::warn!(
            "SESSION_SECRET shorter than 32 bytes, using a random key; admin sessions end on restart"
        );
        Key::generate()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}
