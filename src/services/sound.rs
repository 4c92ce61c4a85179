use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::process::Command;

use crate::domain::logger::EventLogger;
use crate::error::DingError;
use crate::services::audio::{AudioDevice, PlayerCommand};

/// Runs the chime script and the admin speaker test on the shared speaker.
pub struct SoundInvoker {
    script: PathBuf,
    python_bin: String,
    audio: Arc<AudioDevice>,
}

impl SoundInvoker {
    pub fn new(script: impl Into<PathBuf>, python_bin: impl Into<String>, audio: Arc<AudioDevice>) -> Self {
        Self {
            script: script.into(),
            python_bin: python_bin.into(),
            audio,
        }
    }

    pub async fn ring(&self) -> Result<(), DingError> {
        let script = match tokio::fs::canonicalize(&self.script).await {
            Ok(path) => path,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DingError::NotFound(self.script.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let status = self.audio.run(self.command_for(&script)).await?;
        if status.success() {
            Ok(())
        } else {
            // No exit code means the script died from a signal
            Err(DingError::CommandFailed(status.code().unwrap_or(-1)))
        }
    }

    fn command_for(&self, script: &Path) -> Command {
        let interpreter = match script.extension().and_then(|ext| ext.to_str()) {
            Some("py") => Some(self.python_bin.as_str()),
            Some("sh") => Some("sh"),
            _ => None,
        };

        let mut command = match interpreter {
            Some(interpreter) => {
                let mut command = Command::new(interpreter);
                command.arg(script);
                command
            }
            None => Command::new(script),
        };

        if let Some(dir) = script.parent() {
            command.current_dir(dir);
        }
        command
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerTest {
    Started,
    FileMissing,
}

/// Plays `file` once in the background; the caller does not wait for the
/// speaker to be free.
pub fn spawn_speaker_test(
    audio: Arc<AudioDevice>,
    logger: Arc<dyn EventLogger + Send + Sync>,
    player: &PlayerCommand,
    file: &Path,
) -> SpeakerTest {
    if !file.exists() {
        return SpeakerTest::FileMissing;
    }

    let command = player.command_for(file);
    tokio::spawn(async move {
        match audio.run(command).await {
            Ok(status) if status.success() => logger.log(None, "TEST_SOUND", "played"),
            Ok(status) => logger.log(None, "TEST_SOUND_FAILED", &format!("player exited with {status}")),
            Err(e) => logger.log(None, "TEST_SOUND_FAILED", &e.to_string()),
        }
    });

    SpeakerTest::Started
}
