use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Mutex;

use crate::error::DingError;

/// The speaker. Every playback goes through [`AudioDevice::run`], which holds
/// the device lock for the whole life of the child process.
pub struct AudioDevice {
    lock: Mutex<()>,
    timeout: Duration,
}

impl AudioDevice {
    pub fn new(timeout: Duration) -> Self {
        Self {
            lock: Mutex::new(()),
            timeout,
        }
    }

    pub async fn run(&self, mut command: Command) -> Result<ExitStatus, DingError> {
        command.stdin(Stdio::null()).kill_on_drop(true);

        let _device = self.lock.lock().await;
        let mut child = command.spawn()?;

        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill timed out player: {}", e);
                }
                Err(DingError::Timeout(self.timeout))
            }
        }
    }
}

/// An external player such as `aplay` or `mpg321 -q`, configured as a single
/// whitespace separated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    program: String,
    args: Vec<String>,
}

impl PlayerCommand {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn command_for(&self, file: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(file)
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}
