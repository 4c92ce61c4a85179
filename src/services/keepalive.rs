//! Keeps the speaker from powering down by playing a quiet, low tone on a
//! fixed interval.
//!
//! The tone is 1 s of a 20 Hz sine at amplitude 4000, mono 16-bit PCM at
//! 44.1 kHz. It is written once and reused on every tick.

use std::f64::consts::PI;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::logger::EventLogger;
use crate::services::audio::{AudioDevice, PlayerCommand};

pub const SAMPLE_RATE: u32 = 44_100;
pub const FREQUENCY_HZ: f64 = 20.0;
pub const AMPLITUDE: f64 = 4000.0;
pub const DURATION_SECS: f64 = 1.0;

const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

pub fn tone_samples() -> Vec<i16> {
    let count = (SAMPLE_RATE as f64 * DURATION_SECS) as usize;
    (0..count)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            (AMPLITUDE * (2.0 * PI * FREQUENCY_HZ * t).sin()) as i16
        })
        .collect()
}

pub fn write_wav<W: Write>(mut out: W, samples: &[i16]) -> io::Result<()> {
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = SAMPLE_RATE * block_align as u32;
    let data_len = (samples.len() * block_align as usize) as u32;

    out.write_all(b"RIFF")?;
    out.write_all(&(36 + data_len).to_le_bytes())?;
    out.write_all(b"WAVE")?;

    out.write_all(b"fmt ")?;
    out.write_all(&16u32.to_le_bytes())?;
    out.write_all(&1u16.to_le_bytes())?; // PCM
    out.write_all(&CHANNELS.to_le_bytes())?;
    out.write_all(&SAMPLE_RATE.to_le_bytes())?;
    out.write_all(&byte_rate.to_le_bytes())?;
    out.write_all(&block_align.to_le_bytes())?;
    out.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    out.write_all(b"data")?;
    out.write_all(&data_len.to_le_bytes())?;
    for sample in samples {
        out.write_all(&sample.to_le_bytes())?;
    }
    out.flush()
}

/// Writes the tone to `path` unless a file is already there. Returns whether
/// a new file was written.
pub fn ensure_tone(path: &Path) -> io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let file = std::fs::File::create(path)?;
    write_wav(io::BufWriter::new(file), &tone_samples())?;
    Ok(true)
}

pub struct Keepalive {
    pub wav_path: PathBuf,
    pub player: PlayerCommand,
    pub interval: Duration,
    pub audio: Arc<AudioDevice>,
    pub logger: Arc<dyn EventLogger + Send + Sync>,
}

impl Keepalive {
    /// Spawns the loop as a detached task; it only stops with the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        match tokio::task::spawn_blocking({
            let path = self.wav_path.clone();
            move || ensure_tone(&path)
        })
        .await
        {
            Ok(Ok(true)) => {
                tracing::info!("Generated keepalive sound at {}", self.wav_path.display());
            }
            Ok(Ok(false)) => {}
            Ok(Err(e)) => {
                tracing::error!("Failed to generate keepalive wav: {}", e);
                self.logger.log(None, "KEEPALIVE_FAILED", &format!("cannot generate tone: {e}"));
                return;
            }
            Err(e) => {
                tracing::error!("Keepalive tone task failed: {}", e);
                return;
            }
        }

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the first tone plays one interval in
        interval.tick().await;

        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    async fn tick(&self) {
        let command = self.player.command_for(&self.wav_path);
        match self.audio.run(command).await {
            Ok(status) if status.success() => {
                tracing::debug!("Keepalive sound played");
                self.logger.log(None, "KEEPALIVE", "played");
            }
            Ok(status) => {
                tracing::warn!("Keepalive player exited with {}", status);
                self.logger.log(None, "KEEPALIVE_FAILED", &format!("player exited with {status}"));
            }
            Err(e) => {
                tracing::warn!("Error playing keepalive sound: {}", e);
                self.logger.log(None, "KEEPALIVE_FAILED", &e.to_string());
            }
        }
    }
}
