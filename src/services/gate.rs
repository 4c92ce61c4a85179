//! Admission checks for `/ding`: the per-IP block list and the global
//! press cooldown.
//!
//! Both take the current time as an argument so the handlers pass
//! `Utc::now()` / `Instant::now()` and tests can step through time.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::{BlockEntry, BlockedIpView};
use crate::error::DingError;

pub struct Cooldown {
    window: Duration,
    last_press: Mutex<Option<Instant>>,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_press: Mutex::new(None),
        }
    }

    /// Accepts a press and records `now`, or rejects it while the previous
    /// accepted press is still inside the window.
    pub fn try_press(&self, now: Instant) -> Result<(), DingError> {
        let mut last = self.last_press.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(prev) = *last {
            if now.saturating_duration_since(prev) < self.window {
                return Err(DingError::RateLimited {
                    cooldown: self.window,
                });
            }
        }

        *last = Some(now);
        Ok(())
    }
}

pub struct BlockList {
    capacity: usize,
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl BlockList {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Blocks `ip` until `now + minutes`, replacing any earlier block.
    /// Returns `None` when the expiry does not fit in a timestamp.
    pub fn block(&self, ip: &str, minutes: i64, now: DateTime<Utc>) -> Option<BlockEntry> {
        let expires_at = TimeDelta::try_minutes(minutes).and_then(|d| now.checked_add_signed(d))?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        entries.retain(|_, until| now < *until);

        if !entries.contains_key(ip) && entries.len() >= self.capacity {
            let soonest = entries
                .iter()
                .min_by_key(|(_, until)| **until)
                .map(|(ip, _)| ip.clone());
            if let Some(evicted) = soonest {
                tracing::warn!("Block list full, dropping block on {}", evicted);
                entries.remove(&evicted);
            }
        }

        entries.insert(ip.to_string(), expires_at);

        Some(BlockEntry {
            ip: ip.to_string(),
            expires_at,
        })
    }

    pub fn check(&self, ip: &str, now: DateTime<Utc>) -> Result<(), DingError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let Some(&expires_at) = entries.get(ip) else {
            return Ok(());
        };

        let entry = BlockEntry {
            ip: ip.to_string(),
            expires_at,
        };
        if entry.is_active(now) {
            return Err(DingError::Blocked {
                minutes: entry.minutes_left(now),
            });
        }

        entries.remove(ip);
        Ok(())
    }

    /// Drops expired entries and lists the rest, soonest expiry first.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<BlockedIpView> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, until| now < *until);

        let mut active: Vec<BlockEntry> = entries
            .iter()
            .map(|(ip, until)| BlockEntry {
                ip: ip.clone(),
                expires_at: *until,
            })
            .collect();
        active.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then_with(|| a.ip.cmp(&b.ip)));

        active
            .into_iter()
            .map(|entry| BlockedIpView {
                minutes_left: entry.minutes_left(now),
                ip: entry.ip,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
