use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod logger;
pub mod repositories;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
    pub ip: String,
    pub expires_at: DateTime<Utc>,
}

impl BlockEntry {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whole minutes left, rounded up the way the button page reports them.
    pub fn minutes_left(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0) / 60 + 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DingResponse {
    pub ok: bool,
}

/// What the admin console displays from the log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTail {
    Missing,
    Content { text: String, truncated: bool },
}

impl LogTail {
    pub fn render(&self) -> String {
        match self {
            LogTail::Missing => "No log file yet.".to_string(),
            LogTail::Content { text, truncated: true } => format!("...(truncated)...\n{text}"),
            LogTail::Content { text, truncated: false } => text.clone(),
        }
    }
}

/// Form posted to `/admin/logs`, both for login and for console actions.
#[derive(Debug, Default, Deserialize)]
pub struct AdminForm {
    pub password: Option<String>,
    pub action: Option<String>,
    pub ip: Option<String>,
    pub minutes: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct BlockedIpView {
    pub ip: String,
    pub minutes_left: i64,
}
