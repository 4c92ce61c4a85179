use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use crate::domain::logger::EventLogger;
use chrono::Local;

pub struct FileLogger {
    file: Mutex<File>,
}

impl FileLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn format_line(timestamp: &str, ip: Option<&str>, action: &str, detail: &str) -> String {
        // One event per line, commas belong to the separator only
        let detail = detail.replace(['\n', '\r'], " ").replace(',', ";");
        format!("{},{},{},{}", timestamp, ip.unwrap_or("-"), action, detail)
    }
}

impl EventLogger for FileLogger {
    fn log(&self, ip: Option<&str>, action: &str, detail: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S %z").to_string();
        let line = Self::format_line(&timestamp, ip, action, detail);

        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(file, "{}", line) {
            tracing::error!("Failed to write to log: {}", e);
        }
    }
}
