use crate::domain::LogTail;
use std::error::Error;

pub trait LogRepository: Send + Sync {
    fn tail(&self, max_chars: usize) -> Result<LogTail, Box<dyn Error + Send + Sync>>;
}
