use crate::domain::repositories::LogRepository;
use crate::domain::LogTail;
use std::error::Error;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::PathBuf;

/// Longest UTF-8 encoding of a single char.
const MAX_CHAR_BYTES: u64 = 4;

pub struct FileLogRepository {
    path: PathBuf,
}

impl FileLogRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn last_chars(content: &str, max_chars: usize) -> LogTail {
        let total = content.chars().count();
        if total <= max_chars {
            return LogTail::Content {
                text: content.to_string(),
                truncated: false,
            };
        }

        // Cut on a char boundary, not a byte offset
        let start = content
            .char_indices()
            .nth(total - max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        LogTail::Content {
            text: content[start..].to_string(),
            truncated: true,
        }
    }
}

impl LogRepository for FileLogRepository {
    fn tail(&self, max_chars: usize) -> Result<LogTail, Box<dyn Error + Send + Sync>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LogTail::Missing),
            Err(e) => return Err(e.into()),
        };

        // The log is never trimmed, only read the bytes that can hold the tail
        let len = file.metadata()?.len();
        let offset = len.saturating_sub((max_chars as u64).saturating_mul(MAX_CHAR_BYTES));
        file.seek(SeekFrom::Start(offset))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        // Drop the continuation bytes of a char the seek cut in half
        let split = bytes.iter().take_while(|&&b| b & 0xC0 == 0x80).count();
        let content = String::from_utf8_lossy(&bytes[split..]);

        let mut tail = Self::last_chars(&content, max_chars);
        if offset > 0 {
            if let LogTail::Content { truncated, .. } = &mut tail {
                *truncated = true;
            }
        }
        Ok(tail)
    }
}
