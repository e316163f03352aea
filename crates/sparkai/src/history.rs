//! Conversation history persisted as JSON lines, one message per line.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{Message, Result};

pub struct HistoryStore {
    path: PathBuf,
    file: File,
}

impl HistoryStore {
    /// Open `path` for appending, creating it and its parent directories if
    /// needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "Opened history file");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, message: &Message) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    /// Every stored message, in order.
    ///
    /// Reading stops at the first line that is not a valid message; the
    /// messages before it are returned.
    pub fn read(&self) -> Result<Vec<Message>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut messages = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            match serde_json::from_str::<Message>(&line) {
                Ok(message) => messages.push(message),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        line = index + 1,
                        error = %e,
                        "Stopped reading history at unparseable line"
                    );
                    break;
                }
            }
        }
        Ok(messages)
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("path", &self.path)
            .finish()
    }
}
