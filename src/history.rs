//! Interaction history
//!
//! Every user action is appended to a [`HistoryLog`] together with the time
//! elapsed since the previous entry and a JSON context. Entries of actions
//! that touch the image carry the resulting pixel matrix under `"image"`,
//! so a session can be replayed without re-running any transform.
//!
//! The log is written out as a [`HistoryFile`]: session metadata, a summary
//! block and the entries in order.

use std::fs;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::image::Image;

pub const FILE_TYPE: &str = "ARC-Interactive history file";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub sequence_id: u64,
    pub milliseconds_since_last_entry: u64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl LogEntry {
    /// The image recorded in the context, if any
    pub fn image(&self) -> Option<Image> {
        let pixels = self.context.as_ref()?.get("image")?;
        serde_json::from_value(pixels.clone()).ok()
    }
}

/// Append-only record of user actions
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: Vec<LogEntry>,
    last_instant: Option<Instant>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, message: &str, context: Option<Value>) -> &LogEntry {
        self.log_at(Instant::now(), message, context)
    }

    /// Append an entry as if it happened at `now`
    pub fn log_at(&mut self, now: Instant, message: &str, context: Option<Value>) -> &LogEntry {
        let elapsed = self
            .last_instant
            .map(|last| now.saturating_duration_since(last).as_millis() as u64)
            .unwrap_or(0);
        self.last_instant = Some(now);

        let sequence_id = self.entries.len() as u64;
        debug!(sequence_id, elapsed, action = message, "history entry");
        self.entries.push(LogEntry {
            sequence_id,
            milliseconds_since_last_entry: elapsed,
            message: message.to_string(),
            context,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "history count")]
    pub history_count: usize,
    #[serde(rename = "reveal count")]
    pub reveal_count: usize,
    #[serde(rename = "start over count")]
    pub start_over_count: usize,
    #[serde(rename = "test solved count")]
    pub test_solved_count: usize,
    #[serde(rename = "test unsolved count")]
    pub test_unsolved_count: usize,
    #[serde(rename = "show overview count")]
    pub show_overview_count: usize,
}

/// The persisted history artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFile {
    pub file_type: String,
    pub start_time: DateTime<Utc>,
    pub user: String,
    pub dataset: String,
    pub task: String,
    pub summary: Summary,
    pub history: Vec<LogEntry>,
}

impl HistoryFile {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
