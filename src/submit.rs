use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::Result;
use crate::history::HistoryFile;

/// Accepts a finished history artifact for storage
pub trait SubmissionSink {
    fn submit(&self, file: &HistoryFile) -> Result<()>;
}

/// Writes each session's history into a directory. Later submissions of
/// the same session replace the earlier file.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, file: &HistoryFile) -> PathBuf {
        let stamp = file.start_time.format("%Y%m%dT%H%M%S");
        let name = format!("{}_{}_{}.json", file.dataset, file.task, stamp);
        self.dir.join(sanitize(&name))
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

impl SubmissionSink for DirectorySink {
    fn submit(&self, file: &HistoryFile) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        file.save(&self.path_for(file))
    }
}

/// One attempt, never retried. Failures are only logged so editing can go on.
pub fn submit_and_log(sink: &dyn SubmissionSink, file: &HistoryFile) -> bool {
    match sink.submit(file) {
        Ok(()) => {
            info!(task = %file.task, entries = file.history.len(), "history submitted");
            true
        }
        Err(e) => {
            error!(error = %e, task = %file.task, "history submission failed");
            false
        }
    }
}

/// Load a previously submitted history
pub fn load_history(path: &Path) -> Result<HistoryFile> {
    HistoryFile::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::history::{Summary, FILE_TYPE};
    use chrono::{TimeZone, Utc};
    use std::cell::Cell;
    use tempfile::tempdir;

    fn history_file() -> HistoryFile {
        HistoryFile {
            file_type: FILE_TYPE.to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap(),
            user: "tester".to_string(),
            dataset: "ARC".to_string(),
            task: "abc/def".to_string(),
            summary: Summary::default(),
            history: Vec::new(),
        }
    }

    #[test]
    fn directory_sink_names_file_by_session() {
        let dir = tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("history"));
        let file = history_file();
        assert_eq!(
            sink.path_for(&file),
            dir.path().join("history").join("ARC_abc_def_20240309T070501.json")
        );

        assert!(submit_and_log(&sink, &file));
        assert_eq!(load_history(&sink.path_for(&file)).unwrap(), file);
    }

    struct FailingSink {
        attempts: Cell<u32>,
    }

    impl SubmissionSink for FailingSink {
        fn submit(&self, _file: &HistoryFile) -> Result<()> {
            self.attempts.set(self.attempts.get() + 1);
            Err(Error::InvalidArgument("offline".to_string()))
        }
    }

    #[test]
    fn failure_is_reported_once() {
        let sink = FailingSink { attempts: Cell::new(0) };
        assert!(!submit_and_log(&sink, &history_file()));
        assert_eq!(sink.attempts.get(), 1);
    }
}
