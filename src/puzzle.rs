//! Puzzle data: tasks, datasets and where they come from
//!
//! A dataset is a JSON document, optionally gzip compressed, that is either
//! an object whose values are tasks or an array of tasks. Each task has an
//! `id`, a list of `train` pairs and a list of `test` pairs.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::image::Image;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pair {
    pub input: Image,
    #[serde(default)]
    pub output: Option<Image>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    pub train: Vec<Pair>,
    pub test: Vec<Pair>,
}

impl Task {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Rejects tasks that have nothing to solve
    pub fn validate(self) -> Result<Self> {
        if self.test.is_empty() {
            return Err(Error::NoTests(self.id));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: String,
    pub tasks: Vec<Task>,
}

impl Dataset {
    /// Parse dataset bytes, gzip detected by magic bytes
    pub fn from_bytes(id: &str, data: &[u8]) -> Result<Self> {
        let text = if data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b {
            let mut decoder = GzDecoder::new(data);
            let mut buf = Vec::new();
            decoder.read_to_end(&mut buf)?;
            buf
        } else {
            data.to_vec()
        };

        let tasks = match serde_json::from_slice::<Value>(&text)? {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| -> Result<Task> {
                    let mut task: Task = serde_json::from_value(value)?;
                    if task.id.is_empty() {
                        task.id = key;
                    }
                    Ok(task)
                })
                .collect::<Result<Vec<Task>>>()?,
            value => serde_json::from_value(value)?,
        };

        info!(dataset = id, tasks = tasks.len(), "dataset loaded");
        Ok(Self {
            id: id.to_string(),
            tasks,
        })
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }
}

/// Provides tasks by identifier
pub trait PuzzleSource {
    fn load_task(&self, task_id: &str) -> Result<Task>;
}

/// Tasks from a dataset directory, backed by a cache
pub struct DatasetSource<C: Cache> {
    dataset: String,
    dir: PathBuf,
    cache: C,
}

impl<C: Cache> DatasetSource<C> {
    pub fn new(dataset: impl Into<String>, dir: impl Into<PathBuf>, cache: C) -> Self {
        Self {
            dataset: dataset.into(),
            dir: dir.into(),
            cache,
        }
    }

    pub fn cache_key(&self) -> String {
        format!("dataset_{}_json_gz", self.dataset)
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        let key = self.cache_key();
        if let Some(bytes) = self.cache.get(&key) {
            return Ok(bytes);
        }
        debug!(key = %key, "no cached dataset");

        let candidates = [
            self.dir.join(format!("{}.json.gz", self.dataset)),
            self.dir.join(format!("{}.json", self.dataset)),
        ];
        let path = candidates
            .iter()
            .find(|path| path.exists())
            .ok_or_else(|| Error::DatasetNotFound {
                path: candidates[0].clone(),
            })?;
        let bytes = fs::read(path)?;
        self.cache.put(&key, &bytes)?;
        Ok(bytes)
    }

    pub fn load(&self) -> Result<Dataset> {
        Dataset::from_bytes(&self.dataset, &self.read_bytes()?)
    }
}

impl<C: Cache> PuzzleSource for DatasetSource<C> {
    fn load_task(&self, task_id: &str) -> Result<Task> {
        let dataset = self.load()?;
        let task = dataset
            .find_task(task_id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound {
                dataset: dataset.id.clone(),
                task: task_id.to_string(),
            })?;
        task.validate()
    }
}

/// A single task file
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PuzzleSource for FileSource {
    fn load_task(&self, task_id: &str) -> Result<Task> {
        let text = fs::read_to_string(&self.path)?;
        let mut task = Task::from_json(&text)?;
        if task.id.is_empty() {
            task.id = task_id.to_string();
        }
        task.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DirCache, NoCache};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    const TASK: &str = r#"{
        "id": "abc",
        "train": [{"input": [[0, 1]], "output": [[1, 0]]}],
        "test": [{"input": [[1, 1]], "output": [[1, 1]]}, {"input": [[0]]}]
    }"#;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn task_parses_pairs() {
        let task = Task::from_json(TASK).unwrap();
        assert_eq!(task.id, "abc");
        assert_eq!(task.train.len(), 1);
        assert_eq!(task.test[0].output, Some(Image::new(vec![vec![1, 1]]).unwrap()));
        assert_eq!(task.test[1].output, None);
    }

    #[test]
    fn task_without_tests_is_rejected() {
        let task = Task::from_json(r#"{"id": "x", "train": [], "test": []}"#).unwrap();
        assert!(matches!(task.validate(), Err(Error::NoTests(id)) if id == "x"));
    }

    #[test]
    fn dataset_from_array() {
        let text = format!("[{}]", TASK);
        let dataset = Dataset::from_bytes("ARC", text.as_bytes()).unwrap();
        assert!(dataset.find_task("abc").is_some());
        assert!(dataset.find_task("zzz").is_none());
    }

    #[test]
    fn dataset_from_gzipped_object() {
        let text = format!(r#"{{"first": {}, "second": {{"train": [], "test": []}}}}"#, TASK);
        let dataset = Dataset::from_bytes("ARC", &gzip(&text)).unwrap();
        assert_eq!(dataset.tasks.len(), 2);
        assert!(dataset.find_task("abc").is_some());
        // tasks without an id take their key
        assert!(dataset.find_task("second").is_some());
    }

    #[test]
    fn dataset_rejects_invalid_images() {
        let text = r#"[{"id": "bad", "train": [], "test": [{"input": [[1, 2], [3]]}]}]"#;
        assert!(Dataset::from_bytes("ARC", text.as_bytes()).is_err());
    }

    #[test]
    fn dataset_source_reads_and_caches() {
        let data_dir = tempdir().unwrap();
        let cache_dir = tempdir().unwrap();
        fs::write(data_dir.path().join("ARC.json.gz"), gzip(&format!("[{}]", TASK))).unwrap();

        let source = DatasetSource::new("ARC", data_dir.path(), DirCache::new(cache_dir.path()));
        assert_eq!(source.load_task("abc").unwrap().id, "abc");

        // served from the cache once the dataset file is gone
        fs::remove_file(data_dir.path().join("ARC.json.gz")).unwrap();
        assert_eq!(source.load_task("abc").unwrap().test.len(), 2);
    }

    #[test]
    fn dataset_source_missing_task_and_dataset() {
        let data_dir = tempdir().unwrap();
        fs::write(data_dir.path().join("ARC.json"), format!("[{}]", TASK)).unwrap();

        let source = DatasetSource::new("ARC", data_dir.path(), NoCache);
        assert!(matches!(
            source.load_task("nope"),
            Err(Error::TaskNotFound { task, .. }) if task == "nope"
        ));

        let missing = DatasetSource::new("Other", data_dir.path(), NoCache);
        assert!(matches!(missing.load_task("abc"), Err(Error::DatasetNotFound { .. })));
    }

    #[test]
    fn file_source_uses_given_id_when_missing() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"train": [], "test": [{"input": [[3]]}]}"#).unwrap();
        let task = FileSource::new(file.path()).load_task("local").unwrap();
        assert_eq!(task.id, "local");
    }
}
