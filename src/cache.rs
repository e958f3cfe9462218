use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::Result;

/// Key to blob store used to avoid re-reading puzzle data
pub trait Cache {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// One file per key inside a directory
pub struct DirCache {
    dir: PathBuf,
}

impl DirCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(name)
    }
}

impl Cache for DirCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let bytes = fs::read(self.path(key)).ok()?;
        debug!(key, len = bytes.len(), "cache hit");
        Some(bytes)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), bytes)?;
        debug!(key, len = bytes.len(), "cache store");
        Ok(())
    }
}

/// Cache that never stores anything
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn put(&self, _key: &str, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }
}
