use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::warn;

use crate::errors::Result;

/// Persistence for the last observed snapshot. Loading is best-effort: losing
/// the snapshot only risks one duplicate notification after a restart.
pub trait SnapshotStore: Send {
    /// Last persisted snapshot, or `None` when nothing has been observed yet.
    fn load(&self) -> Option<String>;

    /// Overwrite the persisted snapshot.
    fn store(&mut self, snapshot: &str) -> Result<()>;
}

/// Snapshot persisted as a UTF-8 text file.
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read snapshot file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn store(&mut self, snapshot: &str) -> Result<()> {
        // Write a sibling file and rename it over the target so a reader never
        // observes a partial write.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, snapshot)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
