//! Persistence of the store
//!
//! The store is saved as one JSON document (see [`Snapshot`]) after every
//! change. [`SnapshotStore`] is the seam between the session and the storage:
//! [`JsonFileStore`] writes to disk, [`MemoryStore`] keeps the document in memory
//! for tests.

use crate::{Result, Snapshot, ThoughtBotError};
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Loads and saves whole snapshots.
pub trait SnapshotStore {
    /// Reads the saved snapshot. Returns `Ok(None)` if nothing has been saved yet.
    fn load(&self) -> Result<Option<Snapshot>>;

    /// Replaces the saved snapshot. Readers never observe a partially written
    /// snapshot.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Snapshot stored as a JSON file on disk.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = serde_json::from_str(&data)?;
        log::debug!("loaded {}", self.path.display());
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        // Write next to the target, then rename over it
        let mut temp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer(&mut temp, snapshot)?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        log::debug!(
            "saved {} entries to {}",
            snapshot.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-memory snapshot storage for testing.
///
/// Uses `RefCell` since thoughtbot is single-threaded, which lets the trait take
/// `&self` for saving.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RefCell<Option<Snapshot>>,
    saves: RefCell<usize>,
    simulate_write_error: RefCell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a snapshot
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::default();
        *store.snapshot.borrow_mut() = Some(snapshot);
        store
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// The last saved snapshot
    pub fn saved(&self) -> Option<Snapshot> {
        self.snapshot.borrow().clone()
    }

    /// How many times `save` succeeded
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        Ok(self.snapshot.borrow().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(ThoughtBotError::IoError(io::Error::new(
                io::ErrorKind::Other,
                "simulated write error",
            )));
        }
        *self.snapshot.borrow_mut() = Some(snapshot.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}
