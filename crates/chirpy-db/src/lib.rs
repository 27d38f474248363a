pub mod error;
pub mod models;
pub mod queries;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

pub use error::{Result, StoreError};
pub use models::{Chirp, ChirpId, Document, RevokedToken, User, UserId};

/// File-backed record store.
///
/// The entire document lives in one JSON file. Every operation runs a full
/// load -> mutate -> write cycle while holding a single lock, so chirp, user
/// and revocation writes all serialize against each other and no reader ever
/// observes a half-written document.
pub struct Database {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Database {
    /// Open the store at `path`, writing an empty document if the file does
    /// not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        };

        {
            let _guard = db.guard()?;
            match db.load_unlocked() {
                Ok(_) => {}
                Err(StoreError::NotFound) => {
                    db.write_unlocked(&Document::default())?;
                    info!("Created empty database at {}", path.display());
                }
                Err(e) => return Err(e),
            }
        }

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Read the whole document.
    pub fn load(&self) -> Result<Document> {
        let _guard = self.guard()?;
        self.load_unlocked()
    }

    /// Overwrite the file with `document`.
    pub fn write(&self, document: &Document) -> Result<()> {
        let _guard = self.guard()?;
        self.write_unlocked(document)
    }

    /// Run a read-only closure against a freshly loaded document.
    pub fn with_document<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Document) -> Result<T>,
    {
        let _guard = self.guard()?;
        let document = self.load_unlocked()?;
        f(&document)
    }

    /// Load, mutate and persist the document as one critical section.
    /// Nothing is written if the closure fails.
    pub fn with_document_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let _guard = self.guard()?;
        let mut document = self.load_unlocked()?;
        let out = f(&mut document)?;
        self.write_unlocked(&document)?;
        Ok(out)
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn load_unlocked(&self) -> Result<Document> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    fn write_unlocked(&self, document: &Document) -> Result<()> {
        let data = serde_json::to_vec(document)?;

        // Write beside the target and rename over it.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &data)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Wrote {} bytes to {}", data.len(), self.path.display());
        Ok(())
    }
}
