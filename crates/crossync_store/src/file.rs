//! File-backed record store.
//!
//! Layout of a store directory:
//!
//! ```text
//! <store_path>/
//! ├─ LOCK               # Advisory lock serializing every operation
//! ├─ records.cbor       # Identity and data tables
//! └─ records.cbor.tmp   # Transient, written then renamed over records.cbor
//! ```
//!
//! Unlike a database directory, the LOCK here is never held between
//! operations: any number of processes may open the same store, and each
//! operation takes the lock, reloads the tables, applies itself and (for
//! writes) saves before releasing. That makes every [`RecordStore`] call
//! atomic across processes.

use crossync_core::{EntityId, Record, RecordStore, StoreError, StoreResult, StoreTable, VersionToken};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk format version of `records.cbor`.
pub const FORMAT_VERSION: u16 = 1;

const LOCK_FILE: &str = "LOCK";
const TABLE_FILE: &str = "records.cbor";
const TABLE_TEMP: &str = "records.cbor.tmp";

/// A [`RecordStore`] persisted in a directory shared between processes.
///
/// # Thread Safety
///
/// Operations from threads of one process are serialized by an in-process
/// mutex before taking the file lock.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    local: Mutex<()>,
}

impl FileStore {
    /// Opens a store directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the store directory
    /// * `create_if_missing` - If true, creates the directory if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the directory is missing (and not created)
    /// or cannot be accessed, and `Corrupted` if an existing table file
    /// cannot be decoded.
    pub fn open(path: impl AsRef<Path>, create_if_missing: bool) -> StoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path).map_err(|e| unavailable(path, e))?;
            } else {
                return Err(StoreError::Unavailable(format!(
                    "store directory does not exist: {}",
                    path.display()
                )));
            }
        }
        if !path.is_dir() {
            return Err(StoreError::Unavailable(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let store = Self {
            path: path.to_path_buf(),
            local: Mutex::new(()),
        };
        // Validate the existing table up front rather than on first use.
        let table = store.read(|table| table.clone())?;
        info!(
            path = %path.display(),
            identities = table.identity_count(),
            records = table.record_count(),
            "opened file store"
        );
        Ok(store)
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a consistent copy of both tables.
    pub fn table(&self) -> StoreResult<StoreTable> {
        self.read(|table| table.clone())
    }

    /// Returns every stored record, ordered by entity id.
    pub fn records(&self) -> StoreResult<Vec<Record>> {
        self.read(StoreTable::records)
    }

    fn read<R>(&self, f: impl FnOnce(&StoreTable) -> R) -> StoreResult<R> {
        let _local = self.local.lock();
        let lock = self.open_lock_file()?;
        FileExt::lock_shared(&lock).map_err(|e| unavailable(&self.path, e))?;
        let result = self.load().map(|table| f(&table));
        FileExt::unlock(&lock).map_err(|e| unavailable(&self.path, e))?;
        result
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreTable) -> StoreResult<R>) -> StoreResult<R> {
        let _local = self.local.lock();
        let lock = self.open_lock_file()?;
        FileExt::lock_exclusive(&lock).map_err(|e| unavailable(&self.path, e))?;
        let result = self.load().and_then(|mut table| {
            let value = f(&mut table)?;
            self.save(&table)?;
            Ok(value)
        });
        FileExt::unlock(&lock).map_err(|e| unavailable(&self.path, e))?;
        result
    }

    fn open_lock_file(&self) -> StoreResult<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.path.join(LOCK_FILE))
            .map_err(|e| unavailable(&self.path, e))
    }

    fn load(&self) -> StoreResult<StoreTable> {
        let table_path = self.path.join(TABLE_FILE);
        let data = match fs::read(&table_path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoreTable::new()),
            Err(e) => return Err(unavailable(&table_path, e)),
        };
        if data.is_empty() {
            return Ok(StoreTable::new());
        }

        let (version, table): (u16, StoreTable) = ciborium::from_reader(data.as_slice())
            .map_err(|e| StoreError::Corrupted(format!("{}: {e}", table_path.display())))?;
        if version != FORMAT_VERSION {
            return Err(StoreError::Corrupted(format!(
                "unsupported format version {version}, expected {FORMAT_VERSION}"
            )));
        }
        Ok(table)
    }

    /// Saves the tables atomically (write temp, fsync, rename, fsync dir).
    fn save(&self, table: &StoreTable) -> StoreResult<()> {
        let mut data = Vec::new();
        ciborium::into_writer(&(FORMAT_VERSION, table), &mut data)
            .map_err(|e| StoreError::Corrupted(format!("encode failed: {e}")))?;

        let temp_path = self.path.join(TABLE_TEMP);
        let io_result = (|| -> io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
            drop(file);
            fs::rename(&temp_path, self.path.join(TABLE_FILE))?;
            self.sync_directory()
        })();
        io_result.map_err(|e| unavailable(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            bytes = data.len(),
            "saved record tables"
        );
        Ok(())
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> io::Result<()> {
        File::open(&self.path)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> io::Result<()> {
        // NTFS journals metadata; directory handles cannot be fsynced.
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn row_exists(&self, entity_id: EntityId) -> StoreResult<bool> {
        self.read(|table| table.row_exists(entity_id))
    }

    fn insert_row(&self, entity_id: EntityId) -> StoreResult<()> {
        self.write(|table| table.insert_row(entity_id).map(|_| ()))
    }

    fn read_record(&self, entity_id: EntityId) -> StoreResult<Option<Record>> {
        self.read(|table| table.read_record(entity_id))
    }

    fn record_exists(&self, entity_id: EntityId) -> StoreResult<bool> {
        self.read(|table| table.record_exists(entity_id))
    }

    fn insert_record(&self, record: &Record) -> StoreResult<()> {
        self.write(|table| table.insert_record(record))
    }

    fn update_record(&self, record: &Record) -> StoreResult<()> {
        self.write(|table| table.update_record(record))
    }

    fn update_record_if(
        &self,
        record: &Record,
        expected: Option<&VersionToken>,
    ) -> StoreResult<bool> {
        self.write(|table| table.update_record_if(record, expected))
    }
}

fn unavailable(path: &Path, err: io::Error) -> StoreError {
    StoreError::Unavailable(format!("{}: {err}", path.display()))
}
