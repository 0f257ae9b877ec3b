//! Write-Ahead Logging (WAL) backed durable record store

use super::engine::{KeyUpdate, RecordStore};
use super::memory::scan_prefix;
use crate::core::{Result, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{Level, event};

pub const WAL_FILE_NAME: &str = "catalog.wal";
pub const SNAPSHOT_FILE_NAME: &str = "catalog.snapshot";
const SNAPSHOT_FORMAT_VERSION: u32 = 1;

// ============================================================================
// WAL Entry Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogEntry {
    Put { key: String, value: Vec<u8> },
    Delete { key: String },
}

impl LogEntry {
    fn apply(self, entries: &mut BTreeMap<String, Vec<u8>>) {
        match self {
            LogEntry::Put { key, value } => {
                entries.insert(key, value);
            }
            LogEntry::Delete { key } => {
                entries.remove(&key);
            }
        }
    }
}

// ============================================================================
// Durability Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// fsync after every log append
    #[default]
    Sync,
    /// flush to the OS, let it decide when to hit the disk
    Async,
    /// no log; state only survives an explicit checkpoint
    None,
}

impl FromStr for DurabilityMode {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "sync" => Ok(Self::Sync),
            "async" => Ok(Self::Async),
            "none" | "off" => Ok(Self::None),
            other => Err(format!(
                "unknown durability mode '{other}', expected one of: sync, async, none"
            )),
        }
    }
}

impl fmt::Display for DurabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Sync => "sync",
            Self::Async => "async",
            Self::None => "none",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FileStoreOptions {
    pub durability: DurabilityMode,
    /// Log entries accumulated before the log is folded into a snapshot.
    pub checkpoint_every: usize,
}

impl Default for FileStoreOptions {
    fn default() -> Self {
        Self {
            durability: DurabilityMode::Sync,
            checkpoint_every: 1000,
        }
    }
}

// ============================================================================
// WAL Manager
// ============================================================================

pub struct WalManager {
    wal_path: PathBuf,
    wal_file: Option<BufWriter<File>>,
    /// Length the log must be cut back to before the next append.
    truncate_to: Option<u64>,
    durability_mode: DurabilityMode,
    entries_since_checkpoint: usize,
}

impl WalManager {
    pub fn open<P: AsRef<Path>>(wal_path: P, durability_mode: DurabilityMode) -> Result<Self> {
        let wal_path = wal_path.as_ref().to_path_buf();
        let wal_file = if durability_mode != DurabilityMode::None {
            Some(BufWriter::new(Self::open_log(&wal_path)?))
        } else {
            None
        };

        Ok(Self {
            wal_path,
            wal_file,
            truncate_to: None,
            durability_mode,
            entries_since_checkpoint: 0,
        })
    }

    fn open_log(wal_path: &Path) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(wal_path)
            .map_err(|e| StoreError::unavailable(format!("Failed to open WAL file: {e}")))
    }

    /// The live writer, reopened if an earlier failure dropped it.
    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        let writer = match self.wal_file.take() {
            Some(writer) => writer,
            None => {
                let file = Self::open_log(&self.wal_path)?;
                if let Some(valid_len) = self.truncate_to {
                    file.set_len(valid_len)?;
                }
                self.truncate_to = None;
                BufWriter::new(file)
            }
        };
        Ok(self.wal_file.insert(writer))
    }

    /// Appends one frame. On error nothing of the frame stays in the log.
    pub fn append(&mut self, entry: &LogEntry) -> Result<()> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(());
        }
        let serialized = rmp_serde::to_vec(entry)
            .map_err(|e| StoreError::codec(self.wal_path.display().to_string(), e))?;
        let mut frame = Vec::with_capacity(4 + serialized.len());
        frame.extend_from_slice(&(serialized.len() as u32).to_le_bytes());
        frame.extend_from_slice(&serialized);

        let sync = self.durability_mode == DurabilityMode::Sync;
        let writer = self.writer()?;
        let frame_start = writer.get_ref().metadata()?.len();
        if let Err(err) = Self::write_frame(writer, &frame, sync) {
            self.discard_from(frame_start);
            return Err(err);
        }
        self.entries_since_checkpoint += 1;
        Ok(())
    }

    fn write_frame(writer: &mut BufWriter<File>, frame: &[u8], sync: bool) -> Result<()> {
        writer.write_all(frame)?;
        writer.flush()?;
        if sync {
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }

    /// Cuts the log back to `valid_len`, dropping bytes still buffered for a
    /// failed frame. If the cut itself fails it is retried before the next append.
    fn discard_from(&mut self, valid_len: u64) {
        let Some(writer) = self.wal_file.take() else {
            return;
        };
        let (file, _unwritten) = writer.into_parts();
        match file.set_len(valid_len) {
            Ok(()) => self.wal_file = Some(BufWriter::new(file)),
            Err(e) => {
                event!(
                    Level::WARN,
                    path = %self.wal_path.display(),
                    error = %e,
                    "failed to cut back WAL after a failed append"
                );
                self.truncate_to = Some(valid_len);
            }
        }
    }

    /// Reads every complete frame. A torn trailing frame left by a crash
    /// mid-append is cut off so later appends start on a frame boundary.
    pub fn recover(wal_path: &Path) -> Result<Vec<LogEntry>> {
        if !wal_path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(wal_path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();
        let mut valid_len = 0u64;
        loop {
            let mut len_bytes = [0u8; 4];
            match reader.read_exact(&mut len_bytes) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let len = u32::from_le_bytes(len_bytes) as usize;
            let mut data = vec![0u8; len];
            match reader.read_exact(&mut data) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let entry: LogEntry = rmp_serde::from_slice(&data)
                .map_err(|e| StoreError::codec(wal_path.display().to_string(), e))?;
            entries.push(entry);
            valid_len += 4 + len as u64;
        }

        if valid_len < file_len {
            event!(
                Level::WARN,
                path = %wal_path.display(),
                discarded_bytes = file_len - valid_len,
                "discarding torn WAL tail"
            );
            OpenOptions::new().write(true).open(wal_path)?.set_len(valid_len)?;
        }
        Ok(entries)
    }

    /// Empties the log after a snapshot has captured its entries.
    ///
    /// The old handle is never reused: on failure the writer is dropped and
    /// the next append reopens the log and empties it first.
    pub fn clear(&mut self) -> Result<()> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(());
        }
        self.wal_file = None;
        self.truncate_to = Some(0);
        self.entries_since_checkpoint = 0;
        self.writer()?;
        Ok(())
    }

    pub fn entries_since_checkpoint(&self) -> usize {
        self.entries_since_checkpoint
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub created_at: u64,
    pub entries: BTreeMap<String, Vec<u8>>,
}

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn save(&self, entries: &BTreeMap<String, Vec<u8>>) -> Result<()> {
        let dir = self
            .snapshot_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        let snapshot = StoreSnapshot {
            version: SNAPSHOT_FORMAT_VERSION,
            created_at,
            entries: entries.clone(),
        };
        let serialized = rmp_serde::to_vec(&snapshot)
            .map_err(|e| StoreError::codec(self.snapshot_path.display().to_string(), e))?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(&serialized)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| StoreError::unavailable(format!("Failed to replace snapshot: {e}")))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.snapshot_path)?;
        let snapshot: StoreSnapshot = rmp_serde::from_slice(&data)
            .map_err(|e| StoreError::codec(self.snapshot_path.display().to_string(), e))?;
        Ok(Some(snapshot))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }
}

// ============================================================================
// File-backed store
// ============================================================================

struct FileState {
    entries: BTreeMap<String, Vec<u8>>,
    wal: WalManager,
    snapshot: SnapshotManager,
    checkpoint_every: usize,
}

impl FileState {
    fn log(&mut self, entry: LogEntry) -> Result<()> {
        self.wal.append(&entry)?;
        entry.apply(&mut self.entries);
        if self.wal.entries_since_checkpoint() >= self.checkpoint_every {
            // The entry is already durable; a failed checkpoint is retried later.
            if let Err(e) = self.checkpoint() {
                event!(Level::WARN, error = %e, "store checkpoint failed");
            }
        }
        Ok(())
    }

    fn checkpoint(&mut self) -> Result<()> {
        self.snapshot.save(&self.entries)?;
        self.wal.clear()?;
        event!(Level::DEBUG, keys = self.entries.len(), "store checkpoint written");
        Ok(())
    }
}

/// Durable [`RecordStore`]: every write is appended to a log before it is
/// applied in memory; the log is periodically folded into a snapshot.
///
/// Log appends, fsyncs and snapshot writes are blocking file I/O done while
/// the state lock is held, so in `Sync` mode each write occupies a runtime
/// worker for the length of its fsync. Writes are serialized by that lock.
pub struct FileRecordStore {
    data_dir: PathBuf,
    state: Mutex<FileState>,
}

impl FileRecordStore {
    pub fn open<P: AsRef<Path>>(data_dir: P, options: FileStoreOptions) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|e| {
            StoreError::unavailable(format!(
                "Failed to create data directory '{}': {e}",
                data_dir.display()
            ))
        })?;

        let wal_path = data_dir.join(WAL_FILE_NAME);
        let snapshot = SnapshotManager::new(data_dir.join(SNAPSHOT_FILE_NAME));

        let mut entries = snapshot
            .load()?
            .map(|snapshot| snapshot.entries)
            .unwrap_or_default();
        let replayed = WalManager::recover(&wal_path)?;
        let replayed_count = replayed.len();
        for entry in replayed {
            entry.apply(&mut entries);
        }

        let wal = WalManager::open(&wal_path, options.durability)?;
        let mut state = FileState {
            entries,
            wal,
            snapshot,
            checkpoint_every: options.checkpoint_every.max(1),
        };
        if replayed_count > 0 && options.durability != DurabilityMode::None {
            state.checkpoint()?;
        }

        event!(
            Level::INFO,
            data_dir = %data_dir.display(),
            keys = state.entries.len(),
            replayed = replayed_count,
            durability = %options.durability,
            "record store opened"
        );

        Ok(Self {
            data_dir,
            state: Mutex::new(state),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Folds the log into a fresh snapshot.
    pub async fn checkpoint(&self) -> Result<()> {
        self.state.lock().await.checkpoint()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.state.lock().await.entries.get(key).cloned())
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let state = self.state.lock().await;
        Ok(keys.iter().map(|key| state.entries.get(key).cloned()).collect())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.state.lock().await.log(LogEntry::Put {
            key: key.to_string(),
            value,
        })
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.entries.contains_key(key) {
            return Ok(false);
        }
        state.log(LogEntry::Delete {
            key: key.to_string(),
        })?;
        Ok(true)
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        Ok(scan_prefix(&self.state.lock().await.entries, prefix))
    }

    async fn update(&self, key: &str, apply: KeyUpdate) -> Result<Option<Vec<u8>>> {
        let mut state = self.state.lock().await;
        let current = state.entries.get(key).map(Vec::as_slice);
        let next = apply(current)?;
        let entry = match &next {
            Some(value) => LogEntry::Put {
                key: key.to_string(),
                value: value.clone(),
            },
            None if state.entries.contains_key(key) => LogEntry::Delete {
                key: key.to_string(),
            },
            None => return Ok(None),
        };
        state.log(entry)?;
        Ok(next)
    }
}
