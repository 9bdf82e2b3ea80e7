//! JSON snapshot store for player records.
//!
//! The whole player collection lives in one JSON document. Every operation
//! loads the full snapshot from disk, mutates it in memory and writes it back
//! with a temp file + atomic rename. A sidecar `<file>.lock` guarded with
//! `fs2` locks (shared for reads, exclusive for read-modify-write) keeps
//! separate processes from interleaving; inside one process all access should
//! go through [`crate::game::actor::StoreHandle`].
//!
//! Missing, empty or unparsable snapshots load as an empty database. A corrupt
//! file is copied aside to `<file>.corrupt-<timestamp>` (once per distinct
//! content) before a write can replace it. Read errors other than a missing
//! file abort writes instead of replacing the snapshot.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use log::{debug, warn};

use crate::game::errors::GameError;
use crate::game::types::{Database, Item, PlayerRecord};

/// File-backed player record store.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl RecordStore {
    /// Open the store at `path`, creating the parent directory if needed.
    /// The snapshot file itself is created lazily on first save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, GameError> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".lock");
        Ok(Self {
            path,
            lock_path: PathBuf::from(lock_name),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> Result<File, GameError> {
        Ok(OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)?)
    }

    /// Return the full snapshot. Never fails: absent, unreadable or corrupt
    /// data loads as empty. Nothing is written or copied on this path.
    pub fn load(&self) -> Database {
        let lock = self.lock_file().ok();
        if let Some(ref f) = lock {
            let _ = f.lock_shared();
        }
        let db = match self.read_snapshot() {
            Ok(db) => db,
            Err(e) => {
                warn!("{} ({:?}); continuing with an empty database", e, self.path);
                Database::default()
            }
        };
        if let Some(f) = lock {
            let _ = f.unlock();
        }
        db
    }

    /// Persist the full snapshot, overwriting prior content. A corrupt file is
    /// quarantined first.
    pub fn save(&self, db: &Database) -> Result<(), GameError> {
        let lock = self.lock_file()?;
        lock.lock_exclusive()?;
        let result = self.preserve_corrupt().and_then(|_| self.write_snapshot(db));
        let _ = lock.unlock();
        result
    }

    /// Load → mutate → save under one exclusive lock. The snapshot is written
    /// only when `mutate` succeeds, so a failed operation leaves disk untouched.
    /// A corrupt file is quarantined and replaced by an empty database; any
    /// other read failure aborts with `Io` before `mutate` runs.
    pub fn update<T>(
        &self,
        mutate: impl FnOnce(&mut Database) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let lock = self.lock_file()?;
        lock.lock_exclusive()?;
        let result = (|| {
            let mut db = self.preserve_corrupt()?;
            let value = mutate(&mut db)?;
            self.write_snapshot(&db)?;
            Ok(value)
        })();
        let _ = lock.unlock();
        result
    }

    pub fn exists(&self, id: &str) -> bool {
        self.load().players.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<PlayerRecord> {
        self.load().players.remove(id)
    }

    /// Create a fresh character. Fails with `AlreadyExists` and leaves the
    /// existing record untouched when one is present.
    pub fn create(&self, id: &str) -> Result<PlayerRecord, GameError> {
        self.update(|db| {
            if db.players.contains_key(id) {
                return Err(GameError::AlreadyExists(id.to_string()));
            }
            let player = PlayerRecord::new(id);
            db.players.insert(id.to_string(), player.clone());
            Ok(player)
        })
    }

    /// Permanently remove a character.
    pub fn delete(&self, id: &str) -> Result<PlayerRecord, GameError> {
        self.update(|db| {
            db.players
                .remove(id)
                .ok_or_else(|| GameError::NotFound(id.to_string()))
        })
    }

    /// Add an item (currency is credited to the wallet) and persist in one write.
    pub fn add_item(&self, id: &str, item: Item) -> Result<(), GameError> {
        self.update(|db| {
            let player = db
                .players
                .get_mut(id)
                .ok_or_else(|| GameError::NotFound(id.to_string()))?;
            player.add_item(item);
            Ok(())
        })
    }

    /// Remove the first matching inventory entry. Returns whether anything was removed.
    pub fn remove_item(&self, id: &str, item: &Item) -> Result<bool, GameError> {
        self.update(|db| {
            let player = db
                .players
                .get_mut(id)
                .ok_or_else(|| GameError::NotFound(id.to_string()))?;
            Ok(player.remove_item(item))
        })
    }

    fn read_raw(&self) -> Result<Option<Vec<u8>>, GameError> {
        match fs::read(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn decode(raw: &[u8]) -> Result<Database, GameError> {
        let start = raw.iter().position(|b| *b != 0).unwrap_or(raw.len());
        let text = std::str::from_utf8(&raw[start..])
            .map_err(|e| GameError::StoreCorrupt(e.to_string()))?
            .trim();
        if text.is_empty() {
            return Ok(Database::default());
        }
        let mut db = serde_json::from_str::<Database>(text)
            .map_err(|e| GameError::StoreCorrupt(e.to_string()))?;
        let fixed = db.normalize();
        if fixed > 0 {
            debug!("player store: normalized {} legacy record(s)", fixed);
        }
        Ok(db)
    }

    /// Read and decode the snapshot. `Io` for unreadable files, `StoreCorrupt`
    /// for bytes that are not a valid database.
    fn read_snapshot(&self) -> Result<Database, GameError> {
        match self.read_raw()? {
            Some(raw) => Self::decode(&raw),
            None => Ok(Database::default()),
        }
    }

    /// Snapshot for the write path: a corrupt file is copied aside and
    /// replaced by an empty database, read errors are returned.
    fn preserve_corrupt(&self) -> Result<Database, GameError> {
        let Some(raw) = self.read_raw()? else {
            return Ok(Database::default());
        };
        match Self::decode(&raw) {
            Ok(db) => Ok(db),
            Err(e) => {
                warn!("{} ({:?}); starting from an empty database", e, self.path);
                self.quarantine(&raw)?;
                Ok(Database::default())
            }
        }
    }

    /// Copy corrupt bytes to `<file>.corrupt-<timestamp>` unless an identical
    /// copy is already there.
    fn quarantine(&self, raw: &[u8]) -> Result<(), GameError> {
        let dir = self
            .path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let base = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "players.json".to_string());
        let prefix = format!("{}.corrupt-", base);

        for entry in fs::read_dir(dir)?.filter_map(Result::ok) {
            if !entry.file_name().to_string_lossy().starts_with(&prefix) {
                continue;
            }
            if fs::read(entry.path()).map(|kept| kept == raw).unwrap_or(false) {
                debug!("player store: corrupt snapshot already preserved at {:?}", entry.path());
                return Ok(());
            }
        }

        let stamp = Utc::now().format("%Y%m%dT%H%M%S").to_string();
        let mut target = dir.join(format!("{}{}", prefix, stamp));
        let mut n = 1u32;
        while target.exists() {
            target = dir.join(format!("{}{}-{}", prefix, stamp, n));
            n = n.saturating_add(1);
        }
        fs::write(&target, raw)?;
        warn!("player store: corrupt snapshot preserved at {:?}", target);
        Ok(())
    }

    fn write_snapshot(&self, db: &Database) -> Result<(), GameError> {
        let content = serde_json::to_string_pretty(db)?;
        let dir = self
            .path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let base = self
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("players.json");
        let mut counter = 0u32;
        let tmp_path = loop {
            let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut tmp) => {
                    tmp.write_all(content.as_bytes())?;
                    tmp.flush()?;
                    let _ = tmp.sync_all();
                    break candidate;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    counter = counter.saturating_add(1);
                }
                Err(e) => return Err(e.into()),
            }
        };
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        if let Ok(dir_file) = File::open(dir) {
            let _ = dir_file.sync_all();
        }
        Ok(())
    }
}
