//! RocksDB-backed versioned store with named map namespaces.
//!
//! Map names are dynamic (the ledger opens one map per observed address),
//! so maps are realized as length-prefixed key namespaces within a single
//! database rather than column families. Uncommitted writes live in an
//! in-memory overlay; `commit` flushes them as one atomic write batch
//! together with the incremented store version.

use crate::error::StorageError;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Internal namespace: a zero length byte, unreachable from any named map.
const VERSION_KEY: &[u8] = &[0u8, b'v'];

/// Handle to a named map: the encoded key prefix. Cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapRef {
    prefix: Vec<u8>,
}

impl MapRef {
    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key);
        full
    }
}

/// A transactional store of named ordered maps.
///
/// Reads see uncommitted writes. All writes since the last `commit` are
/// made durable together or discarded together; there are no other
/// cross-map transaction semantics.
pub struct VersionedDb {
    db: DB,
    overlay: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    version: u64,
}

impl VersionedDb {
    /// Open (or create) the store at `path`.
    ///
    /// If the store has committed at least once, `rollback` runs to discard
    /// any half-written transaction from a prior crash.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;

        let version = match db.get(VERSION_KEY)? {
            Some(raw) => {
                let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| {
                    StorageError::Corrupted {
                        map: "<internal>".to_string(),
                        detail: format!("version record of {} bytes", raw.len()),
                    }
                })?;
                u64::from_be_bytes(bytes)
            }
            None => 0,
        };

        let mut store = Self {
            db,
            overlay: BTreeMap::new(),
            version,
        };

        if store.version > 0 {
            store.rollback();
        }

        info!(path = %path.display(), version, "substrate opened");
        Ok(store)
    }

    /// Obtain a handle to the named map. Creation is lazy; a map exists
    /// exactly when it holds keys.
    pub fn map(&self, name: &str) -> Result<MapRef, StorageError> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > u8::MAX as usize {
            return Err(StorageError::MapNameTooLong(bytes.len()));
        }
        let mut prefix = Vec::with_capacity(1 + bytes.len());
        prefix.push(bytes.len() as u8);
        prefix.extend_from_slice(bytes);
        Ok(MapRef { prefix })
    }

    /// Read a key; uncommitted writes are visible.
    pub fn get(&self, map: &MapRef, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let full = map.full_key(key);
        if let Some(pending) = self.overlay.get(&full) {
            return Ok(pending.clone());
        }
        Ok(self.db.get(&full)?)
    }

    /// Stage a write. Durable only after `commit`.
    pub fn put(&mut self, map: &MapRef, key: &[u8], value: Vec<u8>) {
        self.overlay.insert(map.full_key(key), Some(value));
    }

    /// Stage a removal. Durable only after `commit`.
    pub fn remove(&mut self, map: &MapRef, key: &[u8]) {
        self.overlay.insert(map.full_key(key), None);
    }

    /// All keys of a map in byte order, merging committed state with the
    /// overlay.
    pub fn keys(&self, map: &MapRef) -> Result<Vec<Vec<u8>>, StorageError> {
        let mut keys = BTreeSet::new();

        let iter = self
            .db
            .iterator(IteratorMode::From(map.prefix.as_slice(), Direction::Forward));
        for item in iter {
            let (full, _) = item?;
            if !full.starts_with(&map.prefix) {
                break;
            }
            keys.insert(full[map.prefix.len()..].to_vec());
        }

        for (full, pending) in self.overlay.range(map.prefix.clone()..) {
            if !full.starts_with(&map.prefix) {
                break;
            }
            let key = full[map.prefix.len()..].to_vec();
            match pending {
                Some(_) => {
                    keys.insert(key);
                }
                None => {
                    keys.remove(&key);
                }
            }
        }

        Ok(keys.into_iter().collect())
    }

    /// Flush all staged writes and the incremented store version as one
    /// atomic, fsynced batch. On failure the staged writes are kept so the
    /// caller can still `rollback`.
    pub fn commit(&mut self) -> Result<(), StorageError> {
        let mut batch = WriteBatch::default();
        for (full, pending) in &self.overlay {
            match pending {
                Some(value) => batch.put(full, value),
                None => batch.delete(full),
            }
        }
        let next = self.version + 1;
        batch.put(VERSION_KEY, next.to_be_bytes());

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db.write_opt(batch, &write_opts)?;

        self.overlay.clear();
        self.version = next;
        Ok(())
    }

    /// Discard all writes staged since the last `commit`.
    pub fn rollback(&mut self) {
        if !self.overlay.is_empty() {
            debug!(discarded = self.overlay.len(), "uncommitted writes discarded");
        }
        self.overlay.clear();
    }

    /// Number of commits this store has performed.
    pub fn store_version(&self) -> u64 {
        self.version
    }
}
