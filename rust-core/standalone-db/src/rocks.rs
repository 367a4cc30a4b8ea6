// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RocksDB-backed LSM engine shared by the `leveldb` and `pebbledb` profiles.
//
// # Design
//
// - One RocksDB instance per data directory; the profile modules only decide
//   the `Options` it is opened with.
// - Blocking engine calls run on `spawn_blocking` with a cloned `Arc<DB>`.
// - `close()` takes the handle out of its slot. RocksDB shuts down (and drops
//   its directory lock) once the last in-flight operation releases its clone.
// - Engine gauges live in the `db` sub-registry and are refreshed by
//   `health_check()` and `compact()`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use prometheus::{IntGauge, Registry};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use tracing::{debug, info};

use crate::backend::StorageBackend;
use crate::batch::{Batch, BatchOp, KeyRange};
use crate::error::StorageError;

/// Gauges describing the engine, registered in the `db` sub-registry.
#[derive(Debug, Clone)]
struct EngineGauges {
    estimate_num_keys: IntGauge,
    live_sst_files_bytes: IntGauge,
    memtable_bytes: IntGauge,
}

impl EngineGauges {
    fn register(registry: &Registry) -> Result<Self, StorageError> {
        let gauges = Self {
            estimate_num_keys: gauge("estimate_num_keys", "Estimated number of keys")?,
            live_sst_files_bytes: gauge("live_sst_files_bytes", "Size of live SST files")?,
            memtable_bytes: gauge("memtable_bytes", "Size of all memtables")?,
        };
        for g in [
            &gauges.estimate_num_keys,
            &gauges.live_sst_files_bytes,
            &gauges.memtable_bytes,
        ] {
            registry
                .register(Box::new(g.clone()))
                .map_err(|e| StorageError::BackendUnavailable(format!("register gauge: {e}")))?;
        }
        Ok(gauges)
    }

    fn refresh(&self, db: &DB) -> Result<(), StorageError> {
        let read = |name: &str| -> Result<i64, StorageError> {
            let value = db.property_int_value(name)?.unwrap_or(0);
            Ok(i64::try_from(value).unwrap_or(i64::MAX))
        };
        self.estimate_num_keys.set(read("rocksdb.estimate-num-keys")?);
        self.live_sst_files_bytes.set(read("rocksdb.live-sst-files-size")?);
        self.memtable_bytes.set(read("rocksdb.cur-size-all-mem-tables")?);
        Ok(())
    }
}

fn gauge(name: &str, help: &str) -> Result<IntGauge, StorageError> {
    IntGauge::new(name, help)
        .map_err(|e| StorageError::BackendUnavailable(format!("gauge {name}: {e}")))
}

/// A persistent LSM-tree engine powered by RocksDB.
pub struct RocksBackend {
    /// Fixed engine name (`leveldb` or `pebbledb`).
    name: &'static str,
    /// Data directory.
    path: PathBuf,
    /// `None` once closed.
    db: RwLock<Option<Arc<DB>>>,
    /// Whether each write is synced to the WAL before returning.
    sync: bool,
    gauges: EngineGauges,
}

impl RocksBackend {
    /// Open or create a RocksDB instance in `path` with the given options.
    ///
    /// Creates the directory and its parents if they don't exist.
    pub(crate) fn open(
        name: &'static str,
        path: &Path,
        mut options: Options,
        sync: bool,
        registry: &Registry,
    ) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        options.create_if_missing(true);

        let gauges = EngineGauges::register(registry)?;
        let db = DB::open(&options, path)?;
        gauges.refresh(&db)?;

        info!(engine = name, path = %path.display(), "opened database");

        Ok(Self {
            name,
            path: path.to_path_buf(),
            db: RwLock::new(Some(Arc::new(db))),
            sync,
            gauges,
        })
    }

    /// Return the data directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone the live handle, or fail if closed.
    fn handle(&self) -> Result<Arc<DB>, StorageError> {
        let slot = self
            .db
            .read()
            .map_err(|_| StorageError::BackendUnavailable("handle lock poisoned".to_string()))?;
        slot.as_ref().map(Arc::clone).ok_or(StorageError::Closed)
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync);
        opts
    }

    /// Run `op` against the live handle on the blocking thread pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&DB) -> Result<T, StorageError> + Send + 'static,
    {
        let db = self.handle()?;
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| StorageError::BackendUnavailable(format!("task join: {e}")))?
    }
}

impl std::fmt::Debug for RocksBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksBackend")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("sync", &self.sync)
            .finish()
    }
}

#[async_trait]
impl StorageBackend for RocksBackend {
    async fn has(&self, key: &[u8]) -> Result<bool, StorageError> {
        let key = key.to_vec();
        self.blocking(move |db| Ok(db.get_pinned(&key)?.is_some())).await
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let key = key.to_vec();
        self.blocking(move |db| Ok(db.get(&key)?)).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let key = key.to_vec();
        let value = value.to_vec();
        let opts = self.write_options();
        self.blocking(move |db| Ok(db.put_opt(&key, &value, &opts)?)).await
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        let key = key.to_vec();
        let opts = self.write_options();
        self.blocking(move |db| Ok(db.delete_opt(&key, &opts)?)).await
    }

    async fn write_batch(&self, batch: &Batch) -> Result<(), StorageError> {
        let mut write = WriteBatch::default();
        for op in batch.ops() {
            match op {
                BatchOp::Put { key, value } => write.put(key, value),
                BatchOp::Delete { key } => write.delete(key),
            }
        }
        let opts = self.write_options();
        self.blocking(move |db| Ok(db.write_opt(write, &opts)?)).await
    }

    async fn iterate(
        &self,
        range: &KeyRange,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let range = range.clone();
        self.blocking(move |db| {
            let mut results = Vec::new();
            if limit == 0 {
                return Ok(results);
            }
            let iter = db.iterator(IteratorMode::From(range.seek_key(), Direction::Forward));
            for entry in iter {
                let (k, v) = entry?;
                if !range.matches(&k) {
                    break;
                }
                results.push((k.into_vec(), v.into_vec()));
                if results.len() >= limit {
                    break;
                }
            }
            Ok(results)
        })
        .await
    }

    async fn compact(
        &self,
        start: Option<&[u8]>,
        limit: Option<&[u8]>,
    ) -> Result<(), StorageError> {
        let start = start.map(<[u8]>::to_vec);
        let limit = limit.map(<[u8]>::to_vec);
        let gauges = self.gauges.clone();
        self.blocking(move |db| {
            db.compact_range(start.as_deref(), limit.as_deref());
            gauges.refresh(db)
        })
        .await
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        let gauges = self.gauges.clone();
        self.blocking(move |db| gauges.refresh(db)).await
    }

    fn close(&self) -> Result<(), StorageError> {
        let mut slot = self
            .db
            .write()
            .map_err(|_| StorageError::BackendUnavailable("handle lock poisoned".to_string()))?;
        match slot.take() {
            Some(_) => {
                debug!(engine = self.name, path = %self.path.display(), "closed database");
                Ok(())
            }
            None => Err(StorageError::Closed),
        }
    }

    fn name(&self) -> &str {
        self.name
    }
}
