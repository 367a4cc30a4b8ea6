// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Standalone DB: storage backend assembly for node processes.
//
// This crate turns a small `DatabaseConfig` into one decorated key-value
// backend. The engine is picked by name, optionally shielded from writes,
// and always metered, before the node sees it through the `StorageBackend`
// trait.
//
// # Modules
//
// - [`backend`] -- The `StorageBackend` trait every engine and wrapper implements.
// - [`batch`] -- Write batches and iteration ranges.
// - [`config`] -- `DatabaseConfig` and the closed set of engine names.
// - [`database`] -- `new_standalone_database`, the selection and wrapping pipeline.
// - [`error`] -- Storage, metrics and assembly error enums.
// - [`gatherer`] -- `MultiGatherer`, named Prometheus sub-registries.
// - [`memory`] -- The `memdb` engine.
// - [`leveldb`] / [`pebbledb`] -- On-disk LSM engine profiles (feature `rocksdb`).
// - [`versioned`] -- The read-only wrapper that discards writes.
// - [`meter`] -- The wrapper that counts and times every call.
//
// # Example
//
// ```rust
// use standalone_db::{new_standalone_database, DatabaseConfig, MultiGatherer};
//
// # tokio_test::block_on(async {
// let gatherer = MultiGatherer::new();
// let config = DatabaseConfig::new("memdb", "").with_read_only(true);
// let db = new_standalone_database(&config, &gatherer).unwrap();
//
// // memdb is never shielded, even in read-only mode.
// db.put(b"k", b"v").await.unwrap();
// assert_eq!(db.get(b"k").await.unwrap(), Some(b"v".to_vec()));
// db.close().unwrap();
// # });
// ```

pub mod backend;
pub mod batch;
pub mod config;
pub mod database;
pub mod error;
pub mod gatherer;
pub mod memory;
pub mod meter;
pub mod versioned;

// On-disk engines pull in RocksDB, so they sit behind a feature.
#[cfg(feature = "rocksdb")]
pub mod leveldb;
#[cfg(feature = "rocksdb")]
pub mod pebbledb;
#[cfg(feature = "rocksdb")]
pub mod rocks;

// Re-export the most commonly used types at the crate root for convenience.
pub use backend::StorageBackend;
pub use batch::{Batch, BatchOp, KeyRange};
pub use config::{BackendKind, DatabaseConfig};
pub use database::{
    new_standalone_database, Database, DB_METRICS_NAMESPACE, METER_METRICS_NAMESPACE,
};
pub use error::{DatabaseError, MetricsError, StorageError};
pub use gatherer::MultiGatherer;
pub use memory::InMemoryBackend;
pub use meter::{MeterBackend, MeterCollectors, Method};
pub use versioned::VersionedBackend;

#[cfg(feature = "rocksdb")]
pub use rocks::RocksBackend;
