// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Assembly of the node's storage backend from its configuration.
//
// Three stages run in a fixed order:
//
// 1. select:  claim the `db` metrics namespace, then open the named engine
//             (`leveldb` and `pebbledb` under `<path>/<name>`, or `memdb`).
// 2. guard:   in read-only mode wrap on-disk engines in `VersionedBackend`.
// 3. meter:   claim the `meterdb` namespace and wrap in `MeterBackend`.
//
// The resulting chain is `meter(versioned(engine))` or `meter(engine)`.
// Any failure is returned as-is, after closing whatever was already opened.

use prometheus::Registry;
use tracing::{debug, info, warn};

use crate::backend::StorageBackend;
use crate::config::{BackendKind, DatabaseConfig};
use crate::error::DatabaseError;
use crate::gatherer::MultiGatherer;
use crate::memory::InMemoryBackend;
use crate::meter::{MeterBackend, MeterCollectors};
use crate::versioned::VersionedBackend;

/// Metrics namespace holding the engine's own metrics.
pub const DB_METRICS_NAMESPACE: &str = "db";

/// Metrics namespace holding the per-call meter.
pub const METER_METRICS_NAMESPACE: &str = "meterdb";

/// A fully decorated storage backend.
pub type Database = Box<dyn StorageBackend>;

/// Build the node's storage backend described by `config`.
///
/// Claims the [`DB_METRICS_NAMESPACE`] and [`METER_METRICS_NAMESPACE`]
/// namespaces in `gatherer`, so calling this twice with the same gatherer
/// fails with [`DatabaseError::MetricsNamespace`].
///
/// # Example
///
/// ```rust
/// use standalone_db::{new_standalone_database, DatabaseConfig, MultiGatherer};
///
/// # tokio_test::block_on(async {
/// let gatherer = MultiGatherer::new();
/// let db = new_standalone_database(&DatabaseConfig::new("memdb", ""), &gatherer).unwrap();
///
/// db.put(b"key", b"value").await.unwrap();
/// assert_eq!(db.get(b"key").await.unwrap(), Some(b"value".to_vec()));
/// assert!(gatherer.gather_text().unwrap().contains("meterdb_calls"));
/// # });
/// ```
pub fn new_standalone_database(
    config: &DatabaseConfig,
    gatherer: &MultiGatherer,
) -> Result<Database, DatabaseError> {
    let db_registry = gatherer.make_and_register(DB_METRICS_NAMESPACE)?;
    let (kind, engine) = select_backend(config, &db_registry)?;
    let guarded = guard_read_only(kind, config.read_only, engine);
    meter(gatherer, guarded)
}

/// Open the engine named by `config`.
fn select_backend(
    config: &DatabaseConfig,
    registry: &Registry,
) -> Result<(BackendKind, Database), DatabaseError> {
    let kind = config.backend_kind()?;
    let engine: Database = match kind {
        BackendKind::MemDb => Box::new(InMemoryBackend::new()),
        BackendKind::LevelDb | BackendKind::PebbleDb => open_on_disk(kind, config, registry)?,
    };
    info!(engine = kind.name(), read_only = config.read_only, "selected database engine");
    Ok((kind, engine))
}

#[cfg(feature = "rocksdb")]
fn open_on_disk(
    kind: BackendKind,
    config: &DatabaseConfig,
    registry: &Registry,
) -> Result<Database, DatabaseError> {
    let path = config.path.join(kind.name());
    let opened = match kind {
        BackendKind::PebbleDb => crate::pebbledb::open(&path, &config.config, registry),
        _ => crate::leveldb::open(&path, &config.config, registry),
    };
    match opened {
        Ok(engine) => Ok(Box::new(engine)),
        Err(source) => Err(DatabaseError::EngineConstruction {
            engine: kind.name(),
            path,
            source,
        }),
    }
}

#[cfg(not(feature = "rocksdb"))]
fn open_on_disk(
    kind: BackendKind,
    config: &DatabaseConfig,
    _registry: &Registry,
) -> Result<Database, DatabaseError> {
    Err(DatabaseError::EngineConstruction {
        engine: kind.name(),
        path: config.path.join(kind.name()),
        source: crate::error::StorageError::BackendUnavailable(
            "built without the rocksdb feature".to_string(),
        ),
    })
}

/// Shield on-disk engines from writes in read-only mode.
fn guard_read_only(kind: BackendKind, read_only: bool, engine: Database) -> Database {
    if read_only && !kind.is_in_memory() {
        Box::new(VersionedBackend::new(engine))
    } else {
        engine
    }
}

/// Wrap `inner` in the per-call meter.
fn meter(gatherer: &MultiGatherer, inner: Database) -> Result<Database, DatabaseError> {
    let registry = match gatherer.make_and_register(METER_METRICS_NAMESPACE) {
        Ok(registry) => registry,
        Err(e) => {
            close_abandoned(inner.as_ref());
            return Err(e.into());
        }
    };

    let collectors = match MeterCollectors::register(&registry) {
        Ok(collectors) => collectors,
        Err(source) => {
            close_abandoned(inner.as_ref());
            return Err(DatabaseError::DecoratorConstruction {
                decorator: METER_METRICS_NAMESPACE,
                source,
            });
        }
    };

    debug!(engine = inner.name(), "metering database calls");
    Ok(Box::new(MeterBackend::with_collectors(collectors, inner)))
}

/// Close a half-built chain that will not be returned.
fn close_abandoned(backend: &dyn StorageBackend) {
    if let Err(e) = backend.close() {
        warn!(engine = backend.name(), error = %e, "failed to close abandoned database");
    }
}
