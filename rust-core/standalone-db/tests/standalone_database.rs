// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Integration tests for standalone database assembly
//!
//! Drives `new_standalone_database` end to end: engine selection, the
//! read-only guard, metering, and cleanup on every failure path.

#[cfg(feature = "rocksdb")]
use std::path::Path;

use proptest::prelude::*;
use standalone_db::{
    new_standalone_database, BackendKind, Batch, Database, DatabaseConfig, DatabaseError,
    KeyRange, MetricsError, MultiGatherer, StorageError,
};
#[cfg(feature = "rocksdb")]
use tempfile::tempdir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// `Database` is a trait object without `Debug`, so unwrap by hand.
fn open(config: &DatabaseConfig, gatherer: &MultiGatherer) -> Database {
    match new_standalone_database(config, gatherer) {
        Ok(db) => db,
        Err(e) => panic!("failed to open {}: {e}", config.name),
    }
}

fn open_err(config: &DatabaseConfig, gatherer: &MultiGatherer) -> DatabaseError {
    match new_standalone_database(config, gatherer) {
        Ok(_) => panic!("expected {} to fail", config.name),
        Err(e) => e,
    }
}

#[cfg(feature = "rocksdb")]
/// Write `pairs` through a writable handle and close it again.
async fn seed(name: &str, root: &Path, pairs: &[(&[u8], &[u8])]) {
    let db = open(&DatabaseConfig::new(name, root), &MultiGatherer::new());
    for (key, value) in pairs {
        db.put(key, value).await.unwrap();
    }
    db.close().unwrap();
}

#[cfg(feature = "rocksdb")]
const ON_DISK: [&str; 2] = ["leveldb", "pebbledb"];

proptest! {
    #[test]
    fn unknown_names_are_rejected(name in "[a-zA-Z0-9_./-]{0,16}") {
        prop_assume!(BackendKind::from_name(&name).is_none());

        let gatherer = MultiGatherer::new();
        let err = open_err(&DatabaseConfig::new(name.clone(), "/nonexistent"), &gatherer);

        let message = err.to_string();
        prop_assert!(
            matches!(err, DatabaseError::UnknownBackend { name: ref n } if *n == name),
            "unexpected error: {}", message
        );
        for valid in BackendKind::NAMES {
            prop_assert!(message.contains(valid));
        }
        prop_assert!(!gatherer.contains("meterdb").unwrap());
    }
}

#[tokio::test]
async fn memdb_is_never_guarded() {
    init_tracing();
    for read_only in [false, true] {
        let gatherer = MultiGatherer::new();
        let config = DatabaseConfig::new("memdb", "").with_read_only(read_only);
        let db = open(&config, &gatherer);

        db.put(b"key", b"value").await.unwrap();
        assert_eq!(db.get(b"key").await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(db.name(), "memdb");
        db.close().unwrap();
    }
}

#[cfg(feature = "rocksdb")]
#[tokio::test]
async fn on_disk_engines_are_writable_by_default() {
    init_tracing();
    for name in ON_DISK {
        let dir = tempdir().unwrap();
        let db = open(&DatabaseConfig::new(name, dir.path()), &MultiGatherer::new());

        db.put(b"key", b"value").await.unwrap();
        assert_eq!(db.get(b"key").await.unwrap(), Some(b"value".to_vec()));

        let mut batch = Batch::new();
        batch.put(b"a", b"1").put(b"b", b"2").delete(b"key");
        db.write_batch(&batch).await.unwrap();

        let all = db.iterate(&KeyRange::all(), 10).await.unwrap();
        assert_eq!(
            all,
            vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())]
        );
        db.close().unwrap();
    }
}

#[cfg(feature = "rocksdb")]
#[tokio::test]
async fn read_only_on_disk_engines_discard_writes() {
    init_tracing();
    for name in ON_DISK {
        let dir = tempdir().unwrap();
        seed(name, dir.path(), &[(b"existing", b"before")]).await;

        let config = DatabaseConfig::new(name, dir.path()).with_read_only(true);
        let db = open(&config, &MultiGatherer::new());

        assert_eq!(db.get(b"existing").await.unwrap(), Some(b"before".to_vec()));

        db.put(b"existing", b"after").await.unwrap();
        db.put(b"fresh", b"value").await.unwrap();
        db.delete(b"existing").await.unwrap();
        let mut batch = Batch::new();
        batch.put(b"batched", b"x");
        db.write_batch(&batch).await.unwrap();

        assert_eq!(db.get(b"existing").await.unwrap(), Some(b"before".to_vec()));
        assert!(!db.has(b"fresh").await.unwrap());
        assert!(!db.has(b"batched").await.unwrap());
        db.close().unwrap();

        // Nothing reached the engine either.
        let db = open(&DatabaseConfig::new(name, dir.path()), &MultiGatherer::new());
        assert_eq!(db.get(b"existing").await.unwrap(), Some(b"before".to_vec()));
        assert_eq!(db.get(b"fresh").await.unwrap(), None);
        db.close().unwrap();
    }
}

#[cfg(feature = "rocksdb")]
#[tokio::test]
async fn meter_wraps_the_read_only_guard() {
    init_tracing();
    let dir = tempdir().unwrap();
    let gatherer = MultiGatherer::new();
    let config = DatabaseConfig::new("leveldb", dir.path()).with_read_only(true);
    let db = open(&config, &gatherer);

    // Discarded writes are still metered, so the meter sits outside the guard.
    db.put(b"k", b"vv").await.unwrap();

    let text = gatherer.gather_text().unwrap();
    assert!(text.contains("meterdb_calls{method=\"put\"} 1"), "{text}");
    assert!(text.contains("meterdb_size{method=\"put\"} 3"), "{text}");
    db.close().unwrap();
}

#[cfg(feature = "rocksdb")]
#[tokio::test]
async fn both_namespaces_are_exported() {
    let dir = tempdir().unwrap();
    let gatherer = MultiGatherer::new();
    let db = open(&DatabaseConfig::new("pebbledb", dir.path()), &gatherer);
    db.put(b"k", b"v").await.unwrap();
    db.health_check().await.unwrap();

    assert_eq!(
        gatherer.namespaces().unwrap(),
        vec!["db".to_string(), "meterdb".to_string()]
    );
    let text = gatherer.gather_text().unwrap();
    assert!(text.contains("db_estimate_num_keys"), "{text}");
    assert!(text.contains("meterdb_calls{method=\"health_check\"} 1"), "{text}");
    db.close().unwrap();
}

#[tokio::test]
async fn memdb_registers_db_namespace_too() {
    let gatherer = MultiGatherer::new();
    let db = open(&DatabaseConfig::new("memdb", ""), &gatherer);
    assert!(gatherer.contains("db").unwrap());
    assert!(gatherer.contains("meterdb").unwrap());
    db.close().unwrap();
}

#[tokio::test]
async fn second_call_on_same_gatherer_collides() {
    let gatherer = MultiGatherer::new();
    let config = DatabaseConfig::new("memdb", "");
    let first = open(&config, &gatherer);

    let err = open_err(&config, &gatherer);
    assert!(
        matches!(
            err,
            DatabaseError::MetricsNamespace(MetricsError::DuplicateNamespace(ref ns)) if ns == "db"
        ),
        "unexpected error: {err}"
    );
    first.close().unwrap();
}

#[cfg(feature = "rocksdb")]
#[test]
fn engine_directory_is_joined_onto_path() {
    for name in ON_DISK {
        let dir = tempdir().unwrap();
        let db = open(&DatabaseConfig::new(name, dir.path()), &MultiGatherer::new());

        let data_dir = dir.path().join(name);
        assert!(data_dir.is_dir());
        assert!(data_dir.join("CURRENT").is_file());
        assert_eq!(
            BackendKind::from_name(name).unwrap().data_dir(dir.path()),
            Some(data_dir)
        );
        db.close().unwrap();
    }
}

#[cfg(feature = "rocksdb")]
#[test]
fn engine_failure_names_engine_and_path() {
    init_tracing();
    let dir = tempdir().unwrap();
    let root = dir.path().join("not-a-directory");
    std::fs::write(&root, b"occupied").unwrap();

    let gatherer = MultiGatherer::new();
    let err = open_err(&DatabaseConfig::new("leveldb", &root), &gatherer);

    let message = err.to_string();
    match err {
        DatabaseError::EngineConstruction { engine, path, .. } => {
            assert_eq!(engine, "leveldb");
            assert_eq!(path, root.join("leveldb"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(message.contains("couldn't create leveldb at"));
    assert!(message.contains(&root.join("leveldb").display().to_string()));
    // The pipeline stopped before the meter stage.
    assert!(!gatherer.contains("meterdb").unwrap());
}

#[cfg(feature = "rocksdb")]
#[test]
fn malformed_tuning_payload_fails_engine_construction() {
    let dir = tempdir().unwrap();
    let config = DatabaseConfig::new("pebbledb", dir.path()).with_config(b"{\"cacheSize\": -1}".to_vec());
    let err = open_err(&config, &MultiGatherer::new());
    assert!(
        matches!(
            err,
            DatabaseError::EngineConstruction {
                engine: "pebbledb",
                source: StorageError::InvalidConfig(_),
                ..
            }
        ),
        "unexpected error: {err}"
    );
}

#[cfg(feature = "rocksdb")]
#[tokio::test]
async fn locked_directory_fails_engine_construction() {
    let dir = tempdir().unwrap();
    let first = open(&DatabaseConfig::new("leveldb", dir.path()), &MultiGatherer::new());

    let err = open_err(&DatabaseConfig::new("leveldb", dir.path()), &MultiGatherer::new());
    assert!(
        matches!(err, DatabaseError::EngineConstruction { engine: "leveldb", .. }),
        "unexpected error: {err}"
    );
    first.close().unwrap();
}

#[cfg(feature = "rocksdb")]
#[tokio::test]
async fn meter_namespace_collision_closes_the_engine() {
    init_tracing();
    for read_only in [false, true] {
        let dir = tempdir().unwrap();
        let gatherer = MultiGatherer::new();
        gatherer.make_and_register("meterdb").unwrap();

        let config = DatabaseConfig::new("leveldb", dir.path()).with_read_only(read_only);
        let err = open_err(&config, &gatherer);
        assert!(
            matches!(
                err,
                DatabaseError::MetricsNamespace(MetricsError::DuplicateNamespace(ref ns))
                    if ns == "meterdb"
            ),
            "unexpected error: {err}"
        );

        // The abandoned engine released its lock, so the directory opens again.
        let db = open(&DatabaseConfig::new("leveldb", dir.path()), &MultiGatherer::new());
        db.close().unwrap();
    }
}

#[cfg(feature = "rocksdb")]
#[tokio::test]
async fn closing_the_outer_handle_closes_the_engine() {
    for read_only in [false, true] {
        let dir = tempdir().unwrap();
        let config = DatabaseConfig::new("pebbledb", dir.path()).with_read_only(read_only);
        let db = open(&config, &MultiGatherer::new());

        db.close().unwrap();
        assert!(matches!(db.get(b"k").await, Err(StorageError::Closed)));
        assert!(matches!(db.put(b"k", b"v").await, Err(StorageError::Closed)));
        assert!(matches!(db.close(), Err(StorageError::Closed)));

        let reopened = open(&DatabaseConfig::new("pebbledb", dir.path()), &MultiGatherer::new());
        reopened.close().unwrap();
    }
}

#[cfg(not(feature = "rocksdb"))]
#[test]
fn on_disk_engines_need_the_rocksdb_feature() {
    for name in ["leveldb", "pebbledb"] {
        let err = open_err(&DatabaseConfig::new(name, "/tmp"), &MultiGatherer::new());
        assert!(
            matches!(
                err,
                DatabaseError::EngineConstruction {
                    source: StorageError::BackendUnavailable(_),
                    ..
                }
            ),
            "unexpected error: {err}"
        );
    }
}
