// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error types for the standalone database.
//
// Three enums, one per concern: `StorageError` for operations on an open
// backend, `MetricsError` for sub-registry management and `DatabaseError`
// for assembling the decorated backend from configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::BackendKind;

/// Errors that can occur when interacting with a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred in the underlying storage layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend has been closed; no further operations are accepted.
    #[error("database closed")]
    Closed,

    /// The storage backend is not available (not compiled in).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The engine tuning payload could not be parsed.
    #[error("invalid engine config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// The engine reported an error.
    #[error("engine error: {0}")]
    Engine(String),
}

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for StorageError {
    fn from(e: rocksdb::Error) -> Self {
        StorageError::Engine(e.into_string())
    }
}

/// Errors raised while managing metrics sub-registries.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A sub-registry with this name already exists in the gatherer.
    #[error("duplicate metrics namespace {0:?}")]
    DuplicateNamespace(String),

    /// Prometheus refused to build or register the registry.
    #[error("prometheus registry error: {0}")]
    Registry(#[from] prometheus::Error),

    /// The gatherer lock was poisoned by a panicking thread.
    #[error("metrics gatherer lock poisoned")]
    LockPoisoned,
}

/// Errors returned by [`crate::database::new_standalone_database`].
///
/// Every variant is terminal: no backend handle is returned and any engine
/// opened along the way has been closed.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The configured name is not one of the known engines.
    #[error(
        "db-type was {name:?} but should have been one of {{{}}}",
        BackendKind::NAMES.join(", ")
    )]
    UnknownBackend {
        /// The offending configured name.
        name: String,
    },

    /// The engine could not be opened at its resolved path.
    #[error("couldn't create {engine} at {}: {source}", .path.display())]
    EngineConstruction {
        /// Fixed engine name (`leveldb` or `pebbledb`).
        engine: &'static str,
        /// Resolved data directory.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: StorageError,
    },

    /// A metrics sub-registry could not be created.
    #[error("couldn't register metrics namespace: {0}")]
    MetricsNamespace(#[from] MetricsError),

    /// A decorator failed to wrap the backend.
    #[error("failed to create {decorator}: {source}")]
    DecoratorConstruction {
        /// Name of the decorator (`meterdb`).
        decorator: &'static str,
        /// Underlying cause.
        #[source]
        source: prometheus::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_display() {
        assert_eq!(StorageError::Closed.to_string(), "database closed");
    }

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file gone");
        let err = StorageError::Io(io_err);
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_invalid_config_display() {
        let json_err = serde_json::from_slice::<serde_json::Value>(b"{not json").unwrap_err();
        let err = StorageError::from(json_err);
        assert!(err.to_string().starts_with("invalid engine config"));
    }

    #[test]
    fn test_unknown_backend_lists_valid_names() {
        let err = DatabaseError::UnknownBackend {
            name: "rocks".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "db-type was \"rocks\" but should have been one of {leveldb, memdb, pebbledb}"
        );
    }

    #[test]
    fn test_engine_construction_names_engine_and_path() {
        let err = DatabaseError::EngineConstruction {
            engine: "pebbledb",
            path: PathBuf::from("/data/pebbledb"),
            source: StorageError::Engine("lock held".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("pebbledb"));
        assert!(message.contains("/data/pebbledb"));
        assert!(message.contains("lock held"));
    }

    #[test]
    fn test_duplicate_namespace_display() {
        let err = DatabaseError::from(MetricsError::DuplicateNamespace("db".to_string()));
        assert!(err.to_string().contains("duplicate metrics namespace \"db\""));
    }

    #[test]
    fn test_decorator_construction_display() {
        let err = DatabaseError::DecoratorConstruction {
            decorator: "meterdb",
            source: prometheus::Error::AlreadyReg,
        };
        assert!(err.to_string().starts_with("failed to create meterdb: "));
    }
}
