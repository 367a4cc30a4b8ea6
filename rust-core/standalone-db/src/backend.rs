// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core storage backend trait.
//
// Every engine (memdb, leveldb, pebbledb) and every decorator (versioned,
// meter) implements `StorageBackend`, so decorators can wrap engines and
// each other without changing the interface handed to the rest of the node.

use async_trait::async_trait;

use crate::batch::{Batch, KeyRange};
use crate::error::StorageError;

/// A key-value storage backend.
///
/// All keys and values are opaque byte slices. Implementations must be safe
/// to share across threads and tokio tasks.
///
/// Once [`StorageBackend::close`] has succeeded every further call,
/// including another `close`, fails with [`StorageError::Closed`].
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Check whether `key` exists without retrieving its value.
    async fn has(&self, key: &[u8]) -> Result<bool, StorageError>;

    /// Retrieve the value associated with `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist, rather than an error.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a key-value pair, overwriting any previous value for `key`.
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &[u8]) -> Result<(), StorageError>;

    /// Apply every operation in `batch` atomically, in order.
    async fn write_batch(&self, batch: &Batch) -> Result<(), StorageError>;

    /// Return up to `limit` (key, value) pairs inside `range`, in ascending
    /// lexicographic key order.
    async fn iterate(
        &self,
        range: &KeyRange,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError>;

    /// Compact the underlying storage for keys in `[start, limit)`.
    ///
    /// `None` bounds are open. Engines without compaction treat this as a
    /// no-op.
    async fn compact(&self, start: Option<&[u8]>, limit: Option<&[u8]>)
        -> Result<(), StorageError>;

    /// Report whether the backend is usable.
    async fn health_check(&self) -> Result<(), StorageError>;

    /// Release the backend. Decorators close the backend they wrap.
    fn close(&self) -> Result<(), StorageError>;

    /// A human-readable name for this backend, used in logging and metrics.
    fn name(&self) -> &str;
}

#[async_trait]
impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    async fn has(&self, key: &[u8]) -> Result<bool, StorageError> {
        (**self).has(key).await
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        (**self).delete(key).await
    }

    async fn write_batch(&self, batch: &Batch) -> Result<(), StorageError> {
        (**self).write_batch(batch).await
    }

    async fn iterate(
        &self,
        range: &KeyRange,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        (**self).iterate(range, limit).await
    }

    async fn compact(
        &self,
        start: Option<&[u8]>,
        limit: Option<&[u8]>,
    ) -> Result<(), StorageError> {
        (**self).compact(start, limit).await
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        (**self).health_check().await
    }

    fn close(&self) -> Result<(), StorageError> {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
