// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read-only versioning wrapper.
//
// Opens an uncommitted version on top of a backend. Every mutation is
// accepted into that version and discarded: nothing is ever committed to the
// wrapped engine and reads keep observing the engine's state as it was.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::backend::StorageBackend;
use crate::batch::{Batch, KeyRange};
use crate::error::StorageError;

/// A backend wrapper that intercepts every write.
///
/// `put`, `delete`, `write_batch` and `compact` succeed without reaching the
/// inner backend. Reads, health checks and `close` pass through.
///
/// # Example
///
/// ```rust
/// use standalone_db::backend::StorageBackend;
/// use standalone_db::memory::InMemoryBackend;
/// use standalone_db::versioned::VersionedBackend;
///
/// # tokio_test::block_on(async {
/// let inner = InMemoryBackend::new();
/// inner.put(b"key", b"original").await.unwrap();
///
/// let guarded = VersionedBackend::new(inner);
/// guarded.put(b"key", b"changed").await.unwrap();
/// assert_eq!(guarded.get(b"key").await.unwrap(), Some(b"original".to_vec()));
/// assert_eq!(guarded.discarded_writes(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct VersionedBackend<B: StorageBackend> {
    inner: B,
    /// Mutations dropped so far; a batch counts once per operation.
    discarded: AtomicU64,
}

impl<B: StorageBackend> VersionedBackend<B> {
    /// Wrap `inner`, shielding it from writes.
    pub fn new(inner: B) -> Self {
        debug!(backend = inner.name(), "wrapping backend in read-only version");
        Self {
            inner,
            discarded: AtomicU64::new(0),
        }
    }

    /// Number of mutations intercepted since construction.
    pub fn discarded_writes(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Return a reference to the inner backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Drop `count` mutations, failing like the engine would once closed.
    async fn discard(&self, count: u64) -> Result<(), StorageError> {
        self.inner.health_check().await?;
        self.discarded.fetch_add(count, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl<B: StorageBackend> StorageBackend for VersionedBackend<B> {
    async fn has(&self, key: &[u8]) -> Result<bool, StorageError> {
        self.inner.has(key).await
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(key).await
    }

    async fn put(&self, _key: &[u8], _value: &[u8]) -> Result<(), StorageError> {
        self.discard(1).await
    }

    async fn delete(&self, _key: &[u8]) -> Result<(), StorageError> {
        self.discard(1).await
    }

    async fn write_batch(&self, batch: &Batch) -> Result<(), StorageError> {
        self.discard(batch.len() as u64).await
    }

    async fn iterate(
        &self,
        range: &KeyRange,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        self.inner.iterate(range, limit).await
    }

    async fn compact(
        &self,
        _start: Option<&[u8]>,
        _limit: Option<&[u8]>,
    ) -> Result<(), StorageError> {
        // Compaction rewrites engine files, so it is held back too.
        self.inner.health_check().await
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        self.inner.health_check().await
    }

    fn close(&self) -> Result<(), StorageError> {
        self.inner.close()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
