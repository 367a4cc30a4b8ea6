// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory storage backend (`memdb`).
//
// Uses a `BTreeMap` wrapped in a tokio `RwLock` for thread-safe, ordered
// key-value storage. The BTreeMap ordering gives range iteration for free.
// Intended for testing, development, and nodes that do not need to persist.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::StorageBackend;
use crate::batch::{Batch, BatchOp, KeyRange};
use crate::error::StorageError;

/// An in-memory storage backend backed by a sorted `BTreeMap`.
///
/// All data lives in process memory and is lost on drop or close.
///
/// # Example
///
/// ```rust
/// use standalone_db::memory::InMemoryBackend;
/// use standalone_db::backend::StorageBackend;
///
/// # tokio_test::block_on(async {
/// let store = InMemoryBackend::new();
/// store.put(b"hello", b"world").await.unwrap();
/// let val = store.get(b"hello").await.unwrap();
/// assert_eq!(val, Some(b"world".to_vec()));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    closed: AtomicBool,
}

impl InMemoryBackend {
    /// Create a new, empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Return true if the store contains no keys.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::Acquire) {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn has(&self, key: &[u8]) -> Result<bool, StorageError> {
        self.ensure_open()?;
        let map = self.data.read().await;
        Ok(map.contains_key(key))
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.ensure_open()?;
        let map = self.data.read().await;
        Ok(map.get(key).cloned())
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.ensure_open()?;
        let mut map = self.data.write().await;
        map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.ensure_open()?;
        let mut map = self.data.write().await;
        map.remove(key);
        Ok(())
    }

    async fn write_batch(&self, batch: &Batch) -> Result<(), StorageError> {
        self.ensure_open()?;
        // A single write guard makes the whole batch visible at once.
        let mut map = self.data.write().await;
        for op in batch.ops() {
            match op {
                BatchOp::Put { key, value } => {
                    map.insert(key.clone(), value.clone());
                }
                BatchOp::Delete { key } => {
                    map.remove(key);
                }
            }
        }
        Ok(())
    }

    async fn iterate(
        &self,
        range: &KeyRange,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        self.ensure_open()?;
        let map = self.data.read().await;
        let results = map
            .range(range.seek_key().to_vec()..)
            .take_while(|(k, _)| range.matches(k))
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(results)
    }

    async fn compact(
        &self,
        _start: Option<&[u8]>,
        _limit: Option<&[u8]>,
    ) -> Result<(), StorageError> {
        // Nothing to reclaim: removed entries are freed immediately.
        self.ensure_open()
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        self.ensure_open()
    }

    fn close(&self) -> Result<(), StorageError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(StorageError::Closed);
        }
        // Free the map now if no reader holds it; otherwise it goes on drop.
        if let Ok(mut map) = self.data.try_write() {
            map.clear();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memdb"
    }
}
