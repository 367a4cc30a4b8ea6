// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Write batches and iteration ranges shared by every backend.

/// A single mutation recorded in a [`Batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Store `value` under `key`.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove `key`.
    Delete { key: Vec<u8> },
}

/// An ordered set of mutations applied atomically by
/// [`crate::backend::StorageBackend::write_batch`].
///
/// Operations are applied in insertion order, so a later `put` of the same
/// key wins over an earlier `delete`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    ops: Vec<BatchOp>,
    size: usize,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a put.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> &mut Self {
        self.size += key.len() + value.len();
        self.ops.push(BatchOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        });
        self
    }

    /// Queue a delete.
    pub fn delete(&mut self, key: &[u8]) -> &mut Self {
        self.size += key.len();
        self.ops.push(BatchOp::Delete { key: key.to_vec() });
        self
    }

    /// The queued operations, in order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True if nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Bytes queued: key plus value length for puts, key length for deletes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Drop every queued operation.
    pub fn reset(&mut self) {
        self.ops.clear();
        self.size = 0;
    }
}

/// Bounds for [`crate::backend::StorageBackend::iterate`].
///
/// Selects keys that are `>= start` and begin with `prefix`. Both default to
/// empty, which selects every key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRange {
    /// Inclusive lower bound.
    pub start: Vec<u8>,
    /// Required key prefix.
    pub prefix: Vec<u8>,
}

impl KeyRange {
    /// Every key.
    pub fn all() -> Self {
        Self::default()
    }

    /// Keys starting with `prefix`.
    pub fn with_prefix(prefix: &[u8]) -> Self {
        Self {
            start: Vec::new(),
            prefix: prefix.to_vec(),
        }
    }

    /// Keys `>= start` starting with `prefix`.
    pub fn new(start: &[u8], prefix: &[u8]) -> Self {
        Self {
            start: start.to_vec(),
            prefix: prefix.to_vec(),
        }
    }

    /// The first key position worth seeking to: the larger of `start` and
    /// `prefix`.
    pub fn seek_key(&self) -> &[u8] {
        if self.start.as_slice() > self.prefix.as_slice() {
            &self.start
        } else {
            &self.prefix
        }
    }

    /// Whether `key` carries the required prefix.
    pub fn matches(&self, key: &[u8]) -> bool {
        key.starts_with(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_tracks_size_and_order() {
        let mut batch = Batch::new();
        batch.put(b"a", b"111").delete(b"bb").put(b"c", b"2");

        assert_eq!(batch.len(), 3);
        // 1 + 3, then 2, then 1 + 1.
        assert_eq!(batch.size(), 8);
        assert_eq!(batch.ops()[1], BatchOp::Delete { key: b"bb".to_vec() });
    }

    #[test]
    fn test_batch_reset() {
        let mut batch = Batch::new();
        batch.put(b"k", b"v");
        batch.reset();
        assert!(batch.is_empty());
        assert_eq!(batch.size(), 0);
    }

    #[test]
    fn test_seek_key_takes_larger_bound() {
        assert_eq!(KeyRange::new(b"user:5", b"user:").seek_key(), b"user:5");
        assert_eq!(KeyRange::new(b"a", b"user:").seek_key(), b"user:");
        assert_eq!(KeyRange::all().seek_key(), b"");
    }

    #[test]
    fn test_matches_prefix() {
        let range = KeyRange::with_prefix(b"pfx:");
        assert!(range.matches(b"pfx:1"));
        assert!(!range.matches(b"pf"));
        assert!(KeyRange::all().matches(b"anything"));
    }
}
