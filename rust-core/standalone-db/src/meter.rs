// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metering wrapper for storage backends.
//
// Wraps any `StorageBackend` and transparently records, per method, the
// number of calls, their cumulative wall-clock duration and the number of
// bytes moved. The counters are Prometheus collectors registered in the
// registry handed to `MeterBackend::new`, normally the `meterdb` namespace.

use std::time::Instant;

use async_trait::async_trait;
use prometheus::{IntCounterVec, Opts, Registry};

use crate::backend::StorageBackend;
use crate::batch::{Batch, KeyRange};
use crate::error::StorageError;

/// Label value for each metered method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Has,
    Get,
    Put,
    Delete,
    WriteBatch,
    Iterate,
    Compact,
    HealthCheck,
    Close,
}

impl Method {
    /// The label value recorded for this method.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Has => "has",
            Method::Get => "get",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::WriteBatch => "write_batch",
            Method::Iterate => "iterate",
            Method::Compact => "compact",
            Method::HealthCheck => "health_check",
            Method::Close => "close",
        }
    }
}

/// The Prometheus collectors behind a [`MeterBackend`].
#[derive(Debug, Clone)]
pub struct MeterCollectors {
    calls: IntCounterVec,
    duration: IntCounterVec,
    size: IntCounterVec,
}

impl MeterCollectors {
    /// Create the collectors and register them in `registry`.
    ///
    /// Fails if the registry already holds metrics with the same names.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let calls = IntCounterVec::new(
            Opts::new("calls", "number of calls to the database"),
            &["method"],
        )?;
        let duration = IntCounterVec::new(
            Opts::new("duration", "time spent in database calls (ns)"),
            &["method"],
        )?;
        let size = IntCounterVec::new(
            Opts::new("size", "size of data passed in database calls"),
            &["method"],
        )?;

        registry.register(Box::new(calls.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(size.clone()))?;

        Ok(Self {
            calls,
            duration,
            size,
        })
    }
}

/// A storage backend wrapper that meters every call.
///
/// Calls are counted whether or not they succeed; byte sizes are only
/// recorded for successful calls.
///
/// # Example
///
/// ```rust
/// use prometheus::Registry;
/// use standalone_db::backend::StorageBackend;
/// use standalone_db::memory::InMemoryBackend;
/// use standalone_db::meter::{MeterBackend, Method};
///
/// # tokio_test::block_on(async {
/// let metered = MeterBackend::new(&Registry::new(), InMemoryBackend::new()).unwrap();
///
/// metered.put(b"key", b"value").await.unwrap();
/// metered.get(b"key").await.unwrap();
///
/// assert_eq!(metered.calls(Method::Put), 1);
/// assert_eq!(metered.bytes(Method::Get), 5);
/// # });
/// ```
pub struct MeterBackend<B: StorageBackend> {
    /// The wrapped backend that performs the actual storage operations.
    inner: B,
    collectors: MeterCollectors,
}

impl<B: StorageBackend> MeterBackend<B> {
    /// Register fresh collectors in `registry` and wrap `inner`.
    pub fn new(registry: &Registry, inner: B) -> Result<Self, prometheus::Error> {
        let collectors = MeterCollectors::register(registry)?;
        Ok(Self::with_collectors(collectors, inner))
    }

    /// Wrap `inner`, recording into already registered collectors.
    pub fn with_collectors(collectors: MeterCollectors, inner: B) -> Self {
        Self { inner, collectors }
    }

    /// Number of calls recorded for `method`.
    pub fn calls(&self, method: Method) -> u64 {
        self.collectors.calls.with_label_values(&[method.as_str()]).get()
    }

    /// Cumulative nanoseconds recorded for `method`.
    pub fn duration_ns(&self, method: Method) -> u64 {
        self.collectors.duration.with_label_values(&[method.as_str()]).get()
    }

    /// Bytes recorded for `method`.
    pub fn bytes(&self, method: Method) -> u64 {
        self.collectors.size.with_label_values(&[method.as_str()]).get()
    }

    /// Return a reference to the inner backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn observe(&self, method: Method, start: Instant) {
        let label = [method.as_str()];
        let elapsed = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.collectors.calls.with_label_values(&label).inc();
        self.collectors.duration.with_label_values(&label).inc_by(elapsed);
    }

    fn record_bytes(&self, method: Method, bytes: usize) {
        self.collectors
            .size
            .with_label_values(&[method.as_str()])
            .inc_by(bytes as u64);
    }
}

#[async_trait]
impl<B: StorageBackend> StorageBackend for MeterBackend<B> {
    async fn has(&self, key: &[u8]) -> Result<bool, StorageError> {
        let start = Instant::now();
        let result = self.inner.has(key).await;
        self.observe(Method::Has, start);
        if result.is_ok() {
            self.record_bytes(Method::Has, key.len());
        }
        result
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let start = Instant::now();
        let result = self.inner.get(key).await;
        self.observe(Method::Get, start);
        if let Ok(Some(ref val)) = result {
            self.record_bytes(Method::Get, val.len());
        }
        result
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let start = Instant::now();
        let result = self.inner.put(key, value).await;
        self.observe(Method::Put, start);
        if result.is_ok() {
            self.record_bytes(Method::Put, key.len() + value.len());
        }
        result
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        let start = Instant::now();
        let result = self.inner.delete(key).await;
        self.observe(Method::Delete, start);
        if result.is_ok() {
            self.record_bytes(Method::Delete, key.len());
        }
        result
    }

    async fn write_batch(&self, batch: &Batch) -> Result<(), StorageError> {
        let start = Instant::now();
        let result = self.inner.write_batch(batch).await;
        self.observe(Method::WriteBatch, start);
        if result.is_ok() {
            self.record_bytes(Method::WriteBatch, batch.size());
        }
        result
    }

    async fn iterate(
        &self,
        range: &KeyRange,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let start = Instant::now();
        let result = self.inner.iterate(range, limit).await;
        self.observe(Method::Iterate, start);
        if let Ok(ref entries) = result {
            let bytes: usize = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
            self.record_bytes(Method::Iterate, bytes);
        }
        result
    }

    async fn compact(
        &self,
        start_key: Option<&[u8]>,
        limit: Option<&[u8]>,
    ) -> Result<(), StorageError> {
        let start = Instant::now();
        let result = self.inner.compact(start_key, limit).await;
        self.observe(Method::Compact, start);
        result
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        let start = Instant::now();
        let result = self.inner.health_check().await;
        self.observe(Method::HealthCheck, start);
        result
    }

    fn close(&self) -> Result<(), StorageError> {
        let start = Instant::now();
        let result = self.inner.close();
        self.observe(Method::Close, start);
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
