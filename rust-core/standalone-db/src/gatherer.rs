// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-wide metrics gatherer made of named Prometheus sub-registries.
//
// Each component that exports metrics claims its own namespace. Metric names
// registered in a namespace's registry are prefixed with the namespace
// (`db_estimate_num_keys`, `meterdb_calls`), and a namespace can only be
// claimed once per gatherer.

use std::collections::BTreeMap;
use std::sync::Mutex;

use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::debug;

use crate::error::MetricsError;

/// A set of uniquely named Prometheus registries.
///
/// Passed explicitly to whatever needs to register metrics; there is no
/// global instance.
#[derive(Debug, Default)]
pub struct MultiGatherer {
    registries: Mutex<BTreeMap<String, Registry>>,
}

impl MultiGatherer {
    /// Create an empty gatherer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry whose metrics are prefixed with `namespace` and
    /// register it under that name.
    ///
    /// Fails with [`MetricsError::DuplicateNamespace`] if the name is taken;
    /// the existing registry is left untouched.
    pub fn make_and_register(&self, namespace: &str) -> Result<Registry, MetricsError> {
        let mut registries = self
            .registries
            .lock()
            .map_err(|_| MetricsError::LockPoisoned)?;
        if registries.contains_key(namespace) {
            return Err(MetricsError::DuplicateNamespace(namespace.to_string()));
        }

        let registry = Registry::new_custom(Some(namespace.to_string()), None)?;
        registries.insert(namespace.to_string(), registry.clone());
        debug!(namespace, "registered metrics namespace");
        Ok(registry)
    }

    /// Whether `namespace` has been claimed.
    pub fn contains(&self, namespace: &str) -> Result<bool, MetricsError> {
        let registries = self
            .registries
            .lock()
            .map_err(|_| MetricsError::LockPoisoned)?;
        Ok(registries.contains_key(namespace))
    }

    /// Claimed namespaces, in lexicographic order.
    pub fn namespaces(&self) -> Result<Vec<String>, MetricsError> {
        let registries = self
            .registries
            .lock()
            .map_err(|_| MetricsError::LockPoisoned)?;
        Ok(registries.keys().cloned().collect())
    }

    /// Collect the metric families of every registry.
    pub fn gather(&self) -> Result<Vec<MetricFamily>, MetricsError> {
        let registries = self
            .registries
            .lock()
            .map_err(|_| MetricsError::LockPoisoned)?;
        Ok(registries.values().flat_map(Registry::gather).collect())
    }

    /// Render every registry in the Prometheus text exposition format.
    pub fn gather_text(&self) -> Result<String, MetricsError> {
        let families = self.gather()?;
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
