// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `pebbledb` engine profile.
//
// Pebble keeps RocksDB's on-disk format, so this profile opens a RocksDB
// instance with Pebble's tuning knobs: a large shared cache, incremental
// syncing, several memtables before writes stall and synced writes by
// default.

use std::path::Path;

use prometheus::Registry;
use rocksdb::{BlockBasedOptions, Cache, Options};
use serde::{Deserialize, Serialize};

use crate::config::BackendKind;
use crate::error::StorageError;
use crate::rocks::RocksBackend;

/// Fixed engine name, also the data subdirectory.
pub const NAME: &str = BackendKind::PebbleDb.name();

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;

/// Tuning payload for the `pebbledb` engine, parsed from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PebbleDbConfig {
    /// Block cache size in bytes.
    pub cache_size: usize,
    /// Sync SST data in the background every this many bytes.
    pub bytes_per_sync: u64,
    /// Sync the WAL in the background every this many bytes; 0 disables.
    pub wal_bytes_per_sync: u64,
    /// Number of memtables allowed before writes stop.
    pub mem_table_stop_writes_threshold: i32,
    /// Memtable size in bytes.
    pub mem_table_size: usize,
    /// Maximum number of open files.
    pub max_open_files: i32,
    /// Maximum number of concurrent background compactions.
    pub max_concurrent_compactions: i32,
    /// Sync the WAL on every write.
    pub sync: bool,
}

impl Default for PebbleDbConfig {
    fn default() -> Self {
        Self {
            cache_size: 512 * MIB,
            bytes_per_sync: 512 * KIB as u64,
            wal_bytes_per_sync: 0,
            mem_table_stop_writes_threshold: 8,
            mem_table_size: 16 * MIB,
            max_open_files: 4096,
            max_concurrent_compactions: 1,
            sync: true,
        }
    }
}

impl PebbleDbConfig {
    /// Parse a tuning payload. An empty payload yields the defaults.
    pub fn parse(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    fn options(&self) -> Options {
        let mut table = BlockBasedOptions::default();
        table.set_block_cache(&Cache::new_lru_cache(self.cache_size));

        let mut opts = Options::default();
        opts.set_block_based_table_factory(&table);
        opts.set_bytes_per_sync(self.bytes_per_sync);
        opts.set_wal_bytes_per_sync(self.wal_bytes_per_sync);
        opts.set_max_write_buffer_number(self.mem_table_stop_writes_threshold);
        opts.set_write_buffer_size(self.mem_table_size);
        opts.set_max_open_files(self.max_open_files);
        opts.set_max_background_jobs(self.max_concurrent_compactions);
        opts
    }
}

/// Open the `pebbledb` engine in `path`.
///
/// `config` is the raw tuning payload; its gauges are registered in
/// `registry`.
pub fn open(path: &Path, config: &[u8], registry: &Registry) -> Result<RocksBackend, StorageError> {
    let config = PebbleDbConfig::parse(config)?;
    RocksBackend::open(NAME, path, config.options(), config.sync, registry)
}
