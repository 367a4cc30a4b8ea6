// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `leveldb` engine profile.
//
// Opens a RocksDB instance tuned the way a LevelDB deployment is: a small
// block cache and write buffer, bloom filters on every table and level-0
// triggers taken from the LevelDB defaults.

use std::path::Path;

use prometheus::Registry;
use rocksdb::{BlockBasedOptions, Cache, Options};
use serde::{Deserialize, Serialize};

use crate::config::BackendKind;
use crate::error::StorageError;
use crate::rocks::RocksBackend;

/// Fixed engine name, also the data subdirectory.
pub const NAME: &str = BackendKind::LevelDb.name();

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;

/// Tuning payload for the `leveldb` engine, parsed from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct LevelDbConfig {
    /// Capacity of the shared block cache in bytes.
    pub block_cache_capacity: usize,
    /// Uncompressed size of a data block in bytes.
    pub block_size: usize,
    /// Memtable size in bytes before it is flushed.
    pub write_buffer: usize,
    /// Bloom filter bits per key; 0 disables the filter.
    pub filter_bits_per_key: u32,
    /// Maximum number of table files kept open.
    pub open_files_cache_capacity: i32,
    /// Number of level-0 files that triggers a compaction.
    pub compaction_l0_trigger: i32,
    /// Number of level-0 files at which writes are slowed down.
    pub write_l0_slowdown_trigger: i32,
    /// Number of level-0 files at which writes are paused.
    pub write_l0_pause_trigger: i32,
}

impl Default for LevelDbConfig {
    fn default() -> Self {
        Self {
            block_cache_capacity: 12 * MIB,
            block_size: 4 * KIB,
            write_buffer: 6 * MIB,
            filter_bits_per_key: 10,
            open_files_cache_capacity: 1024,
            compaction_l0_trigger: 4,
            write_l0_slowdown_trigger: 8,
            write_l0_pause_trigger: 12,
        }
    }
}

impl LevelDbConfig {
    /// Parse a tuning payload. An empty payload yields the defaults.
    pub fn parse(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    fn options(&self) -> Options {
        let mut table = BlockBasedOptions::default();
        table.set_block_cache(&Cache::new_lru_cache(self.block_cache_capacity));
        table.set_block_size(self.block_size);
        if self.filter_bits_per_key > 0 {
            table.set_bloom_filter(f64::from(self.filter_bits_per_key), false);
        }

        let mut opts = Options::default();
        opts.set_block_based_table_factory(&table);
        opts.set_write_buffer_size(self.write_buffer);
        opts.set_max_open_files(self.open_files_cache_capacity);
        opts.set_level_zero_file_num_compaction_trigger(self.compaction_l0_trigger);
        opts.set_level_zero_slowdown_writes_trigger(self.write_l0_slowdown_trigger);
        opts.set_level_zero_stop_writes_trigger(self.write_l0_pause_trigger);
        opts
    }
}

/// Open the `leveldb` engine in `path`.
///
/// `config` is the raw tuning payload; its gauges are registered in
/// `registry`.
pub fn open(path: &Path, config: &[u8], registry: &Registry) -> Result<RocksBackend, StorageError> {
    let config = LevelDbConfig::parse(config)?;
    // LevelDB leaves syncing to the OS unless a write asks for it.
    RocksBackend::open(NAME, path, config.options(), false, registry)
}
