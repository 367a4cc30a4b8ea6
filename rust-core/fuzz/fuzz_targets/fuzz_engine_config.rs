// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for configuration parsing.
// Run with: cargo +nightly fuzz run fuzz_engine_config
//
// Feeds arbitrary bytes to both engine tuning parsers and to the engine
// name lookup. Malformed input must come back as an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use standalone_db::leveldb::LevelDbConfig;
use standalone_db::pebbledb::PebbleDbConfig;
use standalone_db::BackendKind;

fuzz_target!(|data: &[u8]| {
    if data.len() > 4096 {
        return;
    }

    let _ = LevelDbConfig::parse(data);
    let _ = PebbleDbConfig::parse(data);

    if let Ok(name) = std::str::from_utf8(data) {
        if let Ok(kind) = name.parse::<BackendKind>() {
            assert_eq!(kind.name(), name);
        }
    }
});
