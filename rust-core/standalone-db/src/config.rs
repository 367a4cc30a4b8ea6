// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Database configuration and the closed set of selectable engines.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

/// The engines a [`DatabaseConfig`] may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// LSM-tree engine tuned with a LevelDB-style profile.
    LevelDb,
    /// Ephemeral in-memory engine.
    MemDb,
    /// LSM-tree engine tuned with a Pebble-style profile.
    PebbleDb,
}

impl BackendKind {
    /// Every valid engine name, in the order they are reported to users.
    pub const NAMES: [&'static str; 3] = [
        BackendKind::LevelDb.name(),
        BackendKind::MemDb.name(),
        BackendKind::PebbleDb.name(),
    ];

    /// The fixed name of this engine. On-disk engines also use it as their
    /// data subdirectory.
    pub const fn name(self) -> &'static str {
        match self {
            BackendKind::LevelDb => "leveldb",
            BackendKind::MemDb => "memdb",
            BackendKind::PebbleDb => "pebbledb",
        }
    }

    /// Look up an engine by its configured name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "leveldb" => Some(BackendKind::LevelDb),
            "memdb" => Some(BackendKind::MemDb),
            "pebbledb" => Some(BackendKind::PebbleDb),
            _ => None,
        }
    }

    /// Whether the engine keeps its data only in process memory.
    pub fn is_in_memory(self) -> bool {
        matches!(self, BackendKind::MemDb)
    }

    /// Resolve the data directory under `root` for on-disk engines.
    ///
    /// Returns `None` for the in-memory engine.
    pub fn data_dir(self, root: &Path) -> Option<PathBuf> {
        if self.is_in_memory() {
            None
        } else {
            Some(root.join(self.name()))
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::from_name(s).ok_or_else(|| DatabaseError::UnknownBackend {
            name: s.to_string(),
        })
    }
}

/// Configuration for the node's database.
///
/// `name` is kept as a plain string so that an unknown engine can be
/// reported verbatim. `config` is an opaque tuning payload interpreted only
/// by the selected engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DatabaseConfig {
    /// Engine name: one of [`BackendKind::NAMES`].
    pub name: String,
    /// Root directory; on-disk engines live in `<path>/<name>`.
    pub path: PathBuf,
    /// Engine-specific tuning payload (JSON for the on-disk engines).
    pub config: Vec<u8>,
    /// Discard writes instead of committing them.
    pub read_only: bool,
}

impl DatabaseConfig {
    /// Create a writable configuration with no tuning payload.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            config: Vec::new(),
            read_only: false,
        }
    }

    /// Set the engine tuning payload.
    pub fn with_config(mut self, config: impl Into<Vec<u8>>) -> Self {
        self.config = config.into();
        self
    }

    /// Toggle read-only mode.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Parse the configured engine name.
    pub fn backend_kind(&self) -> Result<BackendKind, DatabaseError> {
        self.name.parse()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new(BackendKind::LevelDb.name(), PathBuf::new())
    }
}
