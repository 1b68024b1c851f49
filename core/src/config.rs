use crate::Mode;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Settings for a [crate::SecureFileWriter]. Loading these from a file is up to the caller; this
/// type only describes their shape. Fields missing from the input take their defaults (using
/// `#[serde(default)]`).
#[derive(Debug, Deserialize)]
pub struct WriteOptions {
    /// Mode used by `write_default`. Written as octal text (`"0600"`) or as an integer. Cannot be
    /// world-writable.
    #[serde(default = "default_mode")]
    pub default_mode: Mode,

    /// If true, the file contents and the parent directory are flushed to disk before the write
    /// returns.
    #[serde(default = "default_sync")]
    pub sync: bool,

    // serde places unrecognized fields here, so that a typo produces a warning (see
    // `warn_unknown`) instead of an error.
    #[serde(flatten)]
    pub unknown: HashMap<String, Value>,
}

impl WriteOptions {
    /// Emits a warning for every unrecognized field.
    pub fn warn_unknown(&self) {
        let mut entries: Vec<_> = self.unknown.keys().collect();
        entries.sort_unstable();
        entries
            .into_iter()
            .for_each(|name| warn!("Unknown write option {name}"));
    }
}

impl Default for WriteOptions {
    fn default() -> WriteOptions {
        WriteOptions {
            default_mode: default_mode(),
            sync: default_sync(),
            unknown: HashMap::new(),
        }
    }
}

fn default_mode() -> Mode {
    Mode::OWNER_READ_WRITE
}

fn default_sync() -> bool {
    true
}
