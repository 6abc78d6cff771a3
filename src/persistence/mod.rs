//! Best-score persistence
//!
//! Features:
//! - One integer record per game, keyed `<game_id>_best`
//! - Monotonic-max writes (a smaller value never replaces a larger one)
//! - Failures are reported as `StoreError` and swallowed by callers

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt record {key}: {value:?}")]
    Corrupt { key: String, value: String },

    #[error("write failed for {key}: {reason}")]
    Write { key: String, reason: String },
}

/// Persisted key-value store of best scores
pub trait BestStore {
    /// Stored best for `game_id`, 0 if there is no record
    fn get(&self, game_id: &str) -> Result<u32, StoreError>;
    fn set(&mut self, game_id: &str, value: u32) -> Result<(), StoreError>;
}

/// Storage key for a game's best score
pub fn storage_key(game_id: &str) -> String {
    format!("{game_id}_best")
}

/// Parse a stored record; an absent record is 0
pub fn parse_record(key: &str, raw: Option<&str>) -> Result<u32, StoreError> {
    match raw {
        None => Ok(0),
        Some(text) => text.trim().parse().map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            value: text.to_string(),
        }),
    }
}

/// Persist `score` unless the store already holds a value at least as high
///
/// Another session may have written since this one loaded its best, so the
/// stored value is re-read first. Returns whether a write happened.
pub fn record_best(store: &mut dyn BestStore, game_id: &str, score: u32) -> bool {
    let stored = store.get(game_id).unwrap_or_else(|e| {
        log::warn!("Re-reading {} best failed ({}), assuming 0", game_id, e);
        0
    });
    if score <= stored {
        log::debug!("Keeping stored {} best {} (session {})", game_id, stored, score);
        return false;
    }
    match store.set(game_id, score) {
        Ok(()) => {
            log::info!("New {} best saved: {}", game_id, score);
            true
        }
        Err(e) => {
            log::warn!("Saving {} best failed: {}", game_id, e);
            false
        }
    }
}

/// In-memory store (native builds and tests)
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Put a raw value, bypassing validation
    pub fn insert_raw(&mut self, game_id: &str, raw: &str) {
        self.entries.insert(storage_key(game_id), raw.to_string());
    }
}

impl BestStore for MemoryStore {
    fn get(&self, game_id: &str) -> Result<u32, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        let key = storage_key(game_id);
        parse_record(&key, self.entries.get(&key).map(String::as_str))
    }

    fn set(&mut self, game_id: &str, value: u32) -> Result<(), StoreError> {
        let key = storage_key(game_id);
        if self.fail_writes {
            return Err(StoreError::Write {
                key,
                reason: "writes disabled".into(),
            });
        }
        self.entries.insert(key, value.to_string());
        Ok(())
    }
}

/// Browser LocalStorage store (WASM only)
#[cfg(target_arch = "wasm32")]
pub struct LocalStorageStore {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub fn new() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable - best scores won't persist");
        }
        Self { storage }
    }

    fn storage(&self) -> Result<&web_sys::Storage, StoreError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("no LocalStorage".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl BestStore for LocalStorageStore {
    fn get(&self, game_id: &str) -> Result<u32, StoreError> {
        let key = storage_key(game_id);
        let raw = self
            .storage()?
            .get_item(&key)
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))?;
        parse_record(&key, raw.as_deref())
    }

    fn set(&mut self, game_id: &str, value: u32) -> Result<(), StoreError> {
        let key = storage_key(game_id);
        self.storage()?
            .set_item(&key, &value.to_string())
            .map_err(|e| StoreError::Write {
                key,
                reason: format!("{:?}", e),
            })
    }
}
