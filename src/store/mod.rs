//! Persistence of the verbose flag.
//!
//! The flag is read once when the shipper starts and written on every
//! toggle. Reads never fail from the caller's point of view: anything other
//! than a stored `true` means verbose is off.

pub mod file;

pub use file::FileVerboseStore;

use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on verbose flag: {0}")]
    Io(#[from] std::io::Error),
    #[error("Verbose store unavailable: {0}")]
    Unavailable(String),
}

pub trait VerboseStore: Send + Sync {
    fn read(&self) -> bool;
    fn write(&self, verbose: bool) -> Result<(), StoreError>;
}

pub type SharedVerboseStore = Arc<dyn VerboseStore>;

/// Literal text used to persist the flag.
pub fn encode_flag(verbose: bool) -> &'static str {
    if verbose { "true" } else { "false" }
}

pub fn decode_flag(raw: &str) -> bool {
    raw.trim() == "true"
}

/// Process-local store, for hosts without durable storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryVerboseStore {
    value: Arc<Mutex<Option<String>>>,
}

impl MemoryVerboseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(verbose: bool) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(encode_flag(verbose).to_string()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.value.lock().clone()
    }
}

impl VerboseStore for MemoryVerboseStore {
    fn read(&self) -> bool {
        self.value.lock().as_deref().is_some_and(decode_flag)
    }

    fn write(&self, verbose: bool) -> Result<(), StoreError> {
        *self.value.lock() = Some(encode_flag(verbose).to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_only_accepts_true() {
        assert!(decode_flag("true"));
        assert!(decode_flag("true\n"));
        assert!(!decode_flag("false"));
        assert!(!decode_flag("TRUE"));
        assert!(!decode_flag("1"));
        assert!(!decode_flag(""));
    }

    #[test]
    fn test_memory_store_defaults_to_false() {
        let store = MemoryVerboseStore::new();
        assert!(!store.read());
        store.write(true).unwrap();
        assert!(store.read());
        assert_eq!(store.raw().as_deref(), Some("true"));
    }
}
