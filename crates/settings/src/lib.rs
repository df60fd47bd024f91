use std::collections::BTreeMap;

use tracing::warn;

/// Storage key of the Compute server URL.
pub const COMPUTE_URL_KEY: &str = "compute:url";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    StorageUnavailable,
    Io(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::StorageUnavailable => write!(f, "browser storage unavailable"),
            SettingsError::Io(msg) => write!(f, "settings storage error: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}

/// String key-value storage surviving page reloads.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// Saved Compute URL, if any. Storage failures read as "nothing saved".
pub fn load_compute_url<S: SettingsStore + ?Sized>(store: &S) -> Option<String> {
    match store.get(COMPUTE_URL_KEY) {
        Ok(Some(url)) if !url.trim().is_empty() => Some(url.trim().to_string()),
        Ok(_) => None,
        Err(err) => {
            warn!(error = %err, "could not read saved compute url");
            None
        }
    }
}

/// Remembers the Compute URL. Best-effort: a failing store is logged, never
/// surfaced, so a full or blocked storage cannot abort a run.
pub fn save_compute_url<S: SettingsStore + ?Sized>(store: &mut S, url: &str) {
    let url = url.trim();
    if url.is_empty() {
        return;
    }
    if let Err(err) = store.set(COMPUTE_URL_KEY, url) {
        warn!(error = %err, "could not save compute url");
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemorySettingsStore {
    values: BTreeMap<String, String>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{SettingsError, SettingsStore};

    #[derive(Debug, Default)]
    pub struct LocalStorageSettingsStore;

    impl LocalStorageSettingsStore {
        pub fn new() -> Result<Self, SettingsError> {
            // Probe once so callers can fall back to memory up front.
            window_local_storage()?;
            Ok(Self)
        }
    }

    impl SettingsStore for LocalStorageSettingsStore {
        fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
            window_local_storage()?
                .get_item(key)
                .map_err(|e| SettingsError::Io(format!("get_item({key}) failed: {:?}", e)))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
            window_local_storage()?
                .set_item(key, value)
                .map_err(|e| SettingsError::Io(format!("set_item({key}) failed: {:?}", e)))
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, SettingsError> {
        let win = web_sys::window().ok_or(SettingsError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| SettingsError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(SettingsError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageSettingsStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStorageSettingsStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorageSettingsStore {
    pub fn new() -> Result<Self, SettingsError> {
        Err(SettingsError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SettingsStore for LocalStorageSettingsStore {
    fn get(&self, _key: &str) -> Result<Option<String>, SettingsError> {
        Err(SettingsError::StorageUnavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), SettingsError> {
        Err(SettingsError::StorageUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct BrokenStore;

    impl SettingsStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, SettingsError> {
            Err(SettingsError::Io("quota".into()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), SettingsError> {
            Err(SettingsError::Io("quota".into()))
        }
    }

    #[test]
    fn compute_url_round_trips_under_fixed_key() {
        let mut store = InMemorySettingsStore::new();
        assert_eq!(load_compute_url(&store), None);

        save_compute_url(&mut store, "  http://localhost:6500/ ");
        assert_eq!(
            store.get(COMPUTE_URL_KEY).unwrap(),
            Some("http://localhost:6500/".to_string())
        );
        assert_eq!(
            load_compute_url(&store),
            Some("http://localhost:6500/".to_string())
        );
    }

    #[test]
    fn blank_url_is_not_saved() {
        let mut store = InMemorySettingsStore::new();
        save_compute_url(&mut store, "   ");
        assert_eq!(store.get(COMPUTE_URL_KEY).unwrap(), None);
    }

    #[test]
    fn broken_store_is_tolerated() {
        let mut store = BrokenStore;
        save_compute_url(&mut store, "http://x");
        assert_eq!(load_compute_url(&store), None);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn local_storage_is_unavailable_natively() {
        assert_eq!(
            LocalStorageSettingsStore::new().unwrap_err(),
            SettingsError::StorageUnavailable
        );
    }
}
