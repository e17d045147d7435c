//! Session-scoped keyed persistence.
//!
//! Everything the portal remembers between page reloads lives behind this
//! layer. Data is scoped to the browser tab/session lifetime: the backing
//! store dies with the session, which is intentional for narrative state.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Prefix shared by every session key; `clear_namespace` removes all of them.
pub const NAMESPACE: &str = "haetae_";

/// Fixed storage keys for the persisted session slots.
pub mod keys {
    pub const AGENT_SESSION: &str = "haetae_agent_session";
    pub const GAME_SESSION: &str = "haetae_game_session";
    pub const BUREAU_MODE: &str = "haetae_bureau_mode";
    pub const SESSION_SCHEDULES: &str = "haetae_session_schedules";
    pub const SESSION_APPROVALS: &str = "haetae_session_approvals";
    pub const SESSION_INSPECTIONS: &str = "haetae_session_inspections";
    pub const SESSION_RENTALS: &str = "haetae_session_rentals";
    pub const SESSION_MESSAGES: &str = "haetae_session_messages";
    pub const ACCEPTED_INCIDENTS: &str = "haetae_accepted_incident_ids";
    pub const TRIGGERED_EVENTS: &str = "haetae_triggered_event_ids";
    pub const READ_NOTICES: &str = "haetae_read_notice_ids";
}

/// Raw string key/value store a platform shell provides.
///
/// The reference implementation is [`MemoryBackend`]; a web shell would wrap
/// `sessionStorage` behind the same four operations. The contract is
/// infallible: a backend that cannot write simply drops the value.
pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String);
    fn remove_item(&mut self, key: &str);
    /// All keys currently present, in no particular order.
    fn keys(&self) -> Vec<String>;
}

/// In-memory backend with session-scoped lifetime semantics: dropping it
/// is the equivalent of closing the tab.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    items: HashMap<String, String>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }
}

/// Typed load/save layer over a [`StorageBackend`].
///
/// Reads are synchronous; a missing or corrupt stored value falls back to
/// the provided default without propagating the parse failure. Writes always
/// serialize the full value, never a partial merge.
#[derive(Debug, Clone)]
pub struct SessionStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> SessionStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Load `key`, falling back to `default` when the slot is missing or
    /// the stored JSON no longer parses.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.backend.get_item(key) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    log::warn!("discarding corrupt session value for {key}: {err}");
                    default
                }
            },
            None => default,
        }
    }

    /// Serialize and write the full value for `key`.
    pub fn save<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.backend.set_item(key, raw),
            Err(err) => log::warn!("failed to serialize session value for {key}: {err}"),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.backend.remove_item(key);
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.backend.get_item(key).is_some()
    }

    /// Remove every key under the bureau namespace. This is the logout
    /// full-reset, not merely clearing the identity slot.
    pub fn clear_namespace(&mut self) {
        for key in self.backend.keys() {
            if key.starts_with(NAMESPACE) {
                self.backend.remove_item(&key);
            }
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Consume the store, returning the backend (session handoff).
    #[must_use]
    pub fn into_backend(self) -> B {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_falls_back_on_missing_and_corrupt_values() {
        let mut store = SessionStore::new(MemoryBackend::new());
        assert_eq!(store.load::<i32>("haetae_counter", 7), 7);

        store.backend_mut().set_item("haetae_counter", "not json".into());
        assert_eq!(store.load::<i32>("haetae_counter", 7), 7);

        store.save("haetae_counter", &42);
        assert_eq!(store.load::<i32>("haetae_counter", 7), 42);
    }

    #[test]
    fn save_overwrites_whole_value() {
        let mut store = SessionStore::new(MemoryBackend::new());
        store.save("haetae_ids", &vec!["a".to_string(), "b".to_string()]);
        store.save("haetae_ids", &vec!["c".to_string()]);
        assert_eq!(
            store.load::<Vec<String>>("haetae_ids", Vec::new()),
            vec!["c".to_string()]
        );
    }

    #[test]
    fn clear_namespace_spares_foreign_keys() {
        let mut store = SessionStore::new(MemoryBackend::new());
        store.save(keys::AGENT_SESSION, &"x");
        store.save(keys::TRIGGERED_EVENTS, &vec!["egg-1"]);
        store.backend_mut().set_item("other_app_key", "kept".into());

        store.clear_namespace();

        assert!(!store.contains(keys::AGENT_SESSION));
        assert!(!store.contains(keys::TRIGGERED_EVENTS));
        assert_eq!(
            store.backend().get_item("other_app_key"),
            Some("kept".to_string())
        );
    }

    #[test]
    fn remove_deletes_the_slot() {
        let mut store = SessionStore::new(MemoryBackend::new());
        store.save("haetae_tmp", &1);
        store.remove("haetae_tmp");
        assert!(!store.contains("haetae_tmp"));
    }
}
