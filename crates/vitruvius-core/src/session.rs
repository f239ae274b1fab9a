//! Sessions and session storage.
//!
//! A [`Session`] is a key-value mapping tracked for modification. Storage
//! is pluggable through [`SessionStore`]; [`MemorySessionStore`] keeps
//! everything in process. The session id travels in a cookie, written by
//! [`RequestContext::session_to_cookie`](crate::RequestContext::session_to_cookie).

use std::collections::HashMap;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

/// Stored session contents.
pub type SessionData = IndexMap<String, Value>;

/// Backend for persisting session data between requests.
pub trait SessionStore: Send + Sync + 'static {
    /// Loads the data for a session id.
    fn load(&self, id: &str) -> Option<SessionData>;

    /// Persists the data for a session id.
    fn save(&self, id: &str, data: &SessionData);

    /// Removes a session.
    fn destroy(&self, id: &str);
}

/// In-process session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns true if no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &str) -> Option<SessionData> {
        self.sessions.read().get(id).cloned()
    }

    fn save(&self, id: &str, data: &SessionData) {
        self.sessions.write().insert(id.to_string(), data.clone());
    }

    fn destroy(&self, id: &str) {
        self.sessions.write().remove(id);
    }
}

/// Cookie settings for the session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Cookie name.
    pub cookie_name: String,
    /// `Max-Age` of the cookie in seconds.
    pub timeout_secs: u64,
    /// Whether to set `Secure`.
    pub secure: bool,
    /// Whether to set `HttpOnly`.
    pub http_only: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "vitruvius_session".to_string(),
            timeout_secs: 3600,
            secure: false,
            http_only: true,
        }
    }
}

/// A per-request session.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    data: SessionData,
    modified: bool,
    is_new: bool,
}

impl Session {
    /// Starts a fresh session with a new id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            data: SessionData::new(),
            modified: false,
            is_new: true,
        }
    }

    /// Restores a stored session.
    #[must_use]
    pub fn restore(id: impl Into<String>, data: SessionData) -> Self {
        Self {
            id: id.into(),
            data,
            modified: false,
            is_new: false,
        }
    }

    /// Session id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Reads a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Writes a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
        self.modified = true;
    }

    /// Removes a value.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        let removed = self.data.shift_remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns true if the session was written during this request.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Returns true if the session did not come from the store.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// All stored values.
    #[must_use]
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub(crate) fn mark_saved(&mut self) {
        self.modified = false;
        self.is_new = false;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_tracks_modification() {
        let mut session = Session::new();
        assert!(session.is_new());
        assert!(!session.is_modified());

        session.set("user", "alice");
        assert!(session.is_modified());
        assert_eq!(session.get("user"), Some(&json!("alice")));

        assert_eq!(session.delete("user"), Some(json!("alice")));
        assert!(!session.contains("user"));
    }

    #[test]
    fn test_delete_missing_key_is_not_a_modification() {
        let mut session = Session::restore("abc", SessionData::new());
        assert!(session.delete("nothing").is_none());
        assert!(!session.is_modified());
        assert!(!session.is_new());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemorySessionStore::new();
        let mut data = SessionData::new();
        data.insert("n".to_string(), json!(1));

        store.save("abc", &data);
        assert_eq!(store.load("abc"), Some(data));
        assert_eq!(store.len(), 1);

        store.destroy("abc");
        assert!(store.load("abc").is_none());
        assert!(store.is_empty());
    }
}
