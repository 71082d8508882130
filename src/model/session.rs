use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: usize = 11;

/// Opaque conversation identifier sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// `sess_` + base-36 millisecond timestamp + random base-36 suffix.
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;

        let mut rng = rand::thread_rng();
        let suffix: String = (0..RANDOM_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();

        Self(format!("sess_{}{}", to_base36(millis), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Holds the single session id of a running client.
#[derive(Debug, Clone)]
pub struct SessionStore {
    current: Option<SessionId>,
}

impl SessionStore {
    /// Creates the id immediately, no server round trip.
    pub fn new() -> Self {
        Self {
            current: Some(SessionId::generate()),
        }
    }

    /// A store that has not produced an id yet. The engine creates one on the
    /// first submission and drops that submission.
    pub fn deferred() -> Self {
        Self { current: None }
    }

    pub fn current(&self) -> Option<&SessionId> {
        self.current.as_ref()
    }

    pub fn create(&mut self) -> SessionId {
        let id = SessionId::generate();
        self.current = Some(id.clone());
        id
    }

    /// Replaces the id. Only a conversation reset calls this.
    pub fn reset(&mut self) -> SessionId {
        self.create()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = SessionId::generate();
        let s = id.as_str();
        assert!(s.starts_with("sess_"));
        assert!(s.len() > "sess_".len() + RANDOM_SUFFIX_LEN);
        assert!(s["sess_".len()..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_ids_differ_within_a_run() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }

    #[test]
    fn test_store_created_eagerly() {
        let store = SessionStore::new();
        assert!(store.current().is_some());
    }

    #[test]
    fn test_deferred_store_until_create() {
        let mut store = SessionStore::deferred();
        assert!(store.current().is_none());

        let id = store.create();
        assert_eq!(store.current(), Some(&id));
    }

    #[test]
    fn test_reset_replaces_id() {
        let mut store = SessionStore::new();
        let before = store.current().cloned();
        let after = store.reset();
        assert_ne!(before, Some(after.clone()));
        assert_eq!(store.current(), Some(&after));
    }
}
