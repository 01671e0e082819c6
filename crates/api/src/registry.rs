//! Session registry
//!
//! Sessions are allocated and released explicitly. One of them may be
//! marked current so callers that work with a single active session do not
//! have to carry its id around.

use crate::session::Session;
use rustc_hash::FxHashMap;
use sieve_core::{Error, Result};
use std::fmt;
use tracing::info;

/// Session identifier, unique within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Raw id value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owner of every live session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: FxHashMap<SessionId, Session>,
    next: u64,
    current: Option<SessionId>,
}

impl SessionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh session and make it current.
    pub fn alloc(&mut self) -> SessionId {
        let id = SessionId(self.next);
        self.next += 1;
        self.sessions.insert(id, Session::new());
        self.current = Some(id);
        info!(target: "sieve::api", session = id.0, "Allocated session");
        id
    }

    /// Make `id` the current session.
    pub fn set_current(&mut self, id: SessionId) -> Result<()> {
        if !self.sessions.contains_key(&id) {
            return Err(unknown_session(id));
        }
        self.current = Some(id);
        Ok(())
    }

    /// The current session.
    pub fn current(&mut self) -> Result<&mut Session> {
        let id = self
            .current
            .ok_or_else(|| Error::InvalidOperation("no current session".to_string()))?;
        self.get(id)
    }

    /// Session `id`.
    pub fn get(&mut self, id: SessionId) -> Result<&mut Session> {
        self.sessions.get_mut(&id).ok_or_else(|| unknown_session(id))
    }

    /// Release session `id`, closing its open databases.
    pub fn release(&mut self, id: SessionId) -> Result<()> {
        let mut session = self.sessions.remove(&id).ok_or_else(|| unknown_session(id))?;
        session.teardown();
        if self.current == Some(id) {
            self.current = None;
        }
        info!(target: "sieve::api", session = id.0, "Released session");
        Ok(())
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True if no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn unknown_session(id: SessionId) -> Error {
    Error::InvalidOperation(format!("session {} does not exist", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn alloc_makes_session_current() {
        let mut registry = SessionRegistry::new();
        let a = registry.alloc();
        let b = registry.alloc();
        assert_ne!(a, b);
        assert!(registry.current().unwrap().load_molecule("C") > 0);
        registry.set_current(a).unwrap();
        assert_eq!(registry.current().unwrap().load_molecule("C"), 1);
        assert_eq!(registry.get(b).unwrap().load_molecule("C"), 2);
    }

    #[test]
    fn release_twice_fails() {
        let mut registry = SessionRegistry::new();
        let id = registry.alloc();
        registry.release(id).unwrap();
        assert!(registry.release(id).is_err());
        assert!(registry.current().is_err());
        assert!(registry.set_current(id).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn release_closes_open_databases() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_str().unwrap();
        let mut registry = SessionRegistry::new();

        let first = registry.alloc();
        let session = registry.current().unwrap();
        let db = session.create_database(path, "molecule", "");
        let mol = session.load_molecule("c1ccccc1");
        assert_eq!(session.insert_record(db, mol), 0);
        registry.release(first).unwrap();

        let second = registry.alloc();
        let session = registry.get(second).unwrap();
        let db = session.load_database(path);
        assert!(db > 0, "{:?}", session.last_error());
        let cursor = session.enumerate_id(db);
        assert_eq!(session.next(cursor), 1);
        assert_eq!(session.current_id(cursor), 0);
        assert_eq!(session.next(cursor), 0);
    }
}
