//! Per-session handle table

use rustc_hash::FxHashMap;
use sieve_core::{ChemObject, Error, Result};
use sieve_engine::{Cursor, Database};
use sieve_fingerprint::Fingerprint;

/// Anything a handle can name.
#[derive(Debug)]
pub enum HandleObject {
    /// Molecule, query molecule or reaction
    Object(ChemObject),
    /// Fingerprint
    Fingerprint(Fingerprint),
    /// Open or closed database
    Database(Database),
    /// Search cursor
    Cursor(Cursor),
}

impl HandleObject {
    fn type_name(&self) -> &'static str {
        match self {
            HandleObject::Object(_) => "structure",
            HandleObject::Fingerprint(_) => "fingerprint",
            HandleObject::Database(_) => "database",
            HandleObject::Cursor(_) => "search",
        }
    }
}

/// Handles are positive, start at 1 and are never reused.
#[derive(Debug)]
pub struct HandleTable {
    entries: FxHashMap<i32, HandleObject>,
    next: i32,
}

impl Default for HandleTable {
    fn default() -> Self {
        HandleTable {
            entries: FxHashMap::default(),
            next: 1,
        }
    }
}

macro_rules! typed_accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty, $name:literal) => {
        /// Borrow the entry, which must be of this type.
        pub fn $get(&self, handle: i32) -> Result<&$ty> {
            match self.entry(handle)? {
                HandleObject::$variant(v) => Ok(v),
                other => Err(wrong_type(handle, $name, other)),
            }
        }

        /// Mutably borrow the entry, which must be of this type.
        pub fn $get_mut(&mut self, handle: i32) -> Result<&mut $ty> {
            match self.entries.get_mut(&handle) {
                Some(HandleObject::$variant(v)) => Ok(v),
                Some(other) => Err(wrong_type(handle, $name, other)),
                None => Err(Error::InvalidHandle(handle)),
            }
        }
    };
}

fn wrong_type(handle: i32, expected: &str, found: &HandleObject) -> Error {
    Error::InvalidOperation(format!(
        "handle {} is a {}, expected a {}",
        handle,
        found.type_name(),
        expected
    ))
}

impl HandleTable {
    /// Store `object` under a fresh handle.
    pub fn insert(&mut self, object: HandleObject) -> Result<i32> {
        let handle = self.next;
        self.next = self
            .next
            .checked_add(1)
            .ok_or_else(|| Error::InvalidOperation("handle space exhausted".to_string()))?;
        self.entries.insert(handle, object);
        Ok(handle)
    }

    /// Borrow any entry.
    pub fn entry(&self, handle: i32) -> Result<&HandleObject> {
        self.entries.get(&handle).ok_or(Error::InvalidHandle(handle))
    }

    /// Remove an entry and hand it back.
    pub fn remove(&mut self, handle: i32) -> Result<HandleObject> {
        self.entries.remove(&handle).ok_or(Error::InvalidHandle(handle))
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no handle is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All live databases.
    pub fn databases_mut(&mut self) -> impl Iterator<Item = (i32, &mut Database)> {
        self.entries.iter_mut().filter_map(|(&h, entry)| match entry {
            HandleObject::Database(db) => Some((h, db)),
            _ => None,
        })
    }

    typed_accessors!(object, object_mut, Object, ChemObject, "structure");
    typed_accessors!(fingerprint, fingerprint_mut, Fingerprint, Fingerprint, "fingerprint");
    typed_accessors!(database, database_mut, Database, Database, "database");
    typed_accessors!(cursor, cursor_mut, Cursor, Cursor, "search");
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_core::parse_smiles;

    #[test]
    fn handles_start_at_one_and_are_not_reused() {
        let mut table = HandleTable::default();
        let mol = || HandleObject::Object(ChemObject::from(parse_smiles("C").unwrap()));
        let a = table.insert(mol()).unwrap();
        let b = table.insert(mol()).unwrap();
        assert_eq!((a, b), (1, 2));
        table.remove(a).unwrap();
        assert_eq!(table.insert(mol()).unwrap(), 3);
        assert!(matches!(table.remove(a), Err(Error::InvalidHandle(1))));
    }

    #[test]
    fn typed_access_checks_the_variant() {
        let mut table = HandleTable::default();
        let h = table
            .insert(HandleObject::Object(ChemObject::from(parse_smiles("CC").unwrap())))
            .unwrap();
        assert!(table.object(h).is_ok());
        assert!(matches!(table.database(h), Err(Error::InvalidOperation(_))));
        assert!(matches!(table.cursor_mut(99), Err(Error::InvalidHandle(99))));
    }
}
