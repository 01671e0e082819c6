//! Shared identifier and classification types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a record at insert time.
///
/// Per-database, starts at 0, strictly increasing, never reused.
pub type RecordId = u64;

/// Category of a chemical object: a single molecule or a reaction.
///
/// Also selects the record layout of a database (its schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    /// Atom/bond graph of one (possibly disconnected) molecule
    Molecule,
    /// Reactant and product molecule sets
    Reaction,
}

/// Database schema kind. Databases store exactly one object class.
pub type SchemaKind = ObjectClass;

impl ObjectClass {
    /// Parse a class name (`"molecule"` or `"reaction"`, case-insensitive).
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "molecule" => Ok(ObjectClass::Molecule),
            "reaction" => Ok(ObjectClass::Reaction),
            other => Err(Error::InvalidOperation(format!(
                "unknown schema '{}', expected \"molecule\" or \"reaction\"",
                other
            ))),
        }
    }

    /// Lowercase name as stored in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClass::Molecule => "molecule",
            ObjectClass::Reaction => "reaction",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
