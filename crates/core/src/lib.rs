//! Core types for SieveDB
//!
//! This crate defines the structures every other layer works with:
//! - Molecule / Reaction / ChemObject: atom-bond graphs and reaction sides
//! - SMILES reader for building structures from strings
//! - Ring perception and aromatization
//! - Canonical ranking and canonical token serialization
//! - Binary structure codec used by the record store
//! - Error: error type hierarchy shared by all crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod codec;
pub mod error;
pub mod molecule;
pub mod rings;
pub mod smiles;
pub mod types;

pub use canonical::{canonical_ranks, canonical_reaction_tokens, canonical_smiles, canonical_tokens};
pub use codec::{decode_object, encode_object};
pub use error::{Error, ErrorCategory, Result};
pub use molecule::{Atom, Bond, BondOrder, ChemObject, Element, Molecule, Reaction};
pub use rings::{aromatize, RingInfo};
pub use smiles::{parse_object, parse_query_smiles, parse_reaction_smiles, parse_smiles};
pub use types::{ObjectClass, RecordId, SchemaKind};
