//! SieveDB - embedded chemical structure index
//!
//! SieveDB computes binary fingerprints for molecules and reactions, scores
//! similarity between them, and keeps an embedded record store that can be
//! enumerated or searched by substructure screening and similarity range.
//!
//! # Quick Start
//!
//! ```ignore
//! use sievedb::{Session, SessionRegistry};
//!
//! let mut registry = SessionRegistry::new();
//! let id = registry.alloc();
//! let session = registry.get(id)?;
//!
//! let db = session.create_database("/tmp/mols", "molecule", "similarity-type:ecfp4");
//! let mol = session.load_molecule("C1CCNCC1");
//! session.insert_record(db, mol);
//!
//! let cursor = session.search_sim(db, mol, 0.7, 1.0, "tanimoto");
//! while session.next(cursor) == 1 {
//!     println!("{} {}", session.current_id(cursor), session.current_similarity(cursor));
//! }
//! session.end_search(cursor);
//! session.close_database(db);
//! ```
//!
//! # Architecture
//!
//! The handle-based session layer is re-exported at the top level. The
//! typed layers underneath are available as modules:
//! - [`model`]: structures, SMILES reader, canonical forms, errors
//! - [`fingerprint`]: fingerprint kinds, builder and similarity metrics
//! - [`engine`]: `Database`, `Cursor` and the on-disk format

pub use sieve_api::*;

pub use sieve_core as model;
pub use sieve_engine as engine;
pub use sieve_fingerprint as fingerprint;

pub use sieve_core::{ChemObject, Error, ErrorCategory, Molecule, Reaction, RecordId, Result};
pub use sieve_engine::{Cursor, Database, DatabaseOptions, ScreeningOnly, SubstructureMatcher};
pub use sieve_fingerprint::{
    Fingerprint, FingerprintBuilder, FingerprintKind, SimilarityMetric, SimilarityMode,
};
