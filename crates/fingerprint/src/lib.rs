//! Fingerprints and similarity for SieveDB
//!
//! - `FingerprintKind` / `SimilarityMode`: what a fingerprint carries
//! - `FingerprintParams`: plane lengths and feature enumeration bounds
//! - `FingerprintBuilder`: structure to fingerprint
//! - `similarity`: metrics over fingerprints or structures

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bits;
pub mod builder;
pub mod edit;
mod features;
mod hashing;
pub mod kind;
mod normalize;
pub mod params;
pub mod similarity;

pub use bits::{BitVector, Fingerprint};
pub use builder::FingerprintBuilder;
pub use edit::{levenshtein, normalized_edit_similarity};
pub use kind::{parse_similarity_type, FingerprintKind, SimilarityMode};
pub use params::FingerprintParams;
pub use similarity::{
    bit_similarity, euclid_sub, fingerprint_similarity, similarity, tanimoto, tversky, Operand,
    SimilarityMetric,
};
