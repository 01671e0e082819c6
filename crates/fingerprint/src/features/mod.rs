//! Feature extraction
//!
//! Each extractor returns an unsorted list of 64-bit feature hashes; the
//! builder sorts and folds them.

pub(crate) mod chem;
pub(crate) mod circular;
pub(crate) mod paths;
pub(crate) mod subgraphs;

/// Domain tags keep hashes of different feature families apart.
pub(crate) mod tags {
    pub const ATOM: u64 = 0x5356_4154;
    pub const SUBGRAPH: u64 = 0x5356_5347;
    pub const SHAPE: u64 = 0x5356_5348;
    pub const REFINE: u64 = 0x5356_5246;
    pub const PATH: u64 = 0x5356_5054;
    pub const CIRCULAR: u64 = 0x5356_4352;
}
