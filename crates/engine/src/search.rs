//! Exact substructure matching seam
//!
//! Screening with fingerprints never misses a true match but can let false
//! positives through. A `SubstructureMatcher` gets the final say on every
//! screened candidate.

use sieve_core::{ChemObject, Result};

/// Exact substructure test applied after fingerprint screening.
pub trait SubstructureMatcher {
    /// True if `query` occurs in `target`.
    fn matches(&self, query: &ChemObject, target: &ChemObject) -> Result<bool>;

    /// False if `matches` ignores its arguments, so candidates need not be
    /// decoded.
    fn needs_structures(&self) -> bool {
        true
    }
}

/// Accepts every screened candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreeningOnly;

impl SubstructureMatcher for ScreeningOnly {
    fn matches(&self, _query: &ChemObject, _target: &ChemObject) -> Result<bool> {
        Ok(true)
    }

    fn needs_structures(&self) -> bool {
        false
    }
}
