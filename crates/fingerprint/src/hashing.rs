//! Feature hashing and folding
//!
//! Every feature is reduced to a 64-bit xxh3 hash. The hashes of one plane
//! are collected into an explicit array, sorted, and folded into the plane
//! with `hash mod plane_bits`.

use crate::bits::BitVector;
use xxhash_rust::xxh3::{xxh3_64, Xxh3};

/// Incremental xxh3 over a sequence of 64-bit words.
pub(crate) struct FeatureHasher {
    inner: Xxh3,
}

impl FeatureHasher {
    /// Hasher seeded with a domain tag so different feature families never
    /// share hashes.
    pub(crate) fn new(tag: u64) -> Self {
        let mut inner = Xxh3::new();
        inner.update(&tag.to_le_bytes());
        FeatureHasher { inner }
    }

    pub(crate) fn word(&mut self, value: u64) -> &mut Self {
        self.inner.update(&value.to_le_bytes());
        self
    }

    pub(crate) fn words(&mut self, values: &[u64]) -> &mut Self {
        self.word(values.len() as u64);
        for &v in values {
            self.word(v);
        }
        self
    }

    pub(crate) fn finish(&self) -> u64 {
        self.inner.digest()
    }
}

/// Hash of a short word sequence.
pub(crate) fn hash_words(values: &[u64]) -> u64 {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    xxh3_64(&bytes)
}

/// How repeated feature hashes are treated when folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Multiplicity {
    /// Each distinct feature sets one bit
    Set,
    /// The k-th repeat of a feature is mixed with k before folding
    Count,
}

/// Fold feature hashes into a plane of `bits` bits.
pub(crate) fn fold(mut features: Vec<u64>, bits: usize, multiplicity: Multiplicity) -> BitVector {
    features.sort_unstable();
    let mut plane = BitVector::new(bits);
    if bits == 0 {
        return plane;
    }
    let mut prev: Option<u64> = None;
    let mut occurrence = 0u64;
    for h in features {
        if prev == Some(h) {
            occurrence += 1;
        } else {
            occurrence = 0;
            prev = Some(h);
        }
        let value = match (multiplicity, occurrence) {
            (Multiplicity::Set, 0) | (Multiplicity::Count, 0) => h,
            (Multiplicity::Set, _) => continue,
            (Multiplicity::Count, k) => hash_words(&[h, k]),
        };
        plane.set((value % bits as u64) as usize);
    }
    plane
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_stable_and_order_sensitive() {
        assert_eq!(hash_words(&[1, 2, 3]), hash_words(&[1, 2, 3]));
        assert_ne!(hash_words(&[1, 2, 3]), hash_words(&[3, 2, 1]));
        let a = FeatureHasher::new(7).words(&[1, 2]).finish();
        let b = FeatureHasher::new(8).words(&[1, 2]).finish();
        assert_ne!(a, b);
    }

    #[test]
    fn fold_is_input_order_independent() {
        let a = fold(vec![10, 99, 4000, 10], 256, Multiplicity::Count);
        let b = fold(vec![10, 4000, 10, 99], 256, Multiplicity::Count);
        assert_eq!(a, b);
    }

    #[test]
    fn set_multiplicity_ignores_repeats() {
        let once = fold(vec![12345], 2048, Multiplicity::Set);
        let thrice = fold(vec![12345, 12345, 12345], 2048, Multiplicity::Set);
        assert_eq!(once, thrice);
        let counted = fold(vec![12345, 12345, 12345], 2048, Multiplicity::Count);
        assert!(counted.count_ones() > 1);
    }
}
