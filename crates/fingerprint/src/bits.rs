//! Fixed-length bit vectors and fingerprints

use crate::kind::{FingerprintKind, SimilarityMode};
use serde::{Deserialize, Serialize};
use sieve_core::{Error, ObjectClass, Result};

/// Fixed-length bit set stored in 64-bit words.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitVector {
    words: Vec<u64>,
    len: usize,
}

impl BitVector {
    /// All-zero vector of `len` bits. `len` is rounded up to whole words
    /// only in storage; `len()` reports the requested length.
    pub fn new(len: usize) -> Self {
        BitVector {
            words: vec![0; (len + 63) / 64],
            len,
        }
    }

    /// Length in bits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length vector.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set bit `idx`. Out-of-range indices are ignored.
    pub fn set(&mut self, idx: usize) {
        if idx < self.len {
            if let Some(word) = self.words.get_mut(idx / 64) {
                *word |= 1u64 << (idx % 64);
            }
        }
    }

    /// Read bit `idx`.
    pub fn get(&self, idx: usize) -> bool {
        idx < self.len
            && self
                .words
                .get(idx / 64)
                .map_or(false, |word| word & (1u64 << (idx % 64)) != 0)
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// `|self ∩ other|`
    pub fn and_count(&self, other: &BitVector) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// `|self ∪ other|`
    pub fn or_count(&self, other: &BitVector) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a | b).count_ones() as usize)
            .sum()
    }

    /// True if every bit set in `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &BitVector) -> bool {
        self.len == other.len
            && self
                .words
                .iter()
                .zip(&other.words)
                .all(|(a, b)| a & !b == 0)
    }

    /// Indices of set bits, ascending.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.get(i))
    }

    /// Concatenation of `parts`. Every part must be word aligned.
    pub(crate) fn concat(parts: &[BitVector]) -> BitVector {
        let mut words = Vec::new();
        let mut len = 0;
        for part in parts {
            debug_assert_eq!(part.len % 64, 0);
            words.extend_from_slice(&part.words);
            len += part.len;
        }
        BitVector { words, len }
    }

    /// Bits `start..start + len` as a new vector.
    ///
    /// # Errors
    ///
    /// `Corruption` if `start` is not word aligned or the range runs past the
    /// stored words, as happens with a damaged deserialized fingerprint.
    pub(crate) fn slice(&self, start: usize, len: usize) -> Result<BitVector> {
        let end = start.checked_add(len).filter(|&end| end <= self.len);
        let words = end.and_then(|_| {
            if start % 64 != 0 {
                return None;
            }
            let first = start / 64;
            self.words.get(first..first + (len + 63) / 64)
        });
        match words {
            Some(words) => Ok(BitVector {
                words: words.to_vec(),
                len,
            }),
            None => Err(Error::Corruption(format!(
                "bit range {}+{} does not fit a {} bit vector of {} words",
                start,
                len,
                self.len,
                self.words.len()
            ))),
        }
    }

    /// Raw words, least significant bit first.
    pub fn as_words(&self) -> &[u64] {
        &self.words
    }
}

/// Fingerprint of one chemical object.
///
/// For kinds with both planes the first `sub_bits` bits are the
/// substructure plane and the remainder the similarity plane. Reaction
/// fingerprints place the reactant half of each plane before the product
/// half.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    kind: FingerprintKind,
    mode: Option<SimilarityMode>,
    class: ObjectClass,
    sub_bits: usize,
    bits: BitVector,
}

impl Fingerprint {
    pub(crate) fn new(
        kind: FingerprintKind,
        mode: Option<SimilarityMode>,
        class: ObjectClass,
        sub_bits: usize,
        bits: BitVector,
    ) -> Self {
        Fingerprint {
            kind,
            mode,
            class,
            sub_bits,
            bits,
        }
    }

    /// Kind this fingerprint was built as.
    pub fn kind(&self) -> FingerprintKind {
        self.kind
    }

    /// Similarity sub-mode, present exactly when the kind has a similarity
    /// plane.
    pub fn mode(&self) -> Option<SimilarityMode> {
        self.mode
    }

    /// Molecule or reaction.
    pub fn class(&self) -> ObjectClass {
        self.class
    }

    /// Length of the substructure plane (zero for `Sim`).
    pub fn sub_bits(&self) -> usize {
        self.sub_bits
    }

    /// Total length in bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True for a zero-length fingerprint.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// All bits.
    pub fn bits(&self) -> &BitVector {
        &self.bits
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// True if `other` has the same kind, mode, class and length.
    pub fn is_comparable(&self, other: &Fingerprint) -> bool {
        self.kind == other.kind
            && self.mode == other.mode
            && self.class == other.class
            && self.sub_bits == other.sub_bits
            && self.bits.len() == other.bits.len()
    }

    /// The substructure plane as a standalone `Sub` fingerprint.
    ///
    /// # Errors
    ///
    /// `IncompatibleOperands` for a `Sim` fingerprint; `Corruption` if the
    /// stored plane boundary does not fit the bits.
    pub fn sub_plane(&self) -> Result<Fingerprint> {
        match self.kind {
            FingerprintKind::Sim => Err(Error::IncompatibleOperands(
                "sim fingerprint has no substructure plane".to_string(),
            )),
            FingerprintKind::Full => Ok(Fingerprint::new(
                FingerprintKind::Sub,
                None,
                self.class,
                self.sub_bits,
                self.bits.slice(0, self.sub_bits)?,
            )),
            _ => Ok(self.clone()),
        }
    }

    /// The similarity plane as a standalone `Sim` fingerprint.
    ///
    /// # Errors
    ///
    /// `IncompatibleOperands` for substructure-only kinds; `Corruption` if
    /// the stored plane boundary does not fit the bits.
    pub fn sim_plane(&self) -> Result<Fingerprint> {
        match self.kind {
            FingerprintKind::Sim => Ok(self.clone()),
            FingerprintKind::Full => Ok(Fingerprint::new(
                FingerprintKind::Sim,
                self.mode,
                self.class,
                0,
                self.bits
                    .slice(self.sub_bits, self.bits.len().saturating_sub(self.sub_bits))?,
            )),
            _ => Err(Error::IncompatibleOperands(format!(
                "{} fingerprint has no similarity plane",
                self.kind
            ))),
        }
    }

    /// True if every bit of `self` is set in `other`; used for substructure
    /// screening with `self` as the query.
    pub fn screens(&self, other: &Fingerprint) -> bool {
        self.bits.is_subset_of(&other.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_and_count() {
        let mut bits = BitVector::new(128);
        bits.set(0);
        bits.set(64);
        bits.set(127);
        bits.set(500);
        assert!(bits.get(64));
        assert!(!bits.get(63));
        assert_eq!(bits.count_ones(), 3);
        assert_eq!(bits.ones().collect::<Vec<_>>(), vec![0, 64, 127]);
    }

    #[test]
    fn intersection_and_union() {
        let mut a = BitVector::new(64);
        let mut b = BitVector::new(64);
        a.set(1);
        a.set(2);
        b.set(2);
        b.set(3);
        assert_eq!(a.and_count(&b), 1);
        assert_eq!(a.or_count(&b), 3);
        assert!(!a.is_subset_of(&b));
        b.set(1);
        assert!(a.is_subset_of(&b));
    }

    #[test]
    fn planes_split_at_sub_bits() {
        let mut sub = BitVector::new(64);
        sub.set(5);
        let mut sim = BitVector::new(128);
        sim.set(70);
        let fp = Fingerprint::new(
            FingerprintKind::Full,
            Some(SimilarityMode::Sim),
            ObjectClass::Molecule,
            64,
            BitVector::concat(&[sub.clone(), sim.clone()]),
        );
        assert_eq!(fp.len(), 192);
        assert_eq!(fp.sub_plane().unwrap().bits(), &sub);
        assert_eq!(fp.sim_plane().unwrap().bits(), &sim);
        assert_eq!(fp.sim_plane().unwrap().mode(), Some(SimilarityMode::Sim));
        assert!(fp.sub_plane().unwrap().sim_plane().is_err());
    }

    #[test]
    fn damaged_plane_boundaries_are_errors() {
        let past_end = Fingerprint::new(
            FingerprintKind::Full,
            Some(SimilarityMode::Sim),
            ObjectClass::Molecule,
            256,
            BitVector::new(128),
        );
        assert!(matches!(past_end.sub_plane(), Err(Error::Corruption(_))));
        assert!(matches!(past_end.sim_plane(), Err(Error::Corruption(_))));

        let unaligned = Fingerprint::new(
            FingerprintKind::Full,
            Some(SimilarityMode::Sim),
            ObjectClass::Molecule,
            100,
            BitVector::new(256),
        );
        assert!(matches!(unaligned.sim_plane(), Err(Error::Corruption(_))));

        let short_words = BitVector {
            words: vec![u64::MAX],
            len: 256,
        };
        assert!(short_words.get(0));
        assert!(!short_words.get(200));
        let truncated = Fingerprint::new(
            FingerprintKind::Full,
            Some(SimilarityMode::Sim),
            ObjectClass::Molecule,
            64,
            short_words,
        );
        assert!(matches!(truncated.sim_plane(), Err(Error::Corruption(_))));
        assert!(truncated.sub_plane().is_ok());
    }
}
