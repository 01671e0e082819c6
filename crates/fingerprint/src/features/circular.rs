//! Circular (Morgan) neighborhood features

use crate::features::tags;
use crate::hashing::{hash_words, FeatureHasher};
use sieve_core::{Molecule, RingInfo};
use smallvec::SmallVec;

/// Standard ECFP atom invariants: atomic number, heavy degree, valence,
/// total hydrogens, formal charge, isotope, ring membership, aromaticity.
pub(crate) fn ecfp_invariants(mol: &Molecule, rings: &RingInfo) -> Vec<u64> {
    (0..mol.atom_count())
        .map(|a| {
            let atom = mol.atom(a);
            hash_words(&[
                atom.element.atomic_number() as u64,
                mol.heavy_degree(a) as u64,
                mol.valence(a) as u64,
                mol.total_hydrogens(a) as u64,
                atom.charge as i64 as u64,
                atom.isotope as u64,
                rings.atom_in_ring(a) as u64,
                atom.aromatic as u64,
            ])
        })
        .collect()
}

/// Iterated neighborhood hashing out to `radius` bonds.
///
/// Every atom contributes its identifier at every radius `0..=radius`;
/// identical environments are kept, so the result is a multiset.
pub(crate) fn circular_features(mol: &Molecule, initial: Vec<u64>, radius: usize) -> Vec<u64> {
    let mut out = Vec::with_capacity(initial.len() * (radius + 1));
    out.extend(initial.iter().map(|&h| hash_words(&[0, h])));
    let mut current = initial;
    for r in 1..=radius {
        current = (0..mol.atom_count())
            .map(|a| {
                let mut nbrs: SmallVec<[u64; 4]> = mol
                    .neighbors(a)
                    .iter()
                    .map(|&(n, b)| hash_words(&[mol.bond(b).order.code() as u64, current[n]]))
                    .collect();
                nbrs.sort_unstable();
                FeatureHasher::new(tags::CIRCULAR)
                    .word(r as u64)
                    .word(current[a])
                    .words(&nbrs)
                    .finish()
            })
            .collect();
        out.extend(current.iter().map(|&h| hash_words(&[r as u64, h])));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_core::parse_smiles;

    fn ecfp(smiles: &str, radius: usize) -> Vec<u64> {
        let mol = parse_smiles(smiles).unwrap();
        let rings = RingInfo::find(&mol);
        let mut f = circular_features(&mol, ecfp_invariants(&mol, &rings), radius);
        f.sort_unstable();
        f
    }

    #[test]
    fn one_feature_per_atom_per_radius() {
        assert_eq!(ecfp("CCO", 2).len(), 9);
        assert_eq!(ecfp("CCO", 0).len(), 3);
    }

    #[test]
    fn ring_membership_separates_environments() {
        let chain: Vec<u64> = ecfp("CCCCCC", 0);
        let ring: Vec<u64> = ecfp("C1CCCCC1", 0);
        assert!(chain.iter().all(|h| !ring.contains(h)));
    }

    #[test]
    fn atom_order_does_not_matter() {
        assert_eq!(ecfp("OCC(N)C", 3), ecfp("CC(N)CO", 3));
    }
}
