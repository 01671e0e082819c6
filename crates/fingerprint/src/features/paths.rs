//! Linear path features for the `sim` similarity mode

use crate::features::tags;
use crate::hashing::FeatureHasher;
use crate::normalize::Labels;
use sieve_core::Molecule;

/// Every simple path of 0..=`max_len` bonds, one hash per path occurrence.
///
/// A path is hashed over the smaller of its label sequence and the reverse,
/// and recorded once (from its lower-index end).
pub(crate) fn path_features(mol: &Molecule, labels: &Labels, max_len: usize) -> Vec<u64> {
    let mut out = Vec::new();
    let mut on_path = vec![false; mol.atom_count()];
    for start in 0..mol.atom_count() {
        let mut walk = PathWalk {
            mol,
            labels,
            max_len,
            atoms: vec![start],
            bonds: Vec::new(),
            on_path: &mut on_path,
            out: &mut out,
        };
        walk.extend();
    }
    out
}

struct PathWalk<'a> {
    mol: &'a Molecule,
    labels: &'a Labels,
    max_len: usize,
    atoms: Vec<usize>,
    bonds: Vec<usize>,
    on_path: &'a mut [bool],
    out: &'a mut Vec<u64>,
}

impl PathWalk<'_> {
    fn extend(&mut self) {
        let last = self.atoms[self.atoms.len() - 1];
        self.on_path[last] = true;
        if self.atoms.len() == 1 || self.atoms[0] < last {
            self.out.push(self.hash());
        }
        if self.bonds.len() < self.max_len {
            for &(n, b) in self.mol.neighbors(last) {
                if self.on_path[n] {
                    continue;
                }
                self.atoms.push(n);
                self.bonds.push(b);
                self.extend();
                self.atoms.pop();
                self.bonds.pop();
            }
        }
        self.on_path[last] = false;
    }

    fn hash(&self) -> u64 {
        let mut forward = Vec::with_capacity(self.atoms.len() * 2);
        forward.push(self.labels.atoms[self.atoms[0]]);
        for (i, &b) in self.bonds.iter().enumerate() {
            forward.push(self.labels.bonds[b]);
            forward.push(self.labels.atoms[self.atoms[i + 1]]);
        }
        let reverse: Vec<u64> = forward.iter().rev().copied().collect();
        let seq = if reverse < forward { reverse } else { forward };
        FeatureHasher::new(tags::PATH).words(&seq).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::structural_labels;
    use sieve_core::parse_smiles;

    fn count(smiles: &str, max_len: usize) -> usize {
        let mol = parse_smiles(smiles).unwrap();
        path_features(&mol, &structural_labels(&mol), max_len).len()
    }

    #[test]
    fn chain_paths_are_counted_once() {
        // 4 atoms, 3 one-bond, 2 two-bond, 1 three-bond
        assert_eq!(count("CCCC", 6), 10);
        assert_eq!(count("CCCC", 1), 7);
    }

    #[test]
    fn ring_paths_do_not_revisit_atoms() {
        // 3 atoms, 3 one-bond paths, 3 two-bond paths
        assert_eq!(count("C1CC1", 6), 9);
    }

    #[test]
    fn reversed_paths_share_hashes() {
        let mol = parse_smiles("OCCN").unwrap();
        let forward = path_features(&mol, &structural_labels(&mol), 6);
        let mol = parse_smiles("NCCO").unwrap();
        let backward = path_features(&mol, &structural_labels(&mol), 6);
        let (mut a, mut b) = (forward, backward);
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }
}
