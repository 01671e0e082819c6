//! Atom and bond labelings for feature extraction
//!
//! Labels are computed on an aromatized copy of the structure. Substructure
//! labelings depend only on the atom or bond itself, never on its wider
//! environment, except for the conjugation and tautomer-zone flags of the
//! normalized kinds.

use sieve_core::{BondOrder, Element, Molecule};

/// Bond label shared by all bonds inside a conjugated system
const BOND_CONJUGATED: u64 = 5;
/// Bond label shared by all bonds inside a tautomeric zone
const BOND_TAUTOMER: u64 = 6;

/// Per-atom and per-bond labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Labels {
    pub atoms: Vec<u64>,
    pub bonds: Vec<u64>,
}

fn atom_word(element: Element, flags: u64) -> u64 {
    ((element.atomic_number() as u64) << 32) | flags
}

fn charge_bits(charge: i8) -> u64 {
    (charge as i64 as u64 & 0xff) << 8
}

fn plain_bond_labels(mol: &Molecule) -> Vec<u64> {
    mol.bonds().iter().map(|b| b.order.code() as u64).collect()
}

/// Element, aromaticity and formal charge; bond order.
pub(crate) fn structural_labels(mol: &Molecule) -> Labels {
    let atoms = mol
        .atoms()
        .iter()
        .map(|a| atom_word(a.element, charge_bits(a.charge) | a.aromatic as u64))
        .collect();
    Labels {
        atoms,
        bonds: plain_bond_labels(mol),
    }
}

fn has_pi_bond(mol: &Molecule, atom: usize) -> bool {
    mol.neighbors(atom)
        .iter()
        .any(|&(_, b)| mol.bond(b).order != BondOrder::Single)
}

/// Atoms taking part in a conjugated system: atoms with a multiple or
/// aromatic bond, plus charged atoms and N/O/S atoms adjacent to one.
pub(crate) fn conjugated_atoms(mol: &Molecule) -> Vec<bool> {
    let pi: Vec<bool> = (0..mol.atom_count()).map(|a| has_pi_bond(mol, a)).collect();
    (0..mol.atom_count())
        .map(|a| {
            if pi[a] {
                return true;
            }
            let atom = mol.atom(a);
            (atom.charge != 0 || atom.element.is_nos())
                && mol.neighbors(a).iter().any(|&(n, _)| pi[n])
        })
        .collect()
}

/// Resonance-normalized labels: element plus conjugation flag, charges
/// dropped, and bond order erased between conjugated atoms (triple bonds
/// keep theirs).
pub(crate) fn resonance_labels(mol: &Molecule) -> Labels {
    let conjugated = conjugated_atoms(mol);
    let atoms = mol
        .atoms()
        .iter()
        .zip(&conjugated)
        .map(|(a, &c)| atom_word(a.element, c as u64))
        .collect();
    let bonds = mol
        .bonds()
        .iter()
        .map(|b| {
            if conjugated[b.begin] && conjugated[b.end] && b.order != BondOrder::Triple {
                BOND_CONJUGATED
            } else {
                b.order.code() as u64
            }
        })
        .collect();
    Labels { atoms, bonds }
}

/// Tautomeric zone: the pi system, heteroatoms adjacent to it, and
/// hydrogen-bearing carbons alpha to a pi atom that carries a heteroatom.
pub(crate) fn tautomer_zone(mol: &Molecule) -> Vec<bool> {
    let pi: Vec<bool> = (0..mol.atom_count()).map(|a| has_pi_bond(mol, a)).collect();
    let hetero = |a: usize| mol.atom(a).element.is_nos();
    let pi_with_hetero: Vec<bool> = (0..mol.atom_count())
        .map(|a| pi[a] && mol.neighbors(a).iter().any(|&(n, _)| hetero(n)))
        .collect();

    (0..mol.atom_count())
        .map(|a| {
            if pi[a] {
                return true;
            }
            let nbrs = mol.neighbors(a);
            if hetero(a) {
                return nbrs.iter().any(|&(n, _)| pi[n]);
            }
            mol.atom(a).element == Element::C
                && mol.total_hydrogens(a) > 0
                && nbrs.iter().any(|&(n, _)| pi_with_hetero[n])
        })
        .collect()
}

/// Tautomer-normalized labels: element plus zone membership, bond order
/// erased inside the zone. Aromaticity, charge and hydrogens are ignored.
pub(crate) fn tautomer_labels(mol: &Molecule) -> Labels {
    let zone = tautomer_zone(mol);
    let atoms = mol
        .atoms()
        .iter()
        .zip(&zone)
        .map(|(a, &z)| atom_word(a.element, z as u64))
        .collect();
    let bonds = mol
        .bonds()
        .iter()
        .map(|b| {
            if zone[b.begin] && zone[b.end] {
                BOND_TAUTOMER
            } else {
                b.order.code() as u64
            }
        })
        .collect();
    Labels { atoms, bonds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_core::{aromatize, parse_smiles};

    fn prepared(smiles: &str) -> Molecule {
        let mut mol = parse_smiles(smiles).unwrap();
        aromatize(&mut mol);
        mol
    }

    #[test]
    fn carboxylate_and_acid_share_resonance_labels() {
        let acid = resonance_labels(&prepared("CC(=O)O"));
        let anion = resonance_labels(&prepared("CC(=O)[O-]"));
        assert_eq!(acid, anion);
        assert_ne!(
            structural_labels(&prepared("CC(=O)O")),
            structural_labels(&prepared("CC(=O)[O-]"))
        );
    }

    #[test]
    fn saturated_chain_is_not_conjugated() {
        assert!(conjugated_atoms(&prepared("CCCO")).iter().all(|c| !c));
    }

    #[test]
    fn keto_enol_zone_covers_alpha_carbon() {
        let zone = tautomer_zone(&prepared("CC(=O)C"));
        assert_eq!(zone, vec![true, true, true, true]);
        let zone = tautomer_zone(&prepared("CCCC"));
        assert!(zone.iter().all(|z| !z));
    }

    #[test]
    fn hydroxypyridine_and_pyridone_share_tautomer_labels() {
        let mut a = tautomer_labels(&prepared("Oc1ccccn1")).atoms;
        let mut b = tautomer_labels(&prepared("O=C1C=CC=CN1")).atoms;
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }
}
