//! Pharmacophore-typed atom invariants for the `chem` similarity mode

use sieve_core::{Element, Molecule};

const DONOR: u64 = 1;
const ACCEPTOR: u64 = 1 << 1;
const POSITIVE: u64 = 1 << 2;
const NEGATIVE: u64 = 1 << 3;
const AROMATIC: u64 = 1 << 4;
const HALOGEN: u64 = 1 << 5;
const HYDROPHOBIC: u64 = 1 << 6;

/// Pharmacophore class flags of every atom.
///
/// Atoms are typed by role only: two atoms of different elements with the
/// same flags are interchangeable for the `chem` mode.
pub(crate) fn pharmacophore_invariants(mol: &Molecule) -> Vec<u64> {
    (0..mol.atom_count()).map(|a| flags(mol, a)).collect()
}

fn flags(mol: &Molecule, a: usize) -> u64 {
    let atom = mol.atom(a);
    let mut flags = 0;
    let hetero = matches!(atom.element, Element::N | Element::O);

    if hetero && mol.total_hydrogens(a) > 0 {
        flags |= DONOR;
    }
    if atom.charge <= 0 {
        let acceptor = match atom.element {
            Element::O => true,
            Element::N => {
                mol.total_hydrogens(a) == 0 && (mol.heavy_degree(a) < 3 || atom.aromatic)
            }
            _ => false,
        };
        if acceptor {
            flags |= ACCEPTOR;
        }
    }
    if atom.charge > 0 {
        flags |= POSITIVE;
    }
    if atom.charge < 0 {
        flags |= NEGATIVE;
    }
    if atom.aromatic {
        flags |= AROMATIC;
    }
    if atom.element.is_halogen() {
        flags |= HALOGEN;
    }
    if atom.element == Element::C
        && mol.neighbors(a).iter().all(|&(n, _)| {
            matches!(mol.atom(n).element, Element::C | Element::H)
        })
    {
        flags |= HYDROPHOBIC;
    }
    flags
}
