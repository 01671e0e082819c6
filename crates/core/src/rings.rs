//! Ring perception and benzenoid aromatization
//!
//! Rings are the shortest cycles through each ring bond. Aromatization is a
//! normalization pass: Kekulé and aromatic depictions of the same benzenoid
//! or five-membered heteroaromatic ring systems end up with identical
//! aromatic atoms and bonds.

use crate::molecule::{BondOrder, Element, Molecule};
use std::collections::VecDeque;

/// Rings found in a molecule.
#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    rings: Vec<Vec<usize>>,
    atom_in_ring: Vec<bool>,
    bond_in_ring: Vec<bool>,
}

impl RingInfo {
    /// Find the shortest cycle through every bond, deduplicated by atom set.
    pub fn find(mol: &Molecule) -> Self {
        let mut rings: Vec<Vec<usize>> = Vec::new();
        let mut seen: Vec<Vec<usize>> = Vec::new();
        let mut atom_in_ring = vec![false; mol.atom_count()];
        let mut bond_in_ring = vec![false; mol.bond_count()];

        for bond_idx in 0..mol.bond_count() {
            let Some(cycle) = shortest_cycle_through(mol, bond_idx) else {
                continue;
            };
            bond_in_ring[bond_idx] = true;
            for &a in &cycle {
                atom_in_ring[a] = true;
            }
            let mut key = cycle.clone();
            key.sort_unstable();
            if !seen.contains(&key) {
                seen.push(key);
                rings.push(cycle);
            }
        }

        RingInfo {
            rings,
            atom_in_ring,
            bond_in_ring,
        }
    }

    /// Rings as atom sequences in cycle order.
    pub fn rings(&self) -> &[Vec<usize>] {
        &self.rings
    }

    /// True if the atom lies on any ring.
    pub fn atom_in_ring(&self, atom: usize) -> bool {
        self.atom_in_ring.get(atom).copied().unwrap_or(false)
    }

    /// True if the bond lies on any ring.
    pub fn bond_in_ring(&self, bond: usize) -> bool {
        self.bond_in_ring.get(bond).copied().unwrap_or(false)
    }
}

/// BFS from one end of `bond_idx` to the other without using the bond itself.
fn shortest_cycle_through(mol: &Molecule, bond_idx: usize) -> Option<Vec<usize>> {
    let bond = mol.bond(bond_idx);
    let (start, goal) = (bond.begin, bond.end);
    let mut parent = vec![usize::MAX; mol.atom_count()];
    parent[start] = start;
    let mut queue = VecDeque::from([start]);

    while let Some(a) = queue.pop_front() {
        if a == goal {
            let mut path = vec![goal];
            let mut cur = goal;
            while cur != start {
                cur = parent[cur];
                path.push(cur);
            }
            return Some(path);
        }
        for &(n, b) in mol.neighbors(a) {
            if b == bond_idx || parent[n] != usize::MAX {
                continue;
            }
            parent[n] = a;
            queue.push_back(n);
        }
    }
    None
}

/// Mark benzenoid six-membered rings and heteroaromatic five-membered rings
/// aromatic.
///
/// A six-membered ring of carbon/nitrogen atoms qualifies when every ring
/// atom is covered by an in-ring double bond or an in-ring aromatic bond. A
/// five-membered ring of C/N/O/S atoms qualifies when all atoms but one are
/// covered that way and the remaining atom is a neutral lone-pair donor
/// (pyrrole-type N, furan O, thiophene S) with only single bonds. Iterated to
/// a fixpoint so fused Kekulé systems resolve ring by ring.
///
/// Returns true if anything changed.
pub fn aromatize(mol: &mut Molecule) -> bool {
    let info = RingInfo::find(mol);
    let candidates: Vec<Vec<usize>> = info
        .rings()
        .iter()
        .filter(|ring| {
            let allowed = |a: usize| {
                let atom = mol.atom(a);
                match ring.len() {
                    6 => atom.aromatic || matches!(atom.element, Element::C | Element::N),
                    5 => atom.aromatic || atom.element == Element::C || atom.element.is_nos(),
                    _ => false,
                }
            };
            ring.iter().all(|&a| allowed(a))
        })
        .cloned()
        .collect();

    let mut done = vec![false; candidates.len()];
    let mut changed_any = false;
    loop {
        let mut changed = false;
        for (ring, done) in candidates.iter().zip(done.iter_mut()) {
            if *done {
                continue;
            }
            let Some(ring_bonds) = ring_bonds(mol, ring) else {
                *done = true;
                continue;
            };
            let orders: Vec<BondOrder> = ring_bonds.iter().map(|&b| mol.bond(b).order).collect();
            if orders.iter().any(|o| *o == BondOrder::Triple) {
                *done = true;
                continue;
            }
            let uncovered: Vec<usize> = (0..ring.len())
                .filter(|&k| {
                    let before = orders[(k + ring.len() - 1) % ring.len()];
                    let after = orders[k];
                    !matches!(before, BondOrder::Double | BondOrder::Aromatic)
                        && !matches!(after, BondOrder::Double | BondOrder::Aromatic)
                })
                .map(|k| ring[k])
                .collect();
            let aromatic = match (ring.len(), uncovered.as_slice()) {
                (6, []) => true,
                (5, [donor]) => is_lone_pair_donor(mol, *donor),
                _ => false,
            };
            if !aromatic {
                continue;
            }
            for &b in &ring_bonds {
                mol.set_bond_order(b, BondOrder::Aromatic);
            }
            for &a in ring {
                mol.atom_mut(a).aromatic = true;
            }
            *done = true;
            changed = true;
        }
        if !changed {
            break;
        }
        changed_any = true;
    }
    changed_any
}

/// Neutral N, O or S whose bonds are all single; O and S must be divalent.
fn is_lone_pair_donor(mol: &Molecule, atom: usize) -> bool {
    let a = mol.atom(atom);
    if a.charge != 0
        || mol
            .neighbors(atom)
            .iter()
            .any(|&(_, b)| mol.bond(b).order != BondOrder::Single)
    {
        return false;
    }
    match a.element {
        Element::N => true,
        Element::O | Element::S => mol.degree(atom) == 2 && a.hydrogens == 0,
        _ => false,
    }
}

/// Bond `k` joins ring atom `k` and ring atom `k + 1`.
fn ring_bonds(mol: &Molecule, ring: &[usize]) -> Option<Vec<usize>> {
    (0..ring.len())
        .map(|k| mol.bond_between(ring[k], ring[(k + 1) % ring.len()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    #[test]
    fn finds_single_ring() {
        let mol = parse_smiles("C1CCNCC1").unwrap();
        let info = RingInfo::find(&mol);
        assert_eq!(info.rings().len(), 1);
        assert_eq!(info.rings()[0].len(), 6);
        assert!((0..6).all(|a| info.atom_in_ring(a)));
    }

    #[test]
    fn chain_atoms_are_not_in_ring() {
        let mol = parse_smiles("CCOc1ccccc1").unwrap();
        let info = RingInfo::find(&mol);
        assert!(!info.atom_in_ring(0));
        assert!(!info.bond_in_ring(0));
        assert!(info.atom_in_ring(3));
    }

    #[test]
    fn fused_rings_are_separate() {
        let mol = parse_smiles("c1ccc2ccccc2c1").unwrap();
        let info = RingInfo::find(&mol);
        assert_eq!(info.rings().len(), 2);
    }

    #[test]
    fn kekule_benzene_is_aromatized() {
        let mut mol = parse_smiles("C1=CC=CC=C1").unwrap();
        assert!(aromatize(&mut mol));
        assert!(mol.atoms().iter().all(|a| a.aromatic));
        assert!(mol.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
    }

    #[test]
    fn kekule_naphthalene_is_aromatized() {
        let mut mol = parse_smiles("C1=CC=C2C=CC=CC2=C1").unwrap();
        aromatize(&mut mol);
        assert!(mol.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
    }

    #[test]
    fn kekule_five_membered_heteroaromatics_are_aromatized() {
        for smiles in ["C1=CNC=C1", "C1=COC=C1", "C1=CSC=C1", "CN1C=CC=C1", "C1=CN=CN1"] {
            let mut mol = parse_smiles(smiles).unwrap();
            assert!(aromatize(&mut mol), "input {}", smiles);
            let ring_atoms = mol.atoms().iter().filter(|a| a.aromatic).count();
            assert_eq!(ring_atoms, 5, "input {}", smiles);
        }
    }

    #[test]
    fn kekule_indole_resolves_both_rings() {
        let mut mol = parse_smiles("C1=CC=C2C(=C1)C=CN2").unwrap();
        aromatize(&mut mol);
        assert!(mol.atoms().iter().all(|a| a.aromatic));
        assert!(mol.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
    }

    #[test]
    fn carbocyclic_five_rings_stay_aliphatic() {
        for smiles in ["C1=CCC=C1", "C1=CC2=CC=CC=C2C1", "O=C1C=CC=C1"] {
            let mut mol = parse_smiles(smiles).unwrap();
            aromatize(&mut mol);
            let five_ring_aromatic = RingInfo::find(&mol)
                .rings()
                .iter()
                .filter(|r| r.len() == 5)
                .any(|r| r.iter().all(|&a| mol.atom(a).aromatic));
            assert!(!five_ring_aromatic, "input {}", smiles);
        }
    }

    #[test]
    fn cyclohexene_is_not_aromatized() {
        let mut mol = parse_smiles("C1=CCCCC1").unwrap();
        assert!(!aromatize(&mut mol));
        assert!(mol.atoms().iter().all(|a| !a.aromatic));
    }
}
