//! Molecular object model
//!
//! An in-memory atom/bond graph ([`Molecule`]), a reaction made of
//! molecule sets ([`Reaction`]), and the [`ChemObject`] union handed to
//! fingerprinting, similarity and storage.
//!
//! The adjacency list is derived data: it is rebuilt whenever a molecule is
//! deserialized, so stored bytes only carry atoms, bonds and the query flag.

use crate::error::{Error, Result};
use crate::types::ObjectClass;
use serde::{Deserialize, Serialize};

const SYMBOLS: [&str; 87] = [
    "*", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn",
];

/// Chemical element, stored as its atomic number. `0` is the wildcard atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Element(pub u8);

impl Element {
    /// Wildcard (`*`) atom
    pub const ANY: Element = Element(0);
    /// Hydrogen
    pub const H: Element = Element(1);
    /// Boron
    pub const B: Element = Element(5);
    /// Carbon
    pub const C: Element = Element(6);
    /// Nitrogen
    pub const N: Element = Element(7);
    /// Oxygen
    pub const O: Element = Element(8);
    /// Fluorine
    pub const F: Element = Element(9);
    /// Phosphorus
    pub const P: Element = Element(15);
    /// Sulfur
    pub const S: Element = Element(16);
    /// Chlorine
    pub const CL: Element = Element(17);
    /// Bromine
    pub const BR: Element = Element(35);
    /// Iodine
    pub const I: Element = Element(53);

    /// Look up an element by its symbol (exact case, e.g. `"Cl"`).
    pub fn from_symbol(symbol: &str) -> Option<Element> {
        SYMBOLS
            .iter()
            .position(|s| *s == symbol)
            .map(|z| Element(z as u8))
    }

    /// Element symbol, `"*"` for the wildcard.
    pub fn symbol(&self) -> &'static str {
        SYMBOLS.get(self.0 as usize).copied().unwrap_or("*")
    }

    /// Atomic number.
    pub fn atomic_number(&self) -> u8 {
        self.0
    }

    /// True for F, Cl, Br, I.
    pub fn is_halogen(&self) -> bool {
        matches!(*self, Element::F | Element::CL | Element::BR | Element::I)
    }

    /// True for N, O, S (the heteroatoms that carry mobile hydrogens).
    pub fn is_nos(&self) -> bool {
        matches!(*self, Element::N | Element::O | Element::S)
    }
}

/// Bond multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BondOrder {
    /// Single bond
    Single,
    /// Double bond
    Double,
    /// Triple bond
    Triple,
    /// Aromatic (delocalized) bond
    Aromatic,
}

impl BondOrder {
    /// Bond order in half units (aromatic = 3).
    pub fn half_units(&self) -> u32 {
        match self {
            BondOrder::Single => 2,
            BondOrder::Double => 4,
            BondOrder::Triple => 6,
            BondOrder::Aromatic => 3,
        }
    }

    /// Stable small integer code used in hashing.
    pub fn code(&self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        }
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    /// Element
    pub element: Element,
    /// Formal charge
    pub charge: i8,
    /// Isotope mass number, 0 for natural abundance
    pub isotope: u16,
    /// Implicit plus attached hydrogen count (not graph nodes)
    pub hydrogens: u8,
    /// Member of an aromatic system
    pub aromatic: bool,
}

impl Atom {
    /// Neutral, non-aromatic atom without hydrogens.
    pub fn new(element: Element) -> Self {
        Atom {
            element,
            charge: 0,
            isotope: 0,
            hydrogens: 0,
            aromatic: false,
        }
    }

    /// Builder-style hydrogen count.
    pub fn with_hydrogens(mut self, hydrogens: u8) -> Self {
        self.hydrogens = hydrogens;
        self
    }

    /// Builder-style formal charge.
    pub fn with_charge(mut self, charge: i8) -> Self {
        self.charge = charge;
        self
    }

    /// Builder-style aromatic flag.
    pub fn with_aromatic(mut self, aromatic: bool) -> Self {
        self.aromatic = aromatic;
        self
    }
}

/// A graph edge between two atom indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    /// First atom index
    pub begin: usize,
    /// Second atom index
    pub end: usize,
    /// Multiplicity
    pub order: BondOrder,
}

impl Bond {
    /// The endpoint opposite to `atom`.
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredMolecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    query: bool,
}

/// Atom/bond graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "StoredMolecule", into = "StoredMolecule")]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// `(neighbor atom, bond index)` per atom
    adjacency: Vec<Vec<(usize, usize)>>,
    query: bool,
}

impl From<StoredMolecule> for Molecule {
    fn from(stored: StoredMolecule) -> Self {
        let mut adjacency = vec![Vec::new(); stored.atoms.len()];
        for (idx, bond) in stored.bonds.iter().enumerate() {
            if bond.begin < adjacency.len() && bond.end < adjacency.len() {
                adjacency[bond.begin].push((bond.end, idx));
                adjacency[bond.end].push((bond.begin, idx));
            }
        }
        Molecule {
            atoms: stored.atoms,
            bonds: stored.bonds,
            adjacency,
            query: stored.query,
        }
    }
}

impl From<Molecule> for StoredMolecule {
    fn from(mol: Molecule) -> Self {
        StoredMolecule {
            atoms: mol.atoms,
            bonds: mol.bonds,
            query: mol.query,
        }
    }
}

impl PartialEq for Molecule {
    fn eq(&self, other: &Self) -> bool {
        self.atoms == other.atoms && self.bonds == other.bonds && self.query == other.query
    }
}

impl Molecule {
    /// Empty molecule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an atom, returning its index.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Connect two existing atoms, returning the bond index.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for out-of-range indices, self loops and
    /// duplicate bonds.
    pub fn add_bond(&mut self, begin: usize, end: usize, order: BondOrder) -> Result<usize> {
        if begin >= self.atoms.len() || end >= self.atoms.len() {
            return Err(Error::InvalidOperation(format!(
                "bond {}-{} references a missing atom",
                begin, end
            )));
        }
        if begin == end {
            return Err(Error::InvalidOperation(format!(
                "atom {} cannot bond to itself",
                begin
            )));
        }
        if self.bond_between(begin, end).is_some() {
            return Err(Error::InvalidOperation(format!(
                "atoms {} and {} are already bonded",
                begin, end
            )));
        }
        let idx = self.bonds.len();
        self.bonds.push(Bond { begin, end, order });
        self.adjacency[begin].push((end, idx));
        self.adjacency[end].push((begin, idx));
        Ok(idx)
    }

    /// Number of atoms.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of bonds.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// True if the molecule has no atoms.
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Atom at `idx`. Panics on out-of-range index like slice indexing.
    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    /// Mutable atom at `idx`.
    pub fn atom_mut(&mut self, idx: usize) -> &mut Atom {
        &mut self.atoms[idx]
    }

    /// All atoms in index order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Bond at `idx`.
    pub fn bond(&self, idx: usize) -> &Bond {
        &self.bonds[idx]
    }

    /// Change the order of an existing bond.
    pub fn set_bond_order(&mut self, idx: usize, order: BondOrder) {
        self.bonds[idx].order = order;
    }

    /// All bonds in index order.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// `(neighbor atom, bond index)` pairs of `atom`.
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    /// Number of graph neighbors (explicit hydrogens included).
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Number of non-hydrogen neighbors.
    pub fn heavy_degree(&self, atom: usize) -> usize {
        self.adjacency[atom]
            .iter()
            .filter(|(n, _)| self.atoms[*n].element != Element::H)
            .count()
    }

    /// Total hydrogen count: implicit plus explicit hydrogen neighbors.
    pub fn total_hydrogens(&self, atom: usize) -> u32 {
        let explicit = self.adjacency[atom]
            .iter()
            .filter(|(n, _)| self.atoms[*n].element == Element::H)
            .count() as u32;
        self.atoms[atom].hydrogens as u32 + explicit
    }

    /// Valence: bond orders plus implicit hydrogens, aromatic bonds as 1.5
    /// rounded up per atom.
    pub fn valence(&self, atom: usize) -> u32 {
        let half: u32 = self.adjacency[atom]
            .iter()
            .map(|(_, b)| self.bonds[*b].order.half_units())
            .sum();
        (half + 1) / 2 + self.atoms[atom].hydrogens as u32
    }

    /// Bond index connecting `a` and `b`, if any.
    pub fn bond_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency
            .get(a)?
            .iter()
            .find(|(n, _)| *n == b)
            .map(|(_, bond)| *bond)
    }

    /// Query molecules carry pattern semantics rather than concrete atoms.
    pub fn is_query(&self) -> bool {
        self.query
    }

    /// Set the query flag.
    pub fn set_query(&mut self, query: bool) {
        self.query = query;
    }

    /// Consume and mark as a query.
    pub fn into_query(mut self) -> Self {
        self.query = true;
        self
    }

    /// Append a disjoint copy of `other`.
    pub fn merge(&mut self, other: &Molecule) {
        let offset = self.atoms.len();
        for atom in &other.atoms {
            self.add_atom(atom.clone());
        }
        for bond in &other.bonds {
            let idx = self.bonds.len();
            self.bonds.push(Bond {
                begin: bond.begin + offset,
                end: bond.end + offset,
                order: bond.order,
            });
            self.adjacency[bond.begin + offset].push((bond.end + offset, idx));
            self.adjacency[bond.end + offset].push((bond.begin + offset, idx));
        }
    }

    /// Connected component index of every atom, numbered in order of first
    /// appearance.
    pub fn components(&self) -> Vec<usize> {
        let mut comp = vec![usize::MAX; self.atoms.len()];
        let mut next = 0;
        let mut stack = Vec::new();
        for start in 0..self.atoms.len() {
            if comp[start] != usize::MAX {
                continue;
            }
            comp[start] = next;
            stack.push(start);
            while let Some(a) = stack.pop() {
                for &(n, _) in &self.adjacency[a] {
                    if comp[n] == usize::MAX {
                        comp[n] = next;
                        stack.push(n);
                    }
                }
            }
            next += 1;
        }
        comp
    }

    /// Induced subgraph over `atoms`; new atom `i` is old atom `atoms[i]`.
    /// Indices outside the molecule are skipped.
    pub fn subgraph(&self, atoms: &[usize]) -> Molecule {
        let mut new_index = vec![usize::MAX; self.atoms.len()];
        let mut out = Molecule::new();
        out.query = self.query;
        for &old in atoms {
            if old < self.atoms.len() && new_index[old] == usize::MAX {
                new_index[old] = out.add_atom(self.atoms[old].clone());
            }
        }
        for bond in &self.bonds {
            let (begin, end) = (new_index[bond.begin], new_index[bond.end]);
            if begin != usize::MAX && end != usize::MAX {
                let idx = out.bonds.len();
                out.bonds.push(Bond {
                    begin,
                    end,
                    order: bond.order,
                });
                out.adjacency[begin].push((end, idx));
                out.adjacency[end].push((begin, idx));
            }
        }
        out
    }

    /// Copy with plain explicit hydrogens folded into their neighbor's
    /// hydrogen count.
    ///
    /// A hydrogen is plain when it is neutral, has no isotope label and
    /// hangs off exactly one non-hydrogen atom by a single bond. Deuterium,
    /// charged hydrogens, bridging hydrogens and `[H][H]` stay graph nodes.
    pub fn fold_hydrogens(&self) -> Molecule {
        let plain: Vec<bool> = (0..self.atoms.len())
            .map(|a| {
                let atom = &self.atoms[a];
                if atom.element != Element::H || atom.isotope != 0 || atom.charge != 0 {
                    return false;
                }
                match self.adjacency[a].as_slice() {
                    [(n, b)] => {
                        self.atoms[*n].element != Element::H
                            && self.bonds[*b].order == BondOrder::Single
                    }
                    _ => false,
                }
            })
            .collect();
        if !plain.contains(&true) {
            return self.clone();
        }

        let kept: Vec<usize> = (0..self.atoms.len()).filter(|&a| !plain[a]).collect();
        let mut out = self.subgraph(&kept);
        for (new, &old) in kept.iter().enumerate() {
            let folded = self.adjacency[old]
                .iter()
                .filter(|(n, _)| plain[*n])
                .count();
            let atom = out.atom_mut(new);
            atom.hydrogens = atom
                .hydrogens
                .saturating_add(u8::try_from(folded).unwrap_or(u8::MAX));
        }
        out
    }

    /// Graph-isomorphic relabeling: new atom `i` is old atom `order[i]`.
    ///
    /// Bonds are also re-added in reverse order with swapped endpoints, so
    /// the result differs from the input in every index-dependent way.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if `order` is not a permutation of the atom
    /// indices.
    pub fn renumbered(&self, order: &[usize]) -> Result<Molecule> {
        let n = self.atoms.len();
        let mut new_index = vec![usize::MAX; n];
        if order.len() != n {
            return Err(Error::InvalidOperation(format!(
                "permutation has {} entries for {} atoms",
                order.len(),
                n
            )));
        }
        for (new, &old) in order.iter().enumerate() {
            if old >= n || new_index[old] != usize::MAX {
                return Err(Error::InvalidOperation(
                    "atom order is not a permutation".to_string(),
                ));
            }
            new_index[old] = new;
        }

        let mut out = Molecule::new();
        out.query = self.query;
        for &old in order {
            out.add_atom(self.atoms[old].clone());
        }
        for bond in self.bonds.iter().rev() {
            out.add_bond(new_index[bond.end], new_index[bond.begin], bond.order)?;
        }
        Ok(out)
    }
}

/// Reactant and product molecule sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    /// Left-hand side molecules
    pub reactants: Vec<Molecule>,
    /// Right-hand side molecules
    pub products: Vec<Molecule>,
}

impl Reaction {
    /// Disjoint union of all reactants.
    pub fn reactant_side(&self) -> Molecule {
        Self::union(&self.reactants)
    }

    /// Disjoint union of all products.
    pub fn product_side(&self) -> Molecule {
        Self::union(&self.products)
    }

    fn union(mols: &[Molecule]) -> Molecule {
        let mut out = Molecule::new();
        for mol in mols {
            out.merge(mol);
        }
        out
    }

    /// True if any participant is a query molecule.
    pub fn is_query(&self) -> bool {
        self.reactants
            .iter()
            .chain(self.products.iter())
            .any(Molecule::is_query)
    }
}

/// Any structure the core can fingerprint, compare or store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChemObject {
    /// Single molecule graph
    Molecule(Molecule),
    /// Reaction
    Reaction(Reaction),
}

impl ChemObject {
    /// Molecule or reaction.
    pub fn class(&self) -> ObjectClass {
        match self {
            ChemObject::Molecule(_) => ObjectClass::Molecule,
            ChemObject::Reaction(_) => ObjectClass::Reaction,
        }
    }

    /// Reaction flag.
    pub fn is_reaction(&self) -> bool {
        matches!(self, ChemObject::Reaction(_))
    }

    /// Query flag.
    pub fn is_query(&self) -> bool {
        match self {
            ChemObject::Molecule(m) => m.is_query(),
            ChemObject::Reaction(r) => r.is_query(),
        }
    }

    /// The molecule, if this is one.
    pub fn as_molecule(&self) -> Option<&Molecule> {
        match self {
            ChemObject::Molecule(m) => Some(m),
            ChemObject::Reaction(_) => None,
        }
    }

    /// The reaction, if this is one.
    pub fn as_reaction(&self) -> Option<&Reaction> {
        match self {
            ChemObject::Reaction(r) => Some(r),
            ChemObject::Molecule(_) => None,
        }
    }
}

impl From<Molecule> for ChemObject {
    fn from(mol: Molecule) -> Self {
        ChemObject::Molecule(mol)
    }
}

impl From<Reaction> for ChemObject {
    fn from(rxn: Reaction) -> Self {
        ChemObject::Reaction(rxn)
    }
}
