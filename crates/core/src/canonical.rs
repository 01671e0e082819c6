//! Canonical atom ranking and canonical token serialization
//!
//! Ranks start from local atom invariants, are refined by neighborhood until
//! stable, and remaining ties are broken by splitting the lowest tied class
//! and refining again; every member of the tied class is tried and the split
//! with the smallest serialization is kept. Serialization walks each
//! component depth-first from its lowest-ranked atom, visiting neighbors in
//! rank order, so the emitted token sequence depends only on the graph and
//! not on input atom order. Components are emitted in token order.

use crate::molecule::{BondOrder, Molecule, Reaction};
use crate::rings::aromatize;
use crate::smiles::{implicit_hydrogens, is_organic_subset};
use smallvec::SmallVec;

/// Dense ranks `0..k` for `keys`, ordered by key.
fn dense_ranks<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    let mut ranks = vec![0; keys.len()];
    let mut rank = 0;
    for (pos, &idx) in order.iter().enumerate() {
        if pos > 0 && keys[order[pos - 1]] != keys[idx] {
            rank += 1;
        }
        ranks[idx] = rank;
    }
    ranks
}

fn class_count(ranks: &[usize]) -> usize {
    ranks.iter().max().map_or(0, |m| m + 1)
}

/// Refine ranks by sorted neighbor ranks until the class count stops growing.
fn refine(mol: &Molecule, mut ranks: Vec<usize>) -> Vec<usize> {
    loop {
        let keys: Vec<(usize, SmallVec<[(usize, u8); 4]>)> = (0..mol.atom_count())
            .map(|a| {
                let mut nbrs: SmallVec<[(usize, u8); 4]> = mol
                    .neighbors(a)
                    .iter()
                    .map(|&(n, b)| (ranks[n], mol.bond(b).order.code()))
                    .collect();
                nbrs.sort_unstable();
                (ranks[a], nbrs)
            })
            .collect();
        let next = dense_ranks(&keys);
        if class_count(&next) == class_count(&ranks) {
            return next;
        }
        ranks = next;
    }
}

/// Leaves explored per component before the tie-break search falls back to
/// the first candidate of every remaining tied class.
const SEARCH_LEAVES: usize = 512;

fn initial_ranks(mol: &Molecule) -> Vec<usize> {
    let invariants: Vec<(usize, u8, u16, i8, u32, bool)> = (0..mol.atom_count())
        .map(|a| {
            let atom = mol.atom(a);
            (
                mol.degree(a),
                atom.element.atomic_number(),
                atom.isotope,
                atom.charge,
                atom.hydrogens as u32,
                atom.aromatic,
            )
        })
        .collect();
    refine(mol, dense_ranks(&invariants))
}

/// Ranks after moving `chosen` ahead of the rest of its tied class.
fn split(mol: &Molecule, ranks: &[usize], chosen: usize) -> Vec<usize> {
    let tied = ranks[chosen];
    let keys: Vec<(usize, bool)> = ranks
        .iter()
        .enumerate()
        .map(|(a, &r)| (r, r == tied && a != chosen))
        .collect();
    refine(mol, dense_ranks(&keys))
}

struct Branch {
    ranks: Vec<usize>,
    candidates: Vec<usize>,
    next: usize,
}

/// Distinct ranks of one connected component and the token sequence they
/// serialize to.
///
/// Each tied class is split once per member and the split giving the
/// smallest token sequence wins, so the result does not depend on which
/// symmetric atom comes first in the input.
fn minimal_component(mol: &Molecule) -> (Vec<String>, Vec<usize>) {
    let n = mol.atom_count();
    let mut best: Option<(Vec<String>, Vec<usize>)> = None;
    let mut leaves = 0usize;
    let mut stack: Vec<Branch> = Vec::new();
    let mut pending = Some(initial_ranks(mol));

    loop {
        if let Some(ranks) = pending.take() {
            if class_count(&ranks) == n {
                leaves += 1;
                let tokens = Writer::new(mol, &ranks).write();
                if best.as_ref().map_or(true, |(b, _)| tokens < *b) {
                    best = Some((tokens, ranks));
                }
            } else {
                let tied = lowest_tied_rank(&ranks);
                let candidates = (0..n).filter(|&a| ranks[a] == tied).collect();
                stack.push(Branch {
                    ranks,
                    candidates,
                    next: 0,
                });
            }
        }
        let Some(top) = stack.last_mut() else {
            break;
        };
        let exhausted = top.next == top.candidates.len();
        if exhausted || (top.next > 0 && leaves >= SEARCH_LEAVES) {
            stack.pop();
            continue;
        }
        let chosen = top.candidates[top.next];
        top.next += 1;
        pending = Some(split(mol, &top.ranks, chosen));
    }
    best.unwrap_or_default()
}

/// Canonical rank of every atom; all ranks are distinct.
///
/// Components are ranked independently and ordered by their canonical token
/// sequences, so a component's atoms occupy one contiguous rank range.
pub fn canonical_ranks(mol: &Molecule) -> Vec<usize> {
    let comp = mol.components();
    let count = comp.iter().max().map_or(0, |m| m + 1);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (atom, &c) in comp.iter().enumerate() {
        members[c].push(atom);
    }

    let mut parts: Vec<(Vec<String>, Vec<usize>, Vec<usize>)> = members
        .into_iter()
        .map(|atoms| {
            let (tokens, ranks) = minimal_component(&mol.subgraph(&atoms));
            (tokens, ranks, atoms)
        })
        .collect();
    parts.sort_by(|a, b| a.0.cmp(&b.0));

    let mut ranks = vec![0; mol.atom_count()];
    let mut offset = 0;
    for (_, local, atoms) in parts {
        for (i, &atom) in atoms.iter().enumerate() {
            ranks[atom] = offset + local[i];
        }
        offset += atoms.len();
    }
    ranks
}

fn lowest_tied_rank(ranks: &[usize]) -> usize {
    let mut counts = vec![0usize; class_count(ranks)];
    for &r in ranks {
        counts[r] += 1;
    }
    counts.iter().position(|&c| c > 1).unwrap_or(0)
}

/// Canonical token sequence of a molecule.
///
/// Tokens are atoms, explicit bond symbols, branch parentheses, ring
/// closure digits and `.` between components. Plain explicit hydrogens are
/// folded into their neighbors and Kekulé rings aromatized first, so
/// equivalent depictions serialize identically.
pub fn canonical_tokens(mol: &Molecule) -> Vec<String> {
    let mut mol = mol.fold_hydrogens();
    aromatize(&mut mol);
    let ranks = canonical_ranks(&mol);
    Writer::new(&mol, &ranks).write()
}

/// Canonical SMILES-like string: the concatenated canonical tokens.
pub fn canonical_smiles(mol: &Molecule) -> String {
    canonical_tokens(mol).concat()
}

/// Canonical tokens of a reaction: molecules of each side are serialized,
/// sorted, joined by `.`, and the sides joined by `>>`.
pub fn canonical_reaction_tokens(rxn: &Reaction) -> Vec<String> {
    let side = |mols: &[Molecule]| -> Vec<String> {
        let mut parts: Vec<Vec<String>> = mols.iter().map(canonical_tokens).collect();
        parts.sort();
        let mut out = Vec::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push(".".to_string());
            }
            out.extend(part);
        }
        out
    };
    let mut tokens = side(&rxn.reactants);
    tokens.push(">>".to_string());
    tokens.extend(side(&rxn.products));
    tokens
}

enum Emit {
    Atom(usize, Option<usize>),
    Open,
    Close,
}

struct Closure {
    /// Atom visited first; the digit opens here
    open: usize,
    close: usize,
    bond: usize,
}

struct Writer<'a> {
    mol: &'a Molecule,
    ranks: &'a [usize],
    visit_order: Vec<usize>,
    children: Vec<Vec<(usize, usize)>>,
    closures: Vec<Closure>,
    bond_used: Vec<bool>,
}

impl<'a> Writer<'a> {
    fn new(mol: &'a Molecule, ranks: &'a [usize]) -> Self {
        Writer {
            mol,
            ranks,
            visit_order: vec![usize::MAX; mol.atom_count()],
            children: vec![Vec::new(); mol.atom_count()],
            closures: Vec::new(),
            bond_used: vec![false; mol.bond_count()],
        }
    }

    fn sorted_neighbors(&self, atom: usize) -> Vec<(usize, usize)> {
        let mut nbrs = self.mol.neighbors(atom).to_vec();
        nbrs.sort_by_key(|&(n, _)| self.ranks[n]);
        nbrs
    }

    fn write(mut self) -> Vec<String> {
        let mut starts: Vec<usize> = (0..self.mol.atom_count()).collect();
        starts.sort_by_key(|&a| self.ranks[a]);

        let mut roots = Vec::new();
        let mut counter = 0;
        for start in starts {
            if self.visit_order[start] == usize::MAX {
                roots.push(start);
                self.walk(start, &mut counter);
            }
        }

        let mut tokens = Vec::new();
        let mut digits: Vec<Option<usize>> = Vec::new();
        let mut assigned: Vec<Option<usize>> = vec![None; self.closures.len()];
        for (i, &root) in roots.iter().enumerate() {
            if i > 0 {
                tokens.push(".".to_string());
            }
            self.emit(root, &mut tokens, &mut digits, &mut assigned);
        }
        tokens
    }

    /// First pass: DFS tree and ring closures.
    fn walk(&mut self, root: usize, counter: &mut usize) {
        // (atom, rank-sorted neighbors, next neighbor to try)
        let mut stack: Vec<(usize, Vec<(usize, usize)>, usize)> = Vec::new();
        self.visit_order[root] = *counter;
        *counter += 1;
        stack.push((root, self.sorted_neighbors(root), 0));

        while let Some((atom, nbrs, next)) = stack.last_mut() {
            let Some(&(n, b)) = nbrs.get(*next) else {
                stack.pop();
                continue;
            };
            *next += 1;
            let atom = *atom;
            if self.bond_used[b] {
                continue;
            }
            self.bond_used[b] = true;
            if self.visit_order[n] == usize::MAX {
                self.children[atom].push((n, b));
                self.visit_order[n] = *counter;
                *counter += 1;
                let nbrs = self.sorted_neighbors(n);
                stack.push((n, nbrs, 0));
            } else {
                self.closures.push(Closure {
                    open: n,
                    close: atom,
                    bond: b,
                });
            }
        }
    }

    /// Second pass: emit tokens in DFS order.
    fn emit(
        &self,
        root: usize,
        tokens: &mut Vec<String>,
        digits: &mut Vec<Option<usize>>,
        assigned: &mut [Option<usize>],
    ) {
        let mut stack = vec![Emit::Atom(root, None)];
        while let Some(step) = stack.pop() {
            let (atom, bond) = match step {
                Emit::Open => {
                    tokens.push("(".to_string());
                    continue;
                }
                Emit::Close => {
                    tokens.push(")".to_string());
                    continue;
                }
                Emit::Atom(atom, bond) => (atom, bond),
            };
            if let Some(bond) = bond.and_then(|b| self.bond_token(b)) {
                tokens.push(bond);
            }
            tokens.push(self.atom_token(atom));
            self.emit_ring_digits(atom, tokens, digits, assigned);

            let children = &self.children[atom];
            for (pos, &(child, bond)) in children.iter().enumerate().rev() {
                if pos + 1 == children.len() {
                    stack.push(Emit::Atom(child, Some(bond)));
                } else {
                    stack.push(Emit::Close);
                    stack.push(Emit::Atom(child, Some(bond)));
                    stack.push(Emit::Open);
                }
            }
        }
    }

    fn emit_ring_digits(
        &self,
        atom: usize,
        tokens: &mut Vec<String>,
        digits: &mut Vec<Option<usize>>,
        assigned: &mut [Option<usize>],
    ) {
        let mut rings: Vec<(usize, usize)> = self
            .closures
            .iter()
            .enumerate()
            .filter(|(_, c)| c.open == atom || c.close == atom)
            .map(|(i, c)| {
                let partner = if c.open == atom { c.close } else { c.open };
                (self.visit_order[partner], i)
            })
            .collect();
        rings.sort_unstable();

        for (_, idx) in rings {
            let closure = &self.closures[idx];
            if closure.open == atom {
                let digit = match digits.iter().position(Option::is_none) {
                    Some(free) => free,
                    None => {
                        digits.push(None);
                        digits.len() - 1
                    }
                };
                digits[digit] = Some(idx);
                assigned[idx] = Some(digit);
                if let Some(bond) = self.bond_token(closure.bond) {
                    tokens.push(bond);
                }
                tokens.push(ring_label(digit + 1));
            } else if let Some(digit) = assigned[idx] {
                digits[digit] = None;
                tokens.push(ring_label(digit + 1));
            }
        }
    }

    fn atom_token(&self, idx: usize) -> String {
        let atom = self.mol.atom(idx);
        let symbol = if atom.aromatic {
            atom.element.symbol().to_ascii_lowercase()
        } else {
            atom.element.symbol().to_string()
        };
        let plain = atom.charge == 0
            && atom.isotope == 0
            && is_organic_subset(atom.element)
            && implicit_hydrogens(self.mol, idx) == atom.hydrogens;
        if plain {
            return symbol;
        }

        let mut token = String::from("[");
        if atom.isotope != 0 {
            token.push_str(&atom.isotope.to_string());
        }
        token.push_str(&symbol);
        match atom.hydrogens {
            0 => {}
            1 => token.push('H'),
            h => token.push_str(&format!("H{}", h)),
        }
        match atom.charge {
            0 => {}
            1 => token.push('+'),
            -1 => token.push('-'),
            c if c > 0 => token.push_str(&format!("+{}", c)),
            c => token.push_str(&format!("-{}", -c)),
        }
        token.push(']');
        token
    }

    fn bond_token(&self, bond: usize) -> Option<String> {
        let b = self.mol.bond(bond);
        let both_aromatic = self.mol.atom(b.begin).aromatic && self.mol.atom(b.end).aromatic;
        match b.order {
            BondOrder::Single if both_aromatic => Some("-".to_string()),
            BondOrder::Single => None,
            BondOrder::Aromatic if both_aromatic => None,
            BondOrder::Aromatic => Some(":".to_string()),
            BondOrder::Double => Some("=".to_string()),
            BondOrder::Triple => Some("#".to_string()),
        }
    }
}

fn ring_label(n: usize) -> String {
    if n < 10 {
        n.to_string()
    } else {
        format!("%{:02}", n)
    }
}
