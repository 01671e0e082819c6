//! Connected subgraph features for substructure screening
//!
//! Subgraphs are enumerated level by level (by edge count) and hashed with a
//! Weisfeiler-Lehman refinement restricted to the subgraph, so isomorphic
//! subgraphs with equal labels always produce the same hash. Every subgraph
//! contributes a topology feature that ignores labels; subgraphs up to
//! `max_labeled_edges` bonds, and every single atom, also contribute a
//! labeled feature.

use crate::features::tags;
use crate::hashing::{hash_words, FeatureHasher};
use crate::normalize::Labels;
use rustc_hash::FxHashSet;
use sieve_core::Molecule;
use smallvec::SmallVec;

type EdgeSet = SmallVec<[u32; 8]>;

/// Hashes of all enumerated subgraphs.
#[derive(Debug, Default)]
pub(crate) struct SubgraphFeatures {
    /// Labeled atoms and labeled subgraphs
    pub labeled: Vec<u64>,
    /// Label-free shapes of every enumerated subgraph
    pub shapes: Vec<u64>,
    /// Number of subgraphs enumerated, single atoms included
    pub enumerated: usize,
    /// Largest subgraph size fully enumerated, in bonds
    pub max_level: usize,
    /// True if a level was dropped because of the subgraph cap
    pub truncated: bool,
}

impl SubgraphFeatures {
    /// Labeled and shape hashes together.
    pub(crate) fn into_hashes(self) -> Vec<u64> {
        let mut out = self.labeled;
        out.extend(self.shapes);
        out
    }
}

/// Enumerate subgraph features.
///
/// A level is either added whole or not at all: when adding the next level
/// would exceed `max_subgraphs`, enumeration stops. Level sizes are graph
/// invariants, so the cut is independent of atom order.
pub(crate) fn subgraph_features(
    mol: &Molecule,
    labels: &Labels,
    max_edges: usize,
    max_labeled_edges: usize,
    max_subgraphs: usize,
) -> SubgraphFeatures {
    let mut out = SubgraphFeatures::default();
    for &label in &labels.atoms {
        out.labeled
            .push(FeatureHasher::new(tags::ATOM).word(label).finish());
    }
    if !labels.atoms.is_empty() {
        out.shapes.push(FeatureHasher::new(tags::SHAPE).word(0).finish());
    }
    out.enumerated = labels.atoms.len();

    let blank = Labels {
        atoms: vec![0; mol.atom_count()],
        bonds: vec![0; mol.bond_count()],
    };
    let mut level: Vec<EdgeSet> = (0..mol.bond_count() as u32)
        .map(|b| SmallVec::from_slice(&[b]))
        .collect();
    let mut size = 1;
    while size <= max_edges && !level.is_empty() {
        if out.enumerated + level.len() > max_subgraphs {
            out.truncated = true;
            break;
        }
        for edges in &level {
            if size <= max_labeled_edges {
                out.labeled.push(hash_subgraph(mol, labels, edges, tags::SUBGRAPH));
            }
            out.shapes.push(hash_subgraph(mol, &blank, edges, tags::SHAPE));
        }
        out.enumerated += level.len();
        out.max_level = size;
        if size == max_edges {
            break;
        }
        level = grow(mol, &level);
        size += 1;
    }
    out
}

/// All connected edge sets with one more edge than the sets in `level`.
fn grow(mol: &Molecule, level: &[EdgeSet]) -> Vec<EdgeSet> {
    let mut next: FxHashSet<EdgeSet> = FxHashSet::default();
    for edges in level {
        for &e in edges {
            let bond = mol.bond(e as usize);
            for atom in [bond.begin, bond.end] {
                for &(_, nb) in mol.neighbors(atom) {
                    let nb = nb as u32;
                    if let Err(pos) = edges.binary_search(&nb) {
                        let mut grown = edges.clone();
                        grown.insert(pos, nb);
                        next.insert(grown);
                    }
                }
            }
        }
    }
    let mut next: Vec<EdgeSet> = next.into_iter().collect();
    next.sort_unstable();
    next
}

fn hash_subgraph(mol: &Molecule, labels: &Labels, edges: &[u32], tag: u64) -> u64 {
    let mut atoms: SmallVec<[usize; 12]> = SmallVec::new();
    for &e in edges {
        let bond = mol.bond(e as usize);
        atoms.push(bond.begin);
        atoms.push(bond.end);
    }
    atoms.sort_unstable();
    atoms.dedup();
    let local = |a: usize| atoms.binary_search(&a).unwrap_or(0);

    let mut adjacency: Vec<SmallVec<[(usize, u64); 4]>> = vec![SmallVec::new(); atoms.len()];
    for &e in edges {
        let bond = mol.bond(e as usize);
        let (u, v) = (local(bond.begin), local(bond.end));
        let label = labels.bonds[e as usize];
        adjacency[u].push((v, label));
        adjacency[v].push((u, label));
    }

    let mut current: Vec<u64> = atoms.iter().map(|&a| labels.atoms[a]).collect();
    let rounds = edges.len().min(3);
    for _ in 0..rounds {
        current = (0..atoms.len())
            .map(|v| {
                let mut nbrs: SmallVec<[u64; 4]> = adjacency[v]
                    .iter()
                    .map(|&(u, bond)| hash_words(&[bond, current[u]]))
                    .collect();
                nbrs.sort_unstable();
                FeatureHasher::new(tags::REFINE)
                    .word(current[v])
                    .words(&nbrs)
                    .finish()
            })
            .collect();
    }

    let mut edge_words: SmallVec<[u64; 8]> = edges
        .iter()
        .map(|&e| {
            let bond = mol.bond(e as usize);
            let (a, b) = (current[local(bond.begin)], current[local(bond.end)]);
            hash_words(&[a.min(b), a.max(b), labels.bonds[e as usize]])
        })
        .collect();
    edge_words.sort_unstable();
    current.sort_unstable();

    FeatureHasher::new(tag)
        .words(&current)
        .words(&edge_words)
        .finish()
}
