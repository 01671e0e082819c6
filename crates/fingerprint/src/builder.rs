//! Fingerprint construction
//!
//! The builder never mutates the caller's structure: every build works on a
//! private copy with plain explicit hydrogens folded away and Kekulé rings
//! aromatized.

use crate::bits::{BitVector, Fingerprint};
use crate::features::chem::pharmacophore_invariants;
use crate::features::circular::{circular_features, ecfp_invariants};
use crate::features::paths::path_features;
use crate::features::subgraphs::{subgraph_features, SubgraphFeatures};
use crate::hashing::{fold, Multiplicity};
use crate::kind::{FingerprintKind, SimilarityMode};
use crate::normalize::{resonance_labels, structural_labels, tautomer_labels, Labels};
use crate::params::FingerprintParams;
use sieve_core::{aromatize, ChemObject, Error, Molecule, ObjectClass, Result, RingInfo};
use tracing::{debug, warn};

/// Builds fingerprints with one fixed set of parameters.
#[derive(Debug, Clone, Default)]
pub struct FingerprintBuilder {
    params: FingerprintParams,
}

impl FingerprintBuilder {
    /// Builder for `params`.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if the parameters do not validate.
    pub fn new(params: FingerprintParams) -> Result<Self> {
        params.validate()?;
        Ok(FingerprintBuilder { params })
    }

    /// Parameters in use.
    pub fn params(&self) -> &FingerprintParams {
        &self.params
    }

    /// Build a fingerprint of `kind` for `object`.
    ///
    /// `mode` selects the similarity plane's feature family and defaults to
    /// the parameters' similarity mode. It is ignored by substructure-only
    /// kinds.
    ///
    /// # Errors
    ///
    /// `UnsupportedObject` for a similarity-bearing kind on a query object,
    /// or for `SubRes`/`SubTau` on a reaction.
    pub fn build(
        &self,
        object: &ChemObject,
        kind: FingerprintKind,
        mode: Option<SimilarityMode>,
    ) -> Result<Fingerprint> {
        let mode = mode.unwrap_or(self.params.similarity_mode);
        if object.is_query() && !kind.is_substructure() {
            return Err(Error::UnsupportedObject(format!(
                "{} fingerprint of a query object",
                kind
            )));
        }

        let fp = match object {
            ChemObject::Molecule(mol) => {
                let mol = prepare(mol);
                let (sub, sim) = self.planes(&mol, kind, mode);
                self.assemble(kind, mode, ObjectClass::Molecule, vec![sub], vec![sim])
            }
            ChemObject::Reaction(rxn) => {
                if matches!(kind, FingerprintKind::SubRes | FingerprintKind::SubTau) {
                    return Err(Error::UnsupportedObject(format!(
                        "{} fingerprint of a reaction",
                        kind
                    )));
                }
                let reactants = prepare(&rxn.reactant_side());
                let products = prepare(&rxn.product_side());
                let (sub_r, sim_r) = self.planes(&reactants, kind, mode);
                let (sub_p, sim_p) = self.planes(&products, kind, mode);
                self.assemble(
                    kind,
                    mode,
                    ObjectClass::Reaction,
                    vec![sub_r, sub_p],
                    vec![sim_r, sim_p],
                )
            }
        };
        debug!(
            target: "sieve::fingerprint",
            kind = %kind,
            class = %fp.class(),
            bits = fp.len(),
            ones = fp.count_ones(),
            "Built fingerprint"
        );
        Ok(fp)
    }

    /// Substructure and similarity planes of one prepared molecule; a plane
    /// the kind does not carry is `None`.
    fn planes(
        &self,
        mol: &Molecule,
        kind: FingerprintKind,
        mode: SimilarityMode,
    ) -> (Option<BitVector>, Option<BitVector>) {
        let labeled = self.params.max_labeled_edges;
        let subgraphs = match kind {
            FingerprintKind::Sim => None,
            FingerprintKind::SubRes => Some(self.subgraphs(mol, &resonance_labels(mol), labeled)),
            FingerprintKind::SubTau => Some(self.subgraphs(mol, &tautomer_labels(mol), labeled)),
            FingerprintKind::Sub | FingerprintKind::Full => {
                Some(self.subgraphs(mol, &structural_labels(mol), labeled))
            }
        };

        let sim = kind.has_sim_plane().then(|| {
            let shapes = match (&subgraphs, mode) {
                (_, m) if m != SimilarityMode::Sim => Vec::new(),
                (Some(features), _) => features.shapes.clone(),
                (None, _) => self.subgraphs(mol, &structural_labels(mol), 0).shapes,
            };
            self.sim_plane(mol, mode, shapes)
        });
        let sub = subgraphs
            .map(|features| fold(features.into_hashes(), self.params.sub_bits, Multiplicity::Set));
        (sub, sim)
    }

    fn subgraphs(&self, mol: &Molecule, labels: &Labels, labeled_edges: usize) -> SubgraphFeatures {
        let features = subgraph_features(
            mol,
            labels,
            self.params.max_subgraph_edges,
            labeled_edges,
            self.params.max_subgraphs,
        );
        if features.truncated {
            warn!(
                target: "sieve::fingerprint",
                atoms = mol.atom_count(),
                max_level = features.max_level,
                cap = self.params.max_subgraphs,
                "Subgraph enumeration truncated"
            );
        }
        features
    }

    /// Similarity plane. The `sim` mode counts labeled paths and adds each
    /// distinct subgraph shape once.
    fn sim_plane(&self, mol: &Molecule, mode: SimilarityMode, mut shapes: Vec<u64>) -> BitVector {
        let mut features = match mode {
            SimilarityMode::Sim => {
                path_features(mol, &structural_labels(mol), self.params.sim_path_length)
            }
            SimilarityMode::Chem => circular_features(
                mol,
                pharmacophore_invariants(mol),
                self.params.chem_radius,
            ),
            SimilarityMode::Ecfp2
            | SimilarityMode::Ecfp4
            | SimilarityMode::Ecfp6
            | SimilarityMode::Ecfp8 => {
                let rings = RingInfo::find(mol);
                let radius = mode.ecfp_radius().unwrap_or(0);
                circular_features(mol, ecfp_invariants(mol, &rings), radius)
            }
        };
        shapes.sort_unstable();
        shapes.dedup();
        features.extend(shapes);
        fold(features, self.params.sim_bits, Multiplicity::Count)
    }

    fn assemble(
        &self,
        kind: FingerprintKind,
        mode: SimilarityMode,
        class: ObjectClass,
        sub: Vec<Option<BitVector>>,
        sim: Vec<Option<BitVector>>,
    ) -> Fingerprint {
        let sub: Vec<BitVector> = sub.into_iter().flatten().collect();
        let sim: Vec<BitVector> = sim.into_iter().flatten().collect();
        let sub_bits = sub.iter().map(BitVector::len).sum();
        let parts: Vec<BitVector> = sub.into_iter().chain(sim).collect();
        Fingerprint::new(
            kind,
            kind.has_sim_plane().then_some(mode),
            class,
            sub_bits,
            BitVector::concat(&parts),
        )
    }
}

/// Hydrogen-folded, aromatized copy.
fn prepare(mol: &Molecule) -> Molecule {
    let mut mol = mol.fold_hydrogens();
    aromatize(&mut mol);
    mol
}
