//! Fingerprint generation parameters

use crate::kind::{parse_similarity_type, SimilarityMode};
use serde::{Deserialize, Serialize};
use sieve_core::{Error, Result};

/// Default substructure plane length in bits
pub const DEFAULT_SUB_BITS: usize = 2048;
/// Default similarity plane length in bits
pub const DEFAULT_SIM_BITS: usize = 2048;
/// Default longest linear path, in bonds
pub const DEFAULT_SIM_PATH_LENGTH: usize = 3;
/// Default largest enumerated subgraph, in bonds
pub const DEFAULT_MAX_SUBGRAPH_EDGES: usize = 6;
/// Default largest subgraph hashed with atom and bond labels, in bonds
pub const DEFAULT_MAX_LABELED_EDGES: usize = 3;
/// Default cap on enumerated subgraphs per side
pub const DEFAULT_MAX_SUBGRAPHS: usize = 100_000;
/// Default radius of pharmacophore-typed circular features
pub const DEFAULT_CHEM_RADIUS: usize = 2;

/// Longest accepted plane, in bits
pub const MAX_PLANE_BITS: usize = 1 << 20;
/// Largest accepted subgraph or path size, in bonds
pub const MAX_FEATURE_EDGES: usize = 10;
/// Largest accepted circular radius
pub const MAX_CHEM_RADIUS: usize = 8;
/// Largest accepted subgraph cap
pub const MAX_SUBGRAPHS: usize = 10_000_000;

/// Parameters shared by every fingerprint a builder produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintParams {
    /// Substructure plane length in bits
    pub sub_bits: usize,
    /// Similarity plane length in bits
    pub sim_bits: usize,
    /// Similarity sub-mode used when none is requested explicitly
    pub similarity_mode: SimilarityMode,
    /// Longest linear path for the `sim` mode, in bonds
    pub sim_path_length: usize,
    /// Largest enumerated subgraph, in bonds
    pub max_subgraph_edges: usize,
    /// Largest subgraph that also carries atom and bond labels, in bonds
    pub max_labeled_edges: usize,
    /// Cap on enumerated substructure features
    pub max_subgraphs: usize,
    /// Radius of the `chem` mode
    pub chem_radius: usize,
}

impl Default for FingerprintParams {
    fn default() -> Self {
        FingerprintParams {
            sub_bits: DEFAULT_SUB_BITS,
            sim_bits: DEFAULT_SIM_BITS,
            similarity_mode: SimilarityMode::Sim,
            sim_path_length: DEFAULT_SIM_PATH_LENGTH,
            max_subgraph_edges: DEFAULT_MAX_SUBGRAPH_EDGES,
            max_labeled_edges: DEFAULT_MAX_LABELED_EDGES,
            max_subgraphs: DEFAULT_MAX_SUBGRAPHS,
            chem_radius: DEFAULT_CHEM_RADIUS,
        }
    }
}

impl FingerprintParams {
    /// Check plane lengths and enumeration bounds.
    pub fn validate(&self) -> Result<()> {
        for (name, bits) in [("sub_bits", self.sub_bits), ("sim_bits", self.sim_bits)] {
            if bits == 0 || bits % 64 != 0 || bits > MAX_PLANE_BITS {
                return Err(Error::InvalidOperation(format!(
                    "{} must be a non-zero multiple of 64 up to {}, got {}",
                    name, MAX_PLANE_BITS, bits
                )));
            }
        }
        let ranges = [
            ("sim_path_length", self.sim_path_length, 1, MAX_FEATURE_EDGES),
            ("max_subgraph_edges", self.max_subgraph_edges, 0, MAX_FEATURE_EDGES),
            ("max_labeled_edges", self.max_labeled_edges, 0, MAX_FEATURE_EDGES),
            ("max_subgraphs", self.max_subgraphs, 1, MAX_SUBGRAPHS),
            ("chem_radius", self.chem_radius, 0, MAX_CHEM_RADIUS),
        ];
        for (name, value, min, max) in ranges {
            if value < min || value > max {
                return Err(Error::InvalidOperation(format!(
                    "{} must be between {} and {}, got {}",
                    name, min, max, value
                )));
            }
        }
        Ok(())
    }

    /// Set one parameter from its option name.
    ///
    /// Names: `similarity-type`, `fp-sub-bits`, `fp-sim-bits`,
    /// `fp-path-length`, `fp-subgraph-edges`, `fp-labeled-edges`,
    /// `fp-max-subgraphs`, `fp-chem-radius`. The result is validated; on error `self` is left
    /// unchanged.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        let number = || -> Result<usize> {
            value.trim().parse::<usize>().map_err(|_| {
                Error::InvalidOperation(format!("option {} expects an integer, got '{}'", name, value))
            })
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "similarity-type" => next.similarity_mode = parse_similarity_type(value)?,
            "fp-sub-bits" => next.sub_bits = number()?,
            "fp-sim-bits" => next.sim_bits = number()?,
            "fp-path-length" => next.sim_path_length = number()?,
            "fp-subgraph-edges" => next.max_subgraph_edges = number()?,
            "fp-labeled-edges" => next.max_labeled_edges = number()?,
            "fp-max-subgraphs" => next.max_subgraphs = number()?,
            "fp-chem-radius" => next.chem_radius = number()?,
            _ => {
                return Err(Error::InvalidOperation(format!(
                    "unknown fingerprint option '{}'",
                    name
                )))
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Builder-style setter for the similarity sub-mode.
    pub fn with_similarity_mode(mut self, mode: SimilarityMode) -> Self {
        self.similarity_mode = mode;
        self
    }
}
