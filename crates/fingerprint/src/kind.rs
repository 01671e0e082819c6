//! Fingerprint kinds and similarity sub-modes

use serde::{Deserialize, Serialize};
use sieve_core::{Error, Result};
use std::fmt;

/// Which planes a fingerprint carries and how its substructure plane is
/// normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FingerprintKind {
    /// Similarity plane only
    Sim,
    /// Substructure screening plane
    Sub,
    /// Substructure plane over resonance-normalized structures
    SubRes,
    /// Substructure plane over tautomer-normalized structures
    SubTau,
    /// Substructure plane followed by similarity plane
    Full,
}

impl FingerprintKind {
    /// Parse `sim | sub | sub-res | sub-tau | full`, case-insensitive,
    /// `_` accepted for `-`.
    pub fn parse(name: &str) -> Result<Self> {
        match normalize_name(name).as_str() {
            "sim" => Ok(FingerprintKind::Sim),
            "sub" => Ok(FingerprintKind::Sub),
            "sub-res" => Ok(FingerprintKind::SubRes),
            "sub-tau" => Ok(FingerprintKind::SubTau),
            "full" => Ok(FingerprintKind::Full),
            _ => Err(Error::UnknownMode(format!("fingerprint kind '{}'", name))),
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FingerprintKind::Sim => "sim",
            FingerprintKind::Sub => "sub",
            FingerprintKind::SubRes => "sub-res",
            FingerprintKind::SubTau => "sub-tau",
            FingerprintKind::Full => "full",
        }
    }

    /// True for the kinds built only from substructure features.
    pub fn is_substructure(&self) -> bool {
        matches!(
            self,
            FingerprintKind::Sub | FingerprintKind::SubRes | FingerprintKind::SubTau
        )
    }

    /// True if the kind carries a similarity plane.
    pub fn has_sim_plane(&self) -> bool {
        matches!(self, FingerprintKind::Sim | FingerprintKind::Full)
    }
}

impl fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature family used for the similarity plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMode {
    /// Linear paths
    #[default]
    Sim,
    /// Pharmacophore-typed circular environments
    Chem,
    /// Circular, radius 1
    Ecfp2,
    /// Circular, radius 2
    Ecfp4,
    /// Circular, radius 3
    Ecfp6,
    /// Circular, radius 4
    Ecfp8,
}

impl SimilarityMode {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMode::Sim => "sim",
            SimilarityMode::Chem => "chem",
            SimilarityMode::Ecfp2 => "ecfp2",
            SimilarityMode::Ecfp4 => "ecfp4",
            SimilarityMode::Ecfp6 => "ecfp6",
            SimilarityMode::Ecfp8 => "ecfp8",
        }
    }

    /// Circular radius in bonds for the ECFP modes (diameter / 2).
    pub fn ecfp_radius(&self) -> Option<usize> {
        match self {
            SimilarityMode::Ecfp2 => Some(1),
            SimilarityMode::Ecfp4 => Some(2),
            SimilarityMode::Ecfp6 => Some(3),
            SimilarityMode::Ecfp8 => Some(4),
            SimilarityMode::Sim | SimilarityMode::Chem => None,
        }
    }
}

impl fmt::Display for SimilarityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a similarity sub-mode name, case-insensitive.
///
/// # Errors
///
/// Any name outside `sim, chem, ecfp2, ecfp4, ecfp6, ecfp8` is
/// `UnknownMode`; there is no fallback mode.
pub fn parse_similarity_type(name: &str) -> Result<SimilarityMode> {
    match normalize_name(name).as_str() {
        "sim" => Ok(SimilarityMode::Sim),
        "chem" => Ok(SimilarityMode::Chem),
        "ecfp2" => Ok(SimilarityMode::Ecfp2),
        "ecfp4" => Ok(SimilarityMode::Ecfp4),
        "ecfp6" => Ok(SimilarityMode::Ecfp6),
        "ecfp8" => Ok(SimilarityMode::Ecfp8),
        _ => Err(Error::UnknownMode(format!("similarity type '{}'", name))),
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}
