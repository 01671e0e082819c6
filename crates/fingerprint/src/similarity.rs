//! Similarity metrics over fingerprints and structures

use crate::bits::{BitVector, Fingerprint};
use crate::edit::normalized_edit_similarity;
use serde::{Deserialize, Serialize};
use sieve_core::{canonical_reaction_tokens, canonical_tokens, ChemObject, Error, Result};
use std::fmt;

/// Similarity metric selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimilarityMetric {
    /// `|A ∩ B| / |A ∪ B|`
    Tanimoto,
    /// `|A ∩ B| / (α|A \ B| + β|B \ A| + |A ∩ B|)`
    Tversky {
        /// Weight of bits only in the first operand
        alpha: f64,
        /// Weight of bits only in the second operand
        beta: f64,
    },
    /// `|A ∩ B| / |A|`
    EuclidSub,
    /// Normalized token edit similarity of canonical serializations
    NormalizedEdit,
}

impl SimilarityMetric {
    /// Parse a metric name: `tanimoto`, `tversky [alpha beta]`,
    /// `euclid-sub` or `normalized-edit`, case-insensitive.
    pub fn parse(name: &str) -> Result<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let mut words = lowered.split_whitespace();
        let head = words.next().unwrap_or("");
        let args: Vec<&str> = words.collect();
        let metric = match head {
            "tanimoto" if args.is_empty() => SimilarityMetric::Tanimoto,
            "euclid-sub" if args.is_empty() => SimilarityMetric::EuclidSub,
            "normalized-edit" if args.is_empty() => SimilarityMetric::NormalizedEdit,
            "tversky" if args.is_empty() => SimilarityMetric::Tversky {
                alpha: 0.5,
                beta: 0.5,
            },
            "tversky" if args.len() == 2 => {
                let weight = |s: &str| -> Result<f64> {
                    match s.parse::<f64>() {
                        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
                        _ => Err(Error::InvalidOperation(format!(
                            "invalid tversky weight '{}'",
                            s
                        ))),
                    }
                };
                SimilarityMetric::Tversky {
                    alpha: weight(args[0])?,
                    beta: weight(args[1])?,
                }
            }
            _ => return Err(Error::UnknownMetric(name.to_string())),
        };
        Ok(metric)
    }

    /// True for metrics computed on fingerprint bits.
    pub fn is_bitwise(&self) -> bool {
        !matches!(self, SimilarityMetric::NormalizedEdit)
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMetric::Tanimoto => f.write_str("tanimoto"),
            SimilarityMetric::Tversky { alpha, beta } => write!(f, "tversky {} {}", alpha, beta),
            SimilarityMetric::EuclidSub => f.write_str("euclid-sub"),
            SimilarityMetric::NormalizedEdit => f.write_str("normalized-edit"),
        }
    }
}

/// Operand of a similarity computation.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    /// Precomputed fingerprint
    Fingerprint(&'a Fingerprint),
    /// Raw structure
    Object(&'a ChemObject),
}

/// Similarity of `a` and `b` under `metric`, in `[0, 1]`.
///
/// # Errors
///
/// `IncompatibleOperands` when a bit metric gets a non-fingerprint operand
/// or fingerprints of different kind, mode, class or length, and when
/// `normalized-edit` gets anything but two structures of the same class.
pub fn similarity(a: Operand<'_>, b: Operand<'_>, metric: &SimilarityMetric) -> Result<f64> {
    match (a, b) {
        (Operand::Fingerprint(fa), Operand::Fingerprint(fb)) if metric.is_bitwise() => {
            fingerprint_similarity(fa, fb, metric)
        }
        (Operand::Object(oa), Operand::Object(ob))
            if *metric == SimilarityMetric::NormalizedEdit =>
        {
            object_edit_similarity(oa, ob)
        }
        _ if metric.is_bitwise() => Err(Error::IncompatibleOperands(format!(
            "{} requires two fingerprints",
            metric
        ))),
        _ => Err(Error::IncompatibleOperands(format!(
            "{} requires two structures",
            metric
        ))),
    }
}

/// Bit-metric similarity of two comparable fingerprints.
pub fn fingerprint_similarity(
    a: &Fingerprint,
    b: &Fingerprint,
    metric: &SimilarityMetric,
) -> Result<f64> {
    if !a.is_comparable(b) {
        return Err(Error::IncompatibleOperands(format!(
            "cannot compare {} fingerprint of {} bits with {} fingerprint of {} bits",
            a.kind(),
            a.len(),
            b.kind(),
            b.len()
        )));
    }
    bit_similarity(a.bits(), b.bits(), metric)
}

/// Bit-metric similarity of two equal-length bit vectors.
pub fn bit_similarity(a: &BitVector, b: &BitVector, metric: &SimilarityMetric) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::IncompatibleOperands(format!(
            "bit lengths differ: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    match *metric {
        SimilarityMetric::Tanimoto => Ok(tanimoto(a, b)),
        SimilarityMetric::Tversky { alpha, beta } => Ok(tversky(a, b, alpha, beta)),
        SimilarityMetric::EuclidSub => Ok(euclid_sub(a, b)),
        SimilarityMetric::NormalizedEdit => Err(Error::IncompatibleOperands(
            "normalized-edit requires two structures".to_string(),
        )),
    }
}

/// Tanimoto coefficient; 1.0 when both vectors are empty.
pub fn tanimoto(a: &BitVector, b: &BitVector) -> f64 {
    let union = a.or_count(b);
    if union == 0 {
        return 1.0;
    }
    a.and_count(b) as f64 / union as f64
}

/// Tversky index.
pub fn tversky(a: &BitVector, b: &BitVector, alpha: f64, beta: f64) -> f64 {
    let common = a.and_count(b) as f64;
    let only_a = a.count_ones() as f64 - common;
    let only_b = b.count_ones() as f64 - common;
    let denom = alpha * only_a + beta * only_b + common;
    if denom == 0.0 {
        return if a.count_ones() == 0 && b.count_ones() == 0 {
            1.0
        } else {
            0.0
        };
    }
    common / denom
}

/// Fraction of the query's bits present in the target; 1.0 for an empty
/// query.
pub fn euclid_sub(query: &BitVector, target: &BitVector) -> f64 {
    let ones = query.count_ones();
    if ones == 0 {
        return 1.0;
    }
    query.and_count(target) as f64 / ones as f64
}

fn object_edit_similarity(a: &ChemObject, b: &ChemObject) -> Result<f64> {
    let (ta, tb) = match (a, b) {
        (ChemObject::Molecule(ma), ChemObject::Molecule(mb)) => {
            (canonical_tokens(ma), canonical_tokens(mb))
        }
        (ChemObject::Reaction(ra), ChemObject::Reaction(rb)) => {
            (canonical_reaction_tokens(ra), canonical_reaction_tokens(rb))
        }
        _ => {
            return Err(Error::IncompatibleOperands(
                "normalized-edit between a molecule and a reaction".to_string(),
            ))
        }
    };
    Ok(normalized_edit_similarity(&ta, &tb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FingerprintBuilder;
    use crate::kind::FingerprintKind;
    use sieve_core::{parse_smiles, ErrorCategory};

    fn bits(len: usize, ones: &[usize]) -> BitVector {
        let mut v = BitVector::new(len);
        for &i in ones {
            v.set(i);
        }
        v
    }

    #[test]
    fn metric_names() {
        assert_eq!(SimilarityMetric::parse("Tanimoto").unwrap(), SimilarityMetric::Tanimoto);
        assert_eq!(
            SimilarityMetric::parse("tversky 0.3 0.7").unwrap(),
            SimilarityMetric::Tversky {
                alpha: 0.3,
                beta: 0.7
            }
        );
        assert_eq!(
            SimilarityMetric::parse("tversky").unwrap(),
            SimilarityMetric::Tversky {
                alpha: 0.5,
                beta: 0.5
            }
        );
        let err = SimilarityMetric::parse("cosine").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnknownName);
        assert!(SimilarityMetric::parse("tversky 1").is_err());
        assert!(SimilarityMetric::parse("tversky a b").is_err());
    }

    #[test]
    fn bit_metrics() {
        let a = bits(64, &[1, 2, 3, 4]);
        let b = bits(64, &[3, 4, 5, 6]);
        assert!((tanimoto(&a, &b) - 2.0 / 6.0).abs() < 1e-12);
        assert!((tversky(&a, &b, 0.5, 0.5) - 0.5).abs() < 1e-12);
        assert!((tversky(&a, &b, 1.0, 1.0) - tanimoto(&a, &b)).abs() < 1e-12);
        assert!((euclid_sub(&a, &b) - 0.5).abs() < 1e-12);
        let empty = BitVector::new(64);
        assert_eq!(tanimoto(&empty, &empty), 1.0);
        assert_eq!(euclid_sub(&empty, &b), 1.0);
    }

    #[test]
    fn edit_metric_rejects_fingerprints() {
        let builder = FingerprintBuilder::default();
        let obj = ChemObject::from(parse_smiles("CCO").unwrap());
        let fp = builder.build(&obj, FingerprintKind::Sim, None).unwrap();
        let err = similarity(
            Operand::Fingerprint(&fp),
            Operand::Fingerprint(&fp),
            &SimilarityMetric::NormalizedEdit,
        )
        .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::IncompatibleOperands);
    }

    #[test]
    fn bit_metrics_reject_structures_and_mismatched_fingerprints() {
        let builder = FingerprintBuilder::default();
        let obj = ChemObject::from(parse_smiles("CCO").unwrap());
        let sim = builder.build(&obj, FingerprintKind::Sim, None).unwrap();
        let sub = builder.build(&obj, FingerprintKind::Sub, None).unwrap();
        assert!(similarity(
            Operand::Object(&obj),
            Operand::Object(&obj),
            &SimilarityMetric::Tanimoto
        )
        .is_err());
        assert!(similarity(
            Operand::Fingerprint(&sim),
            Operand::Object(&obj),
            &SimilarityMetric::Tanimoto
        )
        .is_err());
        let err = similarity(
            Operand::Fingerprint(&sim),
            Operand::Fingerprint(&sub),
            &SimilarityMetric::Tanimoto,
        )
        .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::IncompatibleOperands);
    }

    #[test]
    fn identical_fingerprints_score_one() {
        let builder = FingerprintBuilder::default();
        let fp = builder
            .build(
                &ChemObject::from(parse_smiles("c1ccccc1O").unwrap()),
                FingerprintKind::Full,
                None,
            )
            .unwrap();
        let score = similarity(
            Operand::Fingerprint(&fp),
            Operand::Fingerprint(&fp),
            &SimilarityMetric::Tanimoto,
        )
        .unwrap();
        assert_eq!(score, 1.0);
    }
}
