//! Similarity behavior through the session boundary.

use sievedb::{Session, SessionRegistry};

const SIM_MODES: [&str; 6] = ["sim", "chem", "ecfp2", "ecfp4", "ecfp6", "ecfp8"];

fn tanimoto(session: &mut Session, a: &str, b: &str) -> f64 {
    let ha = session.load_molecule(a);
    let hb = session.load_molecule(b);
    let fa = session.fingerprint(ha, "sim");
    let fb = session.fingerprint(hb, "sim");
    session.similarity(fa, fb, "tanimoto")
}

#[test]
fn depiction_only_analogs_are_identical() {
    let mut registry = SessionRegistry::new();
    registry.alloc();
    let session = registry.current().unwrap();
    for mode in SIM_MODES {
        assert_eq!(session.set_option("similarity-type", mode), 1);
        let score = tanimoto(session, "C1C=C(OCCCC)C=CC=1", "C1=CC=C(OCCCC)C=C1");
        assert_eq!(score, 1.0, "mode {}", mode);
    }
}

#[test]
fn one_extra_chain_unit_stays_close() {
    let mut session = Session::new();
    for mode in SIM_MODES {
        assert_eq!(session.set_option("similarity-type", mode), 1);
        let score = tanimoto(
            &mut session,
            "CCCCCCCCCCCCOc1ccc(cc1)C(=O)O",
            "CCCCCCCCCCCCCOc1ccc(cc1)C(=O)O",
        );
        assert!(score > 0.80 && score < 0.99, "mode {} score {}", mode, score);
    }
}

#[test]
fn canonical_and_noncanonical_text_agree_under_edit_distance() {
    let mut session = Session::new();
    let a = session.load_molecule("OCC1=CC=CC=C1");
    let b = session.load_molecule("c1ccc(CO)cc1");
    assert_eq!(session.similarity(a, b, "normalized-edit"), 1.0);
}

#[test]
fn normalized_edit_on_fingerprints_returns_sentinel() {
    let mut session = Session::new();
    let a = session.load_molecule("CCO");
    let b = session.load_molecule("CCN");
    let fa = session.fingerprint(a, "sim");
    let fb = session.fingerprint(b, "sim");
    assert_eq!(session.similarity(fa, fb, "normalized-edit"), -1.0);
    assert!(session.last_error().is_some());
}

#[test]
fn tversky_with_equal_half_weights_matches_dice() {
    let mut session = Session::new();
    let a = session.load_molecule("CC(=O)Nc1ccc(O)cc1");
    let b = session.load_molecule("CC(=O)Nc1ccccc1");
    let fa = session.fingerprint(a, "sim");
    let fb = session.fingerprint(b, "sim");

    let t = session.similarity(fa, fb, "tanimoto");
    let dice = session.similarity(fa, fb, "tversky 0.5 0.5");
    assert!((dice - 2.0 * t / (1.0 + t)).abs() < 1e-12);
    assert_eq!(session.similarity(fa, fb, "tversky 0.5"), -1.0);
}

#[test]
fn euclid_sub_scores_query_coverage() {
    let mut session = Session::new();
    let q = session.load_molecule("c1ccccc1");
    let t = session.load_molecule("Oc1ccccc1");
    let fq = session.fingerprint(q, "sub");
    let ft = session.fingerprint(t, "sub");
    assert_eq!(session.similarity(fq, ft, "euclid-sub"), 1.0);
}
