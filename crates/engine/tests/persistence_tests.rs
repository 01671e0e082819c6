//! On-disk behavior of the record store: reopen, schema checks, recovery.

use sieve_core::{parse_smiles, ChemObject, Error, ObjectClass};
use sieve_engine::{
    Database, DatabaseOptions, DurabilityMode, ScreeningOnly, CONFIG_FILE_NAME, LOG_FILE_NAME,
};
use std::io::Write;
use tempfile::TempDir;

fn mol(smiles: &str) -> ChemObject {
    ChemObject::from(parse_smiles(smiles).unwrap())
}

fn collect(mut cursor: sieve_engine::Cursor) -> Vec<u64> {
    let mut ids = Vec::new();
    while cursor.advance().unwrap() {
        ids.push(cursor.current_id().unwrap());
    }
    ids
}

// ============================================================================
// Reopen
// ============================================================================

#[test]
fn reopen_sees_records_and_continues_ids() {
    let dir = TempDir::new().unwrap();
    let smiles = ["CCO", "c1ccccc1", "C1CCNCC1"];
    {
        let mut db =
            Database::create(dir.path(), ObjectClass::Molecule, &DatabaseOptions::default())
                .unwrap();
        for s in smiles {
            db.insert(&mol(s)).unwrap();
        }
        db.close().unwrap();
    }

    let mut db = Database::open(dir.path()).unwrap();
    assert_eq!(db.len(), 3);
    for (id, s) in smiles.iter().enumerate() {
        assert_eq!(db.get(id as u64).unwrap(), mol(s));
    }
    assert_eq!(db.insert(&mol("CCN")).unwrap(), 3);
    assert_eq!(collect(db.enumerate().unwrap()), vec![0, 1, 2, 3]);
}

#[test]
fn records_survive_drop_without_close() {
    let dir = TempDir::new().unwrap();
    {
        let mut db =
            Database::create(dir.path(), ObjectClass::Molecule, &DatabaseOptions::default())
                .unwrap();
        db.insert(&mol("CCO")).unwrap();
    }
    let db = Database::open(dir.path()).unwrap();
    assert_eq!(db.len(), 1);
}

#[test]
fn create_on_existing_database_reopens_it() {
    let dir = TempDir::new().unwrap();
    let options = DatabaseOptions::parse("similarity-type:ecfp4").unwrap();
    {
        let mut db = Database::create(dir.path(), ObjectClass::Molecule, &options).unwrap();
        db.insert(&mol("CCO")).unwrap();
    }
    let mut db =
        Database::create(dir.path(), ObjectClass::Molecule, &DatabaseOptions::default()).unwrap();
    assert_eq!(db.len(), 1);
    assert_eq!(db.params(), &options.fingerprint);
    assert_eq!(db.insert(&mol("CCN")).unwrap(), 1);
}

#[test]
fn create_with_other_schema_is_a_mismatch() {
    let dir = TempDir::new().unwrap();
    Database::create(dir.path(), ObjectClass::Molecule, &DatabaseOptions::default())
        .unwrap()
        .close()
        .unwrap();
    let err = Database::create(dir.path(), ObjectClass::Reaction, &DatabaseOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}

#[test]
fn stored_options_are_used_after_reopen() {
    let dir = TempDir::new().unwrap();
    let options =
        DatabaseOptions::parse("durability:always;fp-sub-bits:512;fp-sim-bits:256").unwrap();
    Database::create(dir.path(), ObjectClass::Molecule, &options)
        .unwrap()
        .close()
        .unwrap();

    let mut db = Database::open(dir.path()).unwrap();
    assert_eq!(db.durability(), DurabilityMode::Always);
    let id = db.insert(&mol("CCO")).unwrap();
    assert_eq!(db.fingerprint(id).unwrap().len(), 768);
}

#[test]
fn closing_releases_the_directory_lock() {
    let dir = TempDir::new().unwrap();
    let mut db =
        Database::create(dir.path(), ObjectClass::Molecule, &DatabaseOptions::default()).unwrap();
    db.close().unwrap();
    let reopened = Database::open(dir.path()).unwrap();
    assert!(reopened.is_open());
}

// ============================================================================
// Recovery
// ============================================================================

#[test]
fn create_replaces_a_log_left_without_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(LOG_FILE_NAME), b"half-written header").unwrap();
    assert!(Database::open(dir.path()).is_err());

    {
        let mut db =
            Database::create(dir.path(), ObjectClass::Molecule, &DatabaseOptions::default())
                .unwrap();
        assert!(db.is_empty());
        assert_eq!(db.insert(&mol("CCO")).unwrap(), 0);
        db.close().unwrap();
    }
    assert!(dir.path().join(CONFIG_FILE_NAME).exists());

    let db = Database::open(dir.path()).unwrap();
    assert_eq!(db.len(), 1);
    assert_eq!(db.get(0).unwrap(), mol("CCO"));
}

#[test]
fn torn_trailing_write_is_discarded() {
    let dir = TempDir::new().unwrap();
    {
        let mut db =
            Database::create(dir.path(), ObjectClass::Molecule, &DatabaseOptions::default())
                .unwrap();
        db.insert(&mol("CCO")).unwrap();
        db.insert(&mol("CCN")).unwrap();
        db.close().unwrap();
    }
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(dir.path().join(LOG_FILE_NAME))
        .unwrap();
    file.write_all(&[200, 1, 0, 0, 1, 2, 3]).unwrap();
    drop(file);

    let mut db = Database::open(dir.path()).unwrap();
    assert_eq!(db.len(), 2);
    assert_eq!(db.insert(&mol("CCC")).unwrap(), 2);
    db.close().unwrap();

    let db = Database::open(dir.path()).unwrap();
    assert_eq!(db.len(), 3);
}

#[test]
fn damaged_config_fails_open() {
    let dir = TempDir::new().unwrap();
    Database::create(dir.path(), ObjectClass::Molecule, &DatabaseOptions::default())
        .unwrap()
        .close()
        .unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "schema = 12").unwrap();
    assert!(Database::open(dir.path()).is_err());
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn same_structure_three_times_then_search() {
    let dir = TempDir::new().unwrap();
    let mut db =
        Database::create(dir.path(), ObjectClass::Molecule, &DatabaseOptions::default()).unwrap();
    for _ in 0..3 {
        db.insert(&mol("C1CCNCC1")).unwrap();
    }

    let mut cursor = db.enumerate().unwrap();
    assert!(cursor.advance().unwrap());
    assert!(cursor.advance().unwrap());
    assert!(cursor.advance().unwrap());
    assert!(!cursor.advance().unwrap());
    cursor.end().unwrap();

    let hits = collect(db.search_sub(&mol("C1CCNCC1"), &ScreeningOnly).unwrap());
    assert_eq!(hits, vec![0, 1, 2]);
    db.close().unwrap();
}
