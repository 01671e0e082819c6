//! Session context and sentinel-returning operations
//!
//! Every operation records its error message and returns a sentinel on
//! failure: `-1` for handles, ids and flags, `-1.0` for scores (valid scores
//! lie in `[0, 1]`). The message stays available through `last_error` until
//! the next failure.

use crate::handles::{HandleObject, HandleTable};
use sieve_core::{
    parse_query_smiles, parse_reaction_smiles, parse_smiles, ChemObject, Error, ObjectClass,
    Result,
};
use sieve_engine::{Database, DatabaseOptions, ScreeningOnly, SubstructureMatcher};
use sieve_fingerprint::{
    similarity, FingerprintBuilder, FingerprintKind, FingerprintParams, Operand, SimilarityMetric,
};
use tracing::{debug, warn};

/// Handle table, fingerprint options and last error of one caller.
#[derive(Debug, Default)]
pub struct Session {
    handles: HandleTable,
    params: FingerprintParams,
    last_error: Option<String>,
}

impl Session {
    /// Empty session with default fingerprint options.
    pub fn new() -> Self {
        Self::default()
    }

    fn report<T>(&mut self, op: &str, result: Result<T>, sentinel: T) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                debug!(target: "sieve::api", op, error = %e, "Operation failed");
                self.last_error = Some(e.to_string());
                sentinel
            }
        }
    }

    /// Message of the most recent failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Session fingerprint options.
    pub fn params(&self) -> &FingerprintParams {
        &self.params
    }

    /// Handle table, for callers that need direct access to handle objects.
    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    // ========================================================================
    // Structures and options
    // ========================================================================

    /// Load a molecule from SMILES.
    pub fn load_molecule(&mut self, smiles: &str) -> i32 {
        let result = parse_smiles(smiles)
            .and_then(|m| self.handles.insert(HandleObject::Object(m.into())));
        self.report("load_molecule", result, -1)
    }

    /// Load a query molecule from SMILES.
    pub fn load_query_molecule(&mut self, smiles: &str) -> i32 {
        let result = parse_query_smiles(smiles)
            .and_then(|m| self.handles.insert(HandleObject::Object(m.into())));
        self.report("load_query_molecule", result, -1)
    }

    /// Load a reaction from reaction SMILES.
    pub fn load_reaction(&mut self, smiles: &str) -> i32 {
        let result = parse_reaction_smiles(smiles)
            .and_then(|r| self.handles.insert(HandleObject::Object(r.into())));
        self.report("load_reaction", result, -1)
    }

    /// Register a structure built elsewhere.
    pub fn add_object(&mut self, object: ChemObject) -> i32 {
        let result = self.handles.insert(HandleObject::Object(object));
        self.report("add_object", result, -1)
    }

    /// Set a session fingerprint option; returns 1 on success.
    ///
    /// Affects fingerprints built and databases created afterwards.
    pub fn set_option(&mut self, name: &str, value: &str) -> i32 {
        let result = self.params.set_option(name, value).map(|_| 1);
        self.report("set_option", result, -1)
    }

    // ========================================================================
    // Fingerprints and similarity
    // ========================================================================

    /// Build a fingerprint of `kind` for structure `object`.
    pub fn fingerprint(&mut self, object: i32, kind: &str) -> i32 {
        let result = self.try_fingerprint(object, kind);
        self.report("fingerprint", result, -1)
    }

    fn try_fingerprint(&mut self, object: i32, kind: &str) -> Result<i32> {
        let kind = FingerprintKind::parse(kind)?;
        let builder = FingerprintBuilder::new(self.params.clone())?;
        let fp = builder.build(self.handles.object(object)?, kind, None)?;
        self.handles.insert(HandleObject::Fingerprint(fp))
    }

    /// Similarity of two handles under `metric`; -1.0 on failure.
    ///
    /// Bit metrics take two fingerprint handles, `normalized-edit` two
    /// structure handles.
    pub fn similarity(&mut self, a: i32, b: i32, metric: &str) -> f64 {
        let result = self.try_similarity(a, b, metric);
        self.report("similarity", result, -1.0)
    }

    fn try_similarity(&self, a: i32, b: i32, metric: &str) -> Result<f64> {
        let metric = SimilarityMetric::parse(metric)?;
        similarity(self.operand(a)?, self.operand(b)?, &metric)
    }

    fn operand(&self, handle: i32) -> Result<Operand<'_>> {
        match self.handles.entry(handle)? {
            HandleObject::Object(obj) => Ok(Operand::Object(obj)),
            HandleObject::Fingerprint(fp) => Ok(Operand::Fingerprint(fp)),
            _ => Err(Error::IncompatibleOperands(format!(
                "handle {} is neither a structure nor a fingerprint",
                handle
            ))),
        }
    }

    // ========================================================================
    // Databases
    // ========================================================================

    /// Create (or reopen) a database in directory `path`.
    ///
    /// `schema` is `"molecule"` or `"reaction"`; `options` is a
    /// `key:value;...` string applied over the session fingerprint options.
    pub fn create_database(&mut self, path: &str, schema: &str, options: &str) -> i32 {
        let result = self.try_create_database(path, schema, options);
        self.report("create_database", result, -1)
    }

    fn try_create_database(&mut self, path: &str, schema: &str, options: &str) -> Result<i32> {
        let schema = ObjectClass::parse(schema)?;
        let options = DatabaseOptions::with_fingerprint(self.params.clone()).merged(options)?;
        let db = Database::create(path, schema, &options)?;
        self.handles.insert(HandleObject::Database(db))
    }

    /// Open an existing database directory.
    pub fn load_database(&mut self, path: &str) -> i32 {
        let result =
            Database::open(path).and_then(|db| self.handles.insert(HandleObject::Database(db)));
        self.report("load_database", result, -1)
    }

    /// Insert structure `object` into database `db`; returns the record id.
    pub fn insert_record(&mut self, db: i32, object: i32) -> i64 {
        let result = self.try_insert_record(db, object);
        self.report("insert_record", result, -1)
    }

    fn try_insert_record(&mut self, db: i32, object: i32) -> Result<i64> {
        let object = self.handles.object(object)?.clone();
        let id = self.handles.database_mut(db)?.insert(&object)?;
        i64::try_from(id).map_err(|_| Error::InvalidOperation(format!("record id {} overflows", id)))
    }

    /// Cursor over every record of `db`.
    pub fn enumerate_id(&mut self, db: i32) -> i32 {
        let result = self
            .handles
            .database(db)
            .and_then(Database::enumerate)
            .and_then(|c| self.handles.insert(HandleObject::Cursor(c)));
        self.report("enumerate_id", result, -1)
    }

    /// Substructure search with fingerprint screening only.
    pub fn search_sub(&mut self, db: i32, query: i32) -> i32 {
        self.search_sub_with(db, query, &ScreeningOnly)
    }

    /// Substructure search with `matcher` confirming screened candidates.
    pub fn search_sub_with(
        &mut self,
        db: i32,
        query: i32,
        matcher: &dyn SubstructureMatcher,
    ) -> i32 {
        let result = self
            .handles
            .object(query)
            .and_then(|q| self.handles.database(db)?.search_sub(q, matcher))
            .and_then(|c| self.handles.insert(HandleObject::Cursor(c)));
        self.report("search_sub", result, -1)
    }

    /// Similarity search over `db` for scores in `[min, max]`.
    pub fn search_sim(&mut self, db: i32, query: i32, min: f64, max: f64, metric: &str) -> i32 {
        let result = self.try_search_sim(db, query, min, max, metric);
        self.report("search_sim", result, -1)
    }

    fn try_search_sim(
        &mut self,
        db: i32,
        query: i32,
        min: f64,
        max: f64,
        metric: &str,
    ) -> Result<i32> {
        let metric = SimilarityMetric::parse(metric)?;
        let cursor = self
            .handles
            .database(db)?
            .search_sim(self.handles.object(query)?, min, max, &metric)?;
        self.handles.insert(HandleObject::Cursor(cursor))
    }

    /// Close database `db`. The handle stays valid so later use reports the
    /// closed state; release it with `free`.
    pub fn close_database(&mut self, db: i32) -> i32 {
        let result = self
            .handles
            .database_mut(db)
            .and_then(Database::close)
            .map(|_| 1);
        self.report("close_database", result, -1)
    }

    // ========================================================================
    // Cursors
    // ========================================================================

    /// Advance a cursor: 1 positioned, 0 exhausted, -1 error.
    pub fn next(&mut self, cursor: i32) -> i32 {
        let result = self
            .handles
            .cursor_mut(cursor)
            .and_then(|c| c.advance())
            .map(i32::from);
        self.report("next", result, -1)
    }

    /// Record id at the cursor position.
    pub fn current_id(&mut self, cursor: i32) -> i64 {
        let result = self
            .handles
            .cursor(cursor)
            .and_then(|c| c.current_id())
            .and_then(|id| {
                i64::try_from(id)
                    .map_err(|_| Error::InvalidOperation(format!("record id {} overflows", id)))
            });
        self.report("current_id", result, -1)
    }

    /// Similarity score at the cursor position.
    pub fn current_similarity(&mut self, cursor: i32) -> f64 {
        let result = self
            .handles
            .cursor(cursor)
            .and_then(|c| c.current_similarity());
        self.report("current_similarity", result, -1.0)
    }

    /// End a search and release its handle.
    ///
    /// The handle is released even when ending fails because the database
    /// was closed underneath it.
    pub fn end_search(&mut self, cursor: i32) -> i32 {
        let result = self
            .handles
            .cursor_mut(cursor)
            .map(|c| c.end())
            .and_then(|ended| {
                let removed = self.handles.remove(cursor);
                ended.and(removed).map(|_| 1)
            });
        self.report("end_search", result, -1)
    }

    /// Release any handle. Releasing an open database closes it first; if
    /// the close fails the error is reported and the handle stays valid.
    pub fn free(&mut self, handle: i32) -> i32 {
        let closed = match self.handles.database_mut(handle) {
            Ok(db) if db.is_open() => db.close(),
            _ => Ok(()),
        };
        let result = closed
            .and_then(|()| self.handles.remove(handle))
            .map(|_| 1);
        self.report("free", result, -1)
    }

    /// Close every open database. Called when the session is released.
    pub(crate) fn teardown(&mut self) {
        for (handle, db) in self.handles.databases_mut() {
            if db.is_open() {
                if let Err(e) = db.close() {
                    warn!(
                        target: "sieve::api",
                        handle,
                        error = %e,
                        "Failed to close database during session release"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_failures_return_sentinel_and_message() {
        let mut s = Session::new();
        assert_eq!(s.load_molecule("C1CC"), -1);
        assert!(s.last_error().unwrap().contains("Parse error"));
        assert!(s.load_molecule("CCO") > 0);
    }

    #[test]
    fn unknown_similarity_type_is_rejected() {
        let mut s = Session::new();
        assert_eq!(s.set_option("similarity-type", "ecfp5"), -1);
        assert!(s.last_error().unwrap().contains("Unknown fingerprint mode"));
        assert_eq!(s.set_option("similarity-type", "ecfp4"), 1);
    }

    #[test]
    fn fingerprint_of_unknown_handle_fails() {
        let mut s = Session::new();
        assert_eq!(s.fingerprint(42, "sim"), -1);
        assert!(s.last_error().unwrap().contains("Invalid handle"));
    }

    #[test]
    fn wrong_handle_type_fails() {
        let mut s = Session::new();
        let m = s.load_molecule("CCO");
        assert_eq!(s.next(m), -1);
        assert_eq!(s.insert_record(m, m), -1);
    }

    #[test]
    fn freeing_open_database_closes_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_str().unwrap();
        let mut s = Session::new();
        let db = s.create_database(path, "molecule", "");
        assert!(db > 0);
        assert_eq!(s.free(db), 1);
        assert_eq!(s.free(db), -1);
        let again = s.load_database(path);
        assert!(again > 0, "{:?}", s.last_error());
    }

    #[test]
    fn end_search_releases_handle() {
        let mut s = Session::new();
        let dir = TempDir::new().unwrap();
        let db = s.create_database(dir.path().to_str().unwrap(), "molecule", "");
        let cursor = s.enumerate_id(db);
        assert_eq!(s.end_search(cursor), 1);
        assert_eq!(s.next(cursor), -1);
        assert_eq!(s.end_search(cursor), -1);
    }

    #[test]
    fn end_search_after_close_reports_and_releases() {
        let mut s = Session::new();
        let dir = TempDir::new().unwrap();
        let db = s.create_database(dir.path().to_str().unwrap(), "molecule", "");
        let cursor = s.enumerate_id(db);
        assert_eq!(s.close_database(db), 1);
        assert_eq!(s.end_search(cursor), -1);
        assert!(s.last_error().unwrap().contains("closed"));
        assert_eq!(s.next(cursor), -1);
        assert!(s.last_error().unwrap().contains("Invalid handle"));
    }

    #[test]
    fn freeing_closed_database_releases_handle() {
        let dir = TempDir::new().unwrap();
        let mut s = Session::new();
        let db = s.create_database(dir.path().to_str().unwrap(), "molecule", "");
        assert_eq!(s.close_database(db), 1);
        assert_eq!(s.free(db), 1);
        assert_eq!(s.close_database(db), -1);
        assert!(s.last_error().unwrap().contains("Invalid handle"));
    }
}
