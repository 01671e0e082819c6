//! Record store
//!
//! A database is a directory holding `sieve.toml`, `records.log` and a
//! `.lock` file. All records are held in memory; the log is the durable
//! copy and is replayed on open.
//!
//! Single writer: `insert` takes `&mut self`. Cursors own a snapshot of
//! their matches and stay valid until they are ended or the database is
//! closed.

use crate::config::{DatabaseOptions, DurabilityMode, StoreConfig, CONFIG_FILE_NAME};
use crate::cursor::Cursor;
use crate::format::RecordFrame;
use crate::log::{RecordLog, LOG_FILE_NAME};
use crate::record::StoredRecord;
use crate::search::SubstructureMatcher;
use sieve_core::{encode_object, ChemObject, Error, RecordId, Result, SchemaKind};
use sieve_fingerprint::{
    fingerprint_similarity, Fingerprint, FingerprintBuilder, FingerprintKind, FingerprintParams,
    SimilarityMetric,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Embedded fingerprint record store.
#[derive(Debug)]
pub struct Database {
    /// Database directory; `None` for ephemeral databases
    data_dir: Option<PathBuf>,
    config: StoreConfig,
    durability: DurabilityMode,
    builder: FingerprintBuilder,
    records: BTreeMap<RecordId, StoredRecord>,
    next_id: RecordId,
    log: Option<RecordLog>,
    /// Exclusive lock on `.lock`, held until close or drop
    _lock_file: Option<File>,
    /// Shared with every cursor created from this database
    open: Arc<AtomicBool>,
}

impl Database {
    /// Create a database in directory `path`.
    ///
    /// If the directory already holds a database of the same schema it is
    /// reopened with its stored parameters and `options` are ignored; ids
    /// continue from the stored records.
    ///
    /// # Errors
    ///
    /// `SchemaMismatch` if the directory holds a database of another schema,
    /// `IoError` / `StorageError` if the directory cannot be written or is
    /// locked by another process.
    pub fn create<P: AsRef<Path>>(
        path: P,
        schema: SchemaKind,
        options: &DatabaseOptions,
    ) -> Result<Database> {
        options.fingerprint.validate()?;
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;
        let lock_file = acquire_lock(&data_dir)?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            let config = StoreConfig::from_file(&config_path)?;
            if config.schema != schema {
                return Err(Error::SchemaMismatch {
                    expected: schema.to_string(),
                    found: config.schema.to_string(),
                });
            }
            info!(
                target: "sieve::db",
                path = %data_dir.display(),
                schema = %schema,
                "Database already exists, reopening"
            );
            return Self::load(data_dir, config, lock_file);
        }

        // `sieve.toml` is written last and marks a finished create; a log
        // without it is left over from an interrupted one.
        let log_path = data_dir.join(LOG_FILE_NAME);
        if log_path.exists() {
            warn!(
                target: "sieve::db",
                path = %log_path.display(),
                "Removing record log left by an interrupted create"
            );
            std::fs::remove_file(&log_path)?;
        }
        let config = StoreConfig::new(schema, options);
        let log = RecordLog::create(&log_path, schema, *config.uuid.as_bytes())?;
        if let Err(e) = config.write_to_file(&config_path) {
            drop(log);
            if let Err(cleanup) = std::fs::remove_file(&log_path) {
                warn!(
                    target: "sieve::db",
                    path = %log_path.display(),
                    error = %cleanup,
                    "Failed to remove record log after config write failed"
                );
            }
            return Err(e);
        }

        info!(
            target: "sieve::db",
            path = %data_dir.display(),
            schema = %schema,
            uuid = %config.uuid,
            durability = config.durability.as_str(),
            "Created database"
        );

        Ok(Database {
            data_dir: Some(data_dir),
            durability: options.durability,
            builder: FingerprintBuilder::new(config.fingerprint.clone())?,
            config,
            records: BTreeMap::new(),
            next_id: 0,
            log: Some(log),
            _lock_file: Some(lock_file),
            open: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Open an existing database directory.
    ///
    /// # Errors
    ///
    /// `StorageError` if `path` holds no database or is locked;
    /// `Corruption` if the record log is damaged before its tail.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Database> {
        let data_dir = path.as_ref().to_path_buf();
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(Error::StorageError(format!(
                "no database at '{}'",
                data_dir.display()
            )));
        }
        let lock_file = acquire_lock(&data_dir)?;
        let config = StoreConfig::from_file(&config_path)?;
        Self::load(data_dir, config, lock_file)
    }

    fn load(data_dir: PathBuf, config: StoreConfig, lock_file: File) -> Result<Database> {
        let (log, frames) = RecordLog::open(
            &data_dir.join(LOG_FILE_NAME),
            config.schema,
            *config.uuid.as_bytes(),
        )?;

        let mut records = BTreeMap::new();
        let mut next_id = 0;
        for frame in frames {
            records.insert(frame.record_id, StoredRecord::from_payload(&frame.payload)?);
            next_id = frame.record_id + 1;
        }

        info!(
            target: "sieve::db",
            path = %data_dir.display(),
            schema = %config.schema,
            records = records.len(),
            next_id,
            "Opened database"
        );

        Ok(Database {
            data_dir: Some(data_dir),
            durability: config.durability_mode()?,
            builder: FingerprintBuilder::new(config.fingerprint.clone())?,
            config,
            records,
            next_id,
            log: Some(log),
            _lock_file: Some(lock_file),
            open: Arc::new(AtomicBool::new(true)),
        })
    }

    /// In-memory database with no files.
    pub fn ephemeral(schema: SchemaKind, options: &DatabaseOptions) -> Result<Database> {
        let config = StoreConfig::new(schema, options);
        Ok(Database {
            data_dir: None,
            durability: options.durability,
            builder: FingerprintBuilder::new(config.fingerprint.clone())?,
            config,
            records: BTreeMap::new(),
            next_id: 0,
            log: None,
            _lock_file: None,
            open: Arc::new(AtomicBool::new(true)),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::DatabaseClosed)
        }
    }

    /// Reject objects this database cannot store or search with.
    fn check_object(&self, object: &ChemObject, what: &str) -> Result<()> {
        if object.class() != self.config.schema {
            return Err(Error::UnsupportedObject(format!(
                "{} {} in a {} database",
                what,
                object.class(),
                self.config.schema
            )));
        }
        Ok(())
    }

    /// Insert a structure and return its new id.
    ///
    /// Validation, fingerprinting, encoding and the log append all happen
    /// before the record becomes visible; a failure at any step leaves the
    /// database unchanged.
    ///
    /// # Errors
    ///
    /// `UnsupportedObject` for a query object or an object of the wrong
    /// class; storage errors from the log append.
    pub fn insert(&mut self, object: &ChemObject) -> Result<RecordId> {
        self.ensure_open()?;
        self.check_object(object, "record")?;
        if object.is_query() {
            return Err(Error::UnsupportedObject(
                "query objects cannot be stored".to_string(),
            ));
        }

        let fingerprint = self.builder.build(object, FingerprintKind::Full, None)?;
        let record = StoredRecord {
            structure: encode_object(object)?,
            fingerprint,
        };
        let id = self.next_id;
        if let Some(log) = self.log.as_mut() {
            let frame = RecordFrame::new(id, record.to_payload()?);
            log.append(&frame, self.durability == DurabilityMode::Always)?;
        }

        self.records.insert(id, record);
        self.next_id += 1;
        debug!(target: "sieve::db", id, "Inserted record");
        Ok(id)
    }

    /// Stored structure of record `id`.
    pub fn get(&self, id: RecordId) -> Result<ChemObject> {
        self.ensure_open()?;
        self.record(id)?.object()
    }

    /// Stored `Full` fingerprint of record `id`.
    pub fn fingerprint(&self, id: RecordId) -> Result<&Fingerprint> {
        self.ensure_open()?;
        Ok(&self.record(id)?.fingerprint)
    }

    fn record(&self, id: RecordId) -> Result<&StoredRecord> {
        self.records
            .get(&id)
            .ok_or_else(|| Error::InvalidOperation(format!("no record with id {}", id)))
    }

    /// Cursor over every record id, ascending.
    pub fn enumerate(&self) -> Result<Cursor> {
        self.ensure_open()?;
        let ids: Vec<RecordId> = self.records.keys().copied().collect();
        debug!(target: "sieve::db", matches = ids.len(), "Enumerate");
        Ok(Cursor::new(ids, Arc::clone(&self.open)))
    }

    /// Substructure search: records whose substructure plane holds every bit
    /// of the query's and that `matcher` accepts.
    pub fn search_sub(
        &self,
        query: &ChemObject,
        matcher: &dyn SubstructureMatcher,
    ) -> Result<Cursor> {
        self.ensure_open()?;
        self.check_object(query, "query")?;
        let query_fp = self.builder.build(query, FingerprintKind::Sub, None)?;

        let mut ids = Vec::new();
        let mut screened = 0usize;
        for (&id, record) in &self.records {
            if !query_fp.screens(&record.fingerprint.sub_plane()?) {
                continue;
            }
            screened += 1;
            let accepted = if matcher.needs_structures() {
                matcher.matches(query, &record.object()?)?
            } else {
                matcher.matches(query, query)?
            };
            if accepted {
                ids.push(id);
            }
        }
        debug!(
            target: "sieve::db",
            records = self.records.len(),
            screened,
            matches = ids.len(),
            "Substructure search"
        );
        Ok(Cursor::new(ids, Arc::clone(&self.open)))
    }

    /// Similarity search: records whose similarity-plane score against the
    /// query lies in `[min, max]`, ids ascending, scores kept.
    ///
    /// # Errors
    ///
    /// `IncompatibleOperands` for a metric that does not work on bits;
    /// `UnsupportedObject` for a query object or wrong class;
    /// `InvalidOperation` if `min > max`.
    pub fn search_sim(
        &self,
        query: &ChemObject,
        min: f64,
        max: f64,
        metric: &SimilarityMetric,
    ) -> Result<Cursor> {
        self.ensure_open()?;
        self.check_object(query, "query")?;
        if !metric.is_bitwise() {
            return Err(Error::IncompatibleOperands(format!(
                "{} cannot rank stored fingerprints",
                metric
            )));
        }
        if min.is_nan() || max.is_nan() || min > max {
            return Err(Error::InvalidOperation(format!(
                "invalid similarity range [{}, {}]",
                min, max
            )));
        }
        let query_fp = self.builder.build(query, FingerprintKind::Sim, None)?;

        let mut ids = Vec::new();
        let mut scores = Vec::new();
        for (&id, record) in &self.records {
            let score = fingerprint_similarity(&query_fp, &record.fingerprint.sim_plane()?, metric)?;
            if score >= min && score <= max {
                ids.push(id);
                scores.push(score);
            }
        }
        debug!(
            target: "sieve::db",
            metric = %metric,
            min,
            max,
            matches = ids.len(),
            "Similarity search"
        );
        Ok(Cursor::with_scores(ids, scores, Arc::clone(&self.open)))
    }

    /// Sync appended records to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        if let Some(log) = self.log.as_mut() {
            log.flush()?;
        }
        Ok(())
    }

    /// Flush, release the directory lock and invalidate every cursor.
    ///
    /// # Errors
    ///
    /// `DatabaseClosed` if already closed; storage errors from the final
    /// flush (the database is closed regardless).
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        let flushed = match self.log.as_mut() {
            Some(log) => log.flush(),
            None => Ok(()),
        };
        self.open.store(false, Ordering::SeqCst);
        self.log = None;
        self._lock_file = None;
        info!(
            target: "sieve::db",
            path = ?self.data_dir,
            records = self.records.len(),
            "Closed database"
        );
        flushed
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no record has been inserted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Id the next insert will receive.
    pub fn next_id(&self) -> RecordId {
        self.next_id
    }

    /// Object class of every record.
    pub fn schema(&self) -> SchemaKind {
        self.config.schema
    }

    /// Fingerprint parameters of every record.
    pub fn params(&self) -> &FingerprintParams {
        &self.config.fingerprint
    }

    /// Durability mode in effect.
    pub fn durability(&self) -> DurabilityMode {
        self.durability
    }

    /// Database identity.
    pub fn uuid(&self) -> Uuid {
        self.config.uuid
    }

    /// Database directory, `None` for ephemeral databases.
    pub fn path(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// True until `close`.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if !self.is_open() {
            return;
        }
        self.open.store(false, Ordering::SeqCst);
        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.flush() {
                warn!(
                    target: "sieve::db",
                    path = %log.path().display(),
                    error = %e,
                    "Failed to flush record log on drop"
                );
            }
        }
    }
}

fn acquire_lock(data_dir: &Path) -> Result<File> {
    let lock_path = data_dir.join(".lock");
    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(&lock_path)
        .map_err(|e| Error::StorageError(format!("failed to open lock file: {}", e)))?;
    fs2::FileExt::try_lock_exclusive(&lock_file).map_err(|_| {
        Error::StorageError(format!(
            "database at '{}' is already in use",
            data_dir.display()
        ))
    })?;
    Ok(lock_file)
}

// ============================================================================
// Tests
// ============================================================================
