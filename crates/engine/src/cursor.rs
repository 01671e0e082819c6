//! Search cursors
//!
//! A cursor owns a snapshot of the matching ids taken when it was created,
//! so records inserted afterwards are never visited. It shares a liveness
//! flag with its database; once the database closes, every cursor created
//! from it behaves as ended.

use sieve_core::{Error, RecordId, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Created,
    Positioned(usize),
    Exhausted,
    Ended,
}

/// Iterator over a snapshot of record ids, optionally with scores.
#[derive(Debug)]
pub struct Cursor {
    ids: Vec<RecordId>,
    scores: Option<Vec<f64>>,
    state: CursorState,
    db_open: Arc<AtomicBool>,
}

impl Cursor {
    pub(crate) fn new(ids: Vec<RecordId>, db_open: Arc<AtomicBool>) -> Self {
        Cursor {
            ids,
            scores: None,
            state: CursorState::Created,
            db_open,
        }
    }

    pub(crate) fn with_scores(
        ids: Vec<RecordId>,
        scores: Vec<f64>,
        db_open: Arc<AtomicBool>,
    ) -> Self {
        debug_assert_eq!(ids.len(), scores.len());
        Cursor {
            scores: Some(scores),
            ..Cursor::new(ids, db_open)
        }
    }

    fn check_live(&self) -> Result<()> {
        if self.state == CursorState::Ended {
            return Err(Error::InvalidCursor("search has ended".to_string()));
        }
        if !self.db_open.load(Ordering::SeqCst) {
            return Err(Error::InvalidCursor("database was closed".to_string()));
        }
        Ok(())
    }

    /// Move to the next match. Returns false once exhausted, and keeps
    /// returning false.
    pub fn advance(&mut self) -> Result<bool> {
        self.check_live()?;
        let next = match self.state {
            CursorState::Created => 0,
            CursorState::Positioned(pos) => pos + 1,
            CursorState::Exhausted | CursorState::Ended => return Ok(false),
        };
        if next < self.ids.len() {
            self.state = CursorState::Positioned(next);
            Ok(true)
        } else {
            self.state = CursorState::Exhausted;
            Ok(false)
        }
    }

    /// Id of the current match; valid only after `advance` returned true.
    pub fn current_id(&self) -> Result<RecordId> {
        self.check_live()?;
        match self.state {
            CursorState::Positioned(pos) => Ok(self.ids[pos]),
            _ => Err(Error::InvalidCursor("cursor is not positioned".to_string())),
        }
    }

    /// Similarity score of the current match, for similarity searches.
    pub fn current_similarity(&self) -> Result<f64> {
        self.check_live()?;
        let scores = self
            .scores
            .as_ref()
            .ok_or_else(|| Error::InvalidCursor("not a similarity search".to_string()))?;
        match self.state {
            CursorState::Positioned(pos) => Ok(scores[pos]),
            _ => Err(Error::InvalidCursor("cursor is not positioned".to_string())),
        }
    }

    /// End the search. Any further use, including a second `end`, fails.
    pub fn end(&mut self) -> Result<()> {
        self.check_live()?;
        self.state = CursorState::Ended;
        Ok(())
    }

    /// Number of matches in the snapshot.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if the snapshot holds no matches.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True once ended explicitly or by closing the database.
    pub fn is_ended(&self) -> bool {
        self.state == CursorState::Ended || !self.db_open.load(Ordering::SeqCst)
    }

    /// True for similarity-search cursors.
    pub fn has_scores(&self) -> bool {
        self.scores.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(true))
    }

    #[test]
    fn walks_ids_then_stays_exhausted() {
        let mut cursor = Cursor::new(vec![3, 5], live());
        assert!(cursor.current_id().is_err());
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.current_id().unwrap(), 3);
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.current_id().unwrap(), 5);
        assert!(!cursor.advance().unwrap());
        assert!(!cursor.advance().unwrap());
        assert!(cursor.current_id().is_err());
    }

    #[test]
    fn empty_cursor_is_exhausted_immediately() {
        let mut cursor = Cursor::new(vec![], live());
        assert!(cursor.is_empty());
        assert!(!cursor.advance().unwrap());
    }

    #[test]
    fn end_is_final() {
        let mut cursor = Cursor::new(vec![1], live());
        cursor.end().unwrap();
        assert!(cursor.is_ended());
        assert!(matches!(cursor.advance(), Err(Error::InvalidCursor(_))));
        assert!(matches!(cursor.end(), Err(Error::InvalidCursor(_))));
    }

    #[test]
    fn closing_the_database_ends_the_cursor() {
        let flag = live();
        let mut cursor = Cursor::new(vec![1, 2], Arc::clone(&flag));
        assert!(cursor.advance().unwrap());
        flag.store(false, Ordering::SeqCst);
        assert!(cursor.is_ended());
        assert!(cursor.current_id().is_err());
        assert!(cursor.advance().is_err());
        assert!(cursor.end().is_err());
    }

    #[test]
    fn scores_follow_ids() {
        let mut cursor = Cursor::with_scores(vec![0, 4], vec![0.9, 0.85], live());
        assert!(cursor.current_similarity().is_err());
        cursor.advance().unwrap();
        cursor.advance().unwrap();
        assert_eq!(cursor.current_similarity().unwrap(), 0.85);

        let mut plain = Cursor::new(vec![0], live());
        plain.advance().unwrap();
        assert!(plain.current_similarity().is_err());
    }
}
