//! Append-only record log
//!
//! The log is the only durable copy of the records. It is replayed in full
//! on open; a torn trailing frame left by an interrupted write is cut off,
//! while damage anywhere before the tail is reported as corruption.

use crate::format::{frame_size, LogHeader, RecordFrame, RecordFrameError, LOG_HEADER_SIZE};
use sieve_core::{Error, Result, SchemaKind};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Record log file name inside the database directory.
pub const LOG_FILE_NAME: &str = "records.log";

/// Open record log positioned for appending.
#[derive(Debug)]
pub struct RecordLog {
    file: File,
    path: PathBuf,
    /// End of the last complete frame
    write_position: u64,
}

impl RecordLog {
    /// Create a new, empty log and write its header.
    pub fn create(path: &Path, schema: SchemaKind, database_uuid: [u8; 16]) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .open(path)?;
        file.write_all(&LogHeader::new(schema, database_uuid).to_bytes())?;
        file.sync_all()?;
        Ok(RecordLog {
            file,
            path: path.to_path_buf(),
            write_position: LOG_HEADER_SIZE as u64,
        })
    }

    /// Open an existing log and replay its frames.
    ///
    /// The header must name `schema` and `database_uuid`.
    pub fn open(
        path: &Path,
        schema: SchemaKind,
        database_uuid: [u8; 16],
    ) -> Result<(Self, Vec<RecordFrame>)> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        let mut header_bytes = [0u8; LOG_HEADER_SIZE];
        file.read_exact(&mut header_bytes).map_err(|e| {
            Error::Corruption(format!("record log header unreadable: {}", e))
        })?;
        let header = LogHeader::from_bytes(&header_bytes)
            .filter(LogHeader::is_valid)
            .ok_or_else(|| Error::Corruption("invalid record log header".to_string()))?;
        if header.database_uuid != database_uuid {
            return Err(Error::Corruption(
                "record log belongs to a different database".to_string(),
            ));
        }
        match header.schema_kind() {
            Some(found) if found == schema => {}
            Some(found) => {
                return Err(Error::SchemaMismatch {
                    expected: schema.to_string(),
                    found: found.to_string(),
                })
            }
            None => {
                return Err(Error::Corruption(format!(
                    "unknown schema code {} in record log",
                    header.schema
                )))
            }
        }

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        let (frames, valid_len) = replay(&buffer)?;

        let write_position = (LOG_HEADER_SIZE + valid_len) as u64;
        if valid_len < buffer.len() {
            warn!(
                target: "sieve::db",
                path = %path.display(),
                bytes = buffer.len() - valid_len,
                "Truncating torn frame at end of record log"
            );
            file.set_len(write_position)?;
            file.sync_all()?;
        }

        Ok((
            RecordLog {
                file,
                path: path.to_path_buf(),
                write_position,
            },
            frames,
        ))
    }

    /// Append one frame. With `sync` the data is on disk when this returns.
    ///
    /// On failure the log is cut back to its previous end, so a partially
    /// written frame never survives.
    pub fn append(&mut self, frame: &RecordFrame, sync: bool) -> Result<()> {
        let bytes = frame.to_bytes();
        let start = self.write_position;
        let result = self
            .file
            .seek(SeekFrom::Start(start))
            .and_then(|_| self.file.write_all(&bytes))
            .and_then(|_| if sync { self.file.sync_data() } else { Ok(()) });
        if let Err(e) = result {
            if let Err(undo) = self.file.set_len(start) {
                warn!(
                    target: "sieve::db",
                    path = %self.path.display(),
                    error = %undo,
                    "Failed to cut back partial frame"
                );
            }
            return Err(e.into());
        }
        self.write_position = start + bytes.len() as u64;
        Ok(())
    }

    /// Sync all appended frames to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Size of the valid log in bytes, header included.
    pub fn size(&self) -> u64 {
        self.write_position
    }

    /// Log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse consecutive frames; returns the frames and the byte length of the
/// valid prefix.
fn replay(buffer: &[u8]) -> Result<(Vec<RecordFrame>, usize)> {
    let mut frames: Vec<RecordFrame> = Vec::new();
    let mut offset = 0;
    while offset < buffer.len() {
        let remaining = &buffer[offset..];
        match RecordFrame::from_bytes(remaining) {
            Ok((frame, consumed)) => {
                if let Some(prev) = frames.last() {
                    if frame.record_id <= prev.record_id {
                        return Err(Error::Corruption(format!(
                            "record id {} follows {} at offset {}",
                            frame.record_id,
                            prev.record_id,
                            LOG_HEADER_SIZE + offset
                        )));
                    }
                }
                frames.push(frame);
                offset += consumed;
            }
            Err(RecordFrameError::InsufficientData) => break,
            Err(RecordFrameError::ChecksumMismatch { .. })
                if frame_size(remaining) == Some(remaining.len()) =>
            {
                // last frame, written partially before a crash
                break;
            }
            Err(e) => {
                return Err(Error::Corruption(format!(
                    "record log frame at offset {}: {}",
                    LOG_HEADER_SIZE + offset,
                    e
                )))
            }
        }
    }
    Ok((frames, offset))
}
