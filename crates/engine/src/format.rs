//! Record log file format.
//!
//! # File Layout
//!
//! ```text
//! ┌────────────────────────────────────┐
//! │ Log Header (32 bytes)              │
//! ├────────────────────────────────────┤
//! │ Frame 1                            │
//! ├────────────────────────────────────┤
//! │ Frame 2                            │
//! ├────────────────────────────────────┤
//! │ ...                                │
//! └────────────────────────────────────┘
//! ```
//!
//! # Frame Layout
//!
//! ```text
//! ┌─────────────────┬────────────────┬────────────────┬───────────────────┬──────────┐
//! │ Length (4 bytes)│ Format Ver (1) │ RecordId (8)   │ Payload (variable)│ CRC32 (4)│
//! └─────────────────┴────────────────┴────────────────┴───────────────────┴──────────┘
//! ```
//!
//! The length field covers everything after itself. The CRC covers the
//! format version, record id and payload.

use crc32fast::Hasher;
use sieve_core::{ObjectClass, RecordId, SchemaKind};

/// Magic bytes identifying a record log: "SIEV"
pub const LOG_MAGIC: [u8; 4] = *b"SIEV";

/// Current log file format version
pub const LOG_FORMAT_VERSION: u32 = 1;

/// Size of the log header in bytes
pub const LOG_HEADER_SIZE: usize = 32;

/// Current frame format version
pub const FRAME_FORMAT_VERSION: u8 = 1;

/// Bytes before the payload: format version + record id
const FRAME_PREFIX: usize = 9;

/// Frames larger than this are treated as a damaged length field
const MAX_FRAME_LEN: usize = 256 * 1024 * 1024;

/// Record log header (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogHeader {
    /// Magic bytes: "SIEV"
    pub magic: [u8; 4],

    /// Format version for forward compatibility
    pub format_version: u32,

    /// Schema code: 1 = molecule, 2 = reaction
    pub schema: u32,

    /// Database UUID, matches `sieve.toml`
    pub database_uuid: [u8; 16],
}

impl LogHeader {
    /// Header for a new log.
    pub fn new(schema: SchemaKind, database_uuid: [u8; 16]) -> Self {
        LogHeader {
            magic: LOG_MAGIC,
            format_version: LOG_FORMAT_VERSION,
            schema: schema_code(schema),
            database_uuid,
        }
    }

    /// Serialize header to bytes. Bytes 12..16 are reserved and zero.
    pub fn to_bytes(&self) -> [u8; LOG_HEADER_SIZE] {
        let mut bytes = [0u8; LOG_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.format_version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.schema.to_le_bytes());
        bytes[16..32].copy_from_slice(&self.database_uuid);
        bytes
    }

    /// Deserialize header from bytes.
    pub fn from_bytes(bytes: &[u8; LOG_HEADER_SIZE]) -> Option<Self> {
        Some(LogHeader {
            magic: bytes[0..4].try_into().ok()?,
            format_version: u32::from_le_bytes(bytes[4..8].try_into().ok()?),
            schema: u32::from_le_bytes(bytes[8..12].try_into().ok()?),
            database_uuid: bytes[16..32].try_into().ok()?,
        })
    }

    /// Validate magic bytes and version.
    pub fn is_valid(&self) -> bool {
        self.magic == LOG_MAGIC && self.format_version == LOG_FORMAT_VERSION
    }

    /// Schema recorded in the header, if the code is known.
    pub fn schema_kind(&self) -> Option<SchemaKind> {
        match self.schema {
            1 => Some(ObjectClass::Molecule),
            2 => Some(ObjectClass::Reaction),
            _ => None,
        }
    }
}

fn schema_code(schema: SchemaKind) -> u32 {
    match schema {
        ObjectClass::Molecule => 1,
        ObjectClass::Reaction => 2,
    }
}

/// One stored record as written to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFrame {
    /// Identifier assigned at insert
    pub record_id: RecordId,

    /// Encoded record body
    pub payload: Vec<u8>,
}

impl RecordFrame {
    /// Create a new frame.
    pub fn new(record_id: RecordId, payload: Vec<u8>) -> Self {
        RecordFrame { record_id, payload }
    }

    /// Serialize frame to bytes.
    ///
    /// Format: length (4) + format_version (1) + record_id (8) + payload + crc32 (4)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(FRAME_PREFIX + self.payload.len());
        body.push(FRAME_FORMAT_VERSION);
        body.extend_from_slice(&self.record_id.to_le_bytes());
        body.extend_from_slice(&self.payload);

        let crc = compute_crc(&body);

        let total_len = body.len() + 4;
        let mut frame = Vec::with_capacity(4 + total_len);
        frame.extend_from_slice(&(total_len as u32).to_le_bytes());
        frame.extend_from_slice(&body);
        frame.extend_from_slice(&crc.to_le_bytes());
        frame
    }

    /// Deserialize a frame from the start of `bytes`.
    ///
    /// Returns (frame, bytes_consumed) on success.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), RecordFrameError> {
        let length = read_length(bytes)?;
        if length < FRAME_PREFIX + 4 || length > MAX_FRAME_LEN {
            return Err(RecordFrameError::InvalidFormat);
        }
        if bytes.len() < 4 + length {
            return Err(RecordFrameError::InsufficientData);
        }

        let body = &bytes[4..4 + length - 4];
        let stored_crc = read_u32(&bytes[4 + length - 4..4 + length]);
        let computed_crc = compute_crc(body);
        if computed_crc != stored_crc {
            return Err(RecordFrameError::ChecksumMismatch {
                expected: stored_crc,
                computed: computed_crc,
            });
        }

        let format_version = body[0];
        if format_version != FRAME_FORMAT_VERSION {
            return Err(RecordFrameError::UnsupportedVersion(format_version));
        }

        let mut id_bytes = [0u8; 8];
        id_bytes.copy_from_slice(&body[1..FRAME_PREFIX]);
        let frame = RecordFrame {
            record_id: u64::from_le_bytes(id_bytes),
            payload: body[FRAME_PREFIX..].to_vec(),
        };
        Ok((frame, 4 + length))
    }
}

/// Total on-disk size of the frame starting at `bytes`, if its length
/// field is readable.
pub(crate) fn frame_size(bytes: &[u8]) -> Option<usize> {
    read_length(bytes).ok().map(|len| 4 + len)
}

fn read_length(bytes: &[u8]) -> Result<usize, RecordFrameError> {
    if bytes.len() < 4 {
        return Err(RecordFrameError::InsufficientData);
    }
    Ok(read_u32(&bytes[0..4]) as usize)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Frame parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordFrameError {
    /// Not enough data to parse a frame
    #[error("Insufficient data to parse frame")]
    InsufficientData,

    /// Frame format is invalid
    #[error("Invalid frame format")]
    InvalidFormat,

    /// Checksum verification failed
    #[error("Checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Expected checksum from frame
        expected: u32,
        /// Computed checksum
        computed: u32,
    },

    /// Unsupported frame format version
    #[error("Unsupported frame version: {0}")]
    UnsupportedVersion(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let header = LogHeader::new(ObjectClass::Reaction, [0xAB; 16]);
        let parsed = LogHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert!(parsed.is_valid());
        assert_eq!(parsed.schema_kind(), Some(ObjectClass::Reaction));
    }

    #[test]
    fn header_with_bad_magic_is_invalid() {
        let mut bytes = LogHeader::new(ObjectClass::Molecule, [0; 16]).to_bytes();
        bytes[0] = b'X';
        assert!(!LogHeader::from_bytes(&bytes).unwrap().is_valid());
    }

    #[test]
    fn frame_roundtrip() {
        let frame = RecordFrame::new(42, vec![1, 2, 3, 4, 5]);
        let bytes = frame.to_bytes();
        let (parsed, consumed) = RecordFrame::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(consumed, bytes.len());
        assert_eq!(frame_size(&bytes), Some(bytes.len()));
    }

    #[test]
    fn consecutive_frames_parse_in_order() {
        let mut bytes = RecordFrame::new(0, vec![9; 10]).to_bytes();
        bytes.extend(RecordFrame::new(1, vec![]).to_bytes());
        let (first, used) = RecordFrame::from_bytes(&bytes).unwrap();
        let (second, _) = RecordFrame::from_bytes(&bytes[used..]).unwrap();
        assert_eq!(first.record_id, 0);
        assert_eq!(second.record_id, 1);
        assert!(second.payload.is_empty());
    }

    #[test]
    fn truncated_frame_is_insufficient() {
        let bytes = RecordFrame::new(7, vec![0; 32]).to_bytes();
        assert_eq!(
            RecordFrame::from_bytes(&bytes[..bytes.len() - 1]),
            Err(RecordFrameError::InsufficientData)
        );
        assert_eq!(
            RecordFrame::from_bytes(&bytes[..2]),
            Err(RecordFrameError::InsufficientData)
        );
    }

    #[test]
    fn flipped_bit_fails_checksum() {
        let mut bytes = RecordFrame::new(7, vec![0; 32]).to_bytes();
        bytes[20] ^= 0x01;
        assert!(matches!(
            RecordFrame::from_bytes(&bytes),
            Err(RecordFrameError::ChecksumMismatch { .. })
        ));
    }
}
