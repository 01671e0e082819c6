//! Session boundary for SieveDB
//!
//! Exposes structures, fingerprints, databases and cursors to callers as
//! integer handles:
//! - `SessionRegistry`: allocates, selects and releases sessions
//! - `Session`: handle table, fingerprint options and last error
//! - `HandleTable`: typed access to handle objects
//!
//! Failing operations return `-1` (or `-1.0` for scores) and record a
//! message readable through `Session::last_error`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod handles;
pub mod registry;
pub mod session;

pub use handles::{HandleObject, HandleTable};
pub use registry::{SessionId, SessionRegistry};
pub use session::Session;
