//! Error types for the field-binding engine.
//!
//! All fallible operations in this crate return [`Result<T>`], which uses
//! the [`Error`] enum for error variants.
//!
//! Malformed or truncated network input is *not* an error: the parser stops
//! descending and leaves deeper fields unbound. Every variant below that
//! names a field signals a violated binding contract — a bug in the
//! dispatcher or in caller code, never a property of the packet.

use crate::field::OxmField;

/// Errors that can occur while binding or accessing match fields.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File system I/O error (CLI frame input).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (CLI field dump).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field was bound twice in the same parse pass.
    ///
    /// `bind` requires a vacant slot. Seeing this means a dispatcher stage
    /// re-bound a field an earlier stage already populated.
    #[error("field {0} is already bound")]
    AlreadyBound(OxmField),

    /// `rebind` was called on a field no stage has touched.
    ///
    /// Rebinding supersedes an existing binding; there must be one.
    #[error("field {0} is not bound")]
    NotBound(OxmField),

    /// The field was explicitly bound to "absent" for this packet.
    ///
    /// VLAN_VID on an untagged frame is the canonical case: the slot is
    /// occupied, but there are no bytes to read or write. Callers should
    /// check availability via
    /// [`ParsedPacket::is_bound`](crate::ParsedPacket::is_bound) first.
    #[error("field {0} is absent from this packet")]
    FieldAbsent(OxmField),

    /// The raw field id does not belong to the supported OXM namespace.
    #[error("unsupported oxm field id {0}")]
    UnsupportedField(u8),

    /// A caller-supplied binding location fails validation.
    ///
    /// Locations must match the field's wire width and stay inside the
    /// frame buffer; `rebind` checks both before touching the table.
    #[error("invalid binding location: {0}")]
    InvalidLocation(String),

    /// The frame input could not be decoded (CLI hex argument or file).
    #[error("invalid frame encoding: {0}")]
    InvalidFrame(String),
}

/// A specialized Result type for field-binding operations.
pub type Result<T> = std::result::Result<T, Error>;
