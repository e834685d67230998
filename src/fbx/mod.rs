//! The binary FBX container and its JSON intermediate form.
//!
//! A binary FBX file is a tree of named elements. Each element carries a
//! list of typed properties (scalars, strings, raw bytes and packed arrays)
//! followed by its child elements, and records the absolute file offset of
//! its own end. Arrays above a small size threshold are zlib-compressed.
//!
//! The JSON form used by the converter pair represents an element as the
//! 4-tuple `[name, values, type_codes, children]`, where `type_codes` is a
//! string with one character per value:
//!
//! | code | value                  | code | value                |
//! |------|------------------------|------|----------------------|
//! | `C`  | bool                   | `b`  | bool array           |
//! | `Z`  | i8                     | `c`  | byte array           |
//! | `Y`  | i16                    | `i`  | i32 array            |
//! | `I`  | i32                    | `l`  | i64 array            |
//! | `L`  | i64                    | `f`  | f32 array            |
//! | `F`  | f32                    | `d`  | f64 array            |
//! | `D`  | f64                    |      |                      |
//! | `R`  | bytes (base64 in JSON) |      |                      |
//! | `S`  | string                 |      |                      |
//!
//! `B`, the bool tag written by newer FBX exporters, is accepted on input as
//! an alias for `C`.

pub mod encode;
pub mod json;
pub mod parse;
pub mod tree;

pub use tree::{FbxElem, FbxProp};

use std::io;
use thiserror::Error;

/// Default version written when none is given (FBX 2014/2015).
pub const FBX_VERSION_DEFAULT: u32 = 7400;

/// First version whose record headers use 64-bit fields.
pub(crate) const FBX_VERSION_WIDE: u32 = 7500;

/// Errors from the FBX encoder, parser and JSON converters.
#[derive(Debug, Error)]
pub enum FbxError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// Returned when the data doesn't start with the binary FBX magic.
    #[error("not a binary FBX file")]
    NotAnFbxFile,
    /// Returned when the data ends in the middle of a record.
    #[error("unexpected end of data")]
    Truncated,
    #[error("unknown property type code 0x{0:02x}")]
    UnknownTypeCode(u8),
    /// Structural problems: offsets that don't line up, missing sentinels,
    /// array byte counts that don't match their element count, JSON that
    /// doesn't follow the 4-tuple shape.
    #[error("malformed FBX data: {0}")]
    Malformed(String),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid base64 in `R` property: {0}")]
    Base64(#[from] base64::DecodeError),
    /// A record landed past the 4 GiB limit of pre-7500 offsets.
    #[error("output too large for 32-bit record offsets")]
    Oversize,
}
