pub mod blend;

use nom::{
    error::{ErrorKind, ParseError},
    IResult,
};
use std::io;
use thiserror::Error;

pub type Result<'a, T> = IResult<&'a [u8], T, BlendParseError>;

/// Size of a pointer on the machine used to create the .blend file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerSize {
    Bits32,
    Bits64,
}

impl PointerSize {
    /// Returns the pointer size in bytes.
    pub fn bytes_num(self) -> usize {
        match self {
            PointerSize::Bits32 => 4,
            PointerSize::Bits64 => 8,
        }
    }
}

/// Endianness of the machine used to create the .blend file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Errors that can happen during the initial parsing of the .blend file.
/// Most errors are simply `NomError` but a few of them are specific either
/// for better error reporting or due to custom logic.
#[derive(Debug, Error)]
pub enum BlendParseError {
    #[error("parse error ({kind:?})")]
    NomError {
        kind: ErrorKind,
        other: Option<Box<BlendParseError>>,
    },
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
    /// Returned when the file is incomplete.
    #[error("unexpected end of data")]
    NotEnoughData,
    /// Returned when the file doesn't start with `b"BLENDER"` and carries no
    /// known compression magic either.
    #[error("not a .blend file")]
    NotABlendFile,
    /// Returned when the data starts with a compression magic this crate
    /// can't decompress (Zstandard, or gzip handed to the in-memory entry
    /// points). Gzip files are decompressed transparently by
    /// [`crate::thumb::extract_thumb_from_path`].
    #[error("compressed .blend data is not supported here")]
    CompressedFileNotSupported,
}

impl ParseError<&[u8]> for BlendParseError {
    fn from_error_kind(_input: &[u8], kind: ErrorKind) -> Self {
        BlendParseError::NomError { kind, other: None }
    }

    fn append(_input: &[u8], kind: ErrorKind, other: Self) -> Self {
        BlendParseError::NomError {
            kind,
            other: Some(Box::new(other)),
        }
    }
}

/// Flattens nom's error wrapper so callers outside the parser see only
/// `BlendParseError`. `Eof` is what the complete-input combinators report
/// when the data runs out mid-record.
pub(crate) fn unwrap_nom_err(err: nom::Err<BlendParseError>) -> BlendParseError {
    match err {
        nom::Err::Failure(e) | nom::Err::Error(e) => match e {
            BlendParseError::NomError {
                kind: ErrorKind::Eof,
                ..
            } => BlendParseError::NotEnoughData,
            e => e,
        },
        nom::Err::Incomplete(..) => BlendParseError::NotEnoughData,
    }
}
