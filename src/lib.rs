//! # Blendkit - Blender file tooling in Rust
//!
//! This crate collects the binary-format utilities that usually ship as loose
//! scripts next to Blender: extracting the embedded preview thumbnail from a
//! `.blend` file and writing it out as a PNG, and converting binary FBX files
//! to and from a JSON intermediate form.
//!
//! ## Example
//!
//! ```ignore
//! use blendkit::thumb;
//! use std::fs::File;
//!
//! /// Saves the thumbnail embedded in a .blend file as a PNG.
//! fn main() {
//!     let thumb = thumb::extract_thumb_from_path("file.blend")
//!         .expect("parse error")
//!         .expect("file has no thumbnail");
//!
//!     let out = File::create("thumb.png").unwrap();
//!     thumb.write_png(out).unwrap();
//! }
//! ```
//!
//! ## The .blend file
//!
//! A `.blend` file starts with a 12-byte header: the magic `"BLENDER"`, one
//! byte for the pointer size of the machine that saved the file (`'_'` for
//! 32-bit, `'-'` for 64-bit), one byte for its endianness (`'v'` little,
//! `'V'` big) and 3 ASCII digits for the version. After that the file is a
//! flat sequence of blocks, each introduced by a header of 20 or 24 bytes
//! depending on the pointer size, until a block with the code `ENDB`.
//!
//! Files saved with "Compress File" enabled are gzip streams; the path-based
//! entry points decompress those transparently. Newer Blender versions can
//! compress with Zstandard instead, which this crate detects but does not
//! decompress.
//!
//! The preview thumbnail lives near the start of the file: after any `REND`
//! blocks, a `TEST` block holds two 32-bit dimensions followed by the raw
//! RGBA pixels, bottom row first. Everything after it (the actual scene
//! data) is irrelevant here and is never interpreted, which keeps extraction
//! cheap even for very large files.
//!
//! ## Binary FBX
//!
//! The [`fbx`] module implements the binary FBX container: a tree of named
//! elements, each carrying typed scalar and array properties, serialized
//! with absolute end offsets and zlib-compressed arrays. The JSON form used
//! by the converter pair represents each element as a 4-tuple
//! `[name, values, type_codes, children]`. See the module docs for details.
//!
//! ## Warnings
//!
//! This crate is meant for trusted files. Parsing is defensive (malformed
//! input returns an error or "no thumbnail" rather than panicking) but no
//! attempt is made to bound memory on adversarial inputs beyond the length
//! checks the formats themselves allow.

pub mod fbx;
pub mod parsers;
pub mod png;
pub mod thumb;

pub use fbx::{FbxElem, FbxProp};
pub use thumb::{extract_thumb, extract_thumb_from_path, Thumbnail};
