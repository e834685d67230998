//! Extraction of the preview thumbnail embedded in .blend files.
//!
//! Blender stores a screenshot of the viewport in a `TEST` block right after
//! any `REND` blocks at the start of the file: two 32-bit dimensions and
//! `width * height * 4` bytes of RGBA pixels, bottom row first. A file saved
//! without previews simply has no `TEST` block, so "no thumbnail" is an
//! expected outcome and is reported as `Ok(None)` rather than an error.

use crate::parsers::{
    blend::{blocks, Header},
    BlendParseError, Endianness,
};
use crate::png;
use libflate::gzip::Decoder;
use log::debug;
use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
    result::Result as StdResult,
};

/// A thumbnail extracted from a .blend file. `data` holds RGBA pixels in the
/// file's own bottom-up row order; `data.len()` is always
/// `width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Thumbnail {
    /// Writes the thumbnail as an 8-bit RGBA PNG. Rows are flipped to the
    /// top-down order PNG expects.
    pub fn write_png<W: Write>(&self, writer: W) -> io::Result<()> {
        png::write_png(writer, &self.data, self.width, self.height)
    }
}

/// Extracts the thumbnail from uncompressed .blend data.
///
/// `REND` blocks are skipped. If the first block after them is not `TEST`,
/// or the `TEST` payload doesn't describe a sane image, the file has no
/// usable thumbnail and `Ok(None)` is returned. Errors are reserved for data
/// that can't be parsed as a .blend file at all.
pub fn extract_thumb(data: &[u8]) -> StdResult<Option<Thumbnail>, BlendParseError> {
    let (header, blocks) = blocks(data)?;

    for block in blocks {
        let block = block?;
        match &block.code {
            b"REND" => continue,
            b"TEST" => return Ok(thumb_from_test(&header, block.data)),
            code => {
                debug!(
                    "no TEST block before {:?}, file has no thumbnail",
                    String::from_utf8_lossy(code)
                );
                return Ok(None);
            }
        }
    }

    Ok(None)
}

/// Reads a file and extracts its thumbnail, transparently decompressing
/// gzip-compressed saves first.
pub fn extract_thumb_from_path<P: AsRef<Path>>(
    path: P,
) -> StdResult<Option<Thumbnail>, BlendParseError> {
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    if data.starts_with(&[0x1f, 0x8b]) {
        debug!("gzip-compressed .blend, decompressing");
        let mut decoder = Decoder::new(&data[..])?;
        let mut gzip_data = Vec::new();
        decoder.read_to_end(&mut gzip_data)?;
        data = gzip_data;
    }

    extract_thumb(&data)
}

fn thumb_from_test(header: &Header, data: &[u8]) -> Option<Thumbnail> {
    if data.len() < 8 {
        return None;
    }

    let width = read_i32(&data[0..4], header.endianness);
    let height = read_i32(&data[4..8], header.endianness);
    if width <= 0 || height <= 0 {
        return None;
    }

    let expected = (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(4)?;
    if data.len() - 8 != expected {
        debug!(
            "TEST block payload is {} bytes, expected {} for {}x{}",
            data.len() - 8,
            expected,
            width,
            height
        );
        return None;
    }

    Some(Thumbnail {
        width: width as u32,
        height: height as u32,
        data: data[8..].to_vec(),
    })
}

fn read_i32(slice: &[u8], endianness: Endianness) -> i32 {
    let bytes = [slice[0], slice[1], slice[2], slice[3]];
    match endianness {
        Endianness::Little => i32::from_le_bytes(bytes),
        Endianness::Big => i32::from_be_bytes(bytes),
    }
}
