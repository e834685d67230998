use crate::parsers::{unwrap_nom_err, BlendParseError, Endianness, PointerSize, Result};
use nom::{
    branch::alt,
    bytes::complete::{tag, take},
    number::complete::{be_i32, le_i32},
    sequence::tuple,
    Err,
};
use std::{convert::TryFrom, result::Result as StdResult};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// The size of the pointer on the machine used to save the blend file.
    pub pointer_size: PointerSize,
    /// The endianness on the machine used to save the blend file.
    pub endianness: Endianness,
    /// The version of Blender used to save the blend file, as 3 ASCII digits.
    pub version: [u8; 3],
}

impl Header {
    /// Size in bytes of a block header for this file: a 4-byte code, a
    /// 4-byte length, a pointer and two more 4-byte integers.
    pub fn block_header_len(&self) -> usize {
        16 + self.pointer_size.bytes_num()
    }
}

fn pointer_size_bits32(input: &[u8]) -> Result<PointerSize> {
    let (input, _) = tag("_")(input)?;
    Ok((input, PointerSize::Bits32))
}

fn pointer_size_bits64(input: &[u8]) -> Result<PointerSize> {
    let (input, _) = tag("-")(input)?;
    Ok((input, PointerSize::Bits64))
}

pub fn pointer_size(input: &[u8]) -> Result<PointerSize> {
    alt((pointer_size_bits32, pointer_size_bits64))(input)
}

fn endianness_little(input: &[u8]) -> Result<Endianness> {
    let (input, _) = tag("v")(input)?;
    Ok((input, Endianness::Little))
}

fn endianness_big(input: &[u8]) -> Result<Endianness> {
    let (input, _) = tag("V")(input)?;
    Ok((input, Endianness::Big))
}

pub fn endianness(input: &[u8]) -> Result<Endianness> {
    alt((endianness_little, endianness_big))(input)
}

pub fn version(input: &[u8]) -> Result<[u8; 3]> {
    let (input, v) = take(3_usize)(input)?;
    Ok((input, [v[0], v[1], v[2]]))
}

pub fn header(input: &[u8]) -> Result<Header> {
    let (input, _) = match tag::<_, _, BlendParseError>("BLENDER")(input) {
        Ok(v) => v,
        Err(_) => {
            let err = if input.starts_with(&GZIP_MAGIC) || input.starts_with(&ZSTD_MAGIC) {
                BlendParseError::CompressedFileNotSupported
            } else {
                BlendParseError::NotABlendFile
            };
            return Err(nom::Err::Failure(err));
        }
    };

    let (input, (pointer_size, endianness, version)) =
        tuple((pointer_size, endianness, version))(input)?;

    Ok((
        input,
        Header {
            pointer_size,
            endianness,
            version,
        },
    ))
}

pub fn block_header_code(input: &[u8]) -> Result<[u8; 4]> {
    let (input, v) = take(4_usize)(input)?;
    Ok((input, [v[0], v[1], v[2], v[3]]))
}

/// A single block of the blend file: its 4-byte code (principal blocks use a
/// two-letter code padded with NULs) and a borrowed slice of its payload.
/// Block contents are never interpreted at this layer.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    pub code: [u8; 4],
    pub data: &'a [u8],
}

/// Parses one block header and borrows its payload. `ENDB` yields `None`.
fn block<'a>(header: &Header, input: &'a [u8]) -> Result<'a, Option<Block<'a>>> {
    let (input, code) = block_header_code(input)?;
    if &code == b"ENDB" {
        return Ok((input, None));
    }

    let (input, size) = match header.endianness {
        Endianness::Little => le_i32(input)?,
        Endianness::Big => be_i32(input)?,
    };
    let size = usize::try_from(size)
        .map_err(|_| Err::Failure(BlendParseError::NotEnoughData))?;

    // The old memory address, the SDNA index and the struct count. Nothing
    // here dereferences block contents, so all three are skipped.
    let (input, _) = take(header.pointer_size.bytes_num() + 8)(input)?;
    let (input, data) = take(size)(input)?;

    Ok((input, Some(Block { code, data })))
}

/// Lazy iterator over the blocks of a blend file, ending at `ENDB`. A
/// truncated file yields an `Err` item and then stops.
#[derive(Debug)]
pub struct Blocks<'a> {
    header: Header,
    input: &'a [u8],
    finished: bool,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = StdResult<Block<'a>, BlendParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match block(&self.header, self.input) {
            Ok((rest, Some(block))) => {
                self.input = rest;
                Some(Ok(block))
            }
            Ok((rest, None)) => {
                self.input = rest;
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(unwrap_nom_err(err)))
            }
        }
    }
}

/// Parses the file header and returns it along with a lazy iterator over the
/// file's blocks.
pub fn blocks(input: &[u8]) -> StdResult<(Header, Blocks), BlendParseError> {
    let (input, header) = header(input).map_err(unwrap_nom_err)?;

    Ok((
        header.clone(),
        Blocks {
            header,
            input,
            finished: false,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_header(pointer_size: u8, endianness: u8) -> Vec<u8> {
        let mut data = b"BLENDER".to_vec();
        data.push(pointer_size);
        data.push(endianness);
        data.extend_from_slice(b"293");
        data
    }

    fn raw_block(code: &[u8; 4], payload: &[u8], header: &Header) -> Vec<u8> {
        let mut data = code.to_vec();
        let len = payload.len() as i32;
        match header.endianness {
            Endianness::Little => data.extend_from_slice(&len.to_le_bytes()),
            Endianness::Big => data.extend_from_slice(&len.to_be_bytes()),
        }
        data.extend_from_slice(&vec![0; header.pointer_size.bytes_num() + 8]);
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn parses_64bit_little_endian_header() {
        let data = file_header(b'-', b'v');
        let (rest, header) = header(&data).unwrap();
        assert!(rest.is_empty());
        assert_eq!(header.pointer_size, PointerSize::Bits64);
        assert_eq!(header.endianness, Endianness::Little);
        assert_eq!(&header.version, b"293");
        assert_eq!(header.block_header_len(), 24);
    }

    #[test]
    fn parses_32bit_big_endian_header() {
        let data = file_header(b'_', b'V');
        let (_, header) = header(&data).unwrap();
        assert_eq!(header.pointer_size, PointerSize::Bits32);
        assert_eq!(header.endianness, Endianness::Big);
        assert_eq!(header.block_header_len(), 20);
    }

    #[test]
    fn rejects_garbage_as_not_a_blend_file() {
        let err = blocks(b"definitely not a blend").unwrap_err();
        assert!(matches!(err, BlendParseError::NotABlendFile));
    }

    #[test]
    fn reports_gzip_data_as_compressed() {
        let err = blocks(&[0x1f, 0x8b, 0x08, 0x00]).unwrap_err();
        assert!(matches!(err, BlendParseError::CompressedFileNotSupported));
    }

    #[test]
    fn reports_zstd_data_as_compressed() {
        let err = blocks(&[0x28, 0xb5, 0x2f, 0xfd, 0x00]).unwrap_err();
        assert!(matches!(err, BlendParseError::CompressedFileNotSupported));
    }

    #[test]
    fn iterates_blocks_until_endb() {
        let mut data = file_header(b'-', b'v');
        let (_, header) = header(&data.clone()).unwrap();
        data.extend_from_slice(&raw_block(b"REND", &[1, 2, 3], &header));
        data.extend_from_slice(&raw_block(b"GLOB", &[], &header));
        data.extend_from_slice(b"ENDB");

        let (_, blocks) = blocks(&data).unwrap();
        let blocks: Vec<_> = blocks.map(|b| b.unwrap()).collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(&blocks[0].code, b"REND");
        assert_eq!(blocks[0].data, &[1, 2, 3]);
        assert_eq!(&blocks[1].code, b"GLOB");
        assert!(blocks[1].data.is_empty());
    }

    #[test]
    fn truncated_block_yields_an_error() {
        let mut data = file_header(b'-', b'v');
        data.extend_from_slice(b"GLOB");
        // Length claims 100 bytes, nothing follows.
        data.extend_from_slice(&100i32.to_le_bytes());

        let (_, mut blocks) = blocks(&data).unwrap();
        let first = blocks.next().unwrap();
        assert!(matches!(first, Err(BlendParseError::NotEnoughData)));
        assert!(blocks.next().is_none());
    }

    #[test]
    fn negative_block_length_is_rejected() {
        let mut data = file_header(b'-', b'v');
        data.extend_from_slice(b"GLOB");
        data.extend_from_slice(&(-1i32).to_le_bytes());
        data.extend_from_slice(&[0; 16]);
        data.extend_from_slice(b"ENDB");

        let (_, mut blocks) = blocks(&data).unwrap();
        assert!(matches!(
            blocks.next().unwrap(),
            Err(BlendParseError::NotEnoughData)
        ));
    }
}
