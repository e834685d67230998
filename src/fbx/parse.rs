//! Binary FBX reader.
//!
//! FBX records carry absolute end offsets, so parsing walks the input with a
//! plain position cursor and validates every record against the offset it
//! claims. The result is the same [`FbxElem`] tree the encoder consumes.

use super::{
    encode::{Layout, HEAD_MAGIC},
    tree::{FbxElem, FbxProp},
    FbxError,
};
use libflate::zlib::Decoder;
use std::io::Read;

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], FbxError> {
        if self.data.len() - self.pos < len {
            return Err(FbxError::Truncated);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn peek_zeros(&self, len: usize) -> bool {
        self.data.len() - self.pos >= len
            && self.data[self.pos..self.pos + len].iter().all(|&b| b == 0)
    }

    fn u8(&mut self) -> Result<u8, FbxError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, FbxError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, FbxError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// One record header field: u32 below version 7500, u64 from it on.
    fn field(&mut self, layout: Layout) -> Result<u64, FbxError> {
        if layout.wide {
            self.u64()
        } else {
            self.u32().map(u64::from)
        }
    }
}

/// Parses a binary FBX file into its unnamed pseudo-root element and the
/// format version. Footer bytes after the root-level sentinel are ignored.
pub fn from_slice(data: &[u8]) -> Result<(FbxElem, u32), FbxError> {
    if !data.starts_with(HEAD_MAGIC) {
        return Err(FbxError::NotAnFbxFile);
    }

    let mut reader = Reader {
        data,
        pos: HEAD_MAGIC.len(),
    };
    let version = reader.u32()?;
    let layout = Layout::for_version(version);
    let sentinel = layout.sentinel_len() as usize;

    let mut root = FbxElem::default();
    loop {
        if reader.peek_zeros(sentinel) {
            break;
        }
        if reader.data.len() - reader.pos < sentinel {
            return Err(FbxError::Truncated);
        }
        root.children.push(read_elem(&mut reader, layout)?);
    }

    Ok((root, version))
}

fn read_elem(reader: &mut Reader, layout: Layout) -> Result<FbxElem, FbxError> {
    let end_offset = reader.field(layout)?;
    let prop_count = reader.field(layout)?;
    let prop_list_len = reader.field(layout)?;
    let name_len = reader.u8()? as usize;
    let name = reader.take(name_len)?.to_vec();

    if end_offset > reader.data.len() as u64 {
        return Err(FbxError::Malformed(format!(
            "element `{}` claims to end at {} in a {}-byte file",
            String::from_utf8_lossy(&name),
            end_offset,
            reader.data.len()
        )));
    }
    let end_offset = end_offset as usize;

    let props_start = reader.pos;
    let mut props = Vec::with_capacity(prop_count as usize);
    for _ in 0..prop_count {
        props.push(read_prop(reader)?);
    }
    if (reader.pos - props_start) as u64 != prop_list_len {
        return Err(FbxError::Malformed(format!(
            "property list of `{}` is {} bytes, header says {}",
            String::from_utf8_lossy(&name),
            reader.pos - props_start,
            prop_list_len
        )));
    }

    let sentinel = layout.sentinel_len() as usize;
    let mut children = Vec::new();
    while reader.pos < end_offset {
        if end_offset - reader.pos == sentinel {
            if !reader.peek_zeros(sentinel) {
                return Err(FbxError::Malformed(format!(
                    "missing sentinel at the end of `{}`",
                    String::from_utf8_lossy(&name)
                )));
            }
            reader.take(sentinel)?;
            break;
        }
        children.push(read_elem(reader, layout)?);
    }

    if reader.pos != end_offset {
        return Err(FbxError::Malformed(format!(
            "element `{}` ended at {} instead of {}",
            String::from_utf8_lossy(&name),
            reader.pos,
            end_offset
        )));
    }

    Ok(FbxElem {
        name,
        props,
        children,
    })
}

fn read_prop(reader: &mut Reader) -> Result<FbxProp, FbxError> {
    let code = reader.u8()?;

    let prop = match code {
        // `B` is the bool tag written by newer FBX exporters.
        b'C' | b'B' => FbxProp::Bool(reader.u8()? != 0),
        b'Z' => FbxProp::Int8(reader.u8()? as i8),
        b'Y' => {
            let b = reader.take(2)?;
            FbxProp::Int16(i16::from_le_bytes([b[0], b[1]]))
        }
        b'I' => FbxProp::Int32(reader.u32()? as i32),
        b'L' => FbxProp::Int64(reader.u64()? as i64),
        b'F' => FbxProp::Float32(f32::from_bits(reader.u32()?)),
        b'D' => FbxProp::Float64(f64::from_bits(reader.u64()?)),
        b'R' => {
            let len = reader.u32()? as usize;
            FbxProp::Bytes(reader.take(len)?.to_vec())
        }
        b'S' => {
            let len = reader.u32()? as usize;
            FbxProp::String(reader.take(len)?.to_vec())
        }
        b'b' => {
            let raw = read_array(reader, 1)?;
            FbxProp::BoolArray(raw.iter().map(|&b| b != 0).collect())
        }
        b'c' => FbxProp::ByteArray(read_array(reader, 1)?),
        b'i' => {
            let raw = read_array(reader, 4)?;
            FbxProp::Int32Array(
                raw.chunks_exact(4)
                    .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            )
        }
        b'l' => {
            let raw = read_array(reader, 8)?;
            FbxProp::Int64Array(
                raw.chunks_exact(8)
                    .map(|c| {
                        i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
                    })
                    .collect(),
            )
        }
        b'f' => {
            let raw = read_array(reader, 4)?;
            FbxProp::Float32Array(
                raw.chunks_exact(4)
                    .map(|c| f32::from_bits(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
                    .collect(),
            )
        }
        b'd' => {
            let raw = read_array(reader, 8)?;
            FbxProp::Float64Array(
                raw.chunks_exact(8)
                    .map(|c| {
                        f64::from_bits(u64::from_le_bytes([
                            c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7],
                        ]))
                    })
                    .collect(),
            )
        }
        other => return Err(FbxError::UnknownTypeCode(other)),
    };

    Ok(prop)
}

/// Reads an array property's payload and returns the raw element bytes,
/// inflating encoding 1 (zlib) and checking the byte count either way.
fn read_array(reader: &mut Reader, elem_size: usize) -> Result<Vec<u8>, FbxError> {
    let count = reader.u32()? as usize;
    let encoding = reader.u32()?;
    let comp_len = reader.u32()? as usize;
    let data = reader.take(comp_len)?;

    let raw = match encoding {
        0 => data.to_vec(),
        1 => {
            let mut decoder = Decoder::new(data)?;
            let mut raw = Vec::new();
            decoder.read_to_end(&mut raw)?;
            raw
        }
        other => {
            return Err(FbxError::Malformed(format!(
                "unknown array encoding {}",
                other
            )))
        }
    };

    let expected = count
        .checked_mul(elem_size)
        .ok_or_else(|| FbxError::Malformed("array count overflows".into()))?;
    if raw.len() != expected {
        return Err(FbxError::Malformed(format!(
            "array holds {} bytes, expected {} for {} elements",
            raw.len(),
            expected,
            count
        )));
    }

    Ok(raw)
}
