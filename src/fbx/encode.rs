//! Binary FBX writer.
//!
//! Serialization happens in three passes: properties are flattened to bytes
//! first (compressing arrays, so every length is known), then absolute end
//! offsets are computed for the whole tree, then everything is streamed out.
//! Output is deterministic for a given tree and version.

use super::{
    tree::{FbxElem, FbxProp},
    FbxError, FBX_VERSION_WIDE,
};
use libflate::zlib::Encoder;
use std::convert::TryFrom;
use std::io::Write;

pub const HEAD_MAGIC: &[u8] = b"Kaydara FBX Binary\x20\x20\x00\x1a\x00";

pub const FOOT_ID: [u8; 16] = [
    0xfa, 0xbc, 0xab, 0x09, 0xd0, 0xc8, 0xd4, 0x66, 0xb1, 0x76, 0xfb, 0x83, 0x1c, 0xf7, 0x26, 0x7e,
];

pub const FOOT_MAGIC: [u8; 16] = [
    0xf8, 0x5a, 0x8c, 0x6a, 0xde, 0xf5, 0xd9, 0x7e, 0xec, 0xe9, 0x0c, 0xe3, 0x75, 0x8f, 0x29, 0x0b,
];

/// Arrays whose raw form is larger than this are zlib-compressed, matching
/// the behavior of the official converter.
const COMPRESS_THRESHOLD: usize = 128;

/// Record header layout: three u32 fields and a 13-byte sentinel below
/// version 7500, three u64 fields and a 25-byte sentinel from 7500 on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub wide: bool,
}

impl Layout {
    pub fn for_version(version: u32) -> Layout {
        Layout {
            wide: version >= FBX_VERSION_WIDE,
        }
    }

    pub fn field_len(self) -> u64 {
        if self.wide {
            8
        } else {
            4
        }
    }

    pub fn sentinel_len(self) -> u64 {
        // The sentinel is an all-zero record header: 3 fields + the name
        // length byte.
        self.field_len() * 3 + 1
    }
}

struct EncElem {
    name: Vec<u8>,
    prop_count: u64,
    props: Vec<u8>,
    children: Vec<EncElem>,
    end_offset: u64,
}

/// Writes `root`'s children (the root itself is the unnamed pseudo-element)
/// as a complete binary FBX file, footer included.
pub fn write<W: Write>(mut writer: W, root: &FbxElem, version: u32) -> Result<(), FbxError> {
    let layout = Layout::for_version(version);
    let mut enc = prepare(root)?;

    writer.write_all(HEAD_MAGIC)?;
    writer.write_all(&version.to_le_bytes())?;

    let start = (HEAD_MAGIC.len() + 4) as u64;
    let end = calc_offsets_children(&mut enc, start, false, layout);
    if !layout.wide && u32::try_from(end).is_err() {
        return Err(FbxError::Oversize);
    }

    write_children(&mut writer, &enc, layout, false)?;

    writer.write_all(&FOOT_ID)?;
    writer.write_all(&[0u8; 4])?;

    // Zero padding to the next 16-byte boundary; a full 16 bytes when
    // already aligned.
    let pos = end + 16 + 4;
    let mut pad = (pos.wrapping_add(15) & !15) - pos;
    if pad == 0 {
        pad = 16;
    }
    writer.write_all(&vec![0u8; pad as usize])?;

    writer.write_all(&version.to_le_bytes())?;
    writer.write_all(&[0u8; 120])?;
    writer.write_all(&FOOT_MAGIC)?;
    writer.flush()?;

    Ok(())
}

fn prepare(elem: &FbxElem) -> Result<EncElem, FbxError> {
    if elem.name.len() > u8::max_value() as usize {
        return Err(FbxError::Malformed(format!(
            "element name is {} bytes, the limit is 255",
            elem.name.len()
        )));
    }

    let mut props = Vec::new();
    for prop in &elem.props {
        push_prop(&mut props, prop)?;
    }

    let children = elem
        .children
        .iter()
        .map(prepare)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EncElem {
        name: elem.name.clone(),
        prop_count: elem.props.len() as u64,
        props,
        children,
        end_offset: 0,
    })
}

fn calc_offsets(elem: &mut EncElem, mut offset: u64, is_last: bool, layout: Layout) -> u64 {
    offset += layout.field_len() * 3;
    offset += 1 + elem.name.len() as u64;
    offset += elem.props.len() as u64;
    offset = calc_offsets_children(elem, offset, is_last, layout);
    elem.end_offset = offset;
    offset
}

fn calc_offsets_children(elem: &mut EncElem, mut offset: u64, is_last: bool, layout: Layout) -> u64 {
    if !elem.children.is_empty() {
        let last = elem.children.len() - 1;
        for (i, child) in elem.children.iter_mut().enumerate() {
            offset = calc_offsets(child, offset, i == last, layout);
        }
        offset += layout.sentinel_len();
    } else if elem.props.is_empty() && !is_last {
        offset += layout.sentinel_len();
    }
    offset
}

fn write_field<W: Write>(writer: &mut W, layout: Layout, value: u64) -> Result<(), FbxError> {
    if layout.wide {
        writer.write_all(&value.to_le_bytes())?;
    } else {
        let value = u32::try_from(value).map_err(|_| FbxError::Oversize)?;
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

fn write_elem<W: Write>(
    writer: &mut W,
    elem: &EncElem,
    layout: Layout,
    is_last: bool,
) -> Result<(), FbxError> {
    write_field(writer, layout, elem.end_offset)?;
    write_field(writer, layout, elem.prop_count)?;
    write_field(writer, layout, elem.props.len() as u64)?;
    writer.write_all(&[elem.name.len() as u8])?;
    writer.write_all(&elem.name)?;
    writer.write_all(&elem.props)?;
    write_children(writer, elem, layout, is_last)
}

fn write_children<W: Write>(
    writer: &mut W,
    elem: &EncElem,
    layout: Layout,
    is_last: bool,
) -> Result<(), FbxError> {
    let sentinel = vec![0u8; layout.sentinel_len() as usize];

    if !elem.children.is_empty() {
        let last = elem.children.len() - 1;
        for (i, child) in elem.children.iter().enumerate() {
            write_elem(writer, child, layout, i == last)?;
        }
        writer.write_all(&sentinel)?;
    } else if elem.props.is_empty() && !is_last {
        writer.write_all(&sentinel)?;
    }

    Ok(())
}

fn push_prop(out: &mut Vec<u8>, prop: &FbxProp) -> Result<(), FbxError> {
    out.push(prop.type_code());

    match prop {
        FbxProp::Bool(v) => out.push(*v as u8),
        FbxProp::Int8(v) => out.extend_from_slice(&v.to_le_bytes()),
        FbxProp::Int16(v) => out.extend_from_slice(&v.to_le_bytes()),
        FbxProp::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
        FbxProp::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
        FbxProp::Float32(v) => out.extend_from_slice(&v.to_le_bytes()),
        FbxProp::Float64(v) => out.extend_from_slice(&v.to_le_bytes()),
        FbxProp::Bytes(data) | FbxProp::String(data) => {
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(data);
        }
        FbxProp::BoolArray(values) => {
            let raw: Vec<u8> = values.iter().map(|&v| v as u8).collect();
            push_array(out, values.len(), raw)?;
        }
        FbxProp::ByteArray(values) => push_array(out, values.len(), values.clone())?,
        FbxProp::Int32Array(values) => {
            let raw = values.iter().flat_map(|v| v.to_le_bytes().to_vec()).collect();
            push_array(out, values.len(), raw)?;
        }
        FbxProp::Int64Array(values) => {
            let raw = values.iter().flat_map(|v| v.to_le_bytes().to_vec()).collect();
            push_array(out, values.len(), raw)?;
        }
        FbxProp::Float32Array(values) => {
            let raw = values.iter().flat_map(|v| v.to_le_bytes().to_vec()).collect();
            push_array(out, values.len(), raw)?;
        }
        FbxProp::Float64Array(values) => {
            let raw = values.iter().flat_map(|v| v.to_le_bytes().to_vec()).collect();
            push_array(out, values.len(), raw)?;
        }
    }

    Ok(())
}

fn push_array(out: &mut Vec<u8>, count: usize, raw: Vec<u8>) -> Result<(), FbxError> {
    let (encoding, data) = if raw.len() <= COMPRESS_THRESHOLD {
        (0u32, raw)
    } else {
        let mut encoder = Encoder::new(Vec::new())?;
        encoder.write_all(&raw)?;
        (1u32, encoder.finish().into_result()?)
    };

    out.extend_from_slice(&(count as u32).to_le_bytes());
    out.extend_from_slice(&encoding.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&data);

    Ok(())
}
