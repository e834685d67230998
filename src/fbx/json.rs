//! The JSON intermediate form of an FBX document.
//!
//! A document is `[version, [element, ...]]`; each element is the 4-tuple
//! `[name, values, type_codes, children]`. Two conventions keep the output
//! readable: `S` strings render FBX's `\x00\x01` name/class separator as
//! `"::"`, and `R` byte properties are base64.

use super::{
    tree::{FbxElem, FbxProp},
    FbxError, FBX_VERSION_DEFAULT,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::convert::TryFrom;

/// Reads a JSON document into the pseudo-root element and the version. A
/// bare element array (no version wrapper) is accepted too and gets
/// [`FBX_VERSION_DEFAULT`].
pub fn parse_json(doc: &Value) -> Result<(FbxElem, u32), FbxError> {
    let items = doc
        .as_array()
        .ok_or_else(|| shape("document must be a json array"))?;

    let (version, elements) = match (items.get(0), items.get(1)) {
        (Some(version), Some(Value::Array(elements))) if items.len() == 2 && version.is_u64() => {
            let version = version.as_u64().and_then(|v| u32::try_from(v).ok());
            (
                version.ok_or_else(|| shape("version does not fit in u32"))?,
                elements.as_slice(),
            )
        }
        _ => (FBX_VERSION_DEFAULT, items.as_slice()),
    };

    let mut root = FbxElem::default();
    for element in elements {
        root.children.push(elem_from_json(element)?);
    }

    Ok((root, version))
}

pub fn elem_from_json(value: &Value) -> Result<FbxElem, FbxError> {
    let tuple = value
        .as_array()
        .filter(|t| t.len() == 4)
        .ok_or_else(|| shape("element must be a 4-tuple [name, values, types, children]"))?;

    let name = tuple[0]
        .as_str()
        .ok_or_else(|| shape("element name must be a string"))?;
    let values = tuple[1]
        .as_array()
        .ok_or_else(|| shape("element values must be an array"))?;
    let codes = tuple[2]
        .as_str()
        .ok_or_else(|| shape("element type codes must be a string"))?;
    let children = tuple[3]
        .as_array()
        .ok_or_else(|| shape("element children must be an array"))?;

    if !codes.is_ascii() || codes.len() != values.len() {
        return Err(shape("one type code per value is required"));
    }

    let mut elem = FbxElem::new(name.as_bytes().to_vec());
    for (value, code) in values.iter().zip(codes.bytes()) {
        elem.props.push(prop_from_json(value, code)?);
    }
    for child in children {
        elem.children.push(elem_from_json(child)?);
    }

    Ok(elem)
}

fn prop_from_json(value: &Value, code: u8) -> Result<FbxProp, FbxError> {
    let prop = match code {
        b'C' | b'B' => FbxProp::Bool(
            value
                .as_bool()
                .ok_or_else(|| shape("`C` expects a bool"))?,
        ),
        b'Z' => FbxProp::Int8(int_in_range(value, code)? as i8),
        b'Y' => FbxProp::Int16(int_in_range(value, code)? as i16),
        b'I' => FbxProp::Int32(int_in_range(value, code)? as i32),
        b'L' => FbxProp::Int64(
            value
                .as_i64()
                .ok_or_else(|| shape("`L` expects an integer"))?,
        ),
        b'F' => FbxProp::Float32(
            value
                .as_f64()
                .ok_or_else(|| shape("`F` expects a number"))? as f32,
        ),
        b'D' => FbxProp::Float64(
            value
                .as_f64()
                .ok_or_else(|| shape("`D` expects a number"))?,
        ),
        b'R' => {
            let encoded = value
                .as_str()
                .ok_or_else(|| shape("`R` expects a base64 string"))?;
            FbxProp::Bytes(general_purpose::STANDARD.decode(encoded)?)
        }
        b'S' => {
            let string = value
                .as_str()
                .ok_or_else(|| shape("`S` expects a string"))?;
            FbxProp::String(unescape_name_class(string))
        }
        b'b' => FbxProp::BoolArray(
            array_items(value, code)?
                .iter()
                .map(|v| v.as_bool().ok_or_else(|| shape("`b` expects bools")))
                .collect::<Result<_, _>>()?,
        ),
        b'c' => FbxProp::ByteArray(
            array_items(value, code)?
                .iter()
                .map(|v| {
                    v.as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| shape("`c` expects bytes"))
                })
                .collect::<Result<_, _>>()?,
        ),
        b'i' => FbxProp::Int32Array(
            array_items(value, code)?
                .iter()
                .map(|v| int_in_range(v, b'I').map(|n| n as i32))
                .collect::<Result<_, _>>()?,
        ),
        b'l' => FbxProp::Int64Array(
            array_items(value, code)?
                .iter()
                .map(|v| v.as_i64().ok_or_else(|| shape("`l` expects integers")))
                .collect::<Result<_, _>>()?,
        ),
        b'f' => FbxProp::Float32Array(
            array_items(value, code)?
                .iter()
                .map(|v| {
                    v.as_f64()
                        .map(|n| n as f32)
                        .ok_or_else(|| shape("`f` expects numbers"))
                })
                .collect::<Result<_, _>>()?,
        ),
        b'd' => FbxProp::Float64Array(
            array_items(value, code)?
                .iter()
                .map(|v| v.as_f64().ok_or_else(|| shape("`d` expects numbers")))
                .collect::<Result<_, _>>()?,
        ),
        other => return Err(FbxError::UnknownTypeCode(other)),
    };

    Ok(prop)
}

/// Serializes a document: `[version, [children of the pseudo-root]]`.
pub fn doc_to_json(root: &FbxElem, version: u32) -> Value {
    json!([
        version,
        root.children.iter().map(elem_to_json).collect::<Vec<_>>()
    ])
}

pub fn elem_to_json(elem: &FbxElem) -> Value {
    let mut codes = String::with_capacity(elem.props.len());
    let mut values = Vec::with_capacity(elem.props.len());
    for prop in &elem.props {
        codes.push(prop.type_code() as char);
        values.push(prop_to_json(prop));
    }

    json!([
        String::from_utf8_lossy(&elem.name),
        values,
        codes,
        elem.children.iter().map(elem_to_json).collect::<Vec<_>>()
    ])
}

fn prop_to_json(prop: &FbxProp) -> Value {
    match prop {
        FbxProp::Bool(v) => json!(v),
        FbxProp::Int8(v) => json!(v),
        FbxProp::Int16(v) => json!(v),
        FbxProp::Int32(v) => json!(v),
        FbxProp::Int64(v) => json!(v),
        FbxProp::Float32(v) => json!(v),
        FbxProp::Float64(v) => json!(v),
        FbxProp::Bytes(data) => json!(general_purpose::STANDARD.encode(data)),
        FbxProp::String(data) => {
            json!(String::from_utf8_lossy(&escape_name_class(data)).into_owned())
        }
        FbxProp::BoolArray(values) => json!(values),
        FbxProp::ByteArray(values) => json!(values),
        FbxProp::Int32Array(values) => json!(values),
        FbxProp::Int64Array(values) => json!(values),
        FbxProp::Float32Array(values) => json!(values),
        FbxProp::Float64Array(values) => json!(values),
    }
}

fn int_in_range(value: &Value, code: u8) -> Result<i64, FbxError> {
    let (min, max) = match code {
        b'Z' => (i64::from(i8::min_value()), i64::from(i8::max_value())),
        b'Y' => (i64::from(i16::min_value()), i64::from(i16::max_value())),
        _ => (i64::from(i32::min_value()), i64::from(i32::max_value())),
    };
    match value.as_i64() {
        Some(n) if n >= min && n <= max => Ok(n),
        _ => Err(FbxError::Malformed(format!(
            "`{}` expects an integer between {} and {}",
            code as char, min, max
        ))),
    }
}

fn array_items<'a>(value: &'a Value, code: u8) -> Result<&'a Vec<Value>, FbxError> {
    value.as_array().ok_or_else(|| {
        FbxError::Malformed(format!("`{}` expects a json array", code as char))
    })
}

/// `\x00\x01` separates the name and class parts of FBX object names; the
/// JSON form shows it as `"::"`.
fn escape_name_class(data: &[u8]) -> Vec<u8> {
    replace(data, &[0x00, 0x01], b"::")
}

fn unescape_name_class(string: &str) -> Vec<u8> {
    replace(string.as_bytes(), b"::", &[0x00, 0x01])
}

fn replace(data: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

fn shape(msg: &str) -> FbxError {
    FbxError::Malformed(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_versioned_document() {
        let doc = json!([7500, [["Objects", [], "", []]]]);
        let (root, version) = parse_json(&doc).unwrap();
        assert_eq!(version, 7500);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, b"Objects".to_vec());
    }

    #[test]
    fn bare_element_array_defaults_the_version() {
        let doc = json!([["Objects", [], "", []]]);
        let (root, version) = parse_json(&doc).unwrap();
        assert_eq!(version, FBX_VERSION_DEFAULT);
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn maps_scalar_values() {
        let doc = json!([["P", [true, -3, 7, 70000, "AAEC", 1.5], "CZYIRD", []]]);
        let (root, _) = parse_json(&doc).unwrap();
        assert_eq!(
            root.children[0].props,
            vec![
                FbxProp::Bool(true),
                FbxProp::Int8(-3),
                FbxProp::Int16(7),
                FbxProp::Int32(70000),
                FbxProp::Bytes(vec![0, 1, 2]),
                FbxProp::Float64(1.5),
            ]
        );
    }

    #[test]
    fn name_class_separator_round_trips() {
        let doc = json!([["Model", ["Model::Cube"], "S", []]]);
        let (root, _) = parse_json(&doc).unwrap();
        assert_eq!(
            root.children[0].props,
            vec![FbxProp::String(b"Model\x00\x01Cube".to_vec())]
        );

        let back = doc_to_json(&root, FBX_VERSION_DEFAULT);
        assert_eq!(back[1][0][1][0], json!("Model::Cube"));
    }

    #[test]
    fn arrays_round_trip() {
        let doc = json!([["A", [[1, 2, 3], [true, false], [0.5]], "ibd", []]]);
        let (root, _) = parse_json(&doc).unwrap();
        assert_eq!(
            root.children[0].props,
            vec![
                FbxProp::Int32Array(vec![1, 2, 3]),
                FbxProp::BoolArray(vec![true, false]),
                FbxProp::Float64Array(vec![0.5]),
            ]
        );

        let back = doc_to_json(&root, 7400);
        let (again, _) = parse_json(&back).unwrap();
        assert_eq!(root, again);
    }

    #[test]
    fn rejects_mismatched_code_count() {
        let doc = json!([["A", [1, 2], "I", []]]);
        assert!(matches!(
            parse_json(&doc).unwrap_err(),
            FbxError::Malformed(_)
        ));
    }

    #[test]
    fn rejects_out_of_range_integers() {
        let doc = json!([["A", [300], "Z", []]]);
        assert!(matches!(
            parse_json(&doc).unwrap_err(),
            FbxError::Malformed(_)
        ));
    }

    #[test]
    fn rejects_bad_base64() {
        let doc = json!([["A", ["не base64"], "R", []]]);
        assert!(matches!(
            parse_json(&doc).unwrap_err(),
            FbxError::Base64(_)
        ));
    }

    #[test]
    fn accepts_b_as_bool_alias() {
        let doc = json!([["A", [false], "B", []]]);
        let (root, _) = parse_json(&doc).unwrap();
        assert_eq!(root.children[0].props, vec![FbxProp::Bool(false)]);
    }
}
