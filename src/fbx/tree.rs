//! The element tree both converter directions share.

/// One element of an FBX document: a name, its properties in order, and its
/// child elements in order. The document root is a pseudo-element with an
/// empty name whose own properties are never serialized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FbxElem {
    pub name: Vec<u8>,
    pub props: Vec<FbxProp>,
    pub children: Vec<FbxElem>,
}

/// A single property value. The discriminant maps 1:1 to the wire type code
/// (see the module table); arrays keep their element type.
#[derive(Debug, Clone, PartialEq)]
pub enum FbxProp {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bytes(Vec<u8>),
    String(Vec<u8>),
    BoolArray(Vec<bool>),
    ByteArray(Vec<u8>),
    Int32Array(Vec<i32>),
    Int64Array(Vec<i64>),
    Float32Array(Vec<f32>),
    Float64Array(Vec<f64>),
}

impl FbxProp {
    /// The type code this property serializes under.
    pub fn type_code(&self) -> u8 {
        match self {
            FbxProp::Bool(_) => b'C',
            FbxProp::Int8(_) => b'Z',
            FbxProp::Int16(_) => b'Y',
            FbxProp::Int32(_) => b'I',
            FbxProp::Int64(_) => b'L',
            FbxProp::Float32(_) => b'F',
            FbxProp::Float64(_) => b'D',
            FbxProp::Bytes(_) => b'R',
            FbxProp::String(_) => b'S',
            FbxProp::BoolArray(_) => b'b',
            FbxProp::ByteArray(_) => b'c',
            FbxProp::Int32Array(_) => b'i',
            FbxProp::Int64Array(_) => b'l',
            FbxProp::Float32Array(_) => b'f',
            FbxProp::Float64Array(_) => b'd',
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            FbxProp::BoolArray(_)
                | FbxProp::ByteArray(_)
                | FbxProp::Int32Array(_)
                | FbxProp::Int64Array(_)
                | FbxProp::Float32Array(_)
                | FbxProp::Float64Array(_)
        )
    }
}

impl FbxElem {
    pub fn new(name: impl Into<Vec<u8>>) -> Self {
        FbxElem {
            name: name.into(),
            props: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: FbxElem) {
        self.children.push(child);
    }

    pub fn add_bool(&mut self, value: bool) {
        self.props.push(FbxProp::Bool(value));
    }

    pub fn add_int8(&mut self, value: i8) {
        self.props.push(FbxProp::Int8(value));
    }

    pub fn add_int16(&mut self, value: i16) {
        self.props.push(FbxProp::Int16(value));
    }

    pub fn add_int32(&mut self, value: i32) {
        self.props.push(FbxProp::Int32(value));
    }

    pub fn add_int64(&mut self, value: i64) {
        self.props.push(FbxProp::Int64(value));
    }

    pub fn add_float32(&mut self, value: f32) {
        self.props.push(FbxProp::Float32(value));
    }

    pub fn add_float64(&mut self, value: f64) {
        self.props.push(FbxProp::Float64(value));
    }

    pub fn add_bytes(&mut self, value: impl Into<Vec<u8>>) {
        self.props.push(FbxProp::Bytes(value.into()));
    }

    pub fn add_string(&mut self, value: impl Into<Vec<u8>>) {
        self.props.push(FbxProp::String(value.into()));
    }

    pub fn add_bool_array(&mut self, value: Vec<bool>) {
        self.props.push(FbxProp::BoolArray(value));
    }

    pub fn add_byte_array(&mut self, value: Vec<u8>) {
        self.props.push(FbxProp::ByteArray(value));
    }

    pub fn add_int32_array(&mut self, value: Vec<i32>) {
        self.props.push(FbxProp::Int32Array(value));
    }

    pub fn add_int64_array(&mut self, value: Vec<i64>) {
        self.props.push(FbxProp::Int64Array(value));
    }

    pub fn add_float32_array(&mut self, value: Vec<f32>) {
        self.props.push(FbxProp::Float32Array(value));
    }

    pub fn add_float64_array(&mut self, value: Vec<f64>) {
        self.props.push(FbxProp::Float64Array(value));
    }
}
