use blendkit::fbx::{self, encode, json, parse, FbxElem, FbxProp};
use serde_json::json;

/// A small but representative document: scalars, strings with the
/// name/class separator, raw bytes, and arrays on both sides of the
/// compression threshold.
fn sample_tree() -> FbxElem {
    let mut root = FbxElem::default();

    let mut header = FbxElem::new(&b"FBXHeaderExtension"[..]);
    let mut version = FbxElem::new(&b"FBXVersion"[..]);
    version.add_int32(7400);
    header.add_child(version);
    root.add_child(header);

    let mut objects = FbxElem::new(&b"Objects"[..]);
    let mut geometry = FbxElem::new(&b"Geometry"[..]);
    geometry.add_int64(140_737_488_355_328);
    geometry.add_string(b"Geometry\x00\x01Cube".to_vec());
    geometry.add_bool(true);
    geometry.add_int8(-1);
    geometry.add_int16(300);
    geometry.add_float32(0.25);
    geometry.add_float64(-1.5);
    geometry.add_bytes(vec![0xde, 0xad, 0xbe, 0xef]);

    let mut vertices = FbxElem::new(&b"Vertices"[..]);
    // 24 doubles: 192 raw bytes, well past the compression threshold.
    vertices.add_float64_array((0..24).map(f64::from).collect());
    geometry.add_child(vertices);

    let mut indices = FbxElem::new(&b"PolygonVertexIndex"[..]);
    indices.add_int32_array(vec![0, 1, 2, -4]); // 16 raw bytes, stays raw
    geometry.add_child(indices);

    let mut edges = FbxElem::new(&b"Edges"[..]);
    edges.add_bool_array(vec![true, false, true]);
    edges.add_byte_array(vec![1, 2, 3]);
    edges.add_int64_array(vec![1 << 40, -5]);
    edges.add_float32_array(vec![0.5; 40]); // 160 raw bytes, compressed
    geometry.add_child(edges);

    objects.add_child(geometry);
    root.add_child(objects);

    // A childless, property-less marker element between siblings.
    root.add_child(FbxElem::new(&b"Takes"[..]));
    let mut settings = FbxElem::new(&b"GlobalSettings"[..]);
    settings.add_int32(1000);
    root.add_child(settings);

    root
}

#[test]
fn binary_round_trip_preserves_the_tree() {
    for &version in &[7400u32, 7500] {
        let tree = sample_tree();
        let mut data = Vec::new();
        encode::write(&mut data, &tree, version).unwrap();

        let (parsed, parsed_version) = parse::from_slice(&data).unwrap();
        assert_eq!(parsed_version, version);
        assert_eq!(parsed, tree, "version {}", version);
    }
}

#[test]
fn json_round_trip_preserves_the_tree() {
    let tree = sample_tree();
    let doc = json::doc_to_json(&tree, 7400);
    let (parsed, version) = json::parse_json(&doc).unwrap();
    assert_eq!(version, 7400);
    assert_eq!(parsed, tree);
}

#[test]
fn json_document_converts_to_valid_binary() {
    let doc = json!([
        7400,
        [
            [
                "Creator",
                ["Made with blendkit"],
                "S",
                []
            ],
            [
                "Objects",
                [],
                "",
                [["Model", [10_000_000, "Model::Cube"], "LS", []]]
            ]
        ]
    ]);

    let (root, version) = json::parse_json(&doc).unwrap();
    let mut data = Vec::new();
    encode::write(&mut data, &root, version).unwrap();

    assert_eq!(&data[..encode::HEAD_MAGIC.len()], encode::HEAD_MAGIC);
    let (parsed, _) = parse::from_slice(&data).unwrap();
    assert_eq!(parsed.children.len(), 2);
    assert_eq!(parsed.children[0].name, b"Creator".to_vec());
    assert_eq!(
        parsed.children[1].children[0].props,
        vec![
            FbxProp::Int64(10_000_000),
            FbxProp::String(b"Model\x00\x01Cube".to_vec()),
        ]
    );
}

#[test]
fn binary_converts_back_to_the_expected_json() {
    let mut root = FbxElem::default();
    let mut model = FbxElem::new(&b"Model"[..]);
    model.add_string(b"Model\x00\x01Cube".to_vec());
    model.add_bytes(vec![0, 1, 2]);
    root.add_child(model);

    let mut data = Vec::new();
    encode::write(&mut data, &root, 7400).unwrap();
    let (parsed, version) = parse::from_slice(&data).unwrap();
    let doc = json::doc_to_json(&parsed, version);

    assert_eq!(
        doc,
        json!([7400, [["Model", ["Model::Cube", "AAEC"], "SR", []]]])
    );
}

#[test]
fn default_version_is_7400() {
    assert_eq!(fbx::FBX_VERSION_DEFAULT, 7400);
    let (_, version) = json::parse_json(&json!([["A", [], "", []]])).unwrap();
    assert_eq!(version, 7400);
}
