use lcsc2kicad::file_writer::KicadLibrary;
use lcsc2kicad::kicad_models::{
    FpPad, FpShape, KiPinStyle, KiPinType, KiSymbol, KiSymbolInfo, KiSymbolPin, KiSymbolRectangle,
    KiFootprint,
};
use std::fs;

fn test_symbol(name: &str) -> KiSymbol {
    KiSymbol {
        info: KiSymbolInfo {
            name: name.to_string(),
            prefix: "R".to_string(),
            package: "R0805".to_string(),
            datasheet: "https://example.com/ds.pdf".to_string(),
            lcsc_id: "C1234".to_string(),
            ..KiSymbolInfo::default()
        },
        pins: vec![
            KiSymbolPin {
                name: "1".to_string(),
                number: "1".to_string(),
                style: KiPinStyle::Line,
                pin_type: KiPinType::Passive,
                length: 2.54,
                pos_x: -5.08,
                pos_y: 0.0,
                orientation: 0,
            },
            KiSymbolPin {
                name: "2".to_string(),
                number: "2".to_string(),
                style: KiPinStyle::Line,
                pin_type: KiPinType::Passive,
                length: 2.54,
                pos_x: 5.08,
                pos_y: 0.0,
                orientation: 180,
            },
        ],
        rectangles: vec![KiSymbolRectangle {
            start: (-2.54, 1.27),
            end: (2.54, -1.27),
            filled: true,
        }],
        ..KiSymbol::default()
    }
}

fn test_footprint(name: &str) -> KiFootprint {
    KiFootprint {
        name: name.to_string(),
        is_smd: true,
        pads: vec![FpPad {
            number: "1".to_string(),
            pad_type: "smd".to_string(),
            shape: FpShape::Rect,
            pos: (0.0, 0.0),
            size: (1.2, 0.6),
            layers: vec![
                "F.Cu".to_string(),
                "F.Paste".to_string(),
                "F.Mask".to_string(),
            ],
            rotation: 0.0,
            drill: None,
            drill_oval: None,
            polygon: Vec::new(),
        }],
        ..KiFootprint::default()
    }
}

fn record_count(content: &str, name: &str) -> usize {
    content.matches(&format!("(symbol \"{}\"", name)).count()
}

#[test]
fn test_setup_creates_library_structure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = KicadLibrary::new(dir.path());
    library.setup_directories().expect("setup");

    assert!(library.footprint_dir().is_dir());
    assert!(library.model_dir().is_dir());
    let envelope = fs::read_to_string(library.symbol_lib_path()).expect("envelope");
    assert!(envelope.starts_with("(kicad_symbol_lib"));
    assert!(envelope.trim_end().ends_with(')'));
}

#[test]
fn test_symbol_export_is_idempotent_with_overwrite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = KicadLibrary::new(dir.path());
    library.setup_directories().expect("setup");

    let symbol = test_symbol("TEST_R");
    library.add_symbol(&symbol, true).expect("first add");
    library.add_symbol(&symbol, true).expect("second add");

    let content = fs::read_to_string(library.symbol_lib_path()).expect("library");
    assert_eq!(record_count(&content, "TEST_R"), 1, "record must be replaced, not duplicated");
    // The envelope still closes after the splice.
    assert!(content.trim_end().ends_with(')'));
}

#[test]
fn test_symbol_export_skips_without_overwrite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = KicadLibrary::new(dir.path());
    library.setup_directories().expect("setup");

    library.add_symbol(&test_symbol("TEST_R"), true).expect("first add");
    let before = fs::read_to_string(library.symbol_lib_path()).expect("library");

    // A second export without overwrite succeeds and changes nothing.
    let mut changed = test_symbol("TEST_R");
    changed.info.prefix = "U".to_string();
    library.add_symbol(&changed, false).expect("skip must report success");
    let after = fs::read_to_string(library.symbol_lib_path()).expect("library");
    assert_eq!(before, after);
}

#[test]
fn test_symbol_replacement_preserves_siblings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = KicadLibrary::new(dir.path());
    library.setup_directories().expect("setup");

    library.add_symbol(&test_symbol("FIRST"), true).expect("add first");
    library.add_symbol(&test_symbol("SECOND"), true).expect("add second");
    library.add_symbol(&test_symbol("FIRST"), true).expect("replace first");

    let content = fs::read_to_string(library.symbol_lib_path()).expect("library");
    assert_eq!(record_count(&content, "FIRST"), 1);
    assert_eq!(record_count(&content, "SECOND"), 1);
}

#[test]
fn test_symbol_identifier_replaces_spaces() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = KicadLibrary::new(dir.path());
    library.setup_directories().expect("setup");

    library
        .add_symbol(&test_symbol("NE555 Timer"), true)
        .expect("add");
    let content = fs::read_to_string(library.symbol_lib_path()).expect("library");
    assert_eq!(record_count(&content, "NE555_Timer"), 1);
}

#[test]
fn test_add_symbol_without_setup_creates_the_library() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = KicadLibrary::new(dir.path());

    library.add_symbol(&test_symbol("TEST_R"), true).expect("add");
    let content = fs::read_to_string(library.symbol_lib_path()).expect("library");
    assert!(content.starts_with("(kicad_symbol_lib"));
    assert_eq!(record_count(&content, "TEST_R"), 1);
}

#[test]
fn test_footprint_overwrite_semantics() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = KicadLibrary::new(dir.path());
    library.setup_directories().expect("setup");

    library
        .add_footprint(&test_footprint("TEST_PAD"), false)
        .expect("first write");
    let path = library.footprint_dir().join("TEST_PAD.kicad_mod");
    let before = fs::read_to_string(&path).expect("footprint");
    assert!(before.contains("(pad \"1\" smd rect"));

    let mut changed = test_footprint("TEST_PAD");
    changed.pads[0].size = (9.9, 9.9);

    library
        .add_footprint(&changed, false)
        .expect("skip must report success");
    assert_eq!(fs::read_to_string(&path).expect("footprint"), before);

    library.add_footprint(&changed, true).expect("overwrite");
    let after = fs::read_to_string(&path).expect("footprint");
    assert!(after.contains("(size 9.900 9.900)"));
}
