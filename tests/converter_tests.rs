use lcsc2kicad::converter::{convert_footprint, convert_symbol, symbol_info};
use lcsc2kicad::fallback;
use lcsc2kicad::geometry::{from_mm, normalize_rotation, to_mm};
use lcsc2kicad::importer::{import_footprint, import_symbol};
use lcsc2kicad::kicad_models::{FpShape, KiPinType, KiSymbolInfo};
use serde_json::{Value, json};
use std::path::Path;

const PIN_RECORD: &str =
    "P~show~4~1~100~100~0~PIN1^^0~100^^M0,0h-20~#000000^^show~0~0~0~VCC~end~Arial~7pt^^^^hide~0~0";
const RECT_RECORD: &str = "R~0~0~200~200~#000000~1~solid~none~rect1~0";

fn symbol_payload(shapes: Vec<&str>) -> Value {
    json!({
        "title": "TestChip",
        "lcsc": "C1234",
        "datasheet": "https://example.com/ds.pdf",
        "manufacturer": "TestCorp",
        "dataStr": {
            "head": {
                "x": "0",
                "y": "0",
                "c_para": { "name": "TestChip", "pre": "U?", "package": "SOIC-8" }
            },
            "shape": shapes
        }
    })
}

fn footprint_payload(origin: (f32, f32), shapes: Vec<&str>) -> Value {
    json!({
        "title": "TestChip",
        "SMT": true,
        "packageDetail": {
            "title": "TEST-PKG",
            "dataStr": {
                "head": { "x": origin.0.to_string(), "y": origin.1.to_string() },
                "shape": shapes
            }
        }
    })
}

#[test]
fn test_unit_transform_round_trip() {
    for v in [0.0_f32, 1.0, 2.54, 1000.0] {
        assert!(
            (to_mm(from_mm(v)) - v).abs() < 1e-4,
            "round trip diverged for {}",
            v
        );
    }
}

#[test]
fn test_rotation_normalization() {
    assert_eq!(normalize_rotation(0.0), 0);
    assert_eq!(normalize_rotation(87.0), 90);
    assert_eq!(normalize_rotation(181.0), 180);
    assert_eq!(normalize_rotation(359.0), 0);
    assert_eq!(normalize_rotation(-90.0), 270);
}

#[test]
fn test_pin_decoding() {
    let data = symbol_payload(vec![PIN_RECORD]);
    let symbol = import_symbol(&data).expect("symbol should import");
    assert_eq!(symbol.pins.len(), 1);
    assert!(symbol.skipped.is_empty());

    let pin = &symbol.pins[0];
    assert!(pin.settings.is_displayed);
    assert_eq!(pin.settings.spice_number, "1");
    assert_eq!(pin.settings.pos_x, 100.0);
    assert_eq!(pin.settings.pos_y, 100.0);
    assert_eq!(pin.settings.rotation, 0);
    assert_eq!(pin.name.text, "VCC");
    assert_eq!(pin.name.font_size, 7.0);
    // Vertical path notation is folded into horizontal at decode time.
    assert!(!pin.path.path.contains('v'));
}

#[test]
fn test_short_pin_record_is_skipped_not_fatal() {
    let data = symbol_payload(vec!["P~show~4~1~100~100~0~PIN1"]);
    let symbol = import_symbol(&data).expect("decoding must not fail on short records");
    assert!(symbol.pins.is_empty());
    assert_eq!(symbol.skipped.len(), 1);
    assert!(symbol.skipped[0].reason.contains("segment"));
}

#[test]
fn test_unknown_shape_tags_are_ignored() {
    let data = symbol_payload(vec!["ZZZ~1~2~3", RECT_RECORD]);
    let symbol = import_symbol(&data).expect("symbol should import");
    assert_eq!(symbol.rectangles.len(), 1);
    assert!(symbol.skipped.is_empty());
}

#[test]
fn test_symbol_end_to_end_record() {
    let data = symbol_payload(vec![PIN_RECORD, RECT_RECORD]);
    let ee_symbol = import_symbol(&data).expect("symbol should import");
    let ki_symbol = convert_symbol(ee_symbol);

    assert_eq!(ki_symbol.pins.len(), 1);
    let pin = &ki_symbol.pins[0];
    assert_eq!(pin.pin_type, KiPinType::PowerIn);
    assert_eq!(pin.name, "VCC");
    assert_eq!(pin.number, "1");
    assert!((pin.length - 5.08).abs() < 1e-3);

    let record = ki_symbol.to_library_record();
    assert!(record.contains("(pin power_in line"));
    assert!(record.contains("(at 25.40 -25.40 180)"));
    assert!(record.contains("(name \"VCC\""));
    assert!(record.contains("(start 0.00 0.00)"));
    assert!(record.contains("(end 50.80 -50.80)"));
    // The rectangle's fill field was "none".
    assert!(record.contains("(fill (type none))"));
    // The reference prefix wildcard is stripped.
    assert!(record.contains("(property \"Reference\" \"U\""));
}

#[test]
fn test_ellipse_to_circle_conversion() {
    let data = symbol_payload(vec![
        "E~50~50~20~20~#000000~1~solid~none~e1~0",
        "E~50~50~20~10~#000000~1~solid~none~e2~0",
    ]);
    let ee_symbol = import_symbol(&data).expect("symbol should import");
    assert_eq!(ee_symbol.ellipses.len(), 2);

    let ki_symbol = convert_symbol(ee_symbol);
    // Only the equal-radius ellipse survives, as a circle.
    assert_eq!(ki_symbol.circles.len(), 1);
    assert!((ki_symbol.circles[0].radius - to_mm(20.0)).abs() < 1e-3);
}

#[test]
fn test_circular_arc_conversion() {
    let data = symbol_payload(vec![
        "A~M 0 0 A 10 10 0 0 1 20 0~~#000000~1~solid~none~a1~0",
        "A~M 0 0 A 10 5 0 0 1 20 0~~#000000~1~solid~none~a2~0",
    ]);
    let ee_symbol = import_symbol(&data).expect("symbol should import");
    assert_eq!(ee_symbol.arcs.len(), 2);

    let ki_symbol = convert_symbol(ee_symbol);
    assert_eq!(ki_symbol.arcs.len(), 1, "non-circular arcs are dropped");
    let arc = &ki_symbol.arcs[0];
    // A semicircle from (0,0) to (20,0) with radius 10; the sweep passes
    // through (10,-10) in source space, which Y inversion maps to +2.54.
    assert!((arc.start.0 - 0.0).abs() < 1e-3);
    assert!((arc.end.0 - to_mm(20.0)).abs() < 1e-3);
    assert!((arc.mid.0 - to_mm(10.0)).abs() < 1e-2);
    assert!((arc.mid.1 - to_mm(10.0)).abs() < 1e-2);
}

#[test]
fn test_polyline_closing_follows_fill() {
    let data = symbol_payload(vec![
        "PL~0 0 100 0 100 100~#000000~1~solid~none~pl1~0",
        "PG~0 0 100 0 100 100~#000000~1~solid~#FFFFFF~pg1~0",
    ]);
    let ki_symbol = convert_symbol(import_symbol(&data).expect("symbol should import"));
    assert_eq!(ki_symbol.polygons.len(), 2);
    assert!(!ki_symbol.polygons[0].closed);
    assert!(ki_symbol.polygons[1].closed);
}

#[test]
fn test_footprint_recentering() {
    let data = footprint_payload(
        (400.0, 300.0),
        vec!["PAD~RECT~400~300~10~10~1~~1~0~~0", "PAD~RECT~410~300~10~10~1~~2~0~~0"],
    );
    let footprint = import_footprint(&data).expect("footprint should import");
    assert_eq!(footprint.info.bbox_x, 400.0);

    // The pad sitting on the header origin is at (0,0) before unit
    // transform.
    assert_eq!(footprint.pads[0].center_x, 0.0);
    assert_eq!(footprint.pads[0].center_y, 0.0);
    assert_eq!(footprint.pads[1].center_x, 10.0);
}

#[test]
fn test_pad_end_to_end_record() {
    let data = footprint_payload((0.0, 0.0), vec!["PAD~RECT~0~0~10~10~1~~1~0~~0"]);
    let footprint = import_footprint(&data).expect("footprint should import");
    let ki_footprint = convert_footprint(footprint, None);

    assert_eq!(ki_footprint.pads.len(), 1);
    let pad = &ki_footprint.pads[0];
    assert_eq!(pad.pad_type, "smd");
    assert_eq!(pad.shape, FpShape::Rect);
    assert_eq!(pad.pos, (0.0, 0.0));
    assert!(pad.drill.is_none());

    let content = ki_footprint.to_mod_file();
    assert!(content.contains("(pad \"1\" smd rect"));
    assert!(content.contains("(at 0.000 0.000 0.0)"));
    assert!(content.contains("(size 2.540 2.540)"));
    assert!(content.contains("(layers \"F.Cu\" \"F.Paste\" \"F.Mask\")"));
    assert!(!content.contains("drill"));
}

#[test]
fn test_through_hole_pad_gets_drill_and_both_side_layers() {
    let data = footprint_payload((0.0, 0.0), vec!["PAD~ELLIPSE~0~0~6~6~11~~3~1.8~~0"]);
    let ki_footprint = convert_footprint(import_footprint(&data).expect("import"), None);
    let pad = &ki_footprint.pads[0];
    assert_eq!(pad.pad_type, "thru_hole");
    assert_eq!(pad.shape, FpShape::Circle);
    assert_eq!(pad.layers, vec!["*.Cu".to_string(), "*.Mask".to_string()]);
    assert!((pad.drill.expect("drill") - to_mm(3.6)).abs() < 1e-3);
}

#[test]
fn test_polygon_pad_degrades_without_points() {
    let data = footprint_payload(
        (0.0, 0.0),
        vec![
            "PAD~POLYGON~0~0~10~10~1~~1~0~~0",
            "PAD~POLYGON~0~0~10~10~1~~2~0~-10 -10 10 -10 10 10~0",
        ],
    );
    let ki_footprint = convert_footprint(import_footprint(&data).expect("import"), None);

    // No points: reverts to a plain rectangular pad.
    assert_eq!(ki_footprint.pads[0].shape, FpShape::Rect);
    assert!(ki_footprint.pads[0].polygon.is_empty());

    // A valid outline becomes a minimal anchor with offset points.
    let custom = &ki_footprint.pads[1];
    assert_eq!(custom.shape, FpShape::Custom);
    assert_eq!(custom.size, (0.005, 0.005));
    assert_eq!(custom.polygon.len(), 3);
    let content = ki_footprint.to_mod_file();
    assert!(content.contains("(gr_poly"));
    assert!(content.contains("(xy -2.540 -2.540)"));
}

#[test]
fn test_track_becomes_line_segments() {
    let data = footprint_payload(
        (400.0, 300.0),
        vec![
            "TRACK~1~3~~400 300 500 300 500 400~t1",
            "TRACK~1~3~~400 300~t2",
        ],
    );
    let footprint = import_footprint(&data).expect("import");
    assert_eq!(footprint.tracks.len(), 1);
    assert_eq!(footprint.skipped.len(), 1, "single-point track is skipped");

    let ki_footprint = convert_footprint(footprint, None);
    assert_eq!(ki_footprint.lines.len(), 2);
    assert_eq!(ki_footprint.lines[0].start, (0.0, 0.0));
    assert_eq!(ki_footprint.lines[0].layer, "F.SilkS");
    assert!((ki_footprint.lines[0].end.0 - to_mm(100.0)).abs() < 1e-3);
}

#[test]
fn test_hole_becomes_non_plated_pad() {
    let data = footprint_payload((400.0, 300.0), vec!["HOLE~410~300~3~h1"]);
    let ki_footprint = convert_footprint(import_footprint(&data).expect("import"), None);
    assert_eq!(ki_footprint.pads.len(), 1);
    let pad = &ki_footprint.pads[0];
    assert_eq!(pad.pad_type, "np_thru_hole");
    assert!((pad.pos.0 - to_mm(10.0)).abs() < 1e-3);
    assert!((pad.drill.expect("drill") - to_mm(6.0)).abs() < 1e-3);
    assert!(ki_footprint.to_mod_file().contains("np_thru_hole"));
}

#[test]
fn test_footprint_value_and_reference_texts_are_canonical() {
    let data = footprint_payload(
        (0.0, 0.0),
        vec![
            "TEXT~P~0~0~0.8~0~~3~~4.5~TEST-PKG~~~~t1",
            "TEXT~N~0~10~0.8~0~~3~~4.5~REF~~~~t2",
            "TEXT~L~0~20~0.8~0~~3~~4.5~note~~~~t3",
        ],
    );
    let ki_footprint = convert_footprint(import_footprint(&data).expect("import"), None);
    // P and N records are superseded by the canonical lines.
    assert_eq!(ki_footprint.texts.len(), 1);
    assert_eq!(ki_footprint.texts[0].text, "note");
    let content = ki_footprint.to_mod_file();
    assert!(content.contains("(fp_text reference \"REF**\""));
    assert!(content.contains("(fp_text value \"TEST-PKG\""));
}

#[test]
fn test_fallback_dual_inline_split() {
    for n in 1..=8_usize {
        let numbers: Vec<String> = (1..=n).map(|i| i.to_string()).collect();
        let symbol = fallback::synthesize_symbol(KiSymbolInfo::default(), numbers);
        assert_eq!(symbol.pins.len(), n);
        let left = symbol.pins.iter().filter(|p| p.orientation == 180).count();
        let right = symbol.pins.iter().filter(|p| p.orientation == 0).count();
        assert_eq!(left, n.div_ceil(2), "left side for {} pins", n);
        assert_eq!(right, n - left, "right side for {} pins", n);
    }
}

#[test]
fn test_fallback_four_side_split() {
    for n in 9..=50_usize {
        let numbers: Vec<String> = (1..=n).map(|i| i.to_string()).collect();
        let symbol = fallback::synthesize_symbol(KiSymbolInfo::default(), numbers);
        assert_eq!(symbol.pins.len(), n);
        let horizontal = symbol
            .pins
            .iter()
            .filter(|p| p.orientation == 90 || p.orientation == 270)
            .count();
        let vertical = symbol
            .pins
            .iter()
            .filter(|p| p.orientation == 0 || p.orientation == 180)
            .count();
        assert_eq!(horizontal, 2 * (n / 10).max(2), "horizontal pins for {}", n);
        assert_eq!(vertical, n - horizontal, "vertical pins for {}", n);
    }
}

#[test]
fn test_fallback_uses_pad_numbers_verbatim() {
    let numbers = vec!["A1".to_string(), "B2".to_string(), "J14".to_string()];
    let symbol = fallback::synthesize_symbol(KiSymbolInfo::default(), numbers.clone());
    let pin_numbers: Vec<&str> = symbol.pins.iter().map(|p| p.number.as_str()).collect();
    assert_eq!(pin_numbers, numbers);
    assert_eq!(symbol.pins[0].name, "Pin_A1");
    assert_eq!(symbol.rectangles.len(), 1);
}

#[test]
fn test_fallback_body_proportion_floor_for_large_counts() {
    let numbers: Vec<String> = (1..=64).map(|i| i.to_string()).collect();
    let symbol = fallback::synthesize_symbol(KiSymbolInfo::default(), numbers);
    let rect = &symbol.rectangles[0];
    let width = rect.end.0 - rect.start.0;
    let height = rect.start.1 - rect.end.1;
    let larger = width.max(height);
    assert!(width >= larger * 0.5 - 1e-3);
    assert!(height >= larger * 0.5 - 1e-3);
}

#[test]
fn test_pin_count_from_package() {
    assert_eq!(fallback::pin_count_from_package("QFP-100"), Some(100));
    assert_eq!(
        fallback::pin_count_from_package("LQFN-56_L7.0-W7.0-P0.4-EP"),
        Some(56)
    );
    assert_eq!(fallback::pin_count_from_package("8pin"), Some(8));
    assert_eq!(fallback::pin_count_from_package("SOT-23-6"), Some(6));
    assert_eq!(fallback::pin_count_from_package("RADIAL"), None);
}

#[test]
fn test_empty_symbol_triggers_fallback_path() {
    let data = symbol_payload(vec![]);
    let symbol = import_symbol(&data).expect("empty shape list still imports");
    assert!(!symbol.has_drawable_content());

    let pad_numbers = fallback::pad_numbers_from_cad_data(&footprint_payload(
        (0.0, 0.0),
        vec![
            "PAD~RECT~0~0~10~10~1~~A1~0~~0",
            "PAD~RECT~10~0~10~10~1~~A2~0~~0",
        ],
    ));
    assert_eq!(pad_numbers, vec!["A1".to_string(), "A2".to_string()]);

    let fallback_symbol = fallback::synthesize_symbol(symbol_info(&symbol.info), pad_numbers);
    assert_eq!(fallback_symbol.pins.len(), 2);
}

#[test]
fn test_missing_footprint_section_is_artifact_local() {
    let data = symbol_payload(vec![RECT_RECORD]);
    assert!(import_footprint(&data).is_err());
    assert!(import_symbol(&data).is_ok());
}

// Live API round trips, kept out of the default run.

#[tokio::test]
#[ignore = "requires network access to the EasyEDA API"]
async fn test_basic_component_import() {
    let result = lcsc2kicad::import_component("C2040", Path::new("test_output"), true).await;
    let report = result.expect("import should succeed");
    assert!(report.symbol_ok && report.footprint_ok);
}

#[tokio::test]
#[ignore = "requires network access to the EasyEDA API"]
async fn test_invalid_component_import() {
    let result = lcsc2kicad::import_component("INVALID_ID", Path::new("test_output"), true).await;
    assert!(result.is_err());
}
