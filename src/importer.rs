// src/importer.rs
//
// Decodes EasyEDA's delimiter-packed shape records into the typed source
// model. Every record type has its own decoder with an explicit field-index
// table; decoders are collected in tag-keyed registries so the dispatch is
// open for extension. A malformed record is skipped with a reason, never
// aborting its siblings.

use crate::easyeda_models::*;
use crate::error::{Error, Result};
use crate::geometry;
use serde::Deserialize;
use serde_json::Value;

/// Tilde-delimited field list with best-effort accessors: numeric fields
/// default to zero and string fields to empty when absent or unparsable.
struct Fields<'a> {
    inner: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn split(line: &'a str) -> Self {
        Fields {
            inner: line.split('~').collect(),
        }
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn str_at(&self, index: usize) -> &'a str {
        self.inner.get(index).copied().unwrap_or("")
    }

    fn num(&self, index: usize) -> f32 {
        self.str_at(index).trim().parse().unwrap_or(0.0)
    }

    fn int(&self, index: usize) -> i32 {
        self.num(index) as i32
    }

    /// Visibility fields hold the literal token `show`; anything else,
    /// including an absent field, means hidden.
    fn shown(&self, index: usize) -> bool {
        self.str_at(index) == "show"
    }

    fn filled(&self, index: usize) -> bool {
        let fill = self.str_at(index);
        !fill.is_empty() && !fill.eq_ignore_ascii_case("none")
    }

    fn flag(&self, index: usize) -> bool {
        !self.str_at(index).is_empty()
    }
}

fn parse_points(raw: &str) -> Vec<(f32, f32)> {
    let coords: Vec<f32> = raw
        .split_whitespace()
        .filter_map(|c| c.parse().ok())
        .collect();
    coords.chunks_exact(2).map(|c| (c[0], c[1])).collect()
}

type DecodeResult<T> = std::result::Result<T, Skip>;

// ---------------- symbol record decoders ----------------

pub enum EeSymbolShape {
    Pin(EeSymbolPin),
    Rectangle(EeSymbolRectangle),
    Circle(EeSymbolCircle),
    Ellipse(EeSymbolEllipse),
    Arc(EeSymbolArc),
    Polyline(EeSymbolPolyline),
    Polygon(EeSymbolPolyline),
    Path(EeSymbolPath),
}

type SymbolDecoder = fn(&str) -> DecodeResult<EeSymbolShape>;

/// Dispatch table keyed by the record's leading type tag.
pub const SYMBOL_DECODERS: &[(&str, SymbolDecoder)] = &[
    ("P", decode_pin),
    ("R", decode_rectangle),
    ("C", decode_circle),
    ("E", decode_ellipse),
    ("A", decode_arc),
    ("PL", decode_polyline),
    ("PG", decode_polygon),
    ("PATH", decode_path),
];

// A pin record packs six caret-delimited groups: settings, start dot, path,
// display name, reserved, inversion dot; a seventh clock group is optional.
const PIN_MIN_SEGMENTS: usize = 6;

fn decode_pin(line: &str) -> DecodeResult<EeSymbolShape> {
    let segments: Vec<&str> = line.split("^^").collect();
    if segments.len() < PIN_MIN_SEGMENTS {
        return Err(Skip::new(
            "P",
            format!(
                "pin record has {} of {} segments",
                segments.len(),
                PIN_MIN_SEGMENTS
            ),
        ));
    }

    let settings = Fields::split(segments[0]);
    let settings = EeSymbolPinSettings {
        is_displayed: settings.shown(1),
        pin_type: EePinType::from_code(settings.str_at(2)),
        spice_number: settings.str_at(3).to_string(),
        pos_x: settings.num(4),
        pos_y: settings.num(5),
        rotation: geometry::normalize_rotation(settings.num(6)),
        id: settings.str_at(7).to_string(),
        is_locked: settings.flag(8),
    };

    let dot = Fields::split(segments[1]);
    let dot = EeSymbolPinDot {
        x: dot.num(0),
        y: dot.num(1),
    };

    let path = Fields::split(segments[2]);
    let path = EeSymbolPinPath {
        // Vertical segment notation is folded into horizontal so the length
        // can always be read off the last `h` command.
        path: path.str_at(0).replace('v', "h"),
        color: path.str_at(1).to_string(),
    };

    let name = Fields::split(segments[3]);
    let name = EeSymbolPinName {
        is_displayed: name.shown(0),
        pos_x: name.num(1),
        pos_y: name.num(2),
        rotation: geometry::normalize_rotation(name.num(3)),
        text: name.str_at(4).to_string(),
        anchor: name.str_at(5).to_string(),
        font: name.str_at(6).to_string(),
        font_size: parse_font_size(name.str_at(7)),
    };

    let dot_bis = Fields::split(segments[5]);
    let dot_bis = EeSymbolPinDotBis {
        is_displayed: dot_bis.shown(0),
        x: dot_bis.num(1),
        y: dot_bis.num(2),
    };

    let clock = match segments.get(6) {
        Some(segment) => {
            let clock = Fields::split(segment);
            EeSymbolPinClock {
                is_displayed: clock.shown(0),
                path: clock.str_at(1).to_string(),
            }
        }
        None => EeSymbolPinClock {
            is_displayed: false,
            path: String::new(),
        },
    };

    Ok(EeSymbolShape::Pin(EeSymbolPin {
        settings,
        dot,
        path,
        name,
        dot_bis,
        clock,
    }))
}

fn parse_font_size(raw: &str) -> f32 {
    raw.trim_end_matches("pt").trim().parse().unwrap_or(7.0)
}

fn decode_rectangle(line: &str) -> DecodeResult<EeSymbolShape> {
    let f = Fields::split(line);
    if f.len() < 5 {
        return Err(Skip::new("R", "rectangle record too short"));
    }
    Ok(EeSymbolShape::Rectangle(EeSymbolRectangle {
        pos_x: f.num(1),
        pos_y: f.num(2),
        width: f.num(3),
        height: f.num(4),
        stroke_color: f.str_at(5).to_string(),
        stroke_width: f.num(6),
        stroke_style: f.str_at(7).to_string(),
        filled: f.filled(8),
        id: f.str_at(9).to_string(),
        is_locked: f.flag(10),
    }))
}

fn decode_circle(line: &str) -> DecodeResult<EeSymbolShape> {
    let f = Fields::split(line);
    if f.len() < 4 {
        return Err(Skip::new("C", "circle record too short"));
    }
    Ok(EeSymbolShape::Circle(EeSymbolCircle {
        center_x: f.num(1),
        center_y: f.num(2),
        radius: f.num(3),
        stroke_color: f.str_at(4).to_string(),
        stroke_width: f.num(5),
        filled: f.filled(7),
        id: f.str_at(8).to_string(),
        is_locked: f.flag(9),
    }))
}

fn decode_ellipse(line: &str) -> DecodeResult<EeSymbolShape> {
    let f = Fields::split(line);
    if f.len() < 5 {
        return Err(Skip::new("E", "ellipse record too short"));
    }
    Ok(EeSymbolShape::Ellipse(EeSymbolEllipse {
        center_x: f.num(1),
        center_y: f.num(2),
        radius_x: f.num(3),
        radius_y: f.num(4),
        stroke_color: f.str_at(5).to_string(),
        stroke_width: f.num(6),
        filled: f.filled(8),
        id: f.str_at(9).to_string(),
        is_locked: f.flag(10),
    }))
}

fn decode_arc(line: &str) -> DecodeResult<EeSymbolShape> {
    let f = Fields::split(line);
    if f.len() < 2 {
        return Err(Skip::new("A", "arc record has no path"));
    }
    let (start, radius_x, radius_y, large_arc, sweep, end) = parse_arc_path(f.str_at(1))
        .ok_or_else(|| Skip::new("A", "arc path is not a single M/A segment"))?;
    Ok(EeSymbolShape::Arc(EeSymbolArc {
        start,
        end,
        radius_x,
        radius_y,
        large_arc,
        sweep,
        filled: f.filled(6),
        id: f.str_at(7).to_string(),
    }))
}

/// Splits an SVG path into number and command tokens, treating commas and
/// whitespace as separators.
fn svg_tokens(path: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    for c in path.chars() {
        if c.is_ascii_alphabetic() {
            if !buf.is_empty() {
                tokens.push(std::mem::take(&mut buf));
            }
            tokens.push(c.to_string());
        } else if c == ',' || c.is_whitespace() {
            if !buf.is_empty() {
                tokens.push(std::mem::take(&mut buf));
            }
        } else {
            buf.push(c);
        }
    }
    if !buf.is_empty() {
        tokens.push(buf);
    }
    tokens
}

type ArcPath = ((f32, f32), f32, f32, bool, bool, (f32, f32));

fn parse_arc_path(path: &str) -> Option<ArcPath> {
    let tokens = svg_tokens(path);
    if tokens.len() < 11 || !tokens[0].eq_ignore_ascii_case("m") || !tokens[3].eq_ignore_ascii_case("a") {
        return None;
    }
    let num = |i: usize| tokens[i].parse::<f32>().ok();
    let start = (num(1)?, num(2)?);
    let radius_x = num(4)?;
    let radius_y = num(5)?;
    // tokens[6] is the x-axis rotation, irrelevant for circular arcs.
    let large_arc = num(7)? != 0.0;
    let sweep = num(8)? != 0.0;
    let end = (num(9)?, num(10)?);
    Some((start, radius_x, radius_y, large_arc, sweep, end))
}

fn decode_polyline(line: &str) -> DecodeResult<EeSymbolShape> {
    Ok(EeSymbolShape::Polyline(decode_point_list("PL", line)?))
}

fn decode_polygon(line: &str) -> DecodeResult<EeSymbolShape> {
    Ok(EeSymbolShape::Polygon(decode_point_list("PG", line)?))
}

fn decode_point_list(tag: &str, line: &str) -> DecodeResult<EeSymbolPolyline> {
    let f = Fields::split(line);
    let points = parse_points(f.str_at(1));
    if points.len() < 2 {
        return Err(Skip::new(tag, "point list has fewer than two points"));
    }
    Ok(EeSymbolPolyline {
        points,
        stroke_color: f.str_at(2).to_string(),
        stroke_width: f.num(3),
        filled: f.filled(5),
        id: f.str_at(6).to_string(),
        is_locked: f.flag(7),
    })
}

fn decode_path(line: &str) -> DecodeResult<EeSymbolShape> {
    let f = Fields::split(line);
    if f.len() < 2 {
        return Err(Skip::new("PATH", "path record has no path data"));
    }
    Ok(EeSymbolShape::Path(EeSymbolPath {
        paths: f.str_at(1).to_string(),
        stroke_color: f.str_at(2).to_string(),
        stroke_width: f.num(3),
        filled: f.filled(5),
        id: f.str_at(6).to_string(),
    }))
}

// ---------------- footprint record decoders ----------------

pub enum EeFootprintShape {
    Pad(EeFootprintPad),
    Track(EeFootprintTrack),
    Circle(EeFootprintCircle),
    Text(EeFootprintText),
    Hole(EeFootprintHole),
}

type FootprintDecoder = fn(&str) -> DecodeResult<EeFootprintShape>;

pub const FOOTPRINT_DECODERS: &[(&str, FootprintDecoder)] = &[
    ("PAD", decode_pad),
    ("TRACK", decode_track),
    ("CIRCLE", decode_fp_circle),
    ("TEXT", decode_fp_text),
    ("HOLE", decode_hole),
];

// PAD~shape~x~y~width~height~layer~net~number~hole_radius~points~rotation~id~hole_length
const PAD_MIN_FIELDS: usize = 10;

fn decode_pad(line: &str) -> DecodeResult<EeFootprintShape> {
    let f = Fields::split(line);
    if f.len() < PAD_MIN_FIELDS {
        return Err(Skip::new(
            "PAD",
            format!("pad record has {} of {} fields", f.len(), PAD_MIN_FIELDS),
        ));
    }

    // Field 13 carries the slot length in current payloads; very old ones
    // put it at field 12, where a uuid parses to zero and is rejected.
    let mut hole_length = f.num(13);
    if hole_length == 0.0 {
        let legacy = f.num(12);
        if legacy > 0.0 {
            hole_length = legacy;
        }
    }

    Ok(EeFootprintShape::Pad(EeFootprintPad {
        shape: EePadShape::from_tag(f.str_at(1)),
        center_x: f.num(2),
        center_y: f.num(3),
        width: f.num(4),
        height: f.num(5),
        layer_id: f.int(6),
        net: f.str_at(7).to_string(),
        number: f.str_at(8).to_string(),
        hole_radius: f.num(9),
        hole_length,
        points: parse_points(f.str_at(10)),
        rotation: f.num(11),
    }))
}

// TRACK~stroke_width~layer~net~points~id
fn decode_track(line: &str) -> DecodeResult<EeFootprintShape> {
    let f = Fields::split(line);
    if f.len() < 5 {
        return Err(Skip::new("TRACK", "track record too short"));
    }
    let points = parse_points(f.str_at(4));
    if points.len() < 2 {
        return Err(Skip::new("TRACK", "track has fewer than two points"));
    }
    Ok(EeFootprintShape::Track(EeFootprintTrack {
        stroke_width: f.num(1),
        layer_id: f.int(2),
        points,
    }))
}

// CIRCLE~cx~cy~radius~stroke_width~layer~id
fn decode_fp_circle(line: &str) -> DecodeResult<EeFootprintShape> {
    let f = Fields::split(line);
    if f.len() < 4 {
        return Err(Skip::new("CIRCLE", "circle record too short"));
    }
    Ok(EeFootprintShape::Circle(EeFootprintCircle {
        center_x: f.num(1),
        center_y: f.num(2),
        radius: f.num(3),
        stroke_width: f.num(4),
        layer_id: f.int(5),
    }))
}

// TEXT~kind~cx~cy~stroke_width~rotation~mirror~layer~net~font_size~text~...
fn decode_fp_text(line: &str) -> DecodeResult<EeFootprintShape> {
    let f = Fields::split(line);
    if f.len() < 11 {
        return Err(Skip::new("TEXT", "text record too short"));
    }
    Ok(EeFootprintShape::Text(EeFootprintText {
        kind: f.str_at(1).to_string(),
        center_x: f.num(2),
        center_y: f.num(3),
        stroke_width: f.num(4),
        rotation: f.num(5),
        layer_id: f.int(7),
        font_size: f.num(9),
        text: f.str_at(10).to_string(),
    }))
}

// HOLE~cx~cy~radius~id
fn decode_hole(line: &str) -> DecodeResult<EeFootprintShape> {
    let f = Fields::split(line);
    if f.len() < 4 {
        return Err(Skip::new("HOLE", "hole record too short"));
    }
    Ok(EeFootprintShape::Hole(EeFootprintHole {
        center_x: f.num(1),
        center_y: f.num(2),
        radius: f.num(3),
    }))
}

// ---------------- payload helpers ----------------

/// The `dataStr` sections arrive either as a JSON object or as a string
/// containing JSON; both are accepted.
fn section_object(value: &Value, what: &str) -> Result<Value> {
    match value {
        Value::Object(_) => Ok(value.clone()),
        Value::String(s) => {
            serde_json::from_str(s).map_err(|e| Error::ParseError(format!("{}: {}", what, e)))
        }
        _ => Err(Error::MissingData(format!("{} is missing", what))),
    }
}

fn value_as_f32(value: &Value) -> f32 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0) as f32,
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn shape_strings(data_str: &Value) -> Vec<String> {
    data_str["shape"]
        .as_array()
        .map(|shapes| {
            shapes
                .iter()
                .filter_map(|s| s.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------- model builders ----------------

/// Assembles the decoded symbol shapes and header metadata into the
/// intermediate symbol. All coordinates stay in source units, relative to
/// nothing; the bbox origin is applied by the converter.
pub fn import_symbol(cad_data: &Value) -> Result<EeSymbol> {
    let data_str = section_object(&cad_data["dataStr"], "symbol dataStr")?;
    let head = &data_str["head"];
    let c_para = &head["c_para"];

    let mut name = value_as_string(&c_para["name"]);
    if name.is_empty() {
        name = value_as_string(&cad_data["title"]);
    }
    let mut prefix = value_as_string(&c_para["pre"]);
    if prefix.is_empty() {
        prefix = "U".to_string();
    }
    let mut manufacturer = value_as_string(&c_para["BOM_Manufacturer"]);
    if manufacturer.is_empty() {
        manufacturer = value_as_string(&cad_data["manufacturer"]);
    }

    let mut symbol = EeSymbol {
        info: EeSymbolInfo {
            name,
            prefix,
            package: value_as_string(&c_para["package"]),
            manufacturer,
            datasheet: value_as_string(&cad_data["datasheet"]),
            lcsc_id: value_as_string(&cad_data["lcsc"]),
            jlc_id: value_as_string(&c_para["BOM_JLCPCB Part Class"]),
        },
        bbox: EeSymbolBbox {
            x: value_as_f32(&head["x"]),
            y: value_as_f32(&head["y"]),
        },
        ..EeSymbol::default()
    };

    let shapes = shape_strings(&data_str);
    if shapes.is_empty() {
        log::warn!(
            "No symbol shapes found for {}; a fallback symbol may be generated",
            symbol.info.name
        );
    }

    for line in &shapes {
        let tag = line.split('~').next().unwrap_or("");
        let Some((_, decode)) = SYMBOL_DECODERS.iter().find(|(t, _)| *t == tag) else {
            log::debug!("Ignoring unsupported symbol record '{}'", tag);
            continue;
        };
        match decode(line) {
            Ok(EeSymbolShape::Pin(pin)) => symbol.pins.push(pin),
            Ok(EeSymbolShape::Rectangle(rect)) => symbol.rectangles.push(rect),
            Ok(EeSymbolShape::Circle(circle)) => symbol.circles.push(circle),
            Ok(EeSymbolShape::Ellipse(ellipse)) => symbol.ellipses.push(ellipse),
            Ok(EeSymbolShape::Arc(arc)) => symbol.arcs.push(arc),
            Ok(EeSymbolShape::Polyline(polyline)) => symbol.polylines.push(polyline),
            Ok(EeSymbolShape::Polygon(polygon)) => symbol.polygons.push(polygon),
            Ok(EeSymbolShape::Path(path)) => symbol.paths.push(path),
            Err(skip) => {
                log::warn!("Skipping {} record: {}", skip.tag, skip.reason);
                symbol.skipped.push(skip);
            }
        }
    }

    log::info!(
        "Parsed symbol {}: {} pins, {} rectangles, {} skipped",
        symbol.info.name,
        symbol.pins.len(),
        symbol.rectangles.len(),
        symbol.skipped.len()
    );
    Ok(symbol)
}

/// Assembles the decoded footprint shapes into the intermediate footprint.
/// Every coordinate is re-based on the header bounding-box origin here, so
/// the exporter never sees source-header coordinates; the origin itself is
/// kept in the info block for the 3D placement transform.
pub fn import_footprint(cad_data: &Value) -> Result<EeFootprint> {
    let package_detail = &cad_data["packageDetail"];
    if package_detail.is_null() {
        return Err(Error::MissingData(
            "packageDetail section is missing".to_string(),
        ));
    }
    let data_str = section_object(&package_detail["dataStr"], "footprint dataStr")?;
    let head = &data_str["head"];

    let mut name = value_as_string(&package_detail["title"]);
    if name.is_empty() {
        name = "Unknown_Footprint".to_string();
    }

    let mut footprint = EeFootprint {
        info: EeFootprintInfo {
            name,
            is_smd: cad_data["SMT"].as_bool().unwrap_or(false),
            bbox_x: value_as_f32(&head["x"]),
            bbox_y: value_as_f32(&head["y"]),
        },
        raw_shapes: shape_strings(&data_str),
        ..EeFootprint::default()
    };

    for line in footprint.raw_shapes.clone() {
        let tag = line.split('~').next().unwrap_or("");
        let Some((_, decode)) = FOOTPRINT_DECODERS.iter().find(|(t, _)| *t == tag) else {
            log::debug!("Ignoring unsupported footprint record '{}'", tag);
            continue;
        };
        match decode(&line) {
            Ok(EeFootprintShape::Pad(pad)) => footprint.pads.push(pad),
            Ok(EeFootprintShape::Track(track)) => footprint.tracks.push(track),
            Ok(EeFootprintShape::Circle(circle)) => footprint.circles.push(circle),
            Ok(EeFootprintShape::Text(text)) => footprint.texts.push(text),
            Ok(EeFootprintShape::Hole(hole)) => footprint.holes.push(hole),
            Err(skip) => {
                log::warn!("Skipping {} record: {}", skip.tag, skip.reason);
                footprint.skipped.push(skip);
            }
        }
    }

    rebase_on_origin(&mut footprint);
    Ok(footprint)
}

fn rebase_on_origin(footprint: &mut EeFootprint) {
    let (ox, oy) = (footprint.info.bbox_x, footprint.info.bbox_y);
    for pad in &mut footprint.pads {
        pad.center_x -= ox;
        pad.center_y -= oy;
        for point in &mut pad.points {
            point.0 -= ox;
            point.1 -= oy;
        }
    }
    for track in &mut footprint.tracks {
        for point in &mut track.points {
            point.0 -= ox;
            point.1 -= oy;
        }
    }
    for circle in &mut footprint.circles {
        circle.center_x -= ox;
        circle.center_y -= oy;
    }
    for text in &mut footprint.texts {
        text.center_x -= ox;
        text.center_y -= oy;
    }
    for hole in &mut footprint.holes {
        hole.center_x -= ox;
        hole.center_y -= oy;
    }
}

// ---------------- 3D model reference ----------------

#[derive(Deserialize, Debug)]
struct SvgNode {
    attrs: SvgNodeAttrs,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct SvgNodeAttrs {
    uuid: String,
    title: String,
    c_origin: String,
    c_rotation: String,
    z: Value,
}

/// Searches the retained raw shape list for the `SVGNODE` record that holds
/// the 3D model reference. The payloads are not fetched here.
pub fn find_3d_model(raw_shapes: &[String]) -> Option<Ee3dModel> {
    for line in raw_shapes {
        let Some(json_part) = line.strip_prefix("SVGNODE~") else {
            continue;
        };
        let node: SvgNode = match serde_json::from_str(json_part) {
            Ok(node) => node,
            Err(e) => {
                log::warn!("Failed to parse SVGNODE record: {}", e);
                continue;
            }
        };
        if node.attrs.uuid.is_empty() {
            log::info!("SVGNODE record carries no model uuid");
            continue;
        }

        let origin: Vec<f32> = node
            .attrs
            .c_origin
            .split(',')
            .map(|v| v.trim().parse().unwrap_or(0.0))
            .collect();
        let rotation: Vec<f32> = node
            .attrs
            .c_rotation
            .split(',')
            .map(|v| v.trim().parse().unwrap_or(0.0))
            .collect();
        let at = |list: &[f32], i: usize| list.get(i).copied().unwrap_or(0.0);

        return Some(Ee3dModel {
            uuid: node.attrs.uuid,
            title: node.attrs.title,
            obj_data: None,
            step_data: None,
            transform: EeModelTransform {
                translation: glam::Vec3::new(
                    at(&origin, 0),
                    at(&origin, 1),
                    value_as_f32(&node.attrs.z),
                ),
                rotation: glam::Vec3::new(at(&rotation, 0), at(&rotation, 1), at(&rotation, 2)),
                ..EeModelTransform::default()
            },
        });
    }
    None
}
