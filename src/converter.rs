// src/converter.rs
//
// Converts the intermediate EasyEDA structures into their KiCad
// counterparts: unit conversion, symbol Y inversion, shape/layer/pin-type
// mapping and the degenerate-geometry rules (unequal-radius ellipses and
// non-circular arcs are dropped, malformed polygon pads revert to rect).

use crate::easyeda_models::*;
use crate::geometry::{self, to_mm};
use crate::kicad_models::*;
use glam::{Vec2, Vec3};

fn map_pin_type(ee_type: EePinType) -> KiPinType {
    match ee_type {
        EePinType::Unspecified => KiPinType::Unspecified,
        EePinType::Input => KiPinType::Input,
        EePinType::Output => KiPinType::Output,
        EePinType::Bidirectional => KiPinType::Bidirectional,
        EePinType::Power => KiPinType::PowerIn,
    }
}

fn pin_style(pin: &EeSymbolPin) -> KiPinStyle {
    match (pin.dot_bis.is_displayed, pin.clock.is_displayed) {
        (true, true) => KiPinStyle::InvertedClock,
        (true, false) => KiPinStyle::Inverted,
        (false, true) => KiPinStyle::Clock,
        (false, false) => KiPinStyle::Line,
    }
}

/// The pin length is the magnitude of the last horizontal segment of the
/// folded pin path, e.g. `M0,0h-20` is 20 units long.
fn pin_length(path: &str) -> Option<f32> {
    let tail = path.rsplit('h').next()?;
    if tail.len() == path.len() {
        return None;
    }
    tail.trim().parse::<f32>().ok().map(f32::abs)
}

pub fn symbol_info(info: &EeSymbolInfo) -> KiSymbolInfo {
    KiSymbolInfo {
        name: info.name.clone(),
        // The placeholder wildcard of an unannotated reference is stripped.
        prefix: info.prefix.replace('?', ""),
        package: info.package.clone(),
        manufacturer: info.manufacturer.clone(),
        datasheet: info.datasheet.clone(),
        lcsc_id: info.lcsc_id.clone(),
        jlc_id: info.jlc_id.clone(),
        y_low: 0.0,
        y_high: 0.0,
    }
}

/// Converts an EasyEDA symbol to a KiCad symbol. Coordinates are re-based on
/// the bounding-box origin, converted to millimeters and Y-inverted.
pub fn convert_symbol(ee_symbol: EeSymbol) -> KiSymbol {
    let bbox = ee_symbol.bbox;
    let tx = |x: f32| to_mm(x - bbox.x);
    let ty = |y: f32| geometry::scrub_zero(-to_mm(y - bbox.y));

    let mut symbol = KiSymbol {
        info: symbol_info(&ee_symbol.info),
        ..KiSymbol::default()
    };

    for ee_pin in ee_symbol.pins {
        let Some(length) = pin_length(&ee_pin.path.path) else {
            log::warn!(
                "Dropping pin {}: path '{}' has no length segment",
                ee_pin.settings.id,
                ee_pin.path.path
            );
            continue;
        };
        symbol.pins.push(KiSymbolPin {
            name: ee_pin.name.text.replace(' ', ""),
            number: ee_pin.settings.spice_number.replace(' ', ""),
            style: pin_style(&ee_pin),
            pin_type: map_pin_type(ee_pin.settings.pin_type),
            length: to_mm(length),
            pos_x: tx(ee_pin.settings.pos_x),
            pos_y: ty(ee_pin.settings.pos_y),
            orientation: ee_pin.settings.rotation,
        });
    }

    for ee_rect in ee_symbol.rectangles {
        let start = (tx(ee_rect.pos_x), ty(ee_rect.pos_y));
        symbol.rectangles.push(KiSymbolRectangle {
            start,
            end: (start.0 + to_mm(ee_rect.width), start.1 - to_mm(ee_rect.height)),
            filled: ee_rect.filled,
        });
    }

    for ee_circle in ee_symbol.circles {
        symbol.circles.push(KiSymbolCircle {
            center: (tx(ee_circle.center_x), ty(ee_circle.center_y)),
            radius: to_mm(ee_circle.radius),
            filled: ee_circle.filled,
        });
    }

    // The destination format has no ellipse primitive; the degenerate
    // equal-radius case becomes a circle, the rest are dropped.
    for ee_ellipse in ee_symbol.ellipses {
        if ee_ellipse.radius_x != ee_ellipse.radius_y {
            log::warn!(
                "Dropping ellipse {}: unequal radii {} x {}",
                ee_ellipse.id,
                ee_ellipse.radius_x,
                ee_ellipse.radius_y
            );
            continue;
        }
        symbol.circles.push(KiSymbolCircle {
            center: (tx(ee_ellipse.center_x), ty(ee_ellipse.center_y)),
            radius: to_mm(ee_ellipse.radius_x),
            filled: ee_ellipse.filled,
        });
    }

    // Same rule for arcs: only circular ones are representable.
    for ee_arc in ee_symbol.arcs {
        if ee_arc.radius_x != ee_arc.radius_y {
            log::warn!(
                "Dropping arc {}: unequal radii {} x {}",
                ee_arc.id,
                ee_arc.radius_x,
                ee_arc.radius_y
            );
            continue;
        }
        let Some((start, mid, end)) = geometry::arc_three_points(
            Vec2::new(ee_arc.start.0, ee_arc.start.1),
            Vec2::new(ee_arc.end.0, ee_arc.end.1),
            ee_arc.radius_x,
            ee_arc.large_arc,
            ee_arc.sweep,
        ) else {
            log::warn!("Dropping arc {}: degenerate geometry", ee_arc.id);
            continue;
        };
        symbol.arcs.push(KiSymbolArc {
            start: (tx(start.x), ty(start.y)),
            mid: (tx(mid.x), ty(mid.y)),
            end: (tx(end.x), ty(end.y)),
        });
    }

    for ee_polyline in ee_symbol.polylines {
        let closed = ee_polyline.filled;
        symbol.polygons.push(convert_point_list(ee_polyline, closed, tx, ty));
    }
    for ee_polygon in ee_symbol.polygons {
        symbol.polygons.push(convert_point_list(ee_polygon, true, tx, ty));
    }

    if !ee_symbol.paths.is_empty() {
        log::warn!(
            "Dropping {} path record(s): the destination symbol format has no path primitive",
            ee_symbol.paths.len()
        );
    }

    // Pin vertical extent, used to place the property block.
    symbol.info.y_low = symbol
        .pins
        .iter()
        .map(|p| p.pos_y)
        .fold(f32::INFINITY, f32::min);
    symbol.info.y_high = symbol
        .pins
        .iter()
        .map(|p| p.pos_y)
        .fold(f32::NEG_INFINITY, f32::max);
    if symbol.pins.is_empty() {
        symbol.info.y_low = 0.0;
        symbol.info.y_high = 0.0;
    }

    symbol
}

fn convert_point_list(
    ee_polyline: EeSymbolPolyline,
    closed: bool,
    tx: impl Fn(f32) -> f32,
    ty: impl Fn(f32) -> f32,
) -> KiSymbolPolygon {
    KiSymbolPolygon {
        points: ee_polyline
            .points
            .iter()
            .map(|(x, y)| (tx(*x), ty(*y)))
            .collect(),
        closed,
    }
}

// ---------------- footprint ----------------

/// Maps EasyEDA layer IDs to KiCad layer names.
fn map_layer(layer_id: i32) -> &'static str {
    match layer_id {
        1 => "F.Cu",
        2 => "B.Cu",
        3 => "F.SilkS",
        4 => "B.SilkS",
        5 => "F.Paste",
        6 => "B.Paste",
        7 => "F.Mask",
        8 => "B.Mask",
        10 | 11 => "Edge.Cuts",
        12 => "Cmts.User",
        13 => "F.Fab",
        14 => "B.Fab",
        15 => "Dwgs.User",
        _ => "F.SilkS",
    }
}

fn pad_layers(layer_id: i32, through_hole: bool) -> Vec<String> {
    let names: &[&str] = if through_hole {
        &["*.Cu", "*.Mask"]
    } else if layer_id == 2 {
        &["B.Cu", "B.Paste", "B.Mask"]
    } else {
        &["F.Cu", "F.Paste", "F.Mask"]
    };
    names.iter().map(|n| n.to_string()).collect()
}

fn map_pad_shape(shape: EePadShape) -> FpShape {
    match shape {
        EePadShape::Rect => FpShape::Rect,
        EePadShape::Ellipse => FpShape::Circle,
        EePadShape::Oval => FpShape::Oval,
        EePadShape::Polygon => FpShape::Custom,
    }
}

fn convert_pad(ee_pad: EeFootprintPad) -> FpPad {
    let through_hole = ee_pad.hole_radius > 0.0;
    let mut shape = map_pad_shape(ee_pad.shape);
    let mut size = (to_mm(ee_pad.width), to_mm(ee_pad.height));
    let mut rotation = ee_pad.rotation;
    let mut polygon = Vec::new();

    if shape == FpShape::Custom {
        if ee_pad.points.len() >= 2 {
            // A custom pad is a minimal anchor carrying the outline as
            // offsets from the pad center; the points are absolute, so the
            // rotation must not be applied twice.
            polygon = ee_pad
                .points
                .iter()
                .map(|(x, y)| (to_mm(x - ee_pad.center_x), to_mm(y - ee_pad.center_y)))
                .collect();
            size = (0.005, 0.005);
            rotation = 0.0;
        } else {
            log::warn!(
                "Polygon pad {} has a malformed point list; reverting to rect",
                ee_pad.number
            );
            shape = FpShape::Rect;
        }
    }

    let mut drill = None;
    let mut drill_oval = None;
    if through_hole {
        let diameter = to_mm(ee_pad.hole_radius * 2.0);
        if ee_pad.hole_length > 0.0 {
            drill_oval = Some((diameter, to_mm(ee_pad.hole_length)));
        } else {
            drill = Some(diameter);
        }
    }

    FpPad {
        number: ee_pad.number,
        pad_type: if through_hole { "thru_hole" } else { "smd" }.to_string(),
        shape,
        pos: (to_mm(ee_pad.center_x), to_mm(ee_pad.center_y)),
        size,
        layers: pad_layers(ee_pad.layer_id, through_hole),
        rotation,
        drill,
        drill_oval,
        polygon,
    }
}

/// Converts an EasyEDA footprint to a KiCad footprint. Coordinates were
/// already re-based on the bounding-box origin by the importer; only the
/// unit conversion happens here (the footprint Y axis is not inverted).
pub fn convert_footprint(ee_footprint: EeFootprint, model_3d: Option<Ki3dModel>) -> KiFootprint {
    let mut footprint = KiFootprint {
        name: sanitize_filename(&ee_footprint.info.name),
        is_smd: ee_footprint.info.is_smd,
        model_3d,
        ..KiFootprint::default()
    };

    for ee_pad in ee_footprint.pads {
        footprint.pads.push(convert_pad(ee_pad));
    }

    for ee_track in ee_footprint.tracks {
        let layer = map_layer(ee_track.layer_id).to_string();
        for segment in ee_track.points.windows(2) {
            footprint.lines.push(FpLine {
                start: (to_mm(segment[0].0), to_mm(segment[0].1)),
                end: (to_mm(segment[1].0), to_mm(segment[1].1)),
                width: to_mm(ee_track.stroke_width),
                layer: layer.clone(),
            });
        }
    }

    for ee_circle in ee_footprint.circles {
        footprint.circles.push(FpCircle {
            center: (to_mm(ee_circle.center_x), to_mm(ee_circle.center_y)),
            radius: to_mm(ee_circle.radius),
            width: to_mm(ee_circle.stroke_width),
            layer: map_layer(ee_circle.layer_id).to_string(),
        });
    }

    for ee_text in ee_footprint.texts {
        // Value and reference records are superseded by the canonical lines
        // the serializer always emits.
        if ee_text.kind == "P" || ee_text.kind == "N" {
            continue;
        }
        footprint.texts.push(FpText {
            text: ee_text.text,
            pos: (to_mm(ee_text.center_x), to_mm(ee_text.center_y)),
            rotation: ee_text.rotation,
            size: to_mm(ee_text.font_size),
            layer: map_layer(ee_text.layer_id).to_string(),
        });
    }

    for ee_hole in ee_footprint.holes {
        let diameter = to_mm(ee_hole.radius * 2.0);
        footprint.pads.push(FpPad {
            number: String::new(),
            pad_type: "np_thru_hole".to_string(),
            shape: FpShape::Circle,
            pos: (to_mm(ee_hole.center_x), to_mm(ee_hole.center_y)),
            size: (diameter, diameter),
            layers: pad_layers(0, true),
            rotation: 0.0,
            drill: Some(diameter),
            drill_oval: None,
            polygon: Vec::new(),
        });
    }

    footprint
}

// ---------------- 3D model ----------------

/// Converts an EasyEDA 3D model (raw OBJ mesh plus placement data) into a
/// KiCad 3D model with VRML mesh data and destination-space placement.
pub fn convert_3d_model(
    ee_model: Ee3dModel,
    origin_x: f32,
    origin_y: f32,
    name: String,
    path: String,
) -> Ki3dModel {
    let wrl_data = ee_model.obj_data.as_deref().map(obj_to_wrl);
    Ki3dModel {
        name,
        path,
        wrl_data,
        step_data: ee_model.step_data,
        offset: geometry::model_offset(ee_model.transform.translation, origin_x, origin_y),
        scale: ee_model.transform.scale,
        rotate: geometry::model_rotation(ee_model.transform.rotation),
    }
}

/// Minimal OBJ-to-VRML mesh conversion: vertices and faces only, materials
/// and normals are ignored.
fn obj_to_wrl(obj_data: &str) -> String {
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();

    for line in obj_data.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.first() {
            Some(&"v") if parts.len() >= 4 => {
                let x: f32 = parts[1].parse().unwrap_or(0.0);
                let y: f32 = parts[2].parse().unwrap_or(0.0);
                let z: f32 = parts[3].parse().unwrap_or(0.0);
                // The source mesh is in tenth-of-inch units.
                vertices.push(Vec3::new(x, y, z) * 2.54);
            }
            Some(&"f") if parts.len() >= 4 => {
                // OBJ faces are 1-indexed and may carry //normal suffixes.
                let indices: Vec<usize> = parts[1..]
                    .iter()
                    .map(|p| {
                        p.split('/')
                            .next()
                            .unwrap_or("1")
                            .parse::<usize>()
                            .unwrap_or(1)
                            .saturating_sub(1)
                    })
                    .collect();
                faces.push(indices);
            }
            _ => {}
        }
    }

    let mut wrl = String::from("#VRML V2.0 utf8\n");
    wrl.push_str("Shape {\n");
    wrl.push_str("  appearance Appearance {\n");
    wrl.push_str("    material Material { diffuseColor 0.5 0.5 0.5 }\n");
    wrl.push_str("  }\n");
    wrl.push_str("  geometry IndexedFaceSet {\n");
    wrl.push_str("    coord Coordinate {\n");
    wrl.push_str("      point [\n");
    for v in &vertices {
        wrl.push_str(&format!("        {:.4} {:.4} {:.4},\n", v.x, v.y, v.z));
    }
    wrl.push_str("      ]\n");
    wrl.push_str("    }\n");
    wrl.push_str("    coordIndex [\n");
    for face in &faces {
        let indices = face
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        wrl.push_str(&format!("      {}, -1,\n", indices));
    }
    wrl.push_str("    ]\n");
    wrl.push_str("  }\n");
    wrl.push_str("}\n");
    wrl
}
