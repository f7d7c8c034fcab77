// Typed EasyEDA source structures. Each struct mirrors one delimiter-packed
// record type; field order is fixed by the decoders in `importer`.

use bytes::Bytes;
use glam::Vec3;

/// A shape record the decoder dropped, with the reason it was dropped.
/// One bad record never aborts decoding of its siblings.
#[derive(Debug, Clone)]
pub struct Skip {
    pub tag: String,
    pub reason: String,
}

impl Skip {
    pub fn new(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Skip {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EePinType {
    Unspecified,
    Input,
    Output,
    Bidirectional,
    Power,
}

impl EePinType {
    /// Unrecognized electrical-type codes default to `Unspecified`.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => EePinType::Input,
            "2" => EePinType::Output,
            "3" => EePinType::Bidirectional,
            "4" => EePinType::Power,
            _ => EePinType::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EeSymbolBbox {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default)]
pub struct EeSymbolInfo {
    pub name: String,
    pub prefix: String,
    pub package: String,
    pub manufacturer: String,
    pub datasheet: String,
    pub lcsc_id: String,
    pub jlc_id: String,
}

// ---------------- pin ----------------
// A pin record is one string split into caret-delimited groups: settings,
// start dot, path, display name, reserved, inversion dot, clock indicator.

#[derive(Debug, Clone)]
pub struct EeSymbolPinSettings {
    pub is_displayed: bool,
    pub pin_type: EePinType,
    pub spice_number: String,
    pub pos_x: f32,
    pub pos_y: f32,
    pub rotation: i32,
    pub id: String,
    pub is_locked: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct EeSymbolPinDot {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub struct EeSymbolPinPath {
    pub path: String,
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct EeSymbolPinName {
    pub is_displayed: bool,
    pub pos_x: f32,
    pub pos_y: f32,
    pub rotation: i32,
    pub text: String,
    pub anchor: String,
    pub font: String,
    pub font_size: f32,
}

#[derive(Debug, Clone)]
pub struct EeSymbolPinDotBis {
    pub is_displayed: bool,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub struct EeSymbolPinClock {
    pub is_displayed: bool,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct EeSymbolPin {
    pub settings: EeSymbolPinSettings,
    pub dot: EeSymbolPinDot,
    pub path: EeSymbolPinPath,
    pub name: EeSymbolPinName,
    pub dot_bis: EeSymbolPinDotBis,
    pub clock: EeSymbolPinClock,
}

// ---------------- symbol graphics ----------------

#[derive(Debug, Clone)]
pub struct EeSymbolRectangle {
    pub pos_x: f32,
    pub pos_y: f32,
    pub width: f32,
    pub height: f32,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub stroke_style: String,
    pub filled: bool,
    pub id: String,
    pub is_locked: bool,
}

#[derive(Debug, Clone)]
pub struct EeSymbolCircle {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub filled: bool,
    pub id: String,
    pub is_locked: bool,
}

#[derive(Debug, Clone)]
pub struct EeSymbolEllipse {
    pub center_x: f32,
    pub center_y: f32,
    pub radius_x: f32,
    pub radius_y: f32,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub filled: bool,
    pub id: String,
    pub is_locked: bool,
}

/// Arc path decoded from `M sx sy A rx ry xrot laf sf ex ey`.
#[derive(Debug, Clone)]
pub struct EeSymbolArc {
    pub start: (f32, f32),
    pub end: (f32, f32),
    pub radius_x: f32,
    pub radius_y: f32,
    pub large_arc: bool,
    pub sweep: bool,
    pub filled: bool,
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct EeSymbolPolyline {
    pub points: Vec<(f32, f32)>,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub filled: bool,
    pub id: String,
    pub is_locked: bool,
}

#[derive(Debug, Clone)]
pub struct EeSymbolPath {
    pub paths: String,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub filled: bool,
    pub id: String,
}

#[derive(Debug, Clone, Default)]
pub struct EeSymbol {
    pub info: EeSymbolInfo,
    pub bbox: EeSymbolBbox,
    pub pins: Vec<EeSymbolPin>,
    pub rectangles: Vec<EeSymbolRectangle>,
    pub circles: Vec<EeSymbolCircle>,
    pub ellipses: Vec<EeSymbolEllipse>,
    pub arcs: Vec<EeSymbolArc>,
    pub polylines: Vec<EeSymbolPolyline>,
    pub polygons: Vec<EeSymbolPolyline>,
    pub paths: Vec<EeSymbolPath>,
    pub skipped: Vec<Skip>,
}

impl EeSymbol {
    /// A symbol with no pins and no drawable body triggers the fallback
    /// synthesizer instead of exporting an empty record.
    pub fn has_drawable_content(&self) -> bool {
        !(self.pins.is_empty()
            && self.rectangles.is_empty()
            && self.circles.is_empty()
            && self.polylines.is_empty()
            && self.polygons.is_empty())
    }
}

// ---------------- footprint ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EePadShape {
    Rect,
    Ellipse,
    Oval,
    Polygon,
}

impl EePadShape {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "ELLIPSE" => EePadShape::Ellipse,
            "OVAL" => EePadShape::Oval,
            "POLYGON" => EePadShape::Polygon,
            _ => EePadShape::Rect,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EeFootprintInfo {
    pub name: String,
    pub is_smd: bool,
    pub bbox_x: f32,
    pub bbox_y: f32,
}

#[derive(Debug, Clone)]
pub struct EeFootprintPad {
    pub shape: EePadShape,
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    pub layer_id: i32,
    pub net: String,
    pub number: String,
    pub hole_radius: f32,
    pub hole_length: f32,
    pub points: Vec<(f32, f32)>,
    pub rotation: f32,
}

#[derive(Debug, Clone)]
pub struct EeFootprintTrack {
    pub stroke_width: f32,
    pub layer_id: i32,
    pub points: Vec<(f32, f32)>,
}

#[derive(Debug, Clone)]
pub struct EeFootprintCircle {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
    pub stroke_width: f32,
    pub layer_id: i32,
}

#[derive(Debug, Clone)]
pub struct EeFootprintText {
    pub kind: String,
    pub center_x: f32,
    pub center_y: f32,
    pub stroke_width: f32,
    pub rotation: f32,
    pub layer_id: i32,
    pub font_size: f32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct EeFootprintHole {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Default)]
pub struct EeFootprint {
    pub info: EeFootprintInfo,
    pub pads: Vec<EeFootprintPad>,
    pub tracks: Vec<EeFootprintTrack>,
    pub circles: Vec<EeFootprintCircle>,
    pub texts: Vec<EeFootprintText>,
    pub holes: Vec<EeFootprintHole>,
    /// Raw record strings, retained so the 3D-model reference can be looked
    /// up afterwards without re-parsing the whole shape list.
    pub raw_shapes: Vec<String>,
    pub skipped: Vec<Skip>,
}

// ---------------- 3D model ----------------

#[derive(Debug, Clone)]
pub struct EeModelTransform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for EeModelTransform {
    fn default() -> Self {
        EeModelTransform {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Fetched on demand during footprint conversion and folded into the
/// footprint export; never persisted on its own.
#[derive(Debug, Clone)]
pub struct Ee3dModel {
    pub uuid: String,
    pub title: String,
    pub obj_data: Option<String>,
    pub step_data: Option<Bytes>,
    pub transform: EeModelTransform,
}
