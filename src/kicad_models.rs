// src/kicad_models.rs
//
// Destination-side structures and their s-expression serialization.
// Symbol coordinates are rendered at two decimals, footprint coordinates at
// three, 3D placement triplets at four.

use bytes::Bytes;
use glam::Vec3;
use std::fmt::Write;

// Export layout constants (dimensions in mm).
pub const PIN_LENGTH: f32 = 2.54;
pub const PIN_SPACING: f32 = 2.54;
pub const PIN_NAME_SIZE: f32 = 1.27;
pub const PIN_NUM_SIZE: f32 = 1.27;
pub const BOX_LINE_WIDTH: f32 = 0.254;
pub const PROPERTY_FONT_SIZE: f32 = 1.27;
pub const FIELD_OFFSET_START: f32 = 5.08;
pub const FIELD_OFFSET_INCREMENT: f32 = 2.54;

/// Library identifier derived from the component name.
pub fn symbol_id(name: &str) -> String {
    name.replace(' ', "_").replace('/', "_")
}

/// Component name made safe for use as a file name.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Active-low names ending in `#` render with a KiCad overline.
fn apply_text_style(text: &str) -> String {
    match text.strip_suffix('#') {
        Some(base) => format!("~{{{}}}", base),
        None => text.to_string(),
    }
}

pub fn apply_pin_name_style(pin_name: &str) -> String {
    pin_name
        .split('/')
        .map(apply_text_style)
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------- symbol ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KiPinType {
    Input,
    Output,
    Bidirectional,
    PowerIn,
    Passive,
    Unspecified,
}

impl KiPinType {
    pub fn keyword(self) -> &'static str {
        match self {
            KiPinType::Input => "input",
            KiPinType::Output => "output",
            KiPinType::Bidirectional => "bidirectional",
            KiPinType::PowerIn => "power_in",
            KiPinType::Passive => "passive",
            KiPinType::Unspecified => "unspecified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KiPinStyle {
    Line,
    Inverted,
    Clock,
    InvertedClock,
}

impl KiPinStyle {
    pub fn keyword(self) -> &'static str {
        match self {
            KiPinStyle::Line => "line",
            KiPinStyle::Inverted => "inverted",
            KiPinStyle::Clock => "clock",
            KiPinStyle::InvertedClock => "inverted_clock",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KiSymbolInfo {
    pub name: String,
    pub prefix: String,
    pub package: String,
    pub manufacturer: String,
    pub datasheet: String,
    pub lcsc_id: String,
    pub jlc_id: String,
    /// Pin vertical extent, used to place the property block clear of the
    /// body.
    pub y_low: f32,
    pub y_high: f32,
}

#[derive(Debug, Clone)]
pub struct KiSymbolPin {
    pub name: String,
    pub number: String,
    pub style: KiPinStyle,
    pub pin_type: KiPinType,
    pub length: f32,
    pub pos_x: f32,
    pub pos_y: f32,
    /// Source-convention orientation; the serializer applies the 180 degree
    /// phase shift.
    pub orientation: i32,
}

#[derive(Debug, Clone)]
pub struct KiSymbolRectangle {
    pub start: (f32, f32),
    pub end: (f32, f32),
    pub filled: bool,
}

#[derive(Debug, Clone)]
pub struct KiSymbolCircle {
    pub center: (f32, f32),
    pub radius: f32,
    pub filled: bool,
}

#[derive(Debug, Clone)]
pub struct KiSymbolArc {
    pub start: (f32, f32),
    pub mid: (f32, f32),
    pub end: (f32, f32),
}

#[derive(Debug, Clone)]
pub struct KiSymbolPolygon {
    pub points: Vec<(f32, f32)>,
    pub closed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct KiSymbol {
    pub info: KiSymbolInfo,
    pub pins: Vec<KiSymbolPin>,
    pub rectangles: Vec<KiSymbolRectangle>,
    pub circles: Vec<KiSymbolCircle>,
    pub arcs: Vec<KiSymbolArc>,
    pub polygons: Vec<KiSymbolPolygon>,
}

fn fill_keyword(filled: bool) -> &'static str {
    if filled { "background" } else { "none" }
}

impl KiSymbol {
    /// Serializes the symbol as one named record for a `.kicad_sym` library.
    /// Properties come first, then graphic primitives, then pins.
    pub fn to_library_record(&self) -> String {
        let id = symbol_id(&self.info.name);
        let mut out = String::new();
        writeln!(out, "  (symbol \"{}\"", id).unwrap();
        writeln!(out, "    (in_bom yes)").unwrap();
        writeln!(out, "    (on_board yes)").unwrap();
        self.write_properties(&mut out);
        writeln!(out, "    (symbol \"{}_0_1\"", id).unwrap();
        for rect in &self.rectangles {
            writeln!(out, "      (rectangle").unwrap();
            writeln!(out, "        (start {:.2} {:.2})", rect.start.0, rect.start.1).unwrap();
            writeln!(out, "        (end {:.2} {:.2})", rect.end.0, rect.end.1).unwrap();
            writeln!(
                out,
                "        (stroke (width {}) (type default) (color 0 0 0 0))",
                BOX_LINE_WIDTH
            )
            .unwrap();
            writeln!(out, "        (fill (type {}))", fill_keyword(rect.filled)).unwrap();
            writeln!(out, "      )").unwrap();
        }
        for circle in &self.circles {
            writeln!(out, "      (circle").unwrap();
            writeln!(
                out,
                "        (center {:.2} {:.2})",
                circle.center.0, circle.center.1
            )
            .unwrap();
            writeln!(out, "        (radius {:.2})", circle.radius).unwrap();
            writeln!(
                out,
                "        (stroke (width {}) (type default) (color 0 0 0 0))",
                BOX_LINE_WIDTH
            )
            .unwrap();
            writeln!(out, "        (fill (type {}))", fill_keyword(circle.filled)).unwrap();
            writeln!(out, "      )").unwrap();
        }
        for arc in &self.arcs {
            writeln!(out, "      (arc").unwrap();
            writeln!(out, "        (start {:.2} {:.2})", arc.start.0, arc.start.1).unwrap();
            writeln!(out, "        (mid {:.2} {:.2})", arc.mid.0, arc.mid.1).unwrap();
            writeln!(out, "        (end {:.2} {:.2})", arc.end.0, arc.end.1).unwrap();
            writeln!(
                out,
                "        (stroke (width {}) (type default) (color 0 0 0 0))",
                BOX_LINE_WIDTH
            )
            .unwrap();
            writeln!(out, "        (fill (type none))").unwrap();
            writeln!(out, "      )").unwrap();
        }
        for polygon in &self.polygons {
            writeln!(out, "      (polyline").unwrap();
            write!(out, "        (pts").unwrap();
            for (x, y) in &polygon.points {
                write!(out, " (xy {:.2} {:.2})", x, y).unwrap();
            }
            writeln!(out, ")").unwrap();
            writeln!(
                out,
                "        (stroke (width {}) (type default) (color 0 0 0 0))",
                BOX_LINE_WIDTH
            )
            .unwrap();
            writeln!(out, "        (fill (type {}))", fill_keyword(polygon.closed)).unwrap();
            writeln!(out, "      )").unwrap();
        }
        for pin in &self.pins {
            writeln!(
                out,
                "      (pin {} {}",
                pin.pin_type.keyword(),
                pin.style.keyword()
            )
            .unwrap();
            writeln!(
                out,
                "        (at {:.2} {:.2} {})",
                pin.pos_x,
                pin.pos_y,
                crate::geometry::pin_angle(pin.orientation)
            )
            .unwrap();
            writeln!(out, "        (length {:.2})", pin.length).unwrap();
            writeln!(
                out,
                "        (name \"{}\" (effects (font (size {} {}))))",
                apply_pin_name_style(&pin.name),
                PIN_NAME_SIZE,
                PIN_NAME_SIZE
            )
            .unwrap();
            writeln!(
                out,
                "        (number \"{}\" (effects (font (size {} {}))))",
                pin.number, PIN_NUM_SIZE, PIN_NUM_SIZE
            )
            .unwrap();
            writeln!(out, "      )").unwrap();
        }
        writeln!(out, "    )").unwrap();
        writeln!(out, "  )").unwrap();
        out
    }

    fn write_properties(&self, out: &mut String) {
        let info = &self.info;
        write_property(
            out,
            "Reference",
            &info.prefix,
            0,
            info.y_high + FIELD_OFFSET_START,
            false,
        );
        write_property(
            out,
            "Value",
            &info.name,
            1,
            info.y_low - FIELD_OFFSET_START,
            false,
        );
        let mut offset = FIELD_OFFSET_START;
        let mut optional = |out: &mut String, key: &str, value: &str, id: u32| {
            if !value.is_empty() {
                offset += FIELD_OFFSET_INCREMENT;
                write_property(out, key, value, id, info.y_low - offset, true);
            }
        };
        optional(out, "Footprint", &info.package, 2);
        optional(out, "Datasheet", &info.datasheet, 3);
        optional(out, "LCSC", &info.lcsc_id, 4);
        optional(out, "Manufacturer", &info.manufacturer, 5);
        optional(out, "JLC Part", &info.jlc_id, 6);
    }
}

fn write_property(out: &mut String, key: &str, value: &str, id: u32, pos_y: f32, hide: bool) {
    writeln!(out, "    (property \"{}\" \"{}\"", key, value).unwrap();
    writeln!(out, "      (id {})", id).unwrap();
    writeln!(out, "      (at 0 {:.2} 0)", pos_y).unwrap();
    writeln!(
        out,
        "      (effects (font (size {} {})){})",
        PROPERTY_FONT_SIZE,
        PROPERTY_FONT_SIZE,
        if hide { " hide" } else { "" }
    )
    .unwrap();
    writeln!(out, "    )").unwrap();
}

// ---------------- footprint ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpShape {
    Rect,
    Circle,
    Oval,
    Custom,
}

impl FpShape {
    pub fn keyword(self) -> &'static str {
        match self {
            FpShape::Rect => "rect",
            FpShape::Circle => "circle",
            FpShape::Oval => "oval",
            FpShape::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FpPad {
    pub number: String,
    /// "smd", "thru_hole" or "np_thru_hole".
    pub pad_type: String,
    pub shape: FpShape,
    pub pos: (f32, f32),
    pub size: (f32, f32),
    pub layers: Vec<String>,
    pub rotation: f32,
    pub drill: Option<f32>,
    pub drill_oval: Option<(f32, f32)>,
    /// Offset points of a custom pad's polygon primitive, relative to the
    /// pad center.
    pub polygon: Vec<(f32, f32)>,
}

#[derive(Debug, Clone)]
pub struct FpLine {
    pub start: (f32, f32),
    pub end: (f32, f32),
    pub width: f32,
    pub layer: String,
}

#[derive(Debug, Clone)]
pub struct FpCircle {
    pub center: (f32, f32),
    pub radius: f32,
    pub width: f32,
    pub layer: String,
}

#[derive(Debug, Clone)]
pub struct FpText {
    pub text: String,
    pub pos: (f32, f32),
    pub rotation: f32,
    pub size: f32,
    pub layer: String,
}

/// Represents a 3D model in KiCad format: converted mesh and solid payloads
/// plus the placement triplets emitted in the footprint's model block.
#[derive(Debug, Clone)]
pub struct Ki3dModel {
    pub name: String,
    /// Directory reference the footprint's model block points at.
    pub path: String,
    pub wrl_data: Option<String>,
    pub step_data: Option<Bytes>,
    pub offset: Vec3,
    pub scale: Vec3,
    pub rotate: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct KiFootprint {
    pub name: String,
    pub is_smd: bool,
    pub pads: Vec<FpPad>,
    pub lines: Vec<FpLine>,
    pub circles: Vec<FpCircle>,
    pub texts: Vec<FpText>,
    pub model_3d: Option<Ki3dModel>,
}

impl KiFootprint {
    /// Generates the full s-expression content of a `.kicad_mod` file.
    pub fn to_mod_file(&self) -> String {
        let mut out = String::new();
        writeln!(out, "(footprint \"{}\"", self.name).unwrap();
        writeln!(out, "  (version 20211014)").unwrap();
        writeln!(out, "  (generator lcsc2kicad)").unwrap();
        writeln!(out, "  (layer \"F.Cu\")").unwrap();
        writeln!(
            out,
            "  (attr {})",
            if self.is_smd { "smd" } else { "through_hole" }
        )
        .unwrap();
        writeln!(
            out,
            "  (fp_text reference \"REF**\" (at 0 -3) (layer \"F.SilkS\")"
        )
        .unwrap();
        writeln!(out, "    (effects (font (size 1 1) (thickness 0.15)))").unwrap();
        writeln!(out, "  )").unwrap();
        writeln!(
            out,
            "  (fp_text value \"{}\" (at 0 3) (layer \"F.Fab\")",
            self.name
        )
        .unwrap();
        writeln!(out, "    (effects (font (size 1 1) (thickness 0.15)))").unwrap();
        writeln!(out, "  )").unwrap();

        for text in &self.texts {
            writeln!(out, "  (fp_text user \"{}\"", text.text).unwrap();
            writeln!(
                out,
                "    (at {:.3} {:.3} {:.1})",
                text.pos.0, text.pos.1, text.rotation
            )
            .unwrap();
            writeln!(out, "    (layer \"{}\")", text.layer).unwrap();
            writeln!(
                out,
                "    (effects (font (size {:.3} {:.3}) (thickness {:.3})))",
                text.size,
                text.size,
                text.size * 0.15
            )
            .unwrap();
            writeln!(out, "  )").unwrap();
        }

        for line in &self.lines {
            writeln!(out, "  (fp_line").unwrap();
            writeln!(out, "    (start {:.3} {:.3})", line.start.0, line.start.1).unwrap();
            writeln!(out, "    (end {:.3} {:.3})", line.end.0, line.end.1).unwrap();
            writeln!(out, "    (stroke (width {:.3}) (type solid))", line.width).unwrap();
            writeln!(out, "    (layer \"{}\")", line.layer).unwrap();
            writeln!(out, "  )").unwrap();
        }

        for circle in &self.circles {
            writeln!(out, "  (fp_circle").unwrap();
            writeln!(
                out,
                "    (center {:.3} {:.3})",
                circle.center.0, circle.center.1
            )
            .unwrap();
            writeln!(
                out,
                "    (end {:.3} {:.3})",
                circle.center.0 + circle.radius,
                circle.center.1
            )
            .unwrap();
            writeln!(out, "    (stroke (width {:.3}) (type solid))", circle.width).unwrap();
            writeln!(out, "    (fill none)").unwrap();
            writeln!(out, "    (layer \"{}\")", circle.layer).unwrap();
            writeln!(out, "  )").unwrap();
        }

        for pad in &self.pads {
            self.write_pad(&mut out, pad);
        }

        if let Some(model) = &self.model_3d {
            writeln!(out, "  (model \"{}/{}.wrl\"", model.path, model.name).unwrap();
            writeln!(
                out,
                "    (offset (xyz {:.4} {:.4} {:.4}))",
                model.offset.x, model.offset.y, model.offset.z
            )
            .unwrap();
            writeln!(
                out,
                "    (scale (xyz {:.4} {:.4} {:.4}))",
                model.scale.x, model.scale.y, model.scale.z
            )
            .unwrap();
            writeln!(
                out,
                "    (rotate (xyz {:.4} {:.4} {:.4}))",
                model.rotate.x, model.rotate.y, model.rotate.z
            )
            .unwrap();
            writeln!(out, "  )").unwrap();
        }

        writeln!(out, ")").unwrap();
        out
    }

    fn write_pad(&self, out: &mut String, pad: &FpPad) {
        writeln!(
            out,
            "  (pad \"{}\" {} {}",
            pad.number,
            pad.pad_type,
            pad.shape.keyword()
        )
        .unwrap();
        writeln!(
            out,
            "    (at {:.3} {:.3} {:.1})",
            pad.pos.0, pad.pos.1, pad.rotation
        )
        .unwrap();
        writeln!(out, "    (size {:.3} {:.3})", pad.size.0, pad.size.1).unwrap();
        let layers = pad
            .layers
            .iter()
            .map(|l| format!("\"{}\"", l))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "    (layers {})", layers).unwrap();
        if let Some((width, height)) = pad.drill_oval {
            writeln!(out, "    (drill oval {:.3} {:.3})", width, height).unwrap();
        } else if let Some(diameter) = pad.drill {
            writeln!(out, "    (drill {:.3})", diameter).unwrap();
        }
        if pad.shape == FpShape::Custom && !pad.polygon.is_empty() {
            writeln!(out, "    (zone_connect 2)").unwrap();
            writeln!(out, "    (options (clearance outline) (anchor rect))").unwrap();
            writeln!(out, "    (primitives").unwrap();
            writeln!(out, "      (gr_poly").unwrap();
            write!(out, "        (pts").unwrap();
            for (x, y) in &pad.polygon {
                write!(out, " (xy {:.3} {:.3})", x, y).unwrap();
            }
            writeln!(out, ")").unwrap();
            writeln!(out, "        (width 0.1)").unwrap();
            writeln!(out, "      )").unwrap();
            writeln!(out, "    )").unwrap();
        }
        writeln!(out, "  )").unwrap();
    }
}
