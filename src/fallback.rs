// src/fallback.rs
//
// Synthesizes a generic rectangular symbol when a component has no usable
// symbol geometry. Pin numbers come from the real footprint pads when
// available so the symbol stays traceable to the board; sequential numbers
// are a last resort.

use crate::kicad_models::{
    KiPinStyle, KiPinType, KiSymbol, KiSymbolInfo, KiSymbolPin, KiSymbolRectangle, PIN_LENGTH,
    PIN_SPACING,
};
use regex::Regex;
use serde_json::Value;

const EDGE_MARGIN: f32 = 2.54;
const DEFAULT_PIN_COUNT: usize = 8;

/// Extracts a pin count from a package name such as `QFP-100`,
/// `LQFN-56_L7.0-W7.0` or `8pin`.
pub fn pin_count_from_package(package: &str) -> Option<usize> {
    let suffix = Regex::new(r"-(\d+)(?:_|$)").expect("static pattern");
    if let Some(caps) = suffix.captures(package) {
        return caps[1].parse().ok();
    }
    let pin_word = Regex::new(r"(\d+)[-_]?(?:pin|Pin|PIN)").expect("static pattern");
    pin_word
        .captures(package)
        .and_then(|caps| caps[1].parse().ok())
}

/// Scans the raw footprint payload for PAD records and collects their pad
/// numbers in order. A light scan on purpose: the fallback path must work
/// even when full footprint decoding failed.
pub fn pad_numbers_from_cad_data(cad_data: &Value) -> Vec<String> {
    let data_str = &cad_data["packageDetail"]["dataStr"];
    let parsed;
    let data_str = match data_str {
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(v) => {
                parsed = v;
                &parsed
            }
            Err(_) => return Vec::new(),
        },
        other => other,
    };

    let mut numbers = Vec::new();
    if let Some(shapes) = data_str["shape"].as_array() {
        for shape in shapes.iter().filter_map(|s| s.as_str()) {
            let parts: Vec<&str> = shape.split('~').collect();
            if parts.first() == Some(&"PAD") && parts.len() > 8 && !parts[8].is_empty() {
                numbers.push(parts[8].to_string());
            }
        }
    }
    numbers
}

struct SideCounts {
    left: usize,
    right: usize,
    top: usize,
    bottom: usize,
}

/// Distributes `n` pins over the body sides. Up to eight pins use a
/// dual-inline split; larger counts give the top and bottom rows ten percent
/// each, the rest splitting left/right with the odd pin on the left.
fn side_counts(n: usize) -> SideCounts {
    if n <= DEFAULT_PIN_COUNT {
        let left = n.div_ceil(2);
        SideCounts {
            left,
            right: n - left,
            top: 0,
            bottom: 0,
        }
    } else {
        let horizontal = (n / 10).max(2);
        let vertical = n - 2 * horizontal;
        let right = vertical / 2;
        SideCounts {
            left: vertical - right,
            right,
            top: horizontal,
            bottom: horizontal,
        }
    }
}

/// Builds the fallback symbol. `pad_numbers`, when non-empty, are used
/// verbatim as pin numbers; otherwise the count is resolved from the package
/// name and sequential numbers are generated.
pub fn synthesize_symbol(mut info: KiSymbolInfo, pad_numbers: Vec<String>) -> KiSymbol {
    let pad_numbers = if pad_numbers.is_empty() {
        let count = match pin_count_from_package(&info.package) {
            Some(count) if count > 0 => count,
            _ => {
                log::warn!(
                    "Could not determine pin count for {}; using {} pins",
                    info.name,
                    DEFAULT_PIN_COUNT
                );
                DEFAULT_PIN_COUNT
            }
        };
        log::info!(
            "Synthesizing fallback symbol for {} with {} sequential pins",
            info.name,
            count
        );
        (1..=count).map(|i| i.to_string()).collect()
    } else {
        log::info!(
            "Synthesizing fallback symbol for {} with {} pins from footprint pads",
            info.name,
            pad_numbers.len()
        );
        pad_numbers
    };

    let n = pad_numbers.len();
    let sides = side_counts(n);

    let mut height = (sides.left as f32 * PIN_SPACING + 10.16).max(10.16);
    let mut width = (sides.top as f32 * PIN_SPACING + 10.16).max(12.7);
    if n > 50 {
        // Large pin counts keep the body from collapsing into a sliver.
        let min_dim = height.max(width) * 0.5;
        height = height.max(min_dim);
        width = width.max(min_dim);
    }

    let mut pins = Vec::with_capacity(n);
    let mut numbers = pad_numbers.into_iter();
    let mut place = |count: usize, orientation: i32, position: &dyn Fn(usize) -> (f32, f32)| {
        for i in 0..count {
            let Some(number) = numbers.next() else {
                return;
            };
            let (pos_x, pos_y) = position(i);
            pins.push(KiSymbolPin {
                name: format!("Pin_{}", number),
                number,
                style: KiPinStyle::Line,
                pin_type: KiPinType::Passive,
                length: PIN_LENGTH,
                pos_x,
                pos_y,
                orientation,
            });
        }
    };

    if n <= DEFAULT_PIN_COUNT {
        let ladder = move |i: usize| height / 2.0 - (i + 1) as f32 * PIN_SPACING - EDGE_MARGIN;
        place(sides.left, 180, &|i| (-width / 2.0 - EDGE_MARGIN, ladder(i)));
        place(sides.right, 0, &|i| (width / 2.0 + EDGE_MARGIN, ladder(i)));
    } else {
        let start_y = (((sides.left - 1) as f32 * PIN_SPACING) / 2.0).min(height / 2.0 - 5.08);
        let row_start = |count: usize| -((((count.max(1) - 1) as f32 * PIN_SPACING) / 2.0)
            .min(width / 2.0 - 5.08));
        let bottom_x0 = row_start(sides.bottom);
        let top_x0 = row_start(sides.top);
        // Sides are filled left, bottom, right, top, so the top row takes
        // the last pad numbers.
        place(sides.left, 180, &|i| {
            (-width / 2.0 - EDGE_MARGIN, start_y - i as f32 * PIN_SPACING)
        });
        place(sides.bottom, 270, &|i| {
            (bottom_x0 + i as f32 * PIN_SPACING, -height / 2.0 - EDGE_MARGIN)
        });
        place(sides.right, 0, &|i| {
            (width / 2.0 + EDGE_MARGIN, start_y - i as f32 * PIN_SPACING)
        });
        place(sides.top, 90, &|i| {
            (top_x0 + i as f32 * PIN_SPACING, height / 2.0 + EDGE_MARGIN)
        });
    }

    info.y_low = -height / 2.0;
    info.y_high = height / 2.0;

    KiSymbol {
        info,
        pins,
        rectangles: vec![KiSymbolRectangle {
            start: (-width / 2.0, height / 2.0),
            end: (width / 2.0, -height / 2.0),
            filled: true,
        }],
        ..KiSymbol::default()
    }
}
