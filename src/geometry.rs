// src/geometry.rs

use glam::{Vec2, Vec3};

/// One EasyEDA grid unit is 10 mil; one mil is 0.0254 mm.
pub const EE_UNIT_TO_MM: f32 = 10.0 * 0.0254;

pub fn to_mm(value: f32) -> f32 {
    value * EE_UNIT_TO_MM
}

pub fn from_mm(value: f32) -> f32 {
    value / EE_UNIT_TO_MM
}

/// Axis inversion turns zero into negative zero, which would render as
/// `-0.00`; collapse it back to positive zero.
pub fn scrub_zero(value: f32) -> f32 {
    if value == 0.0 { 0.0 } else { value }
}

/// KiCad pins point into the symbol body while EasyEDA pins point out of it,
/// so every serialized pin orientation carries a 180 degree phase shift.
pub fn pin_angle(rotation: i32) -> i32 {
    (180 + rotation).rem_euclid(360)
}

/// Snaps a decoded rotation to the nearest cardinal value in [0, 360).
pub fn normalize_rotation(rotation: f32) -> i32 {
    let r = (rotation.round() as i32).rem_euclid(360);
    (((r + 45) / 90) * 90) % 360
}

/// 3D placement offset: translation re-based on the footprint origin, with
/// Y and Z inverted between the two coordinate systems. X is not inverted.
pub fn model_offset(translation: Vec3, origin_x: f32, origin_y: f32) -> Vec3 {
    Vec3::new(
        to_mm(translation.x - origin_x),
        scrub_zero(-to_mm(translation.y - origin_y)),
        scrub_zero(-to_mm(translation.z)),
    )
}

/// 3D placement rotation: each axis angle is complemented to correct the
/// handedness difference between the two coordinate systems.
pub fn model_rotation(rotation: Vec3) -> Vec3 {
    Vec3::new(
        complement_angle(rotation.x),
        complement_angle(rotation.y),
        complement_angle(rotation.z),
    )
}

fn complement_angle(angle: f32) -> f32 {
    (360.0 - angle).rem_euclid(360.0)
}

/// Evaluates a circular SVG arc segment (endpoint parameterization) into its
/// start, mid and end points, all in the source coordinate space. Returns
/// `None` for degenerate input (zero chord or non-positive radius).
pub fn arc_three_points(
    start: Vec2,
    end: Vec2,
    radius: f32,
    large_arc: bool,
    sweep: bool,
) -> Option<(Vec2, Vec2, Vec2)> {
    let half = (start - end) * 0.5;
    let d2 = half.length_squared();
    if d2 <= f32::EPSILON || radius <= 0.0 {
        return None;
    }
    // An undersized radius is scaled up to the chord, per SVG arc semantics.
    let r = radius.max(d2.sqrt());
    let sq = ((r * r - d2) / d2).max(0.0);
    let coef = sq.sqrt() * if large_arc != sweep { 1.0 } else { -1.0 };
    let midpoint = (start + end) * 0.5;
    let center = Vec2::new(midpoint.x + coef * half.y, midpoint.y - coef * half.x);

    let a1 = (start.y - center.y).atan2(start.x - center.x);
    let a2 = (end.y - center.y).atan2(end.x - center.x);
    let tau = std::f32::consts::TAU;
    let mut delta = a2 - a1;
    // The source space is y-down, where sweep means increasing angle.
    if sweep {
        while delta <= 0.0 {
            delta += tau;
        }
    } else {
        while delta >= 0.0 {
            delta -= tau;
        }
    }
    let am = a1 + delta / 2.0;
    let mid = center + Vec2::new(am.cos(), am.sin()) * r;
    Some((start, mid, end))
}
