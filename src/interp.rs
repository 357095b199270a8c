use crate::{
    tables::{Corner, Edge},
    types::{Point, Value},
};

/// How an edge crossing is placed along its edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    /// Always the exact midpoint of the edge.
    #[default]
    Midpoint,
    /// Linearly weighted by the distance of each corner value from the threshold.
    Linear,
}

// Return the interpolation factor t corresponding to iso_val
pub fn find_t(v0: Value, v1: Value, iso_val: Value) -> Value {
    (iso_val - v0) / (v1 - v0)
}

// Linear interpolation
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

// Linearly interpolate between two points by factor t
pub fn interpolate_points(p0: Point, p1: Point, t: Value) -> Point {
    Point::new(lerp(p0.x, p1.x, t), lerp(p0.y, p1.y, t))
}

/// Midpoint of edge `edge` of the unit square.
#[inline]
pub fn edge_midpoint(edge: Edge) -> Point {
    edge.midpoint()
}

/// Point on edge `edge` of the unit square where the field crosses `threshold`.
///
/// `corner_values` are in corner order. The factor is clamped to the edge, and
/// an edge whose corners hold (nearly) equal values falls back to its midpoint.
pub fn edge_interpolate(edge: Edge, corner_values: &[Value; 4], threshold: Value) -> Point {
    let [c0, c1] = edge.corners();
    let v0 = corner_values[c0.index()];
    let v1 = corner_values[c1.index()];

    if (v1 - v0).abs() < 1e-10 {
        return edge.midpoint();
    }

    let t = find_t(v0, v1, threshold).clamp(0.0, 1.0);
    interpolate_points(unit_corner(c0), unit_corner(c1), t)
}

/// Resolves the point for `edge` according to `mode`.
#[inline]
pub fn edge_point(
    mode: Interpolation,
    edge: Edge,
    corner_values: &[Value; 4],
    threshold: Value,
) -> Point {
    match mode {
        Interpolation::Midpoint => edge_midpoint(edge),
        Interpolation::Linear => edge_interpolate(edge, corner_values, threshold),
    }
}

#[inline]
fn unit_corner(corner: Corner) -> Point {
    let [x, y] = corner.offset();
    Point::new(x as Value, y as Value)
}
