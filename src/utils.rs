use crate::{
    interp::{Interpolation, edge_point},
    tables::{EDGE_TABLE, Edge, line_indices},
    types::{Cell, Configuration, Point, SAMPLE_THRESHOLD, Segment, Value},
};

/// Computes the marching squares configuration of a cell of 4-bit samples.
///
/// Bit `i` is set when corner `i` is at or above [`SAMPLE_THRESHOLD`]. Total over
/// every [`Sample`](crate::types::Sample) value: anything from 8 up counts as "above".
#[inline]
pub fn classify(cell: Cell) -> Configuration {
    get_state(&cell.map(Value::from), Value::from(SAMPLE_THRESHOLD))
}

/// Computes the marching squares state bitmask for a cell.
///
/// Each of the 4 corners maps to one bit. A bit is set when the corner's value
/// is **at or above** the threshold:
///
/// ```text
/// corner index:  3  2  1  0
/// state bits:   [_][_][_][_]
///                          ^-- corner 0 above?
/// ```
#[inline]
pub fn get_state(corner_values: &[Value; 4], threshold: Value) -> Configuration {
    let mut state: Configuration = 0;
    for (i, &v) in corner_values.iter().enumerate() {
        if v >= threshold {
            state |= 1 << i;
        }
    }
    state
}

/// World-space position of the origin corner of cell `(x, y)`.
#[inline]
pub fn cell_offset(x: usize, y: usize, scale: Value) -> Point {
    Point::new(x as Value * scale, y as Value * scale)
}

/// Maps a unit-square point into world space: scaled by `scale`, then translated by `offset`.
#[inline]
pub fn to_world(local: Point, offset: Point, scale: Value) -> Point {
    offset + local.coords * scale
}

/// Resolves the local point on each edge of the cell that the contour crosses.
///
/// `edges_mask` comes from [`EDGE_TABLE`]; a set bit means that edge is active.
#[inline]
pub fn get_edge_points(
    edges_mask: u8,
    corner_values: &[Value; 4],
    threshold: Value,
    mode: Interpolation,
) -> [Option<Point>; 4] {
    let mut edge_points: [Option<Point>; 4] = [None; 4];

    for edge in Edge::ALL {
        if edges_mask & edge.bit() == 0 {
            continue;
        }
        edge_points[edge.index()] = Some(edge_point(mode, edge, corner_values, threshold));
    }

    edge_points
}

/// Converts the active edge points for a given `state` into world-space segments.
///
/// `LINE_TABLE[state]` holds edge indices in pairs, padded with `-1`:
/// ```text
/// LINE_TABLE[state] = [e0, e1,  e2, e3]
///                      \_seg0_/  \_seg1_/
/// ```
/// Segments whose endpoints coincide are dropped.
#[inline]
pub fn segments_from_state(
    edge_points: &[Option<Point>; 4],
    state: Configuration,
    offset: Point,
    scale: Value,
) -> Vec<Segment> {
    line_indices(state)
        .chunks_exact(2)
        .filter_map(|pair| {
            let a = edge_points[pair[0] as usize]?;
            let b = edge_points[pair[1] as usize]?;
            Some([to_world(a, offset, scale), to_world(b, offset, scale)])
        })
        .filter(|[a, b]| a != b)
        .collect()
}

/// Turns one cell of 4-bit samples into 0, 1 or 2 world-space segments using
/// midpoint placement and the fixed [`SAMPLE_THRESHOLD`].
///
/// Unit-square points are scaled by `scale` and then translated by `offset`.
pub fn generate_cell_lines(cell: Cell, offset: Point, scale: Value) -> Vec<Segment> {
    generate_cell_lines_with(
        &cell.map(Value::from),
        Value::from(SAMPLE_THRESHOLD),
        offset,
        scale,
        Interpolation::Midpoint,
    )
}

/// Turns one cell into world-space segments for an arbitrary threshold and
/// interpolation mode.
///
/// ```text
/// 1. get_state             →  16-entry lookup key
/// 2. EDGE_TABLE[state]     →  bitmask of crossed edges (0 → no contour)
/// 3. get_edge_points       →  up to 4 local edge points
/// 4. segments_from_state   →  segments from LINE_TABLE, in world space
/// ```
pub fn generate_cell_lines_with(
    corner_values: &[Value; 4],
    threshold: Value,
    offset: Point,
    scale: Value,
    mode: Interpolation,
) -> Vec<Segment> {
    let state = get_state(corner_values, threshold);
    let edges_mask = EDGE_TABLE[state as usize];
    if edges_mask == 0 {
        return Vec::new();
    }

    let edge_points = get_edge_points(edges_mask, corner_values, threshold, mode);
    segments_from_state(&edge_points, state, offset, scale)
}
