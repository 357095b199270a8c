//! Lookup tables for marching squares.
//!
//! Every table in this module shares one corner and edge numbering. The
//! classifier, the edge interpolator and the cell generator all read it from
//! here instead of re-deriving it:
//!
//! ```text
//!         e2
//!    3---->----2          Y
//!    |         |          |
//! e3 ^         ^ e1       *-- X
//!    |         |
//!    0---->----1
//!         e0
//! ```
//!
//! Corners run counter-clockwise from the origin corner. Edges always point
//! along +X or +Y so two neighbouring cells interpolate a shared edge with the
//! same operands.

use crate::types::{Configuration, Point, Value};

/// Cell corners in classification order. Bit `i` of a [`Configuration`] is corner `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Corner {
    BottomLeft = 0,
    BottomRight = 1,
    TopRight = 2,
    TopLeft = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::BottomLeft,
        Corner::BottomRight,
        Corner::TopRight,
        Corner::TopLeft,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The configuration bit set when this corner is above the threshold.
    #[inline]
    pub const fn bit(self) -> Configuration {
        1 << self as u8
    }

    /// Integer offset `[dx, dy]` of this corner from the cell origin.
    #[inline]
    pub const fn offset(self) -> [usize; 2] {
        CORNER_OFFSETS[self as usize]
    }
}

/// Cell edges in edge-mask order. Bit `i` of an [`EDGE_TABLE`] entry is edge `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Edge {
    Bottom = 0,
    Right = 1,
    Top = 2,
    Left = 3,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Bottom, Edge::Right, Edge::Top, Edge::Left];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Start and end corner of this edge, start first.
    #[inline]
    pub const fn corners(self) -> [Corner; 2] {
        match self {
            Edge::Bottom => [Corner::BottomLeft, Corner::BottomRight],
            Edge::Right => [Corner::BottomRight, Corner::TopRight],
            Edge::Top => [Corner::TopLeft, Corner::TopRight],
            Edge::Left => [Corner::BottomLeft, Corner::TopLeft],
        }
    }

    /// Midpoint of this edge in unit-square coordinates.
    #[inline]
    pub fn midpoint(self) -> Point {
        let [a, b] = self.corners();
        let [ax, ay] = a.offset();
        let [bx, by] = b.offset();
        Point::new((ax + bx) as Value * 0.5, (ay + by) as Value * 0.5)
    }
}

/// `[dx, dy]` offset of each corner from the cell origin.
pub const CORNER_OFFSETS: [[usize; 2]; 4] = [[0, 0], [1, 0], [1, 1], [0, 1]];

/// Edges crossed by the contour for each configuration.
///
/// Complementary configurations cross the same edges, so `EDGE_TABLE[c] == EDGE_TABLE[15 - c]`.
#[rustfmt::skip]
pub const EDGE_TABLE: [u8; 16] = [
    0b0000, 0b1001, 0b0011, 0b1010,
    0b0110, 0b1111, 0b0101, 0b1100,
    0b1100, 0b0101, 0b1111, 0b0110,
    0b1010, 0b0011, 0b1001, 0b0000,
];

/// Edge index pairs forming each configuration's segments, padded with `-1`:
/// ```text
/// LINE_TABLE[state] = [e0, e1,  e2, e3]
///                      \_seg0_/  \_seg1_/
/// ```
///
/// The saddles 5 and 10 cut each above-threshold corner off on its own, so the
/// below-threshold region stays connected through the cell centre.
#[rustfmt::skip]
pub const LINE_TABLE: [[i8; 4]; 16] = [
    [-1, -1, -1, -1],
    [ 3,  0, -1, -1],
    [ 0,  1, -1, -1],
    [ 3,  1, -1, -1],
    [ 1,  2, -1, -1],
    [ 3,  0,  1,  2],
    [ 0,  2, -1, -1],
    [ 2,  3, -1, -1],
    [ 2,  3, -1, -1],
    [ 0,  2, -1, -1],
    [ 0,  1,  2,  3],
    [ 1,  2, -1, -1],
    [ 1,  3, -1, -1],
    [ 0,  1, -1, -1],
    [ 0,  3, -1, -1],
    [-1, -1, -1, -1],
];

/// The `LINE_TABLE` row for `state` without its `-1` padding.
///
/// Only the low four bits of `state` are used.
#[inline]
pub fn line_indices(state: Configuration) -> &'static [i8] {
    let row = &LINE_TABLE[(state & 0xF) as usize];
    let len = row.iter().position(|&e| e == -1).unwrap_or(row.len());
    &row[..len]
}
