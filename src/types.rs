use nalgebra::Point2;

/// Scalar field value at a grid point.
pub type Value = f32;

/// A 2D point with [`Value`] components.
pub type Point = Point2<Value>;

/// A 4-bit intensity sample. Only the comparison against [`SAMPLE_THRESHOLD`] matters,
/// so values above 15 are accepted and classified as "above".
pub type Sample = u8;

/// Samples at or above this value are "above" the iso-line.
pub const SAMPLE_THRESHOLD: Sample = 8;

/// The four corner samples of one cell, in corner order (see [`crate::tables::Corner`]).
pub type Cell = [Sample; 4];

/// 4-bit cell classification. Bit `i` is set when corner `i` is above the threshold.
pub type Configuration = u8;

/// A line segment between two points. Undirected for rendering purposes.
pub type Segment = [Point; 2];
