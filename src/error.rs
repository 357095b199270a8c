use derive_more::{Display, From};
use ndarray::ShapeError;

pub type Result<T> = core::result::Result<T, MarchingSquaresError>;

#[derive(Debug, Display, From)]
pub enum MarchingSquaresError {
    /// A field needs at least one full cell.
    #[display("scalar field must be at least 2x2, got {width}x{height}")]
    InvalidShape { width: usize, height: usize },
    /// `width * height` overflows the addressable sample count.
    #[display("scalar field of {width}x{height} samples is too large")]
    TooLarge { width: usize, height: usize },
    #[display("expected {expected} values for the field, got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },
    /// Dimensions are `(width, height)`.
    #[display("expected a {}x{} grid, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[display("{_0}")]
    #[from]
    Shape(ShapeError),
}

impl std::error::Error for MarchingSquaresError {}
