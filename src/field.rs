use std::sync::Arc;

use bevy::prelude::*;
use ndarray::Array2;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    error::{MarchingSquaresError, Result},
    interp::Interpolation,
    tables::CORNER_OFFSETS,
    types::{SAMPLE_THRESHOLD, Sample, Segment, Value},
    utils::{cell_offset, generate_cell_lines_with},
};

/// A 2D grid of scalar samples that produces a marching squares contour.
///
/// The grid has `width × height` sample points and `(width - 1) × (height - 1)`
/// cells. Values are stored row-major as `values[[y, x]]`.
///
/// `values` is wrapped in an [`Arc`] so the async contour task can hold a reference
/// to the grid without copying it. Width and height are at least 2, so every
/// field has at least one cell.
#[derive(Component, Clone, Debug)]
#[require(Transform)]
pub struct ScalarField {
    width: usize,
    height: usize,
    scale: Value,
    threshold: Value,
    interpolation: Interpolation,
    values: Arc<Array2<Value>>,
}

impl ScalarField {
    /// Creates a field from row-major `values`.
    ///
    /// Returns [`MarchingSquaresError::InvalidShape`] if either dimension is below 2,
    /// [`MarchingSquaresError::TooLarge`] if `width * height` is not addressable and
    /// [`MarchingSquaresError::ValueCountMismatch`] if `values.len() != width * height`.
    pub fn new(width: usize, height: usize, values: Vec<Value>) -> Result<Self> {
        let expected = sample_count(width, height)?;
        if values.len() != expected {
            return Err(MarchingSquaresError::ValueCountMismatch {
                expected,
                actual: values.len(),
            });
        }

        let values = Array2::from_shape_vec((height, width), values)?;
        Ok(Self {
            width,
            height,
            scale: 1.,
            threshold: Value::from(SAMPLE_THRESHOLD),
            interpolation: Interpolation::default(),
            values: Arc::new(values),
        })
    }

    /// Creates a field from row-major 4-bit samples.
    pub fn from_samples(width: usize, height: usize, samples: &[Sample]) -> Result<Self> {
        Self::new(width, height, samples.iter().copied().map(Value::from).collect())
    }

    /// Creates a field by evaluating `function(x, y)` at every sample point.
    ///
    /// Coordinates are integer grid indices, not world-space positions.
    pub fn from_fn<F>(width: usize, height: usize, function: F) -> Result<Self>
    where
        F: Fn(usize, usize) -> Value,
    {
        sample_count(width, height)?;
        let values = Array2::from_shape_fn((height, width), |(y, x)| function(x, y));
        Self::new(width, height, values.into_raw_vec_and_offset().0)
    }

    /// Sets the world-space size of each cell edge.
    pub fn with_scale(mut self, scale: Value) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the iso-line threshold. Samples at or above it are "above".
    pub fn with_threshold(mut self, threshold: Value) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets how edge crossings are placed.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Replaces the sample values with a previously saved [`Arc`].
    ///
    /// Returns [`MarchingSquaresError::ShapeMismatch`] if the grid is not
    /// `width` columns by `height` rows.
    pub fn with_values(mut self, values: Arc<Array2<Value>>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if (rows, cols) != (self.height, self.width) {
            return Err(MarchingSquaresError::ShapeMismatch {
                expected: (self.width, self.height),
                actual: (cols, rows),
            });
        }
        self.values = values;
        Ok(self)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn scale(&self) -> Value {
        self.scale
    }

    pub fn threshold(&self) -> Value {
        self.threshold
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Shared handle to the sample grid, indexed `[[y, x]]`.
    pub fn values(&self) -> &Arc<Array2<Value>> {
        &self.values
    }

    /// Returns a mutable reference to the inner sample grid.
    ///
    /// If the Arc is shared this will clone the data first (copy-on-write).
    fn values_mut(&mut self) -> &mut Array2<Value> {
        Arc::make_mut(&mut self.values)
    }

    /// Returns the sample at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Value {
        self.values[[y, x]]
    }

    /// Sets the sample at `(x, y)`.
    pub fn set(&mut self, x: usize, y: usize, v: Value) {
        self.values_mut()[[y, x]] = v
    }

    /// Calls `f(x, y, &mut value)` for every sample in the grid.
    pub fn for_each_sample<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, usize, &mut Value),
    {
        for ((y, x), v) in self.values_mut().indexed_iter_mut() {
            f(x, y, v);
        }
    }

    /// Returns the 4 sample indices `[x, y]` of the cell at `(x, y)`.
    ///
    /// Corners are ordered counter-clockwise to match the lookup tables:
    ///
    /// ```text
    ///   3----2        Y
    ///   |    |        |
    ///   0----1        *-- X
    ///
    ///  0 = (x,   y  )    2 = (x+1, y+1)
    ///  1 = (x+1, y  )    3 = (x,   y+1)
    /// ```
    #[inline]
    pub fn cell_corner_indices(&self, x: usize, y: usize) -> [[usize; 2]; 4] {
        CORNER_OFFSETS.map(|[dx, dy]| [x + dx, y + dy])
    }

    /// Returns the 4 corner samples of the cell at `(x, y)` in corner order.
    #[inline]
    pub fn cell_corners(&self, x: usize, y: usize) -> [Value; 4] {
        self.cell_corner_indices(x, y)
            .map(|[cx, cy]| self.values[[cy, cx]])
    }

    /// Number of cells along X and Y.
    pub fn cell_dims(&self) -> (usize, usize) {
        (self.width - 1, self.height - 1)
    }
}

/// Validates the field dimensions and returns the number of samples they hold.
fn sample_count(width: usize, height: usize) -> Result<usize> {
    if width < 2 || height < 2 {
        return Err(MarchingSquaresError::InvalidShape { width, height });
    }
    width
        .checked_mul(height)
        .filter(|&n| n <= isize::MAX as usize)
        .ok_or(MarchingSquaresError::TooLarge { width, height })
}

/// Runs marching squares over every cell of `field`.
///
/// Work is parallelised over rows using Rayon. Rows are concatenated in order,
/// so the result is row-major (X inner) exactly as a sequential walk would be.
///
/// ```text
/// Per cell (x, y):
/// 1. cell_corners              →  4 samples in corner order
/// 2. cell_offset               →  (x, y) × scale
/// 3. generate_cell_lines_with  →  0, 1 or 2 segments
/// ```
pub fn generate_field_lines(field: &ScalarField) -> Vec<Segment> {
    let (cells_x, cells_y) = field.cell_dims();
    let _span = tracing::debug_span!("generate_field_lines", cells_x, cells_y).entered();

    let per_row: Vec<Vec<Segment>> = (0..cells_y)
        .into_par_iter()
        .map(|y| {
            let mut local: Vec<Segment> = Vec::new();
            for x in 0..cells_x {
                let corners = field.cell_corners(x, y);
                let offset = cell_offset(x, y, field.scale);
                local.extend(generate_cell_lines_with(
                    &corners,
                    field.threshold,
                    offset,
                    field.scale,
                    field.interpolation,
                ));
            }
            local
        })
        .collect();

    // Merge per-row results into a single segment list
    let total: usize = per_row.iter().map(|v| v.len()).sum();
    let mut segments: Vec<Segment> = Vec::with_capacity(total);
    for mut row in per_row {
        segments.append(&mut row);
    }

    tracing::debug!(segments = segments.len(), "marching squares finished");
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_small_fields() {
        for (w, h) in [(0, 0), (1, 5), (5, 1), (1, 1)] {
            let err = ScalarField::new(w, h, vec![0.; w * h]).unwrap_err();
            assert!(
                matches!(err, MarchingSquaresError::InvalidShape { width, height } if width == w && height == h),
                "{w}x{h}: {err}"
            );
        }
    }

    #[test]
    fn test_rejects_value_count_mismatch() {
        let err = ScalarField::from_samples(3, 3, &[0; 8]).unwrap_err();
        assert!(matches!(
            err,
            MarchingSquaresError::ValueCountMismatch {
                expected: 9,
                actual: 8
            }
        ));
        assert_eq!(err.to_string(), "expected 9 values for the field, got 8");
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let field = ScalarField::from_fn(3, 2, |x, y| (y * 10 + x) as Value).unwrap();
        assert_eq!(field.width(), 3);
        assert_eq!(field.height(), 2);
        assert_eq!(field.get(2, 0), 2.);
        assert_eq!(field.get(0, 1), 10.);
        assert_eq!(field.values().as_slice().unwrap(), &[0., 1., 2., 10., 11., 12.]);
    }

    #[test]
    fn test_defaults() {
        let field = ScalarField::from_samples(2, 2, &[0; 4]).unwrap();
        assert_eq!(field.scale(), 1.);
        assert_eq!(field.threshold(), 8.);
        assert_eq!(field.interpolation(), Interpolation::Midpoint);
        assert_eq!(field.cell_dims(), (1, 1));
    }

    #[test]
    fn test_cell_corners_follow_corner_order() {
        let field = ScalarField::from_fn(3, 3, |x, y| (y * 3 + x) as Value).unwrap();
        assert_eq!(
            field.cell_corner_indices(1, 0),
            [[1, 0], [2, 0], [2, 1], [1, 1]]
        );
        assert_eq!(field.cell_corners(1, 0), [1., 2., 5., 4.]);
    }

    #[test]
    fn test_set_is_copy_on_write() {
        let mut field = ScalarField::from_samples(2, 2, &[0; 4]).unwrap();
        let saved = Arc::clone(field.values());
        field.set(1, 1, 15.);
        assert_eq!(field.get(1, 1), 15.);
        assert_eq!(saved[[1, 1]], 0.);
    }

    #[test]
    fn test_for_each_sample_visits_every_point() {
        let mut field = ScalarField::from_samples(4, 3, &[0; 12]).unwrap();
        field.for_each_sample(|x, y, v| *v = (x + y) as Value);
        assert_eq!(field.get(3, 2), 5.);
        assert_eq!(field.get(0, 0), 0.);
    }

    #[test]
    fn test_rejects_overflowing_dimensions() {
        let err = ScalarField::new(usize::MAX, 3, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            MarchingSquaresError::TooLarge {
                width: usize::MAX,
                height: 3
            }
        ));

        // Rejected before any sample is evaluated or allocated.
        let err = ScalarField::from_fn(2, usize::MAX / 2 + 1, |_, _| 0.).unwrap_err();
        assert!(matches!(err, MarchingSquaresError::TooLarge { .. }), "{err}");
    }

    #[test]
    fn test_with_values_checks_shape() {
        let field = ScalarField::from_samples(3, 2, &[0; 6]).unwrap();
        // Same element count, transposed shape.
        let wrong = Arc::new(Array2::<Value>::zeros((3, 2)));
        let err = field.clone().with_values(wrong).unwrap_err();
        assert!(matches!(
            err,
            MarchingSquaresError::ShapeMismatch {
                expected: (3, 2),
                actual: (2, 3)
            }
        ));
        assert_eq!(err.to_string(), "expected a 3x2 grid, got 2x3");

        let right = Arc::new(Array2::<Value>::from_elem((2, 3), 15.));
        let field = field.with_values(right).unwrap();
        assert_eq!(field.get(2, 1), 15.);
    }

    #[test]
    fn test_uniform_field_has_no_lines() {
        for fill in [0, 15] {
            let field = ScalarField::from_samples(5, 4, &[fill; 20]).unwrap();
            assert!(generate_field_lines(&field).is_empty());
        }
    }

    #[test]
    fn test_traversal_is_row_major() {
        // One crossing per row: a vertical step between columns 0 and 1.
        let field = ScalarField::from_fn(2, 4, |x, _| if x == 0 { 0. } else { 15. }).unwrap();
        let segments = generate_field_lines(&field);
        assert_eq!(segments.len(), 3);
        for (y, [a, b]) in segments.iter().enumerate() {
            assert_eq!(a.y.min(b.y), y as Value);
            assert_eq!(a.x, 0.5);
        }
    }
}
