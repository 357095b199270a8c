pub mod contour;
pub mod error;
pub mod field;
pub mod interp;
pub mod plugin;
pub mod tables;
pub mod types;
pub mod utils;

pub use field::{ScalarField, generate_field_lines};
pub use interp::Interpolation;
pub use plugin::MarchingSquaresPlugin;
pub use utils::{classify, generate_cell_lines, generate_cell_lines_with};
