//! Color correction: the 4x5 color matrix, the continuous [`Adjustment`] pipeline and the
//! discrete [`ImageFilter`] presets.

mod adjustment;
mod filter;
mod matrix;

pub use adjustment::{Adjustment, AdjustmentRange};
pub use filter::ImageFilter;
pub use matrix::ColorMatrix;

/// Resolves the matrix a renderer should apply for an image layer.
///
/// A non-neutral adjustment wins over the preset filter. `None` means the pixels pass
/// through untouched.
pub fn effective_color_matrix(filter: ImageFilter, adjustment: &Adjustment) -> Option<ColorMatrix> {
    let matrix = if adjustment.is_neutral() {
        filter.color_matrix()
    } else {
        adjustment.to_color_matrix()
    };
    (!matrix.is_identity()).then_some(matrix)
}
