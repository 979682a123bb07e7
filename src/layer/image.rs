use std::sync::Arc;

use image::RgbaImage;

use super::{LayerCommon, LayerId};
use crate::color::{effective_color_matrix, Adjustment, ColorMatrix, ImageFilter};
use crate::geometry::Transform;

/// Raster layer. Pixels are shared immutably so history snapshots never copy buffers.
///
/// `filter` and `adjustment` are mutually exclusive: setting one resets the other.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayer {
    id: LayerId,
    display_name: String,
    transform: Transform,
    z_index: i32,
    visible: bool,
    pixels: Option<Arc<RgbaImage>>,
    filter: ImageFilter,
    adjustment: Adjustment,
    native_width: u32,
    native_height: u32,
    source_ref: Option<String>,
}

impl ImageLayer {
    pub fn new(
        id: LayerId,
        display_name: impl Into<String>,
        pixels: Arc<RgbaImage>,
        transform: Transform,
        z_index: i32,
    ) -> Self {
        let (native_width, native_height) = pixels.dimensions();
        Self {
            id,
            display_name: display_name.into(),
            transform,
            z_index,
            visible: true,
            pixels: Some(pixels),
            filter: ImageFilter::None,
            adjustment: Adjustment::NEUTRAL,
            native_width,
            native_height,
            source_ref: None,
        }
    }

    /// Layer whose pixels are not loaded yet. It keeps its placement but never hits or paints.
    pub fn detached(
        id: LayerId,
        display_name: impl Into<String>,
        native_size: (u32, u32),
        transform: Transform,
        z_index: i32,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            transform,
            z_index,
            visible: true,
            pixels: None,
            filter: ImageFilter::None,
            adjustment: Adjustment::NEUTRAL,
            native_width: native_size.0,
            native_height: native_size.1,
            source_ref: None,
        }
    }

    pub fn pixels(&self) -> Option<&Arc<RgbaImage>> {
        self.pixels.as_ref()
    }

    pub const fn filter(&self) -> ImageFilter {
        self.filter
    }

    pub const fn adjustment(&self) -> Adjustment {
        self.adjustment
    }

    pub const fn native_size(&self) -> (u32, u32) {
        (self.native_width, self.native_height)
    }

    pub fn source_ref(&self) -> Option<&str> {
        self.source_ref.as_deref()
    }

    pub fn color_matrix(&self) -> Option<ColorMatrix> {
        effective_color_matrix(self.filter, &self.adjustment)
    }

    /// Swaps in a new buffer (crop result or background reload); native size follows it.
    pub fn with_pixels(self, pixels: Arc<RgbaImage>) -> Self {
        let (native_width, native_height) = pixels.dimensions();
        Self {
            pixels: Some(pixels),
            native_width,
            native_height,
            ..self
        }
    }

    pub fn without_pixels(self) -> Self {
        Self {
            pixels: None,
            ..self
        }
    }

    pub fn with_filter(self, filter: ImageFilter) -> Self {
        Self {
            filter,
            adjustment: Adjustment::NEUTRAL,
            ..self
        }
    }

    pub fn with_adjustment(self, adjustment: Adjustment) -> Self {
        Self {
            filter: ImageFilter::None,
            adjustment: adjustment.clamped(),
            ..self
        }
    }

    pub fn with_source_ref(self, source_ref: Option<String>) -> Self {
        Self { source_ref, ..self }
    }

    pub fn with_transform(self, transform: Transform) -> Self {
        Self { transform, ..self }
    }

    pub fn with_z_index(self, z_index: i32) -> Self {
        Self { z_index, ..self }
    }

    pub fn with_visible(self, visible: bool) -> Self {
        Self { visible, ..self }
    }

    pub fn with_display_name(self, display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..self
        }
    }
}

impl LayerCommon for ImageLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn z_index(&self) -> i32 {
        self.z_index
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn content_size(&self) -> Option<(f32, f32)> {
        let pixels = self.pixels.as_ref()?;
        let (width, height) = pixels.dimensions();
        Some((width as f32, height as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::test_support::solid_pixels;

    fn layer() -> ImageLayer {
        ImageLayer::new(
            LayerId::new(4),
            "Image 1",
            solid_pixels(30, 10, [1, 2, 3, 255]),
            Transform::at(50.0, 50.0),
            0,
        )
    }

    #[test]
    fn filter_and_adjustment_reset_each_other() {
        let adjusted = layer().with_adjustment(Adjustment {
            contrast: 1.2,
            ..Adjustment::NEUTRAL
        });
        assert_eq!(adjusted.filter(), ImageFilter::None);
        assert!(!adjusted.adjustment().is_neutral());

        let filtered = adjusted.with_filter(ImageFilter::Sepia);
        assert_eq!(filtered.filter(), ImageFilter::Sepia);
        assert!(filtered.adjustment().is_neutral());

        let readjusted = filtered.with_adjustment(Adjustment {
            hue: 30.0,
            ..Adjustment::NEUTRAL
        });
        assert_eq!(readjusted.filter(), ImageFilter::None);
    }

    #[test]
    fn stored_adjustment_is_clamped() {
        let adjusted = layer().with_adjustment(Adjustment {
            brightness: 900.0,
            ..Adjustment::NEUTRAL
        });
        assert_eq!(adjusted.adjustment().brightness, 100.0);
    }

    #[test]
    fn missing_pixels_leave_no_content_size() {
        let detached = layer().without_pixels();
        assert_eq!(detached.content_size(), None);
        assert_eq!(detached.bounds(), None);
        assert_eq!(detached.native_size(), (30, 10));
        assert_eq!(detached.transform(), Transform::at(50.0, 50.0));
    }

    #[test]
    fn replacing_pixels_updates_native_size() {
        let cropped = layer().with_pixels(solid_pixels(12, 8, [0, 0, 0, 255]));
        assert_eq!(cropped.native_size(), (12, 8));
        assert_eq!(cropped.content_size(), Some((12.0, 8.0)));
    }

    #[test]
    fn neutral_layer_needs_no_color_matrix() {
        assert_eq!(layer().color_matrix(), None);
        assert!(layer().with_filter(ImageFilter::Cool).color_matrix().is_some());
    }
}
