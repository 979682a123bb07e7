use std::sync::Arc;

use image::RgbaImage;

use super::{LayerCommon, LayerId};
use crate::geometry::Transform;
use crate::text::{GlyphRasterizer, TextStyle};

/// Text layer with a cached glyph-run raster.
///
/// The raster doubles as the measured size used for hit-testing, so it is only ever rebuilt
/// through [`TextLayer::new`] and [`TextLayer::restyled`], which both take a rasterizer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    id: LayerId,
    display_name: String,
    transform: Transform,
    z_index: i32,
    visible: bool,
    style: TextStyle,
    raster: Option<Arc<RgbaImage>>,
}

impl TextLayer {
    pub fn new<R: GlyphRasterizer + ?Sized>(
        id: LayerId,
        display_name: impl Into<String>,
        style: TextStyle,
        transform: Transform,
        z_index: i32,
        rasterizer: &R,
    ) -> Self {
        let raster = rasterize(id, &style, rasterizer);
        Self {
            id,
            display_name: display_name.into(),
            transform,
            z_index,
            visible: true,
            style,
            raster,
        }
    }

    /// Applies a new style and re-measures the glyph run.
    pub fn restyled<R: GlyphRasterizer + ?Sized>(self, style: TextStyle, rasterizer: &R) -> Self {
        let raster = rasterize(self.id, &style, rasterizer);
        Self {
            style,
            raster,
            ..self
        }
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn text(&self) -> &str {
        &self.style.text
    }

    pub fn raster(&self) -> Option<&Arc<RgbaImage>> {
        self.raster.as_ref()
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

fn rasterize<R: GlyphRasterizer + ?Sized>(
    id: LayerId,
    style: &TextStyle,
    rasterizer: &R,
) -> Option<Arc<RgbaImage>> {
    let raster = rasterizer.rasterize(style);
    if raster.is_none() {
        tracing::warn!(layer = %id, size = style.font_size_px, "text layer could not be rasterized");
    }
    raster.map(Arc::new)
}

impl LayerCommon for TextLayer {
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
        let raster = self.raster.as_ref()?;
        let (width, height) = raster.dimensions();
        Some((width as f32, height as f32))
    }
}
