//! Layer data model: a closed set of layer variants sharing one placement contract.

mod image;
mod text;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{LayerBounds, Transform};

pub use self::image::ImageLayer;
pub use self::text::TextLayer;

/// Opaque layer identity, stable for the layer's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(u64);

impl LayerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

/// Fields every layer variant carries.
pub trait LayerCommon {
    fn id(&self) -> LayerId;
    fn display_name(&self) -> &str;
    fn transform(&self) -> Transform;
    fn z_index(&self) -> i32;
    fn visible(&self) -> bool;

    /// Unscaled content size, or `None` when the layer has nothing to paint or hit.
    fn content_size(&self) -> Option<(f32, f32)>;

    /// Axis-aligned canvas footprint at the current scale, ignoring rotation.
    fn bounds(&self) -> Option<LayerBounds> {
        let (width, height) = self.content_size()?;
        let transform = self.transform();
        Some(LayerBounds::new(
            transform.x,
            transform.y,
            width * transform.scale,
            height * transform.scale,
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Image(ImageLayer),
    Text(TextLayer),
}

impl Layer {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Text(_) => "text",
        }
    }

    fn common(&self) -> &dyn LayerCommon {
        match self {
            Self::Image(image) => image,
            Self::Text(text) => text,
        }
    }

    pub fn as_image(&self) -> Option<&ImageLayer> {
        match self {
            Self::Image(image) => Some(image),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextLayer> {
        match self {
            Self::Text(text) => Some(text),
            Self::Image(_) => None,
        }
    }

    pub fn with_transform(self, transform: Transform) -> Self {
        match self {
            Self::Image(image) => Self::Image(image.with_transform(transform)),
            Self::Text(text) => Self::Text(text.with_transform(transform)),
        }
    }

    pub fn with_z_index(self, z_index: i32) -> Self {
        match self {
            Self::Image(image) => Self::Image(image.with_z_index(z_index)),
            Self::Text(text) => Self::Text(text.with_z_index(z_index)),
        }
    }

    pub fn with_visible(self, visible: bool) -> Self {
        match self {
            Self::Image(image) => Self::Image(image.with_visible(visible)),
            Self::Text(text) => Self::Text(text.with_visible(visible)),
        }
    }

    pub fn with_display_name(self, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        match self {
            Self::Image(image) => Self::Image(image.with_display_name(display_name)),
            Self::Text(text) => Self::Text(text.with_display_name(display_name)),
        }
    }
}

impl LayerCommon for Layer {
    fn id(&self) -> LayerId {
        self.common().id()
    }

    fn display_name(&self) -> &str {
        self.common().display_name()
    }

    fn transform(&self) -> Transform {
        self.common().transform()
    }

    fn z_index(&self) -> i32 {
        self.common().z_index()
    }

    fn visible(&self) -> bool {
        self.common().visible()
    }

    fn content_size(&self) -> Option<(f32, f32)> {
        self.common().content_size()
    }
}

impl From<ImageLayer> for Layer {
    fn from(layer: ImageLayer) -> Self {
        Self::Image(layer)
    }
}

impl From<TextLayer> for Layer {
    fn from(layer: TextLayer) -> Self {
        Self::Text(layer)
    }
}

/// Id of the layer painted last: highest z-index, later list position on ties.
pub fn top_most_id(layers: &[Layer]) -> Option<LayerId> {
    layers
        .iter()
        .max_by_key(|layer| layer.z_index())
        .map(LayerCommon::id)
}

pub fn next_z_index(layers: &[Layer]) -> i32 {
    layers
        .iter()
        .map(LayerCommon::z_index)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use ::image::{Rgba, RgbaImage};

    use super::*;
    use crate::geometry::Color;
    use crate::text::{GlyphRasterizer, TextStyle};

    /// Deterministic rasterizer: every char is a solid `size/2` x `size` block.
    pub(crate) struct BlockGlyphs;

    impl GlyphRasterizer for BlockGlyphs {
        fn rasterize(&self, style: &TextStyle) -> Option<RgbaImage> {
            if style.font_size_px <= 0.0 {
                return None;
            }
            let glyph_width = (style.font_size_px / 2.0).round().max(1.0) as u32;
            let line_height = style.font_size_px.round().max(1.0) as u32;
            let columns = style.lines().map(|line| line.chars().count()).max().unwrap_or(0);
            let rows = style.lines().count() as u32;
            if columns == 0 {
                return Some(RgbaImage::new(1, 1));
            }
            let Color { r, g, b, a } = style.color;
            Some(RgbaImage::from_pixel(
                glyph_width * columns as u32,
                line_height * rows,
                Rgba([r, g, b, a]),
            ))
        }
    }

    pub(crate) fn solid_pixels(width: u32, height: u32, rgba: [u8; 4]) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_pixel(width, height, Rgba(rgba)))
    }

    pub(crate) fn image_layer(id: u64, width: u32, height: u32, transform: Transform, z: i32) -> Layer {
        Layer::Image(ImageLayer::new(
            LayerId::new(id),
            format!("Image {id}"),
            solid_pixels(width, height, [200, 40, 40, 255]),
            transform,
            z,
        ))
    }

    pub(crate) fn text_layer(id: u64, text: &str, transform: Transform, z: i32) -> Layer {
        Layer::Text(TextLayer::new(
            LayerId::new(id),
            format!("Text {id}"),
            TextStyle::new(text, Color::BLACK, 20.0),
            transform,
            z,
            &BlockGlyphs,
        ))
    }
}
