//! Glyph-run rasterization for text layers.
//!
//! A text layer is painted from a cached raster of its glyph run, measured once when the
//! text or its style changes. [`GlyphRasterizer`] is the seam the host fills with real fonts;
//! [`FontRasterizer`] is the `ab_glyph`-backed implementation.

mod font;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::geometry::Color;

pub use font::{FontFaces, FontRasterizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Everything that determines how a text layer looks before its transform is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub text: String,
    pub color: Color,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub font_size_px: f32,
}

impl TextStyle {
    pub fn new(text: impl Into<String>, color: Color, font_size_px: f32) -> Self {
        Self {
            text: text.into(),
            color,
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            font_size_px,
        }
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.weight = if bold {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        };
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.style = if italic {
            FontStyle::Italic
        } else {
            FontStyle::Normal
        };
        self
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

/// Produces a tight raster of a glyph run in the style's color.
///
/// `None` means the run could not be rasterized; the owning layer then behaves as a
/// missing resource (never hit, never painted).
pub trait GlyphRasterizer {
    fn rasterize(&self, style: &TextStyle) -> Option<RgbaImage>;
}

impl<R: GlyphRasterizer + ?Sized> GlyphRasterizer for &R {
    fn rasterize(&self, style: &TextStyle) -> Option<RgbaImage> {
        (**self).rasterize(style)
    }
}

/// Raster used for runs with no visible glyphs, so empty text still has a 1x1 footprint.
pub(crate) fn empty_run_raster() -> RgbaImage {
    RgbaImage::new(1, 1)
}
