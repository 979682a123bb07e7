use ab_glyph::{point, Font, FontArc, GlyphId, InvalidFont, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use super::{empty_run_raster, FontStyle, FontWeight, GlyphRasterizer, TextStyle};

const SYNTHETIC_OBLIQUE_SHEAR: f32 = 0.2;
const SYNTHETIC_BOLD_DIVISOR: f32 = 24.0;
const MIN_COVERAGE: f32 = 1.0 / 255.0;

/// Font faces for each weight/style combination; missing faces fall back to `regular`
/// with a synthetic bold or oblique.
#[derive(Clone)]
pub struct FontFaces {
    regular: FontArc,
    bold: Option<FontArc>,
    italic: Option<FontArc>,
    bold_italic: Option<FontArc>,
}

impl std::fmt::Debug for FontFaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFaces")
            .field("bold", &self.bold.is_some())
            .field("italic", &self.italic.is_some())
            .field("bold_italic", &self.bold_italic.is_some())
            .finish()
    }
}

impl FontFaces {
    pub fn from_regular(bytes: Vec<u8>) -> Result<Self, InvalidFont> {
        Ok(Self {
            regular: FontArc::try_from_vec(bytes)?,
            bold: None,
            italic: None,
            bold_italic: None,
        })
    }

    pub fn with_bold(mut self, bytes: Vec<u8>) -> Result<Self, InvalidFont> {
        self.bold = Some(FontArc::try_from_vec(bytes)?);
        Ok(self)
    }

    pub fn with_italic(mut self, bytes: Vec<u8>) -> Result<Self, InvalidFont> {
        self.italic = Some(FontArc::try_from_vec(bytes)?);
        Ok(self)
    }

    pub fn with_bold_italic(mut self, bytes: Vec<u8>) -> Result<Self, InvalidFont> {
        self.bold_italic = Some(FontArc::try_from_vec(bytes)?);
        Ok(self)
    }

    /// Picks the face for a weight/style and reports which traits must be synthesized.
    fn resolve(&self, weight: FontWeight, style: FontStyle) -> ResolvedFace<'_> {
        let bold = weight == FontWeight::Bold;
        let italic = style == FontStyle::Italic;
        let exact = match (bold, italic) {
            (true, true) => self.bold_italic.as_ref(),
            (true, false) => self.bold.as_ref(),
            (false, true) => self.italic.as_ref(),
            (false, false) => Some(&self.regular),
        };
        if let Some(font) = exact {
            return ResolvedFace {
                font,
                synthetic_bold: false,
                synthetic_oblique: false,
            };
        }

        match (bold, italic) {
            (true, true) if self.bold.is_some() => ResolvedFace {
                font: self.bold.as_ref().unwrap_or(&self.regular),
                synthetic_bold: false,
                synthetic_oblique: true,
            },
            (true, true) if self.italic.is_some() => ResolvedFace {
                font: self.italic.as_ref().unwrap_or(&self.regular),
                synthetic_bold: true,
                synthetic_oblique: false,
            },
            _ => ResolvedFace {
                font: &self.regular,
                synthetic_bold: bold,
                synthetic_oblique: italic,
            },
        }
    }
}

struct ResolvedFace<'a> {
    font: &'a FontArc,
    synthetic_bold: bool,
    synthetic_oblique: bool,
}

/// `ab_glyph` rasterizer producing one tight RGBA raster per glyph run.
#[derive(Debug, Clone)]
pub struct FontRasterizer {
    faces: FontFaces,
}

impl FontRasterizer {
    pub fn new(faces: FontFaces) -> Self {
        Self { faces }
    }

    pub fn faces(&self) -> &FontFaces {
        &self.faces
    }
}

struct CoverageSample {
    x: i32,
    y: i32,
    coverage: f32,
}

impl GlyphRasterizer for FontRasterizer {
    fn rasterize(&self, style: &TextStyle) -> Option<RgbaImage> {
        if !style.font_size_px.is_finite() || style.font_size_px <= 0.0 {
            tracing::warn!(size = style.font_size_px, "refusing to rasterize text at invalid size");
            return None;
        }

        let face = self.faces.resolve(style.weight, style.style);
        let scale = PxScale::from(style.font_size_px);
        let scaled = face.font.as_scaled(scale);
        let line_advance = scaled.height() + scaled.line_gap();
        let bold_offset = if face.synthetic_bold {
            (style.font_size_px / SYNTHETIC_BOLD_DIVISOR).max(1.0)
        } else {
            0.0
        };
        let shear = if face.synthetic_oblique {
            SYNTHETIC_OBLIQUE_SHEAR
        } else {
            0.0
        };

        let mut samples = Vec::new();
        for (line_index, line) in style.lines().enumerate() {
            let baseline = scaled.ascent() + line_advance * line_index as f32;
            let mut caret = 0.0_f32;
            let mut previous: Option<GlyphId> = None;
            for ch in line.chars() {
                let id = face.font.glyph_id(ch);
                if let Some(previous) = previous {
                    caret += scaled.kern(previous, id);
                }
                let glyph = id.with_scale_and_position(scale, point(caret, baseline));
                caret += scaled.h_advance(id);
                previous = Some(id);

                let Some(outlined) = face.font.outline_glyph(glyph) else {
                    continue;
                };
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    if coverage < MIN_COVERAGE {
                        return;
                    }
                    let y = bounds.min.y + py as f32;
                    let x = bounds.min.x + px as f32 + shear * (baseline - y);
                    let passes = if bold_offset > 0.0 { 2 } else { 1 };
                    for pass in 0..passes {
                        samples.push(CoverageSample {
                            x: (x + bold_offset * pass as f32).round() as i32,
                            y: y.round() as i32,
                            coverage,
                        });
                    }
                });
            }
        }

        Some(coverage_to_raster(&samples, style))
    }
}

fn coverage_to_raster(samples: &[CoverageSample], style: &TextStyle) -> RgbaImage {
    let Some(first) = samples.first() else {
        return empty_run_raster();
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for sample in samples {
        min_x = min_x.min(sample.x);
        min_y = min_y.min(sample.y);
        max_x = max_x.max(sample.x);
        max_y = max_y.max(sample.y);
    }

    let width = u32::try_from(max_x - min_x + 1).unwrap_or(1).max(1);
    let height = u32::try_from(max_y - min_y + 1).unwrap_or(1).max(1);
    let mut raster = RgbaImage::new(width, height);
    let color = style.color;
    for sample in samples {
        let (Ok(x), Ok(y)) = (
            u32::try_from(sample.x - min_x),
            u32::try_from(sample.y - min_y),
        ) else {
            continue;
        };
        let alpha = (sample.coverage.clamp(0.0, 1.0) * f32::from(color.a)).round() as u8;
        let pixel = raster.get_pixel_mut(x, y);
        if alpha > pixel[3] {
            *pixel = Rgba([color.r, color.g, color.b, alpha]);
        }
    }
    raster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;

    #[test]
    fn coverage_raster_is_tight_around_samples() {
        let samples = [
            CoverageSample {
                x: 5,
                y: -3,
                coverage: 1.0,
            },
            CoverageSample {
                x: 8,
                y: 1,
                coverage: 0.5,
            },
        ];
        let style = TextStyle::new("ab", Color::rgb(10, 20, 30), 40.0);
        let raster = coverage_to_raster(&samples, &style);
        assert_eq!(raster.dimensions(), (4, 5));
        assert_eq!(raster.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(raster.get_pixel(3, 4).0, [10, 20, 30, 128]);
        assert_eq!(raster.get_pixel(1, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn overlapping_samples_keep_strongest_coverage() {
        let samples = [
            CoverageSample {
                x: 0,
                y: 0,
                coverage: 1.0,
            },
            CoverageSample {
                x: 0,
                y: 0,
                coverage: 0.2,
            },
        ];
        let style = TextStyle::new("a", Color::BLACK, 12.0);
        let raster = coverage_to_raster(&samples, &style);
        assert_eq!(raster.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn no_samples_yield_single_transparent_pixel() {
        let style = TextStyle::new("", Color::BLACK, 12.0);
        let raster = coverage_to_raster(&[], &style);
        assert_eq!(raster.dimensions(), (1, 1));
        assert_eq!(raster.get_pixel(0, 0)[3], 0);
    }

    const REGULAR: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/fonts/DejaVuSansMono.ttf"
    ));
    const BOLD: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/fonts/DejaVuSansMono-Bold.ttf"
    ));

    fn regular_only() -> FontRasterizer {
        FontRasterizer::new(FontFaces::from_regular(REGULAR.to_vec()).expect("fixture font should load"))
    }

    fn raster(rasterizer: &FontRasterizer, style: &TextStyle) -> RgbaImage {
        rasterizer.rasterize(style).expect("text should rasterize")
    }

    #[test]
    fn real_font_produces_tight_colored_run() {
        let style = TextStyle::new("Hello", Color::rgb(200, 10, 10), 24.0);
        let run = raster(&regular_only(), &style);
        let (width, height) = run.dimensions();
        assert!(width > height, "{width}x{height}");
        assert!(height <= 30, "{width}x{height}");
        for pixel in run.pixels().filter(|pixel| pixel[3] > 0) {
            assert_eq!(&pixel.0[..3], &[200, 10, 10]);
        }
        assert!(run.pixels().any(|pixel| pixel[3] == 255));
    }

    #[test]
    fn blank_text_yields_unit_raster() {
        let rasterizer = regular_only();
        for text in ["", "   "] {
            let run = raster(&rasterizer, &TextStyle::new(text, Color::BLACK, 24.0));
            assert_eq!(run.dimensions(), (1, 1), "{text:?}");
        }
    }

    #[test]
    fn second_line_adds_height() {
        let rasterizer = regular_only();
        let one = raster(&rasterizer, &TextStyle::new("Ag", Color::BLACK, 24.0));
        let two = raster(&rasterizer, &TextStyle::new("Ag\nAg", Color::BLACK, 24.0));
        assert!(two.height() > one.height() + 20, "{} vs {}", two.height(), one.height());
        assert_eq!(two.width(), one.width());
    }

    #[test]
    fn synthetic_bold_and_oblique_widen_the_run() {
        let rasterizer = regular_only();
        let plain = raster(&rasterizer, &TextStyle::new("Hello", Color::BLACK, 24.0));
        let bold = raster(&rasterizer, &TextStyle::new("Hello", Color::BLACK, 24.0).bold(true));
        let italic = raster(&rasterizer, &TextStyle::new("Hello", Color::BLACK, 24.0).italic(true));
        assert!(bold.width() > plain.width());
        assert!(italic.width() > plain.width());
        assert_eq!(bold.height(), plain.height());
    }

    #[test]
    fn missing_faces_fall_back_to_regular_with_synthesis() {
        let faces = FontFaces::from_regular(REGULAR.to_vec()).expect("fixture font should load");
        let bold = faces.resolve(FontWeight::Bold, FontStyle::Normal);
        assert!(bold.synthetic_bold);
        let bold_italic = faces.resolve(FontWeight::Bold, FontStyle::Italic);
        assert!(bold_italic.synthetic_bold && bold_italic.synthetic_oblique);

        let faces = faces.with_bold(BOLD.to_vec()).expect("fixture bold font should load");
        let bold = faces.resolve(FontWeight::Bold, FontStyle::Normal);
        assert!(!bold.synthetic_bold && !bold.synthetic_oblique);
        let bold_italic = faces.resolve(FontWeight::Bold, FontStyle::Italic);
        assert!(!bold_italic.synthetic_bold && bold_italic.synthetic_oblique);
    }

    #[test]
    fn invalid_sizes_are_refused() {
        let rasterizer = regular_only();
        for size in [0.0, -4.0, f32::NAN] {
            assert!(rasterizer.rasterize(&TextStyle::new("a", Color::BLACK, size)).is_none());
        }
    }

    #[test]
    fn garbage_bytes_are_not_a_font() {
        assert!(FontFaces::from_regular(vec![0, 1, 2, 3]).is_err());
    }
}
