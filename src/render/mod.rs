//! Flattens a layer list into an RGBA raster.
//!
//! One code path serves the interactive preview (scale 1, selection outline) and the export
//! (per-axis scale from preview to output pixels, no decoration). Output depends only on the
//! inputs, so repeated renders are pixel-identical.

use image::{Rgba, RgbaImage};
use kurbo::{Affine, Point, Rect};
use thiserror::Error;

use crate::color::ColorMatrix;
use crate::editor::EditorState;
use crate::geometry::Color;
use crate::layer::{Layer, LayerCommon, LayerId};

/// Upper bound on destination pixels (a 16k x 16k canvas).
pub const MAX_DESTINATION_PIXELS: u64 = 16_384 * 16_384;

pub type RenderResult<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("canvas has not been measured yet")]
    CanvasNotMeasured,
    #[error("destination must be at least 1x1 pixels")]
    ZeroSizedDestination,
    #[error("destination {width}x{height} exceeds the pixel budget")]
    DestinationTooLarge { width: u32, height: u32 },
}

/// Outline drawn around the selected layer in preview renders, in layer-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionStyle {
    pub color: Color,
    pub stroke_px: f32,
    pub padding_px: f32,
}

impl Default for SelectionStyle {
    fn default() -> Self {
        Self {
            color: Color::rgb(0xF8, 0x9B, 0x29),
            stroke_px: 8.0,
            padding_px: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Compositor {
    selection: SelectionStyle,
}

impl Compositor {
    pub const fn new(selection: SelectionStyle) -> Self {
        Self { selection }
    }

    pub const fn selection(&self) -> SelectionStyle {
        self.selection
    }

    /// Paints `layers` back to front onto `destination`.
    ///
    /// Invalid scale factors paint nothing.
    pub fn render(
        &self,
        destination: &mut RgbaImage,
        layers: &[Layer],
        scale_x: f32,
        scale_y: f32,
        selected: Option<LayerId>,
    ) {
        if !(valid_scale(scale_x) && valid_scale(scale_y)) {
            tracing::debug!(scale_x, scale_y, "skipping render with invalid scale");
            return;
        }
        for layer in paint_order(layers) {
            let outline = (selected == Some(layer.id())).then_some(&self.selection);
            paint_layer(destination, layer, scale_x, scale_y, outline);
        }
    }

    /// Renders the on-screen canvas at scale 1 with the selection outline.
    pub fn render_preview(&self, state: &EditorState, background: Color) -> RenderResult<RgbaImage> {
        let canvas = state.canvas_size;
        if !canvas.is_measured() {
            return Err(RenderError::CanvasNotMeasured);
        }
        let mut destination =
            allocate_destination(canvas.width.ceil() as u32, canvas.height.ceil() as u32, background)?;
        self.render(
            &mut destination,
            state.layers(),
            1.0,
            1.0,
            state.selected_layer_id(),
        );
        Ok(destination)
    }

    /// Renders the composition at output resolution. Never touches `state`.
    pub fn export(
        &self,
        state: &EditorState,
        export_size: (u32, u32),
        background: Color,
    ) -> RenderResult<RgbaImage> {
        let canvas = state.canvas_size;
        if !canvas.is_measured() {
            return Err(RenderError::CanvasNotMeasured);
        }
        let (width, height) = export_size;
        let mut destination = allocate_destination(width, height, background)?;
        let scale_x = width as f32 / canvas.width;
        let scale_y = height as f32 / canvas.height;

        tracing::info!(width, height, scale_x, scale_y, layers = state.layers().len(), "export started");
        self.render(&mut destination, state.layers(), scale_x, scale_y, None);
        tracing::info!(width, height, "export finished");
        Ok(destination)
    }
}

/// [`Compositor::render`] with the default selection style.
pub fn render(
    destination: &mut RgbaImage,
    layers: &[Layer],
    scale_x: f32,
    scale_y: f32,
    selected: Option<LayerId>,
) {
    Compositor::default().render(destination, layers, scale_x, scale_y, selected);
}

/// Validates and allocates a destination filled with `background`.
pub fn allocate_destination(width: u32, height: u32, background: Color) -> RenderResult<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(RenderError::ZeroSizedDestination);
    }
    if u64::from(width) * u64::from(height) > MAX_DESTINATION_PIXELS {
        return Err(RenderError::DestinationTooLarge { width, height });
    }
    Ok(RgbaImage::from_pixel(width, height, Rgba(background.to_array())))
}

fn valid_scale(scale: f32) -> bool {
    scale.is_finite() && scale > 0.0
}

/// Visible layers sorted back to front; equal z-indices keep list order.
fn paint_order(layers: &[Layer]) -> Vec<&Layer> {
    let mut ordered: Vec<&Layer> = layers.iter().filter(|layer| layer.visible()).collect();
    ordered.sort_by_key(|layer| layer.z_index());
    ordered
}

fn layer_content(layer: &Layer) -> Option<(&RgbaImage, Option<ColorMatrix>)> {
    match layer {
        Layer::Image(image) => Some((image.pixels()?.as_ref(), image.color_matrix())),
        Layer::Text(text) => Some((text.raster()?.as_ref(), None)),
    }
}

fn paint_layer(
    destination: &mut RgbaImage,
    layer: &Layer,
    scale_x: f32,
    scale_y: f32,
    outline: Option<&SelectionStyle>,
) {
    let Some((source, matrix)) = layer_content(layer) else {
        return;
    };
    let local_to_destination = layer.transform().to_affine(scale_x, scale_y);
    let determinant = local_to_destination.determinant();
    if !determinant.is_finite() || determinant.abs() < f64::EPSILON {
        return;
    }
    let destination_to_local = local_to_destination.inverse();

    let half_width = f64::from(source.width()) / 2.0;
    let half_height = f64::from(source.height()) / 2.0;
    let ring = outline.map(|style| SelectionRing::new(style, half_width, half_height));
    let reach = ring.as_ref().map_or(0.0, |ring| ring.outer_margin);
    let local_extent = Rect::new(
        -half_width - reach,
        -half_height - reach,
        half_width + reach,
        half_height + reach,
    );
    let Some((x_range, y_range)) = pixel_span(
        local_to_destination.transform_rect_bbox(local_extent),
        destination.width(),
        destination.height(),
    ) else {
        return;
    };

    for y in y_range {
        for x in x_range.clone() {
            let local = destination_to_local * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let source_x = local.x + half_width;
            let source_y = local.y + half_height;
            let covered = (0.0..2.0 * half_width).contains(&source_x)
                && (0.0..2.0 * half_height).contains(&source_y);
            let sample = if covered {
                sample_bilinear(source, source_x, source_y)
            } else {
                [0.0; 4]
            };
            if sample[3] > 0.0 {
                let color = match &matrix {
                    Some(matrix) => matrix.apply_f32(sample),
                    None => sample,
                };
                blend_over(destination.get_pixel_mut(x, y), color);
            }
            if let Some(ring) = &ring {
                if ring.contains(local) {
                    blend_over(destination.get_pixel_mut(x, y), ring.color);
                }
            }
        }
    }
}

struct SelectionRing {
    inner_x: f64,
    inner_y: f64,
    outer_x: f64,
    outer_y: f64,
    outer_margin: f64,
    color: [f32; 4],
}

impl SelectionRing {
    fn new(style: &SelectionStyle, half_width: f64, half_height: f64) -> Self {
        let padding = f64::from(style.padding_px.max(0.0));
        let half_stroke = f64::from(style.stroke_px.max(0.0)) / 2.0;
        let inner_margin = (padding - half_stroke).max(0.0);
        let outer_margin = padding + half_stroke;
        Self {
            inner_x: half_width + inner_margin,
            inner_y: half_height + inner_margin,
            outer_x: half_width + outer_margin,
            outer_y: half_height + outer_margin,
            outer_margin,
            color: style.color.to_array().map(f32::from),
        }
    }

    fn contains(&self, local: Point) -> bool {
        let (x, y) = (local.x.abs(), local.y.abs());
        let inside_outer = x <= self.outer_x && y <= self.outer_y;
        let inside_inner = x < self.inner_x && y < self.inner_y;
        inside_outer && !inside_inner
    }
}

type PixelRange = std::ops::Range<u32>;

/// Destination pixel rows/columns touched by `bounds`, clipped to the destination.
fn pixel_span(bounds: Rect, width: u32, height: u32) -> Option<(PixelRange, PixelRange)> {
    let clip = |low: f64, high: f64, limit: u32| -> Option<PixelRange> {
        if !(low.is_finite() && high.is_finite()) {
            return None;
        }
        let start = low.floor().max(0.0);
        let end = high.ceil().min(f64::from(limit));
        (start < end).then(|| start as u32..end as u32)
    };
    Some((
        clip(bounds.x0, bounds.x1, width)?,
        clip(bounds.y0, bounds.y1, height)?,
    ))
}

/// Bilinear sample at a source-space position (texel centers sit at `n + 0.5`).
///
/// Taps past the border clamp to the edge texel. Interpolates in premultiplied space and
/// returns unpremultiplied RGBA in `[0, 255]`.
fn sample_bilinear(source: &RgbaImage, x: f64, y: f64) -> [f32; 4] {
    let fx = x - 0.5;
    let fy = y - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = (fx - x0) as f32;
    let ty = (fy - y0) as f32;

    let mut accumulated = [0.0_f32; 4];
    let taps = [
        (x0, y0, (1.0 - tx) * (1.0 - ty)),
        (x0 + 1.0, y0, tx * (1.0 - ty)),
        (x0, y0 + 1.0, (1.0 - tx) * ty),
        (x0 + 1.0, y0 + 1.0, tx * ty),
    ];
    for (tap_x, tap_y, weight) in taps {
        if weight <= 0.0 {
            continue;
        }
        let [r, g, b, a] = texel(source, tap_x, tap_y);
        let alpha = f32::from(a);
        let premultiply = alpha / 255.0;
        accumulated[0] += f32::from(r) * premultiply * weight;
        accumulated[1] += f32::from(g) * premultiply * weight;
        accumulated[2] += f32::from(b) * premultiply * weight;
        accumulated[3] += alpha * weight;
    }

    let alpha = accumulated[3];
    if alpha <= 0.0 {
        return [0.0; 4];
    }
    let unpremultiply = 255.0 / alpha;
    [
        (accumulated[0] * unpremultiply).min(255.0),
        (accumulated[1] * unpremultiply).min(255.0),
        (accumulated[2] * unpremultiply).min(255.0),
        alpha.min(255.0),
    ]
}

fn texel(source: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    let max_x = f64::from(source.width().saturating_sub(1));
    let max_y = f64::from(source.height().saturating_sub(1));
    source
        .get_pixel(x.clamp(0.0, max_x) as u32, y.clamp(0.0, max_y) as u32)
        .0
}

/// Source-over composite of an unpremultiplied color onto an unpremultiplied pixel.
fn blend_over(pixel: &mut Rgba<u8>, source: [f32; 4]) {
    let source_alpha = source[3] / 255.0;
    if source_alpha <= 0.0 {
        return;
    }
    let destination_alpha = f32::from(pixel[3]) / 255.0;
    let kept = destination_alpha * (1.0 - source_alpha);
    let out_alpha = source_alpha + kept;
    for channel in 0..3 {
        let blended =
            (source[channel] * source_alpha + f32::from(pixel[channel]) * kept) / out_alpha;
        pixel[channel] = blended.clamp(0.0, 255.0).round() as u8;
    }
    pixel[3] = (out_alpha * 255.0).clamp(0.0, 255.0).round() as u8;
}
