/// Shared geometric and color primitives used across layer, render and session modules.
use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let digits = raw.trim().strip_prefix('#')?;
        if !digits.is_ascii() {
            return None;
        }
        let channel = |index: usize| u8::from_str_radix(digits.get(index..index + 2)?, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color literal: {value}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Logical canvas dimensions in preview pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_measured(self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn center(self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Center-anchored placement of a layer on the canvas.
///
/// `x`/`y` is the layer center in canvas pixels, `rotation_degrees` turns clockwise
/// around that center and `scale` multiplies the layer's native size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub rotation_degrees: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

impl Transform {
    pub const fn new(x: f32, y: f32, scale: f32, rotation_degrees: f32) -> Self {
        Self {
            x,
            y,
            scale,
            rotation_degrees,
        }
    }

    pub const fn at(x: f32, y: f32) -> Self {
        Self::new(x, y, 1.0, 0.0)
    }

    pub fn with_position(self, x: f32, y: f32) -> Self {
        Self { x, y, ..self }
    }

    pub fn with_scale_clamped(self, scale: f32, min_scale: f32, max_scale: f32) -> Self {
        Self {
            scale: clamp_scale(scale, min_scale, max_scale),
            ..self
        }
    }

    pub fn with_rotation(self, rotation_degrees: f32) -> Self {
        Self {
            rotation_degrees,
            ..self
        }
    }

    /// Maps a canvas-space point into the layer's unscaled, unrotated local space.
    pub fn canvas_to_local(&self, canvas_x: f32, canvas_y: f32) -> (f32, f32) {
        let dx = canvas_x - self.x;
        let dy = canvas_y - self.y;

        let radians = (-self.rotation_degrees).to_radians();
        let (sin, cos) = radians.sin_cos();
        let rx = dx * cos - dy * sin;
        let ry = dx * sin + dy * cos;

        (rx / self.scale, ry / self.scale)
    }

    /// Local-to-destination affine for a render pass at the given output scale factors.
    pub fn to_affine(&self, scale_x: f32, scale_y: f32) -> Affine {
        Affine::translate((
            f64::from(self.x) * f64::from(scale_x),
            f64::from(self.y) * f64::from(scale_y),
        )) * Affine::rotate(f64::from(self.rotation_degrees).to_radians())
            * Affine::scale_non_uniform(
                f64::from(self.scale) * f64::from(scale_x),
                f64::from(self.scale) * f64::from(scale_y),
            )
    }

    pub fn local_to_canvas(&self, local_x: f32, local_y: f32) -> (f32, f32) {
        let point = self.to_affine(1.0, 1.0) * Point::new(f64::from(local_x), f64::from(local_y));
        (point.x as f32, point.y as f32)
    }
}

pub fn clamp_scale(scale: f32, min_scale: f32, max_scale: f32) -> f32 {
    if scale.is_nan() {
        return min_scale;
    }
    scale.clamp(min_scale, max_scale)
}

/// Axis-aligned footprint of a layer on the canvas (center plus scaled size, rotation ignored).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBounds {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayerBounds {
    pub const fn new(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.center_x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.center_y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.center_y + self.height / 2.0
    }
}
