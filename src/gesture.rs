use crate::align::snap;
use crate::geometry::{clamp_scale, CanvasSize, Transform};

/// One incremental pinch/pan/rotate step reported by the host's gesture detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformGesture {
    pub pan_x: f32,
    pub pan_y: f32,
    pub zoom: f32,
    pub rotation_degrees: f32,
}

impl Default for TransformGesture {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureLimits {
    pub min_scale: f32,
    pub max_scale: f32,
    pub snap_threshold: f32,
}

impl TransformGesture {
    pub const IDENTITY: Self = Self {
        pan_x: 0.0,
        pan_y: 0.0,
        zoom: 1.0,
        rotation_degrees: 0.0,
    };

    pub const fn pan(pan_x: f32, pan_y: f32) -> Self {
        Self {
            pan_x,
            pan_y,
            ..Self::IDENTITY
        }
    }

    pub const fn zoom(zoom: f32) -> Self {
        Self {
            zoom,
            ..Self::IDENTITY
        }
    }

    pub const fn rotate(rotation_degrees: f32) -> Self {
        Self {
            rotation_degrees,
            ..Self::IDENTITY
        }
    }

    /// Folds this step into a layer transform.
    ///
    /// Panning moves `raw_center`, the unsnapped center carried from the previous step of the
    /// same drag, and the stored position is that point snapped to the canvas guides. Steps
    /// without pan keep the layer where it is. `content_size` is the layer's unscaled size;
    /// without it, or on an unmeasured canvas, the raw position is used as-is.
    pub fn apply(
        &self,
        transform: Transform,
        raw_center: (f32, f32),
        content_size: Option<(f32, f32)>,
        canvas: CanvasSize,
        limits: &GestureLimits,
    ) -> GestureStep {
        let zoom = if self.zoom.is_finite() { self.zoom } else { 1.0 };
        let scale = clamp_scale(transform.scale * zoom, limits.min_scale, limits.max_scale);
        let rotation_degrees = transform.rotation_degrees + finite_or_zero(self.rotation_degrees);
        let (pan_x, pan_y) = (finite_or_zero(self.pan_x), finite_or_zero(self.pan_y));

        if pan_x == 0.0 && pan_y == 0.0 {
            return GestureStep {
                transform: Transform::new(transform.x, transform.y, scale, rotation_degrees),
                raw_center,
            };
        }

        let raw_center = (raw_center.0 + pan_x, raw_center.1 + pan_y);
        let (mut x, mut y) = raw_center;
        if let (Some((width, height)), true) = (content_size, canvas.is_measured()) {
            x = snap(x, canvas.width, width * scale, limits.snap_threshold);
            y = snap(y, canvas.height, height * scale, limits.snap_threshold);
        }
        GestureStep {
            transform: Transform::new(x, y, scale, rotation_degrees),
            raw_center,
        }
    }
}

/// Outcome of one gesture step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureStep {
    /// Snapped transform to store on the layer.
    pub transform: Transform,
    /// Unsnapped center the next step of the drag continues from.
    pub raw_center: (f32, f32),
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
