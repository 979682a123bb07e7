//! Snap-to-guide math for drags and the observational guide lines shown while dragging.

use crate::geometry::{CanvasSize, Color, LayerBounds};

pub const DEFAULT_SNAP_THRESHOLD_PX: f32 = 15.0;
pub const GUIDE_COLOR: Color = Color::rgb(0x00, 0x7A, 0xFF);
pub const GUIDE_WIDTH_PX: f32 = 2.0;
pub const GUIDE_DASH_PATTERN: [f32; 2] = [8.0, 4.0];

/// Snaps a layer center coordinate on one axis.
///
/// Targets in priority order: canvas center, leading edge on the canvas origin, trailing
/// edge on the far canvas edge. The first target within `threshold` wins and no further
/// correction is chained; otherwise `value` is returned unchanged.
///
/// There is no separate "top edge" target for the y axis. With one `layer_dimension` per
/// axis it would test `|value - layer_dimension / 2|`, which is the leading-edge rule, so
/// a top-edge snap on y is exactly the leading-edge snap.
pub fn snap(value: f32, canvas_dimension: f32, layer_dimension: f32, threshold: f32) -> f32 {
    let center = canvas_dimension / 2.0;
    let half_layer = layer_dimension / 2.0;

    if (value - center).abs() <= threshold {
        return center;
    }
    if (value - half_layer).abs() <= threshold {
        return half_layer;
    }
    if (value + half_layer - canvas_dimension).abs() <= threshold {
        return canvas_dimension - half_layer;
    }
    value
}

/// Snaps both axes of a layer footprint independently.
pub fn snap_center(bounds: &LayerBounds, canvas: CanvasSize, threshold: f32) -> (f32, f32) {
    (
        snap(bounds.center_x, canvas.width, bounds.width, threshold),
        snap(bounds.center_y, canvas.height, bounds.height, threshold),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignmentGuide {
    VerticalCenter,
    HorizontalCenter,
    LeftEdge,
    RightEdge,
    TopEdge,
}

impl AlignmentGuide {
    /// Guide segment endpoints in canvas pixels.
    pub fn line(self, canvas: CanvasSize) -> ((f32, f32), (f32, f32)) {
        let (center_x, center_y) = canvas.center();
        match self {
            Self::VerticalCenter => ((center_x, 0.0), (center_x, canvas.height)),
            Self::HorizontalCenter => ((0.0, center_y), (canvas.width, center_y)),
            Self::LeftEdge => ((0.0, 0.0), (0.0, canvas.height)),
            Self::RightEdge => ((canvas.width, 0.0), (canvas.width, canvas.height)),
            Self::TopEdge => ((0.0, 0.0), (canvas.width, 0.0)),
        }
    }
}

/// Guides a host should draw for a layer footprint; empty while the canvas is unmeasured.
pub fn alignment_guides(
    bounds: &LayerBounds,
    canvas: CanvasSize,
    threshold: f32,
) -> Vec<AlignmentGuide> {
    if !canvas.is_measured() {
        return Vec::new();
    }
    let (center_x, center_y) = canvas.center();
    let near = |value: f32, target: f32| (value - target).abs() <= threshold;

    [
        (near(bounds.center_x, center_x), AlignmentGuide::VerticalCenter),
        (near(bounds.center_y, center_y), AlignmentGuide::HorizontalCenter),
        (near(bounds.left(), 0.0), AlignmentGuide::LeftEdge),
        (near(bounds.right(), canvas.width), AlignmentGuide::RightEdge),
        (near(bounds.top(), 0.0), AlignmentGuide::TopEdge),
    ]
    .into_iter()
    .filter_map(|(active, guide)| active.then_some(guide))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_within_threshold_of_center_snaps_exactly() {
        assert_eq!(snap(512.0, 1000.0, 100.0, 15.0), 500.0);
        assert_eq!(snap(485.0, 1000.0, 100.0, 15.0), 500.0);
        assert_eq!(snap(516.0, 1000.0, 100.0, 15.0), 516.0);
    }

    #[test]
    fn leading_edge_snaps_to_origin() {
        // left edge at 10 => center snaps to half width
        assert_eq!(snap(60.0, 1000.0, 100.0, 15.0), 50.0);
        assert_eq!(snap(66.0, 1000.0, 100.0, 15.0), 66.0);
    }

    #[test]
    fn trailing_edge_snaps_to_far_edge() {
        assert_eq!(snap(940.0, 1000.0, 100.0, 15.0), 950.0);
        assert_eq!(snap(934.0, 1000.0, 100.0, 15.0), 934.0);
    }

    #[test]
    fn center_takes_priority_over_edges() {
        // a layer as wide as the canvas is near every target at once
        assert_eq!(snap(505.0, 1000.0, 1000.0, 15.0), 500.0);
    }

    #[test]
    fn top_edge_on_y_is_the_leading_edge_rule() {
        // 50px tall layer with its top 8px below the origin
        assert_eq!(snap(33.0, 800.0, 50.0, 15.0), 25.0);
        let bounds = LayerBounds::new(300.0, 33.0, 100.0, 50.0);
        let snapped = snap_center(&bounds, CanvasSize::new(1000.0, 800.0), 15.0);
        assert_eq!(snapped, (300.0, 25.0));
    }

    #[test]
    fn snap_center_handles_each_axis_independently() {
        let bounds = LayerBounds::new(508.0, 300.0, 100.0, 50.0);
        let snapped = snap_center(&bounds, CanvasSize::new(1000.0, 800.0), 15.0);
        assert_eq!(snapped, (500.0, 300.0));
    }

    #[test]
    fn guides_report_every_aligned_target() {
        let canvas = CanvasSize::new(1000.0, 1000.0);
        let centered = LayerBounds::new(500.0, 500.0, 200.0, 200.0);
        assert_eq!(
            alignment_guides(&centered, canvas, 15.0),
            vec![AlignmentGuide::VerticalCenter, AlignmentGuide::HorizontalCenter]
        );

        let corner = LayerBounds::new(55.0, 45.0, 100.0, 100.0);
        assert_eq!(
            alignment_guides(&corner, canvas, 15.0),
            vec![AlignmentGuide::LeftEdge, AlignmentGuide::TopEdge]
        );

        assert!(alignment_guides(&corner, CanvasSize::ZERO, 15.0).is_empty());
    }

    #[test]
    fn guide_lines_span_the_canvas() {
        let canvas = CanvasSize::new(300.0, 200.0);
        assert_eq!(
            AlignmentGuide::VerticalCenter.line(canvas),
            ((150.0, 0.0), (150.0, 200.0))
        );
        assert_eq!(
            AlignmentGuide::RightEdge.line(canvas),
            ((300.0, 0.0), (300.0, 200.0))
        );
    }
}
