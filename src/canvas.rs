use serde::{Deserialize, Serialize};

use crate::geometry::CanvasSize;

/// Output presets; each fixes the canvas aspect ratio and the export pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasFormat {
    Story,
    #[default]
    Post,
    Portrait,
    Thumbnail,
}

impl CanvasFormat {
    pub const ALL: [Self; 4] = [Self::Story, Self::Post, Self::Portrait, Self::Thumbnail];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Story => "Story",
            Self::Post => "Post",
            Self::Portrait => "Portrait",
            Self::Thumbnail => "Thumbnail",
        }
    }

    pub const fn aspect_label(self) -> &'static str {
        match self {
            Self::Story => "9:16",
            Self::Post => "1:1",
            Self::Portrait => "4:5",
            Self::Thumbnail => "16:9",
        }
    }

    pub const fn export_size(self) -> (u32, u32) {
        match self {
            Self::Story => (1080, 1920),
            Self::Post => (1080, 1080),
            Self::Portrait => (1080, 1350),
            Self::Thumbnail => (1920, 1080),
        }
    }

    pub fn aspect_ratio(self) -> f32 {
        let (width, height) = self.export_size();
        width as f32 / height as f32
    }
}

/// Largest preview size with the format's aspect ratio that fits the available area.
pub fn fit_preview(format: CanvasFormat, max_width: f32, max_height: f32) -> CanvasSize {
    if !(max_width > 0.0 && max_height > 0.0) {
        return CanvasSize::ZERO;
    }
    let aspect = format.aspect_ratio();
    if aspect >= 1.0 {
        let width = max_width.min(max_height * aspect);
        CanvasSize::new(width, width / aspect)
    } else {
        let height = max_height.min(max_width / aspect);
        CanvasSize::new(height * aspect, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_expose_export_dimensions() {
        assert_eq!(CanvasFormat::Story.export_size(), (1080, 1920));
        assert_eq!(CanvasFormat::Thumbnail.aspect_label(), "16:9");
        assert_eq!(CanvasFormat::default(), CanvasFormat::Post);
    }

    #[test]
    fn landscape_format_is_width_limited_in_a_wide_area() {
        let size = fit_preview(CanvasFormat::Thumbnail, 800.0, 1000.0);
        assert!((size.width - 800.0).abs() < 1e-3);
        assert!((size.height - 450.0).abs() < 1e-2);
    }

    #[test]
    fn portrait_format_is_height_limited_in_a_tall_area() {
        let size = fit_preview(CanvasFormat::Portrait, 1000.0, 500.0);
        assert!((size.height - 500.0).abs() < 1e-3);
        assert!((size.width - 400.0).abs() < 1e-2);
    }

    #[test]
    fn narrow_area_limits_portrait_width() {
        let size = fit_preview(CanvasFormat::Story, 360.0, 1000.0);
        assert!((size.width - 360.0).abs() < 1e-3);
        assert!((size.height - 640.0).abs() < 1e-2);
    }

    #[test]
    fn empty_area_yields_unmeasured_canvas() {
        assert!(!fit_preview(CanvasFormat::Post, 0.0, 300.0).is_measured());
    }
}
