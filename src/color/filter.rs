use serde::{Deserialize, Serialize};

use super::ColorMatrix;

/// Fixed color presets for image layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFilter {
    #[default]
    None,
    Grayscale,
    Sepia,
    Invert,
    Bright,
    HighContrast,
    Warm,
    Cool,
}

impl ImageFilter {
    pub const ALL: [Self; 8] = [
        Self::None,
        Self::Grayscale,
        Self::Sepia,
        Self::Invert,
        Self::Bright,
        Self::HighContrast,
        Self::Warm,
        Self::Cool,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "Original",
            Self::Grayscale => "Grayscale",
            Self::Sepia => "Sepia",
            Self::Invert => "Invert",
            Self::Bright => "Bright",
            Self::HighContrast => "High Contrast",
            Self::Warm => "Warm",
            Self::Cool => "Cool",
        }
    }

    #[rustfmt::skip]
    pub const fn color_matrix(self) -> ColorMatrix {
        match self {
            Self::None => ColorMatrix::IDENTITY,
            Self::Grayscale => ColorMatrix::new([
                0.299, 0.587, 0.114, 0.0, 0.0,
                0.299, 0.587, 0.114, 0.0, 0.0,
                0.299, 0.587, 0.114, 0.0, 0.0,
                0.0,   0.0,   0.0,   1.0, 0.0,
            ]),
            Self::Sepia => ColorMatrix::new([
                0.393, 0.769, 0.189, 0.0, 0.0,
                0.349, 0.686, 0.168, 0.0, 0.0,
                0.272, 0.534, 0.131, 0.0, 0.0,
                0.0,   0.0,   0.0,   1.0, 0.0,
            ]),
            Self::Invert => ColorMatrix::new([
                -1.0,  0.0,  0.0, 0.0, 255.0,
                 0.0, -1.0,  0.0, 0.0, 255.0,
                 0.0,  0.0, -1.0, 0.0, 255.0,
                 0.0,  0.0,  0.0, 1.0,   0.0,
            ]),
            Self::Bright => ColorMatrix::rgb_scale_offset(1.0, 1.0, 1.0, 40.0),
            Self::HighContrast => ColorMatrix::rgb_scale_offset(1.5, 1.5, 1.5, -50.0),
            Self::Warm => ColorMatrix::new([
                1.1, 0.0,  0.0,  0.0, 10.0,
                0.0, 1.05, 0.0,  0.0, 5.0,
                0.0, 0.0,  0.95, 0.0, 0.0,
                0.0, 0.0,  0.0,  1.0, 0.0,
            ]),
            Self::Cool => ColorMatrix::new([
                0.95, 0.0, 0.0, 0.0, 0.0,
                0.0,  1.0, 0.0, 0.0, 0.0,
                0.0,  0.0, 1.1, 0.0, 10.0,
                0.0,  0.0, 0.0, 1.0, 0.0,
            ]),
        }
    }
}
