use serde::{Deserialize, Serialize};

use super::ColorMatrix;

/// Inclusive range a single adjustment parameter is clamped to before use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentRange {
    pub min: f32,
    pub max: f32,
    pub neutral: f32,
}

impl AdjustmentRange {
    const fn new(min: f32, max: f32, neutral: f32) -> Self {
        Self { min, max, neutral }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.neutral;
        }
        value.clamp(self.min, self.max)
    }
}

/// Continuous seven-parameter color correction for an image layer.
///
/// Values are stored as given and clamped when the matrix is built, so a host slider may
/// overshoot without corrupting the result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub saturation: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub exposure: f32,
    pub temperature: f32,
    pub tint: f32,
    pub hue: f32,
}

impl Default for Adjustment {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl Adjustment {
    pub const SATURATION: AdjustmentRange = AdjustmentRange::new(0.0, 2.0, 1.0);
    pub const BRIGHTNESS: AdjustmentRange = AdjustmentRange::new(-100.0, 100.0, 0.0);
    pub const CONTRAST: AdjustmentRange = AdjustmentRange::new(0.5, 1.5, 1.0);
    pub const EXPOSURE: AdjustmentRange = AdjustmentRange::new(-1.0, 1.0, 0.0);
    pub const TEMPERATURE: AdjustmentRange = AdjustmentRange::new(-100.0, 100.0, 0.0);
    pub const TINT: AdjustmentRange = AdjustmentRange::new(-100.0, 100.0, 0.0);
    pub const HUE: AdjustmentRange = AdjustmentRange::new(-180.0, 180.0, 0.0);

    pub const NEUTRAL: Self = Self {
        saturation: 1.0,
        brightness: 0.0,
        contrast: 1.0,
        exposure: 0.0,
        temperature: 0.0,
        tint: 0.0,
        hue: 0.0,
    };

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    pub fn clamped(&self) -> Self {
        Self {
            saturation: Self::SATURATION.clamp(self.saturation),
            brightness: Self::BRIGHTNESS.clamp(self.brightness),
            contrast: Self::CONTRAST.clamp(self.contrast),
            exposure: Self::EXPOSURE.clamp(self.exposure),
            temperature: Self::TEMPERATURE.clamp(self.temperature),
            tint: Self::TINT.clamp(self.tint),
            hue: Self::HUE.clamp(self.hue),
        }
    }

    /// Composes the adjustment into one matrix.
    ///
    /// Order: saturation, contrast, exposure, temperature, tint, hue (red, green, blue
    /// axes), brightness. Brightness stays last so its offset is never rescaled.
    pub fn to_color_matrix(&self) -> ColorMatrix {
        let Self {
            saturation,
            brightness,
            contrast,
            exposure,
            temperature,
            tint,
            hue,
        } = self.clamped();

        let contrast_offset = (-0.5 * contrast + 0.5) * 255.0;
        let exposure_factor = 2.0_f32.powf(exposure);

        let steps = [
            ColorMatrix::saturation(saturation),
            ColorMatrix::rgb_scale_offset(contrast, contrast, contrast, contrast_offset),
            ColorMatrix::rgb_scale_offset(exposure_factor, exposure_factor, exposure_factor, 0.0),
            ColorMatrix::rgb_scale_offset(
                1.0 + temperature / 200.0,
                1.0,
                1.0 - temperature / 200.0,
                0.0,
            ),
            ColorMatrix::rgb_scale_offset(1.0, 1.0 + tint / 200.0, 1.0, 0.0),
            ColorMatrix::rotation(0, hue),
            ColorMatrix::rotation(1, hue),
            ColorMatrix::rotation(2, hue),
            ColorMatrix::rgb_scale_offset(1.0, 1.0, 1.0, brightness),
        ];

        steps
            .iter()
            .fold(ColorMatrix::IDENTITY, |composed, step| composed.post_concat(step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_adjustments() -> Vec<Adjustment> {
        vec![
            Adjustment::NEUTRAL,
            Adjustment {
                saturation: 0.0,
                ..Adjustment::NEUTRAL
            },
            Adjustment {
                saturation: 1.7,
                brightness: -40.0,
                contrast: 1.2,
                exposure: 0.5,
                temperature: 60.0,
                tint: -25.0,
                hue: 90.0,
            },
            Adjustment {
                saturation: 9.0,
                brightness: 400.0,
                contrast: -3.0,
                exposure: 5.0,
                temperature: -900.0,
                tint: 900.0,
                hue: -720.0,
            },
        ]
    }

    #[test]
    fn neutral_adjustment_builds_exact_identity() {
        assert!(Adjustment::NEUTRAL.to_color_matrix().is_identity());
    }

    #[test]
    fn composing_with_neutral_matrix_is_exact_no_op() {
        let neutral = Adjustment::NEUTRAL.to_color_matrix();
        for adjustment in sample_adjustments() {
            let matrix = adjustment.to_color_matrix();
            assert_eq!(matrix.post_concat(&neutral), matrix);
            assert_eq!(neutral.post_concat(&matrix), matrix);
        }
    }

    #[test]
    fn zero_saturation_turns_pure_red_into_luma_gray() {
        let adjustment = Adjustment {
            saturation: 0.0,
            ..Adjustment::NEUTRAL
        };
        let gray = adjustment.to_color_matrix().apply([255, 0, 0, 255]);
        let expected = (0.213_f32 * 255.0).round() as u8;
        assert_eq!(gray, [expected, expected, expected, 255]);
        assert_eq!(expected, 54);
    }

    #[test]
    fn parameters_are_clamped_to_documented_ranges() {
        let wild = Adjustment {
            saturation: -1.0,
            brightness: 250.0,
            contrast: 9.0,
            exposure: -4.0,
            temperature: 101.0,
            tint: -101.0,
            hue: 181.0,
        };
        let clamped = wild.clamped();
        assert_eq!(clamped.saturation, 0.0);
        assert_eq!(clamped.brightness, 100.0);
        assert_eq!(clamped.contrast, 1.5);
        assert_eq!(clamped.exposure, -1.0);
        assert_eq!(clamped.temperature, 100.0);
        assert_eq!(clamped.tint, -100.0);
        assert_eq!(clamped.hue, 180.0);
        assert_eq!(wild.to_color_matrix(), clamped.to_color_matrix());
    }

    #[test]
    fn brightness_offset_is_applied_after_contrast_scaling() {
        let adjustment = Adjustment {
            brightness: 20.0,
            contrast: 1.5,
            ..Adjustment::NEUTRAL
        };
        let matrix = adjustment.to_color_matrix();
        // 100 * 1.5 + (-0.25 * 255) + 20
        assert_eq!(matrix.apply([100, 100, 100, 255])[0], 106);
    }

    #[test]
    fn temperature_warms_red_and_cools_blue() {
        let warm = Adjustment {
            temperature: 100.0,
            ..Adjustment::NEUTRAL
        };
        assert_eq!(
            warm.to_color_matrix().apply([100, 100, 100, 255]),
            [150, 100, 50, 255]
        );
    }

    #[test]
    fn exposure_doubles_rgb_per_stop() {
        let bright = Adjustment {
            exposure: 1.0,
            ..Adjustment::NEUTRAL
        };
        assert_eq!(
            bright.to_color_matrix().apply([40, 60, 80, 200]),
            [80, 120, 160, 200]
        );
    }

    #[test]
    fn nan_parameters_fall_back_to_neutral() {
        let broken = Adjustment {
            hue: f32::NAN,
            ..Adjustment::NEUTRAL
        };
        assert!(broken.to_color_matrix().is_identity());
    }
}
