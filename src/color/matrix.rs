/// Row-major 4x5 affine color matrix over unpremultiplied RGBA in `[0, 255]`.
///
/// Each row produces one output channel:
/// `out = m0 * r + m1 * g + m2 * b + m3 * a + m4`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    values: [f32; 20],
}

const LUMA_R: f32 = 0.213;
const LUMA_G: f32 = 0.715;
const LUMA_B: f32 = 0.072;

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorMatrix {
    #[rustfmt::skip]
    pub const IDENTITY: Self = Self::new([
        1.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]);

    pub const fn new(values: [f32; 20]) -> Self {
        Self { values }
    }

    pub const fn values(&self) -> &[f32; 20] {
        &self.values
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Scales the RGB channels by `r`, `g`, `b` and adds `offset` to each of them.
    #[rustfmt::skip]
    pub const fn rgb_scale_offset(r: f32, g: f32, b: f32, offset: f32) -> Self {
        Self::new([
            r,   0.0, 0.0, 0.0, offset,
            0.0, g,   0.0, 0.0, offset,
            0.0, 0.0, b,   0.0, offset,
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Luma-weighted saturation; `0` is grayscale, `1` is identity.
    #[rustfmt::skip]
    pub fn saturation(saturation: f32) -> Self {
        let inverse = 1.0 - saturation;
        let r = LUMA_R * inverse;
        let g = LUMA_G * inverse;
        let b = LUMA_B * inverse;
        Self::new([
            r + saturation, g,              b,              0.0, 0.0,
            r,              g + saturation, b,              0.0, 0.0,
            r,              g,              b + saturation, 0.0, 0.0,
            0.0,            0.0,            0.0,            1.0, 0.0,
        ])
    }

    /// Rotation of the RGB cube about the red (`0`), green (`1`) or blue (`2`) axis.
    ///
    /// Any other axis index yields the identity.
    pub fn rotation(axis: usize, degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let mut values = Self::IDENTITY.values;
        match axis {
            0 => {
                values[6] = cos;
                values[7] = sin;
                values[11] = -sin;
                values[12] = cos;
            }
            1 => {
                values[0] = cos;
                values[2] = -sin;
                values[10] = sin;
                values[12] = cos;
            }
            2 => {
                values[0] = cos;
                values[1] = sin;
                values[5] = -sin;
                values[6] = cos;
            }
            _ => {}
        }
        Self::new(values)
    }

    /// Returns the matrix that applies `self` first and then `post`.
    pub fn post_concat(&self, post: &Self) -> Self {
        let a = &post.values;
        let b = &self.values;
        let mut out = [0.0_f32; 20];
        for row in 0..4 {
            let base = row * 5;
            for column in 0..4 {
                out[base + column] = a[base] * b[column]
                    + a[base + 1] * b[5 + column]
                    + a[base + 2] * b[10 + column]
                    + a[base + 3] * b[15 + column];
            }
            out[base + 4] = a[base] * b[4]
                + a[base + 1] * b[9]
                + a[base + 2] * b[14]
                + a[base + 3] * b[19]
                + a[base + 4];
        }
        Self::new(out)
    }

    pub fn apply(&self, pixel: [u8; 4]) -> [u8; 4] {
        self.apply_f32(pixel.map(f32::from))
            .map(|channel| channel.round() as u8)
    }

    /// Float variant of [`ColorMatrix::apply`] for interpolated samples; output is clamped
    /// to `[0, 255]` but not rounded.
    pub fn apply_f32(&self, input: [f32; 4]) -> [f32; 4] {
        let m = &self.values;
        let mut out = [0.0_f32; 4];
        for (row, channel) in out.iter_mut().enumerate() {
            let base = row * 5;
            let value = m[base] * input[0]
                + m[base + 1] * input[1]
                + m[base + 2] * input[2]
                + m[base + 3] * input[3]
                + m[base + 4];
            *channel = value.clamp(0.0, 255.0);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_leaves_pixels_untouched() {
        let pixel = [12, 130, 255, 77];
        assert_eq!(ColorMatrix::IDENTITY.apply(pixel), pixel);
    }

    #[test]
    fn post_concat_applies_receiver_before_argument() {
        let double = ColorMatrix::rgb_scale_offset(2.0, 2.0, 2.0, 0.0);
        let offset = ColorMatrix::rgb_scale_offset(1.0, 1.0, 1.0, 10.0);

        let double_then_offset = double.post_concat(&offset);
        assert_eq!(double_then_offset.apply([20, 20, 20, 255]), [50, 50, 50, 255]);

        let offset_then_double = offset.post_concat(&double);
        assert_eq!(offset_then_double.apply([20, 20, 20, 255]), [60, 60, 60, 255]);
    }

    #[test]
    fn zero_saturation_uses_luma_weights() {
        let gray = ColorMatrix::saturation(0.0).apply([255, 0, 0, 255]);
        let expected = (LUMA_R * 255.0).round() as u8;
        assert_eq!(gray, [expected, expected, expected, 255]);
    }

    #[test]
    fn zero_degree_rotation_is_identity_on_every_axis() {
        for axis in 0..3 {
            assert!(ColorMatrix::rotation(axis, 0.0).is_identity());
        }
        assert!(ColorMatrix::rotation(7, 45.0).is_identity());
    }

    #[test]
    fn apply_clamps_out_of_range_channels() {
        let boost = ColorMatrix::rgb_scale_offset(1.0, 1.0, 1.0, 100.0);
        assert_eq!(boost.apply([200, 10, 0, 255]), [255, 110, 100, 255]);
        let cut = ColorMatrix::rgb_scale_offset(1.0, 1.0, 1.0, -100.0);
        assert_eq!(cut.apply([50, 150, 255, 128]), [0, 50, 155, 128]);
    }
}
