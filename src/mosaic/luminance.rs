//! Scalar brightness of a pixel region using BT.601 weights

use crate::io::configuration::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R};
use image::{GenericImageView, Rgb};

/// Weighted brightness of a single pixel in [0, 255]
pub fn pixel_luminance(pixel: Rgb<u8>) -> f64 {
    let [r, g, b] = pixel.0;
    LUMINANCE_B.mul_add(
        f64::from(b),
        LUMINANCE_R.mul_add(f64::from(r), LUMINANCE_G * f64::from(g)),
    )
}

/// Mean brightness over every pixel of `region`
///
/// Per-pixel values are summed unrounded and divided once by the pixel count.
/// An empty region has brightness 0.
pub fn luminance<V>(region: &V) -> f64
where
    V: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = region.dimensions();
    let count = u64::from(width) * u64::from(height);
    if count == 0 {
        return 0.0;
    }

    let total: f64 = region
        .pixels()
        .map(|(_, _, pixel)| pixel_luminance(pixel))
        .sum();

    total / count as f64
}
