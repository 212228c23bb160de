//! Luminance and variance primitives shared by the pixel checks.
//!
//! Luminance here is the plain mean of R, G, B — the scoring thresholds in
//! `VerificationConfig` were tuned against that definition, so switching to
//! a perceptual weighting would shift every variance cutoff.

use image::RgbaImage;

/// Mean-RGB luminance of one pixel.
#[inline]
pub fn luminance(pixel: &image::Rgba<u8>) -> f64 {
    (pixel.0[0] as f64 + pixel.0[1] as f64 + pixel.0[2] as f64) / 3.0
}

/// Population variance of per-pixel luminance across the whole image.
/// Near-blank and solid-color images score close to zero.
pub fn luminance_variance(img: &RgbaImage) -> f64 {
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0u64;

    for pixel in img.pixels() {
        let lum = luminance(pixel);
        sum += lum;
        sum_sq += lum * lum;
        count += 1;
    }

    if count == 0 {
        return 0.0;
    }

    let mean = sum / count as f64;
    ((sum_sq / count as f64) - mean * mean).max(0.0)
}

/// Population variance of the luminances in the 3x3 neighborhood centered
/// at (x, y). Neighbors outside the image are skipped.
pub fn local_variance_3x3(img: &RgbaImage, x: u32, y: u32) -> f64 {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let mut values = [0.0f64; 9];
    let mut n = 0usize;

    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx >= 0 && nx < w && ny >= 0 && ny < h {
                values[n] = luminance(img.get_pixel(nx as u32, ny as u32));
                n += 1;
            }
        }
    }

    variance_of(&values[..n])
}

/// Population variance of a slice of samples. Empty input yields zero.
pub fn variance_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let sum_sq_diff: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    sum_sq_diff / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn solid_color_has_zero_variance() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([77, 77, 77, 255]));
        assert_eq!(luminance_variance(&img), 0.0);
    }

    #[test]
    fn checkerboard_has_high_variance() {
        let img = RgbaImage::from_fn(16, 16, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        // Half at 0, half at 255: variance = 127.5^2 = 16256.25
        let v = luminance_variance(&img);
        assert!((v - 16256.25).abs() < 0.01, "got {v}");
    }

    #[test]
    fn variance_of_empty_is_zero() {
        assert_eq!(variance_of(&[]), 0.0);
    }

    #[test]
    fn variance_of_constant_is_zero() {
        assert_eq!(variance_of(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn variance_of_known_samples() {
        // Mean 2, squared deviations 1, 0, 1 -> population variance 2/3
        let v = variance_of(&[1.0, 2.0, 3.0]);
        assert!((v - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn local_variance_zero_on_flat_region() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([100, 100, 100, 255]));
        assert_eq!(local_variance_3x3(&img, 4, 4), 0.0);
    }

    #[test]
    fn local_variance_handles_corners() {
        let img = RgbaImage::from_fn(4, 4, |x, _| Rgba([(x * 60) as u8, 0, 0, 255]));
        // Corner neighborhood only has 4 in-bounds pixels; must not panic.
        let v = local_variance_3x3(&img, 0, 0);
        assert!(v >= 0.0);
    }
}
