//! Automatic brightness and contrast normalization.

use crate::{AsImageView, Color, Image};

/// Default share of pixels (in percent) that may be clipped by [`auto_brightness_contrast`].
pub const DEFAULT_CLIP_PERCENT: f32 = 1.0;

/// 256-bin histogram of pixel luma values.
#[derive(Clone)]
pub struct Histogram {
    bins: [u64; 256],
}

impl Histogram {
    /// Computes the luma histogram of `image`.
    pub fn of_luma<V: AsImageView>(image: &V) -> Self {
        let view = image.as_view();
        let mut bins = [0; 256];
        for y in 0..view.height() {
            for x in 0..view.width() {
                bins[usize::from(view.get(x, y).luma())] += 1;
            }
        }
        Self { bins }
    }

    #[inline]
    pub fn bins(&self) -> &[u64; 256] {
        &self.bins
    }

    /// Returns the total number of samples in the histogram.
    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    /// Returns the running sum of all bins.
    pub fn cumulative(&self) -> [u64; 256] {
        let mut acc = [0; 256];
        let mut sum = 0;
        for (out, bin) in acc.iter_mut().zip(self.bins) {
            sum += bin;
            *out = sum;
        }
        acc
    }

    /// Returns the luma range `[min, max]` that remains after cutting off up to `clip` samples
    /// from each end of the histogram.
    pub fn clipped_range(&self, clip: f64) -> (u8, u8) {
        let acc = self.cumulative();
        let total = acc[255] as f64;

        let min = acc.iter().position(|&a| a as f64 > clip).unwrap_or(0);
        let max = acc
            .iter()
            .position(|&a| a as f64 >= total - clip)
            .unwrap_or(255);
        (min as u8, max as u8)
    }
}

/// Stretches the brightness range of `image` so that the clipped luma range covers `0..=255`.
///
/// Up to `clip_percent / 2` percent of the pixels at each end of the luma histogram are allowed to
/// saturate. Every color channel `v` is mapped to `|alpha * v + beta|`, saturated to `0..=255`,
/// where `alpha = 255 / (max - min)` and `beta = -min * alpha`. The alpha channel is left
/// untouched.
///
/// Images whose clipped range is empty (eg. flat images) are returned unchanged.
pub fn auto_brightness_contrast<V: AsImageView>(image: &V, clip_percent: f32) -> Image {
    let mut out = image.as_view().to_image();

    let hist = Histogram::of_luma(&out);
    let clip = f64::from(clip_percent) * hist.total() as f64 / 100.0 / 2.0;
    let (min, max) = hist.clipped_range(clip);
    if max <= min {
        log::trace!("luma range {min}..={max} is empty, leaving image unchanged");
        return out;
    }

    let alpha = 255.0 / f32::from(max - min);
    let beta = -f32::from(min) * alpha;
    log::trace!("contrast stretch: luma {min}..={max}, alpha={alpha}, beta={beta}");

    let map = |v: u8| (alpha * f32::from(v) + beta).abs().round().clamp(0.0, 255.0) as u8;
    out.map_pixels(|c| Color::from_rgba8(map(c.r()), map(c.g()), map(c.b()), c.a()));
    out
}

#[cfg(test)]
mod tests {
    use crate::Resolution;

    use super::*;

    fn gray_ramp(from: u8, to: u8) -> Image {
        let mut image = Image::new(u32::from(to - from) + 1, 1);
        for (x, v) in (from..=to).enumerate() {
            image.set(x as u32, 0, Color::from_rgb8(v, v, v));
        }
        image
    }

    #[test]
    fn flat_image_is_unchanged() {
        let image = Image::filled(Resolution::new(4, 3), Color::from_rgb8(90, 120, 30));
        assert_eq!(auto_brightness_contrast(&image, 0.0), image);
        assert_eq!(auto_brightness_contrast(&image, DEFAULT_CLIP_PERCENT), image);
    }

    #[test]
    fn ramp_is_stretched() {
        let image = gray_ramp(100, 151);
        let out = auto_brightness_contrast(&image, 0.0);
        assert_eq!(out.get(0, 0), Color::from_rgb8(0, 0, 0));
        assert_eq!(out.get(51, 0), Color::from_rgb8(255, 255, 255));
        assert_eq!(out.get(10, 0), Color::from_rgb8(50, 50, 50));
    }

    #[test]
    fn full_range_is_unchanged() {
        let image = gray_ramp(0, 255);
        assert_eq!(auto_brightness_contrast(&image, 0.0), image);
    }

    #[test]
    fn clipped_range() {
        // 100 samples: 1 dark outlier, 98 in the middle, 1 bright outlier.
        let mut image = Image::filled(Resolution::new(100, 1), Color::from_rgb8(128, 128, 128));
        image.set(0, 0, Color::BLACK);
        image.set(99, 0, Color::WHITE);

        let hist = Histogram::of_luma(&image);
        assert_eq!(hist.total(), 100);
        assert_eq!(hist.clipped_range(0.0), (0, 255));
        assert_eq!(hist.clipped_range(1.0), (128, 128));
    }
}
