use image::{buffer::ConvertBuffer, codecs::jpeg::JpegEncoder, ColorType, RgbImage};

use crate::Image;

/// JPEG quality of the dataset images.
pub const DEFAULT_QUALITY: u8 = 95;

pub(crate) fn encode(image: &Image, quality: u8) -> anyhow::Result<Vec<u8>> {
    anyhow::ensure!(
        (1..=100).contains(&quality),
        "JPEG quality must be between 1 and 100, got {quality}"
    );

    let rgb: RgbImage = image.buf.convert();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;
    log::trace!(
        "encoded {}x{} image as {} byte JPEG (q={quality})",
        image.width(),
        image.height(),
        data.len()
    );
    Ok(data)
}
