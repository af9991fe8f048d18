//! Animated images.

use std::{
    collections::VecDeque,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    time::Duration,
};

use anyhow::{bail, Context};
use image::{
    codecs::{gif::GifDecoder, png::PngDecoder},
    AnimationDecoder,
};
use signprep_image::{Image, Resolution};

use crate::FrameSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnimationFormat {
    Gif,
    Apng,
}

impl AnimationFormat {
    /// Maps a lowercase file extension to the animation format it denotes.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "gif" => Some(Self::Gif),
            "apng" | "png" => Some(Self::Apng),
            _ => None,
        }
    }
}

/// A timed sequence of images.
pub struct Animation {
    frames: Vec<(Image, Duration)>,
}

impl Animation {
    /// Loads an animation from the filesystem.
    ///
    /// The path must have a supported extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::from_path_impl(path.as_ref())
    }

    fn from_path_impl(path: &Path) -> anyhow::Result<Self> {
        let format = match path.extension() {
            Some(ext) => match AnimationFormat::from_extension(&ext.to_string_lossy().to_lowercase())
            {
                Some(format) => format,
                None => bail!(
                    "file extension `{}` is not supported for animations",
                    ext.to_string_lossy()
                ),
            },
            None => bail!("animation path must have a supported extension"),
        };

        let file =
            File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
        Self::from_reader(BufReader::new(file), format)
            .with_context(|| format!("failed to decode animation '{}'", path.display()))
    }

    /// Loads an animation from an in-memory byte slice.
    pub fn from_data(data: &[u8], format: AnimationFormat) -> anyhow::Result<Self> {
        Self::from_reader(data, format)
    }

    /// Loads an animation from a [`BufRead`] implementor.
    pub fn from_reader<R: BufRead>(mut reader: R, format: AnimationFormat) -> anyhow::Result<Self> {
        Self::from_reader_impl(&mut reader, format)
    }

    fn from_reader_impl(reader: &mut dyn BufRead, format: AnimationFormat) -> anyhow::Result<Self> {
        let frames = match format {
            AnimationFormat::Gif => GifDecoder::new(reader)?.into_frames(),
            AnimationFormat::Apng => {
                let dec = PngDecoder::new(reader)?;
                if !dec.is_apng() {
                    bail!("attempted to load APNG animation from still image PNG");
                }
                dec.apng().into_frames()
            }
        };

        let frames = frames
            .map(|res| {
                let frame = res?;
                let dur = Duration::from(frame.delay());
                let image = Image::from_rgba8(
                    Resolution::new(frame.buffer().width(), frame.buffer().height()),
                    frame.buffer(),
                );
                Ok((image, dur))
            })
            .collect::<anyhow::Result<_>>()?;

        Ok(Self { frames })
    }

    /// Returns the number of frames in this animation.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns an iterator over the frames and their display durations.
    pub fn frames(&self) -> impl ExactSizeIterator<Item = (&Image, Duration)> + '_ {
        self.frames.iter().map(|(image, dur)| (image, *dur))
    }
}

/// A [`FrameSource`] yielding the frames of an [`Animation`] in order.
///
/// The whole animation is decoded when the source is opened, so the frame count is always known.
pub struct AnimationSource {
    frames: VecDeque<Image>,
    total: u64,
}

impl AnimationSource {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let anim = Animation::from_path(path)?;
        log::debug!(
            "decoded {} frames from animation '{}'",
            anim.len(),
            path.display()
        );
        Ok(Self::from(anim))
    }
}

impl From<Animation> for AnimationSource {
    fn from(anim: Animation) -> Self {
        Self {
            total: anim.len() as u64,
            frames: anim.frames.into_iter().map(|(image, _)| image).collect(),
        }
    }
}

impl FrameSource for AnimationSource {
    fn frame_count(&self) -> Option<u64> {
        Some(self.total)
    }

    fn read_frame(&mut self) -> anyhow::Result<Option<Image>> {
        Ok(self.frames.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use image::{codecs::gif::GifEncoder, Frame, ImageEncoder, Rgba, RgbaImage};
    use signprep_image::Color;

    use super::*;

    fn write_gif(path: &Path, colors: &[[u8; 4]]) {
        let file = File::create(path).unwrap();
        let mut encoder = GifEncoder::new(file);
        for &color in colors {
            let buf = RgbaImage::from_pixel(6, 4, Rgba(color));
            encoder.encode_frame(Frame::new(buf)).unwrap();
        }
    }

    #[test]
    fn gif_frames_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wave.gif");
        write_gif(
            &path,
            &[[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]],
        );

        let mut source = AnimationSource::open(&path).unwrap();
        assert_eq!(source.frame_count(), Some(3));

        let expected = [Color::RED, Color::GREEN, Color::BLUE];
        for color in expected {
            let frame = source.read_frame().unwrap().unwrap();
            assert_eq!(frame.resolution(), Resolution::new(6, 4));
            assert_eq!(frame.get(3, 2), color);
        }
        assert!(source.read_frame().unwrap().is_none());
        assert!(source.read_frame().unwrap().is_none());
    }

    #[test]
    fn open_dispatches_gif() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CLIP.GIF");
        write_gif(&path, &[[255, 255, 255, 255]; 2]);

        let mut source = crate::open(&path).unwrap();
        assert_eq!(source.frame_count(), Some(2));
        assert!(source.read_frame().unwrap().is_some());
    }

    #[test]
    fn corrupt_gif_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gif");
        std::fs::write(&path, b"definitely not a gif").unwrap();
        assert!(AnimationSource::open(&path).is_err());
    }

    #[test]
    fn still_png_is_rejected() {
        let mut data = Vec::new();
        image::codecs::png::PngEncoder::new(&mut data)
            .write_image(&[0; 4], 1, 1, image::ColorType::Rgba8)
            .unwrap();
        let err = Animation::from_data(&data, AnimationFormat::Apng).err().unwrap();
        assert!(err.to_string().contains("still image"), "{err}");
    }
}
