//! Frame-by-frame decoding of sign videos.
//!
//! Every supported input is exposed as a [`FrameSource`], a forward-only stream of RGBA frames.
//! Use [`open`] to pick the right decoder for a file based on its extension.
//!
//! Animated GIF and APNG files are always supported. Regular video containers are decoded by the
//! `ffmpeg` feature (enabled by default), which links against the system FFmpeg libraries.

pub mod anim;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

use std::path::Path;

use anyhow::bail;
use signprep_image::Image;

pub use anim::{Animation, AnimationFormat, AnimationSource};

/// A forward-only source of decoded video frames.
///
/// The underlying decoder is released when the source is dropped.
pub trait FrameSource {
    /// Returns the total number of frames reported by the container, if known.
    fn frame_count(&self) -> Option<u64>;

    /// Decodes the next frame.
    ///
    /// Returns `Ok(None)` at the end of the stream.
    fn read_frame(&mut self) -> anyhow::Result<Option<Image>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn frame_count(&self) -> Option<u64> {
        (**self).frame_count()
    }

    fn read_frame(&mut self) -> anyhow::Result<Option<Image>> {
        (**self).read_frame()
    }
}

/// File extensions that are decoded through FFmpeg when the `ffmpeg` feature is enabled.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mov", "mp4", "m4v", "avi", "mkv", "webm", "wmv", "flv", "mpg", "mpeg", "3gp",
];

/// Opens the video file at `path` with a decoder matching its extension.
pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Box<dyn FrameSource>> {
    open_impl(path.as_ref())
}

fn open_impl(path: &Path) -> anyhow::Result<Box<dyn FrameSource>> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    let Some(ext) = ext else {
        bail!("video path '{}' has no file extension", path.display());
    };

    if AnimationFormat::from_extension(&ext).is_some() {
        return Ok(Box::new(AnimationSource::open(path)?));
    }

    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        #[cfg(feature = "ffmpeg")]
        {
            return Ok(Box::new(ffmpeg::FfmpegSource::open(path)?));
        }
        #[cfg(not(feature = "ffmpeg"))]
        {
            bail!(
                "cannot decode '{}': support for `.{ext}` videos requires the `ffmpeg` feature",
                path.display()
            );
        }
    }

    bail!(
        "file extension `.{ext}` of '{}' is not a supported video format",
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_extensions() {
        let err = open("clip.txt").err().unwrap();
        assert!(err.to_string().contains("not a supported video format"), "{err}");

        let err = open("clip").err().unwrap();
        assert!(err.to_string().contains("no file extension"), "{err}");
    }

    #[cfg(not(feature = "ffmpeg"))]
    #[test]
    fn video_containers_need_ffmpeg() {
        let err = open("clip.MOV").err().unwrap();
        assert!(err.to_string().contains("`ffmpeg` feature"), "{err}");
    }
}
