//! Video decoding through the system FFmpeg libraries.

use std::path::Path;

use anyhow::Context;
use ffmpeg_next as ffmpeg;
use ffmpeg::{
    format::{context::Input, Pixel},
    frame::Video,
    media,
    software::scaling::{self, Flags},
    Packet,
};
use signprep_image::{Image, Resolution};

use crate::FrameSource;

/// Decodes the best video stream of a container file frame by frame.
pub struct FfmpegSource {
    input: Input,
    decoder: ffmpeg::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    frame_count: Option<u64>,
    eof_sent: bool,
    decoded: Video,
}

impl FfmpegSource {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::open_impl(path.as_ref())
    }

    fn open_impl(path: &Path) -> anyhow::Result<Self> {
        ffmpeg::init().context("failed to initialize FFmpeg")?;

        let input = ffmpeg::format::input(&path)
            .with_context(|| format!("failed to open video file '{}'", path.display()))?;
        let stream = input
            .streams()
            .best(media::Type::Video)
            .with_context(|| format!("no video stream found in '{}'", path.display()))?;
        let stream_index = stream.index();

        // `nb_frames` is 0 when the container does not store a frame count.
        let frame_count = u64::try_from(stream.frames()).ok().filter(|&n| n > 0);

        let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .context("failed to create codec context")?
            .decoder()
            .video()
            .context("failed to create video decoder")?;

        let (width, height) = (decoder.width(), decoder.height());
        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            Flags::BILINEAR,
        )
        .context("failed to create video scaler")?;

        log::debug!(
            "opened '{}': {}x{}, {:?} frames, {:?}",
            path.display(),
            width,
            height,
            frame_count,
            decoder.format(),
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            frame_count,
            eof_sent: false,
            decoded: Video::empty(),
        })
    }

    fn convert(&mut self) -> anyhow::Result<Image> {
        let mut rgb = Video::empty();
        self.scaler
            .run(&self.decoded, &mut rgb)
            .context("failed to convert frame to RGB")?;

        // Rows of the converted frame may be padded.
        Ok(Image::from_rgb8_rows(
            Resolution::new(rgb.width(), rgb.height()),
            rgb.stride(0),
            rgb.data(0),
        ))
    }
}

impl FrameSource for FfmpegSource {
    fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    fn read_frame(&mut self) -> anyhow::Result<Option<Image>> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded).is_ok() {
                return self.convert().map(Some);
            }
            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        self.decoder
                            .send_packet(&packet)
                            .context("failed to send packet to decoder")?;
                    }
                }
                Err(ffmpeg::Error::Eof) => {
                    self.decoder
                        .send_eof()
                        .context("failed to flush video decoder")?;
                    self.eof_sent = true;
                }
                Err(e) => return Err(e).context("failed to read packet"),
            }
        }
    }
}
