#![cfg(feature = "ffmpeg")]

use std::{fs::File, path::Path};

use image::{codecs::gif::GifEncoder, Frame, Rgba, RgbaImage};
use signprep_image::Resolution;
use signprep_video::{ffmpeg::FfmpegSource, FrameSource};

fn write_gif(path: &Path, colors: &[[u8; 4]]) {
    let mut encoder = GifEncoder::new(File::create(path).unwrap());
    for &color in colors {
        let buf = RgbaImage::from_pixel(64, 48, Rgba(color));
        encoder.encode_frame(Frame::new(buf)).unwrap();
    }
}

fn close(a: u8, b: u8) -> bool {
    a.abs_diff(b) <= 8
}

#[test]
fn decodes_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wave.gif");
    let colors = [[250, 10, 10, 255], [10, 250, 10, 255], [10, 10, 250, 255]];
    write_gif(&path, &colors);

    let mut source = FfmpegSource::open(&path).unwrap();
    for [r, g, b, _] in colors {
        let frame = source.read_frame().unwrap().unwrap();
        assert_eq!(frame.resolution(), Resolution::new(64, 48));
        let c = frame.get(32, 24);
        assert!(close(c.r(), r) && close(c.g(), g) && close(c.b(), b), "{c:?}");
        assert_eq!(c.a(), 255);
    }
    assert!(source.read_frame().unwrap().is_none());
    assert!(source.read_frame().unwrap().is_none());
}

#[test]
fn containers_are_probed_by_content() {
    // FFmpeg detects the format from the data, so a `.mov` path takes the FFmpeg route.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.MOV");
    write_gif(&path, &[[200, 200, 200, 255]; 2]);

    let mut source = signprep_video::open(&path).unwrap();
    let mut frames = 0;
    while let Some(frame) = source.read_frame().unwrap() {
        assert_eq!(frame.resolution(), Resolution::new(64, 48));
        frames += 1;
    }
    assert_eq!(frames, 2);
}

#[test]
fn missing_files_fail_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.mp4");
    let err = FfmpegSource::open(&path).err().unwrap();
    assert!(err.to_string().contains("failed to open video file"), "{err}");
    assert!(signprep_video::open(&path).is_err());
}
