use super::*;
use Color as C;

fn mkimage<const W: usize, const H: usize>(data: [[Color; W]; H]) -> Image {
    let data = data
        .into_iter()
        .flat_map(|row| row.into_iter())
        .flat_map(|col| col.0)
        .collect::<Vec<_>>();
    Image::from_rgba8(Resolution::new(W as u32, H as u32), &data)
}

#[test]
fn views() {
    #[rustfmt::skip]
    let image = mkimage([
        [C::BLUE, C::WHITE, C::WHITE],
        [C::WHITE, C::RED, C::WHITE],
        [C::WHITE, C::WHITE, C::GREEN],
    ]);

    let center = image.view(Rect::from_top_left(1.0, 1.0, 1.0, 1.0));
    assert_eq!(center.resolution(), Resolution::new(1, 1));
    assert_eq!(center.get(0, 0), C::RED);

    let bottom_right = image.view(Rect::from_top_left(1.0, 1.0, 2.0, 2.0));
    assert_eq!(bottom_right.get(0, 0), C::RED);
    assert_eq!(bottom_right.get(1, 1), C::GREEN);

    let nested = bottom_right.view(Rect::from_top_left(1.0, 1.0, 1.0, 1.0));
    assert_eq!(nested.get(0, 0), C::GREEN);
}

#[test]
fn out_of_bounds_views() {
    #[rustfmt::skip]
    let mut image = mkimage([
        [C::BLUE, C::WHITE],
        [C::WHITE, C::RED],
    ]);

    let view = image.view(Rect::from_top_left(-1.0, -1.0, 2.0, 2.0));
    assert_eq!(view.resolution(), Resolution::new(2, 2));
    assert_eq!(view.get(0, 0), C::NONE);
    assert_eq!(view.get(1, 0), C::NONE);
    assert_eq!(view.get(1, 1), C::BLUE);

    let mut view = image.view_mut(Rect::from_top_left(1.0, 1.0, 2.0, 2.0));
    view.set(0, 0, C::GREEN);
    view.set(1, 1, C::GREEN);
    assert_eq!(view.get(1, 1), C::NONE);
    assert_eq!(image.get(1, 1), C::GREEN);
}

#[test]
fn to_image() {
    #[rustfmt::skip]
    let image = mkimage([
        [C::BLUE, C::WHITE, C::WHITE],
        [C::WHITE, C::RED, C::WHITE],
    ]);

    let copy = image.view(Rect::from_top_left(1.0, 0.0, 2.0, 2.0)).to_image();
    #[rustfmt::skip]
    let expected = mkimage([
        [C::WHITE, C::WHITE],
        [C::RED, C::WHITE],
    ]);
    assert_eq!(copy, expected);
    assert_eq!(image.as_view().to_image(), image);
}

#[test]
fn copy_from() {
    let mut canvas = Image::filled(Resolution::new(4, 4), C::WHITE);
    let patch = Image::filled(Resolution::new(2, 1), C::RED);

    canvas
        .view_mut(Rect::from_top_left(1.0, 2.0, 2.0, 1.0))
        .copy_from(&patch);

    for y in 0..4 {
        for x in 0..4 {
            let expected = if y == 2 && (1..3).contains(&x) {
                C::RED
            } else {
                C::WHITE
            };
            assert_eq!(canvas.get(x, y), expected, "({x},{y})");
        }
    }
}

#[test]
#[should_panic(expected = "same size")]
fn copy_from_size_mismatch() {
    let mut canvas = Image::new(4, 4);
    let patch = Image::new(3, 3);
    canvas.as_view_mut().copy_from(&patch);
}

#[test]
fn resize() {
    let image = Image::filled(Resolution::new(80, 120), C::from_rgb8(10, 20, 30));
    let resized = image.resize(Resolution::square(300));
    assert_eq!(resized.resolution(), Resolution::square(300));
    assert!(resized.pixels().all(|c| c == C::from_rgb8(10, 20, 30)));

    let view = image.view(Rect::from_top_left(10.0, 10.0, 20.0, 40.0));
    let resized = view.resize(Resolution::new(30, 60));
    assert_eq!(resized.resolution(), Resolution::new(30, 60));
    assert_eq!(resized.get(15, 30), C::from_rgb8(10, 20, 30));
}

#[test]
fn rgb_rows_with_stride() {
    let data = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
    let image = Image::from_rgb8_rows(Resolution::new(2, 2), 8, &data);
    assert_eq!(image.get(0, 0), C::from_rgb8(1, 2, 3));
    assert_eq!(image.get(1, 0), C::from_rgb8(4, 5, 6));
    assert_eq!(image.get(0, 1), C::from_rgb8(7, 8, 9));
    assert_eq!(image.get(1, 1), C::from_rgb8(10, 11, 12));
}

#[test]
fn jpeg_encoding() {
    let image = Image::filled(Resolution::new(16, 8), C::from_rgb8(200, 40, 40));
    let data = image.encode_jpeg(DEFAULT_JPEG_QUALITY).unwrap();
    assert_eq!(&data[..2], &[0xFF, 0xD8]);

    let dir = std::env::temp_dir().join(format!("signprep-image-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("red.jpg");
    std::fs::write(&path, &data).unwrap();
    let decoded = Image::load(&path).unwrap();
    assert_eq!(decoded.resolution(), image.resolution());
    let c = decoded.get(4, 4);
    assert!(c.r() > 180 && c.g() < 70 && c.b() < 70, "{c:?}");
    std::fs::remove_dir_all(&dir).unwrap();

    assert!(image.encode_jpeg(0).is_err());
}
