use std::{fmt, path::Path};

use anyhow::Context;
use image::{imageops::FilterType, GenericImage, GenericImageView, ImageBuffer, Rgba, RgbaImage};

use crate::{jpeg, Color, Rect, Resolution};

#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    fn from_path(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("jpg" | "jpeg") => Ok(Self::Jpeg),
            Some("png") => Ok(Self::Png),
            _ => anyhow::bail!(
                "invalid image path '{}' (must have one of the supported extensions)",
                path.display()
            ),
        }
    }
}

/// An 8-bit sRGB image with alpha channel.
#[derive(Clone, PartialEq)]
pub struct Image {
    pub(crate) buf: RgbaImage,
}

impl Image {
    /// Loads an image from the filesystem.
    ///
    /// The path must have a supported file extension (`jpeg`, `jpg` or `png`).
    pub fn load<A: AsRef<Path>>(path: A) -> anyhow::Result<Self> {
        Self::load_impl(path.as_ref())
    }

    fn load_impl(path: &Path) -> anyhow::Result<Self> {
        let format = match ImageFormat::from_path(path)? {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
        };
        let data =
            std::fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
        let buf = image::load_from_memory_with_format(&data, format)?.to_rgba8();
        Ok(Self { buf })
    }

    /// Creates an empty image of a specified size.
    ///
    /// The image will start out black and fully transparent.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buf: ImageBuffer::new(width, height),
        }
    }

    /// Returns a new [`Image`] of the given size, with every pixel initialized to `color`.
    pub fn filled(res: impl Into<Resolution>, color: Color) -> Self {
        let res = res.into();
        Self {
            buf: ImageBuffer::from_pixel(res.width(), res.height(), Rgba(color.0)),
        }
    }

    /// Creates an [`Image`] from raw, preexisting RGBA pixel data.
    ///
    /// `buf` needs to contain tightly packed `rgba` pixels in row-major order. Its length needs to
    /// be exactly `width * height * 4`, or this function will panic.
    pub fn from_rgba8(res: impl Into<Resolution>, buf: &[u8]) -> Self {
        let res = res.into();
        let expected_size = res.width() as usize * res.height() as usize * 4;
        assert_eq!(
            expected_size,
            buf.len(),
            "incorrect buffer size {} for {} image (expected {} bytes)",
            buf.len(),
            res,
            expected_size,
        );

        Self {
            buf: ImageBuffer::from_vec(res.width(), res.height(), buf.to_vec())
                .expect("buffer size does not match image resolution"),
        }
    }

    /// Creates an opaque [`Image`] from rows of packed RGB pixel data.
    ///
    /// Consecutive rows start `stride` bytes apart, which allows passing decoder buffers with
    /// padded rows directly. `stride` must be at least `width * 3`.
    pub fn from_rgb8_rows(res: impl Into<Resolution>, stride: usize, buf: &[u8]) -> Self {
        let res = res.into();
        let row_len = res.width() as usize * 3;
        assert!(
            stride >= row_len,
            "row stride {stride} is smaller than a row of {} RGB pixels",
            res.width()
        );
        assert!(
            res.height() == 0 || buf.len() >= stride * (res.height() as usize - 1) + row_len,
            "buffer of {} bytes is too small for a {} image with stride {}",
            buf.len(),
            res,
            stride,
        );

        let mut out = Vec::with_capacity(res.num_pixels() as usize * 4);
        for row in 0..res.height() as usize {
            let start = row * stride;
            for rgb in buf[start..start + row_len].chunks_exact(3) {
                out.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        }

        Self {
            buf: ImageBuffer::from_vec(res.width(), res.height(), out)
                .expect("buffer size does not match image resolution"),
        }
    }

    /// Encodes this image as a baseline JPEG with the given quality (1-100).
    ///
    /// JPEG has no alpha channel, so the alpha component is dropped.
    pub fn encode_jpeg(&self, quality: u8) -> anyhow::Result<Vec<u8>> {
        jpeg::encode(self, quality)
    }

    /// Returns the width of this image, in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    /// Returns the height of this image, in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// Returns the size of this image.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    /// Returns a [`Rect`] covering this image.
    ///
    /// The rectangle will be positioned at `(0, 0)` and have the width and height of the image.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.resolution().rect()
    }

    /// Gets the image color at the given pixel coordinates.
    ///
    /// # Panics
    ///
    /// This will panic if `(x, y)` is outside the bounds of this image.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        Color(self.buf[(x, y)].0)
    }

    /// Sets the image color at the given pixel coordinates.
    ///
    /// # Panics
    ///
    /// This will panic if `(x, y)` is outside the bounds of this image.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.buf[(x, y)] = Rgba(color.0);
    }

    /// Creates an immutable view into an area of this image, specified by `rect`.
    ///
    /// `rect` is snapped to whole pixels. If it lies partially outside of `self`, the pixels that
    /// are outside of `self` will have the value [`Color::NONE`]. The returned view always has the
    /// size of `rect`.
    pub fn view(&self, rect: Rect) -> ImageView<'_> {
        ImageView {
            image: self,
            data: ViewData::full(self).view(rect),
        }
    }

    /// Creates a mutable view into an area of this image, specified by `rect`.
    ///
    /// If `rect` lies partially outside of `self`, the pixels that are outside of `self` will have
    /// the value [`Color::NONE`] and ignore writes. The returned view always has the size of
    /// `rect`.
    pub fn view_mut(&mut self, rect: Rect) -> ImageViewMut<'_> {
        ImageViewMut {
            data: ViewData::full(self).view(rect),
            image: self,
        }
    }

    /// Resizes the whole image to `res` with bilinear filtering, ignoring the aspect ratio.
    pub fn resize(&self, res: Resolution) -> Image {
        Image {
            buf: image::imageops::resize(&self.buf, res.width(), res.height(), FilterType::Triangle),
        }
    }

    /// Calls `f` on every pixel of the image, replacing it with the returned color.
    pub fn map_pixels(&mut self, mut f: impl FnMut(Color) -> Color) {
        self.buf
            .pixels_mut()
            .for_each(|pix| pix.0 = f(Color(pix.0)).0);
    }

    /// Returns an iterator over all pixel colors, in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Color> + '_ {
        self.buf.pixels().map(|pix| Color(pix.0))
    }

}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} Image", self.width(), self.height())
    }
}

#[derive(Debug, Clone, Copy)]
struct ViewData {
    /// Top-left corner in the root image's coordinates.
    x: i64,
    y: i64,
    width: u32,
    height: u32,
}

impl ViewData {
    fn full(image: &Image) -> Self {
        Self {
            x: 0,
            y: 0,
            width: image.width(),
            height: image.height(),
        }
    }

    fn view(&self, rect: Rect) -> Self {
        Self {
            x: self.x + rect.x().round() as i64,
            y: self.y + rect.y().round() as i64,
            width: rect.width().round().max(0.0) as u32,
            height: rect.height().round().max(0.0) as u32,
        }
    }

    fn rect(&self) -> Rect {
        Rect::from_top_left(0.0, 0.0, self.width as f32, self.height as f32)
    }

    fn image_coord(&self, x: u32, y: u32, image: &Image) -> Option<(u32, u32)> {
        let x = self.x + i64::from(x);
        let y = self.y + i64::from(y);
        if x < 0 || y < 0 || x >= i64::from(image.width()) || y >= i64::from(image.height()) {
            return None;
        }
        Some((x as u32, y as u32))
    }

    fn get(&self, x: u32, y: u32, image: &Image) -> Color {
        match self.image_coord(x, y, image) {
            Some((x, y)) => Color(image.buf[(x, y)].0),
            None => Color::NONE,
        }
    }
}

/// An immutable view of a rectangular section of an [`Image`].
#[derive(Clone, Copy)]
pub struct ImageView<'a> {
    image: &'a Image,
    data: ViewData,
}

impl<'a> ImageView<'a> {
    fn as_generic_image_view(&self) -> impl GenericImageView<Pixel = Rgba<u8>> + '_ {
        struct Wrapper<'a>(ImageView<'a>);

        impl GenericImageView for Wrapper<'_> {
            type Pixel = Rgba<u8>;

            fn dimensions(&self) -> (u32, u32) {
                (self.0.width(), self.0.height())
            }

            fn bounds(&self) -> (u32, u32, u32, u32) {
                (0, 0, self.0.width(), self.0.height())
            }

            fn get_pixel(&self, x: u32, y: u32) -> Self::Pixel {
                Rgba(self.0.data.get(x, y, self.0.image).0)
            }
        }

        Wrapper(*self)
    }

    /// Returns the width of this view, in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.data.width
    }

    /// Returns the height of this view, in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.data.height
    }

    /// Returns the size of this view.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    /// Returns a [`Rect`] of the size of this view.
    ///
    /// The rectangle will be positioned at `(0, 0)` and have the width and height of the view.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.data.rect()
    }

    /// Gets the image color at the given pixel coordinates.
    ///
    /// Coordinates that map outside of the underlying [`Image`] yield [`Color::NONE`].
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.data.get(x, y, self.image)
    }

    /// Creates an immutable subview into an area of this view, specified by `rect`.
    ///
    /// `rect` is relative to the top left corner of `self`. Parts of `rect` outside of the
    /// underlying [`Image`] read as [`Color::NONE`].
    pub fn view(&self, rect: Rect) -> ImageView<'a> {
        ImageView {
            image: self.image,
            data: self.data.view(rect),
        }
    }

    /// Copies the contents of this view into a new [`Image`].
    pub fn to_image(&self) -> Image {
        let mut image = Image::new(self.width(), self.height());
        image
            .buf
            .copy_from(&self.as_generic_image_view(), 0, 0)
            .expect("destination has the size of the view");
        image
    }

    /// Copies this view into a new [`Image`] of size `res`, stretching it with bilinear
    /// filtering.
    pub fn resize(&self, res: Resolution) -> Image {
        Image {
            buf: image::imageops::resize(
                &self.as_generic_image_view(),
                res.width(),
                res.height(),
                FilterType::Triangle,
            ),
        }
    }
}

impl fmt::Debug for ImageView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} ImageView", self.width(), self.height())
    }
}

/// A mutable view of a rectangular section of an [`Image`].
pub struct ImageViewMut<'a> {
    image: &'a mut Image,
    data: ViewData,
}

impl<'a> ImageViewMut<'a> {
    /// Returns the width of this view, in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.data.width
    }

    /// Returns the height of this view, in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.data.height
    }

    /// Returns the size of this view.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    /// Returns a [`Rect`] of the size of this view.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.data.rect()
    }

    /// Gets the image color at the given pixel coordinates.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.data.get(x, y, self.image)
    }

    /// Sets the image color at the given pixel coordinates.
    ///
    /// Writes to pixels outside of the underlying [`Image`] are ignored.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if let Some((x, y)) = self.data.image_coord(x, y, self.image) {
            self.image.buf[(x, y)] = Rgba(color.0);
        }
    }

    /// Borrows an identical [`ImageViewMut`] from `self` that may have a shorter lifetime.
    ///
    /// This is equivalent to the implicit "reborrowing" that happens on Rust references. It needs
    /// to be a method call here because user-defined types cannot opt into making this happen
    /// automatically.
    pub fn reborrow(&mut self) -> ImageViewMut<'_> {
        ImageViewMut {
            image: &mut *self.image,
            data: self.data,
        }
    }

    /// Creates a mutable view into an area of this view, specified by `rect`.
    pub fn view_mut(&mut self, rect: Rect) -> ImageViewMut<'_> {
        ImageViewMut {
            image: &mut *self.image,
            data: self.data.view(rect),
        }
    }

    /// Overwrites the pixels of `self` with the pixels of `src`.
    ///
    /// # Panics
    ///
    /// `src` must have the same size as `self`, otherwise this method will panic.
    pub fn copy_from<V: AsImageView>(&mut self, src: &V) {
        let src = src.as_view();
        assert_eq!(
            self.resolution(),
            src.resolution(),
            "`copy_from` requires source and destination to have the same size"
        );

        for y in 0..self.height() {
            for x in 0..self.width() {
                self.set(x, y, src.get(x, y));
            }
        }
    }

    /// Copies the contents of this view into a new [`Image`].
    pub fn to_image(&self) -> Image {
        self.as_view().to_image()
    }
}

impl fmt::Debug for ImageViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} ImageViewMut", self.width(), self.height())
    }
}

/// Trait for types that can be treated as read-only views of image data.
///
/// This allows abstracting over [`Image`] and [`ImageView`] and should be used by any code that
/// takes immutable image data as input.
pub trait AsImageView {
    /// Returns an [`ImageView`] covering `self`.
    fn as_view(&self) -> ImageView<'_>;
}

/// Trait for types that can be treated as mutable views of image data.
///
/// This allows abstracting over [`Image`] and [`ImageViewMut`] and should be used by any code that
/// writes to image data.
pub trait AsImageViewMut: AsImageView {
    /// Returns an [`ImageViewMut`] covering `self`.
    fn as_view_mut(&mut self) -> ImageViewMut<'_>;
}

impl AsImageView for Image {
    fn as_view(&self) -> ImageView<'_> {
        self.view(self.rect())
    }
}

impl<'a> AsImageView for ImageView<'a> {
    fn as_view(&self) -> ImageView<'_> {
        *self
    }
}

impl AsImageViewMut for Image {
    fn as_view_mut(&mut self) -> ImageViewMut<'_> {
        let rect = self.rect();
        self.view_mut(rect)
    }
}

impl<'a> AsImageView for ImageViewMut<'a> {
    fn as_view(&self) -> ImageView<'_> {
        ImageView {
            data: self.data,
            image: &*self.image,
        }
    }
}

impl<'a> AsImageViewMut for ImageViewMut<'a> {
    fn as_view_mut(&mut self) -> ImageViewMut<'_> {
        self.reborrow()
    }
}

impl<'a, V: AsImageView> AsImageView for &'a V {
    fn as_view(&self) -> ImageView<'_> {
        (*self).as_view()
    }
}

impl<'a, V: AsImageView> AsImageView for &'a mut V {
    fn as_view(&self) -> ImageView<'_> {
        (**self).as_view()
    }
}

impl<'a, V: AsImageViewMut> AsImageViewMut for &'a mut V {
    fn as_view_mut(&mut self) -> ImageViewMut<'_> {
        (*self).as_view_mut()
    }
}
