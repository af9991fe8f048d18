//! Types for representing image resolutions.

use std::fmt;

use crate::Rect;

/// Resolution (`width x height`) of an image or video frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    /// Creates a new [`Resolution`] of `width x height`.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Creates a square [`Resolution`] of `size x size`.
    pub const fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Returns the width of this [`Resolution`].
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of this [`Resolution`].
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn num_pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns `true` if either dimension is 0.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Computes the [`AspectRatio`] of this [`Resolution`].
    ///
    /// If `self` has a width or height of 0, `None` is returned.
    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        AspectRatio::new(self.width(), self.height())
    }

    /// Returns a [`Rect`] positioned at `(0, 0)` with the size of `self`.
    pub fn rect(&self) -> Rect {
        Rect::from_top_left(0.0, 0.0, self.width as f32, self.height as f32)
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for Resolution {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

/// Ratio between an image's width and height.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    num: u32,
    denom: u32,
}

impl AspectRatio {
    /// An aspect ratio of 1:1.
    pub const SQUARE: Self = Self { num: 1, denom: 1 };

    /// Creates an aspect ratio of `width:height`, reduced to lowest terms.
    ///
    /// Returns `None` if `width` or `height` is 0.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        let gcd = gcd(width, height);
        Some(Self {
            num: width / gcd,
            denom: height / gcd,
        })
    }

    /// Returns the ratio as a floating-point number (`width / height`).
    #[inline]
    pub fn as_f32(&self) -> f32 {
        self.num as f32 / self.denom as f32
    }

    #[inline]
    pub fn is_landscape(&self) -> bool {
        self.num > self.denom
    }

    #[inline]
    pub fn is_portrait(&self) -> bool {
        self.num < self.denom
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl fmt::Debug for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.num, self.denom)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.num, self.denom)
    }
}
