//! Hand and bone crop geometry.
//!
//! Both crops are taken around the [`BoundingBox`] of a hand, extended by a margin on every side.
//! The hand crop is square and taken from the original frame, the bone crop follows the box's
//! aspect ratio and is letterboxed into a white square canvas.

use std::fmt;

use signprep_image::{
    contrast::auto_brightness_contrast, AsImageView, Color, Image, Rect, Resolution,
};

use crate::hand::BoundingBox;

/// A coordinate axis of the landmark space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

/// Reasons for skipping a frame whose hand geometry cannot produce the dataset artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// All landmarks share the same coordinate on an axis.
    #[error("hand landmarks have zero extent along {0}")]
    DegenerateExtent(Axis),
    /// The crop region extends past the edges of the image.
    #[error("crop region {x_min}..{x_max}x{y_min}..{y_max} leaves the {image} image")]
    CropOutOfBounds {
        x_min: i64,
        x_max: i64,
        y_min: i64,
        y_max: i64,
        image: Resolution,
    },
    /// The crop region or the bounding box has no area.
    #[error("crop region is empty")]
    EmptyRegion,
}

/// Half-open pixel ranges of a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x_min: i64,
    pub x_max: i64,
    pub y_min: i64,
    pub y_max: i64,
}

impl CropRegion {
    /// Checks that the region is non-empty and lies within an image of resolution `image`.
    fn within(self, image: Resolution) -> Result<Self, GeometryError> {
        if self.x_max <= self.x_min || self.y_max <= self.y_min {
            return Err(GeometryError::EmptyRegion);
        }
        if self.x_min < 0
            || self.y_min < 0
            || self.x_max > i64::from(image.width())
            || self.y_max > i64::from(image.height())
        {
            return Err(GeometryError::CropOutOfBounds {
                x_min: self.x_min,
                x_max: self.x_max,
                y_min: self.y_min,
                y_max: self.y_max,
                image,
            });
        }
        Ok(self)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pixel_ranges(self.x_min, self.x_max, self.y_min, self.y_max)
    }
}

/// Computes the square hand crop region.
///
/// The side of the square is the larger of the box's width and height, and it extends from the
/// box's top left corner. `margin` pixels are added on every side.
pub fn hand_region(
    bbox: BoundingBox,
    margin: u32,
    image: Resolution,
) -> Result<CropRegion, GeometryError> {
    let side = bbox.width.max(bbox.height);
    if side <= 0 {
        return Err(GeometryError::EmptyRegion);
    }
    let m = i64::from(margin);
    CropRegion {
        x_min: bbox.x - m,
        x_max: bbox.x + side + m,
        y_min: bbox.y - m,
        y_max: bbox.y + side + m,
    }
    .within(image)
}

/// Computes the bone crop region: the bounding box extended by `margin` pixels on every side.
pub fn bone_region(
    bbox: BoundingBox,
    margin: u32,
    image: Resolution,
) -> Result<CropRegion, GeometryError> {
    if bbox.width <= 0 || bbox.height <= 0 {
        return Err(GeometryError::EmptyRegion);
    }
    let m = i64::from(margin);
    CropRegion {
        x_min: bbox.x - m,
        x_max: bbox.x + bbox.width + m,
        y_min: bbox.y - m,
        y_max: bbox.y + bbox.height + m,
    }
    .within(image)
}

/// Crops the hand region out of `frame` and resizes it to `size x size`.
///
/// If `auto_contrast` is set, the crop is passed through [`auto_brightness_contrast`] with that
/// clip percentage before resizing.
pub fn hand_crop(
    frame: &Image,
    bbox: BoundingBox,
    margin: u32,
    size: u32,
    auto_contrast: Option<f32>,
) -> Result<Image, GeometryError> {
    let region = hand_region(bbox, margin, frame.resolution())?;
    let view = frame.view(region.rect());
    let res = Resolution::square(size);
    Ok(match auto_contrast {
        Some(clip_percent) => auto_brightness_contrast(&view, clip_percent).resize(res),
        None => view.resize(res),
    })
}

/// Placement of the resized bone crop inside the square canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Letterbox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Fits a `width x height` box into a `size x size` canvas.
///
/// The longer side is scaled to `size`, the scaled shorter side is rounded up and centered, with
/// the gap rounded up as well. The scaled side never exceeds `size`.
pub fn letterbox(width: i64, height: i64, size: u32) -> Result<Letterbox, GeometryError> {
    if width <= 0 || height <= 0 || size == 0 {
        return Err(GeometryError::EmptyRegion);
    }
    let (w, h, s) = (width as u64, height as u64, u64::from(size));
    let fit = |short: u64, long: u64| {
        // `short <= long`, so this is at most `size`.
        let scaled = (s * short).div_ceil(long);
        (scaled as u32, (s - scaled).div_ceil(2) as u32)
    };
    Ok(if h > w {
        let (scaled, gap) = fit(w, h);
        Letterbox {
            x: gap,
            y: 0,
            width: scaled,
            height: size,
        }
    } else {
        let (scaled, gap) = fit(h, w);
        Letterbox {
            x: 0,
            y: gap,
            width: size,
            height: scaled,
        }
    })
}

/// Crops the bone region out of `bone` and letterboxes it into a white `size x size` canvas.
pub fn bone_letterbox(
    bone: &Image,
    bbox: BoundingBox,
    margin: u32,
    size: u32,
) -> Result<Image, GeometryError> {
    let region = bone_region(bbox, margin, bone.resolution())?;
    let placement = letterbox(bbox.width, bbox.height, size)?;

    let resized = bone
        .view(region.rect())
        .resize(Resolution::new(placement.width, placement.height));
    let mut canvas = Image::filled(Resolution::square(size), Color::WHITE);
    canvas
        .view_mut(Rect::from_top_left(
            placement.x as f32,
            placement.y as f32,
            placement.width as f32,
            placement.height as f32,
        ))
        .copy_from(&resized.as_view());
    Ok(canvas)
}
