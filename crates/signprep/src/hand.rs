//! Hand landmark detection.
//!
//! [`HandLandmarker`] wraps a [`LandmarkBackend`] and turns its raw per-hand landmark sets into
//! [`HandObservation`]s with integer pixel coordinates, bounding boxes, and per-axis extrema. It
//! can also render the detected skeletons onto a blank canvas ("bone" images).
//!
//! The production backend is [`OnnxHands`], which runs the two-stage MediaPipe Hands pipeline
//! (palm detection followed by landmark regression) through `tract`.

pub mod detection;
pub mod landmark;
pub mod normalize;
mod onnx;

use itertools::{Itertools, MinMaxResult};
use signprep_image::{draw, AsImageViewMut, Color, Image, ImageViewMut};

pub use landmark::{LandmarkIdx, CONNECTIVITY, NUM_LANDMARKS};
pub use onnx::OnnxHands;

/// Hand detection settings.
///
/// These are forwarded unchanged to the [`LandmarkBackend`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandConfig {
    /// Treat every frame as an unrelated still image instead of a video frame.
    pub static_image_mode: bool,
    /// Maximum number of hands to report per frame.
    pub max_hands: usize,
    /// Minimum palm detection confidence (`0.0..=1.0`).
    pub min_detection_confidence: f32,
    /// Minimum landmark presence confidence (`0.0..=1.0`).
    pub min_tracking_confidence: f32,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            static_image_mode: false,
            max_hands: 2,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

/// The raw landmark set of one hand, as produced by a [`LandmarkBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawHand {
    /// Landmark positions `[x, y, z]` in frame pixels. `z` is scaled like `x`.
    pub landmarks: Vec<[f32; 3]>,
}

/// A per-frame hand landmark estimator.
pub trait LandmarkBackend {
    /// Runs inference on `frame`.
    ///
    /// `Ok(None)` means that the model produced no result set at all for this frame, which callers
    /// treat the same as an empty list of hands.
    fn infer(&self, frame: &Image) -> anyhow::Result<Option<Vec<RawHand>>>;
}

impl<B: LandmarkBackend + ?Sized> LandmarkBackend for &B {
    fn infer(&self, frame: &Image) -> anyhow::Result<Option<Vec<RawHand>>> {
        (**self).infer(frame)
    }
}

impl<B: LandmarkBackend + ?Sized> LandmarkBackend for Box<B> {
    fn infer(&self, frame: &Image) -> anyhow::Result<Option<Vec<RawHand>>> {
        (**self).infer(frame)
    }
}

/// Axis-aligned bounding box of a hand, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// The span of one coordinate axis over all landmarks of a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub min: i64,
    pub max: i64,
}

impl Extent {
    fn of(values: &[i64]) -> Self {
        match values.iter().copied().minmax() {
            MinMaxResult::NoElements => Self { min: 0, max: 0 },
            MinMaxResult::OneElement(v) => Self { min: v, max: v },
            MinMaxResult::MinMax(min, max) => Self { min, max },
        }
    }

    #[inline]
    pub fn span(&self) -> i64 {
        self.max - self.min
    }
}

/// A hand found in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    landmarks: Vec<[i64; 3]>,
    xs: Vec<i64>,
    ys: Vec<i64>,
    zs: Vec<i64>,
    bbox: BoundingBox,
}

impl HandObservation {
    /// Builds an observation from integer landmark positions.
    pub fn new(landmarks: Vec<[i64; 3]>) -> Self {
        let xs = landmarks.iter().map(|lm| lm[0]).collect::<Vec<_>>();
        let ys = landmarks.iter().map(|lm| lm[1]).collect::<Vec<_>>();
        let zs = landmarks.iter().map(|lm| lm[2]).collect::<Vec<_>>();
        let (x, y) = (Extent::of(&xs), Extent::of(&ys));
        let bbox = BoundingBox {
            x: x.min,
            y: y.min,
            width: x.span(),
            height: y.span(),
        };

        Self {
            landmarks,
            xs,
            ys,
            zs,
            bbox,
        }
    }

    /// Truncates the landmarks of `raw` towards zero.
    pub fn from_raw(raw: &RawHand) -> Self {
        Self::new(
            raw.landmarks
                .iter()
                .map(|lm| lm.map(|v| v.trunc() as i64))
                .collect(),
        )
    }

    /// Returns the `[x, y, z]` landmark positions.
    #[inline]
    pub fn landmarks(&self) -> &[[i64; 3]] {
        &self.landmarks
    }

    #[inline]
    pub fn xs(&self) -> &[i64] {
        &self.xs
    }

    #[inline]
    pub fn ys(&self) -> &[i64] {
        &self.ys
    }

    #[inline]
    pub fn zs(&self) -> &[i64] {
        &self.zs
    }

    /// Returns the extents of the X, Y, and Z coordinates.
    pub fn extents(&self) -> [Extent; 3] {
        [
            Extent::of(&self.xs),
            Extent::of(&self.ys),
            Extent::of(&self.zs),
        ]
    }

    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Draws the hand skeleton onto `target`.
    ///
    /// Connections are drawn in light gray with a stroke width of 2, landmarks as red dots.
    pub fn draw<I: AsImageViewMut>(&self, target: &mut I) {
        self.draw_impl(&mut target.as_view_mut());
    }

    fn draw_impl(&self, target: &mut ImageViewMut<'_>) {
        let pos = |idx: LandmarkIdx| -> Option<(i32, i32)> {
            let [x, y, _] = *self.landmarks.get(idx as usize)?;
            Some((x as i32, y as i32))
        };

        for &(a, b) in CONNECTIVITY {
            if let (Some((ax, ay)), Some((bx, by))) = (pos(a), pos(b)) {
                draw::line(target, ax, ay, bx, by)
                    .color(BONE_COLOR)
                    .stroke_width(2);
            }
        }
        for &[x, y, _] in &self.landmarks {
            draw::circle(target, x as i32, y as i32, 2)
                .color(Color::RED)
                .filled();
        }
    }
}

const BONE_COLOR: Color = Color::from_rgb8(224, 224, 224);

/// Result of [`HandLandmarker::detect`].
#[derive(Debug)]
pub struct HandsOutput {
    /// The detected hands, at most [`HandConfig::max_hands`].
    pub hands: Vec<HandObservation>,
    /// The skeleton rendering, if requested.
    pub bone: Option<Image>,
}

/// Detects hands and their landmarks in video frames.
///
/// The landmarker is created once and then invoked for every frame; detection does not mutate
/// it.
pub struct HandLandmarker<B> {
    backend: B,
    config: HandConfig,
}

impl<B: LandmarkBackend> HandLandmarker<B> {
    pub fn new(backend: B, config: HandConfig) -> Self {
        Self { backend, config }
    }

    #[inline]
    pub fn config(&self) -> &HandConfig {
        &self.config
    }

    /// Detects the hands in `frame`.
    ///
    /// If `draw` is `true`, the skeletons of all detected hands are rendered onto a white canvas of
    /// the frame's size, which is returned in [`HandsOutput::bone`].
    pub fn detect(&self, frame: &Image, draw: bool) -> anyhow::Result<HandsOutput> {
        let raw = match self.backend.infer(frame)? {
            Some(raw) => raw,
            None => {
                log::trace!("landmark backend returned no result set");
                Vec::new()
            }
        };

        let hands = raw
            .iter()
            .take(self.config.max_hands)
            .map(HandObservation::from_raw)
            .collect::<Vec<_>>();
        log::trace!("{} hand(s) in frame", hands.len());

        let bone = draw.then(|| render_bones(frame, &hands));
        Ok(HandsOutput { hands, bone })
    }
}

/// Renders the skeletons of `hands` onto a white canvas that has the size of `frame`.
pub fn render_bones(frame: &Image, hands: &[HandObservation]) -> Image {
    let mut canvas = Image::filled(frame.resolution(), Color::WHITE);
    for hand in hands {
        hand.draw(&mut canvas);
    }
    canvas
}

#[cfg(test)]
mod tests;
