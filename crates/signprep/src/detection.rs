//! Common functionality for object detection.
//!
//! Detections produced by SSD networks (see [`ssd`]) are deduplicated with [`nms`].

pub mod nms;
pub mod ssd;

use signprep_image::Rect;

/// A detected object.
///
/// A [`Detection`] consists of a [`Rect`] enclosing the detected object, a confidence value, and a
/// possibly empty set of located keypoints.
///
/// Per convention, the confidence value lies between 0.0 and 1.0, which can be achieved by passing
/// the raw network output through [`crate::num::sigmoid`].
#[derive(Debug, Clone)]
pub struct Detection {
    confidence: f32,
    rect: Rect,
    keypoints: Vec<Keypoint>,
}

impl Detection {
    pub fn new(confidence: f32, rect: Rect) -> Self {
        Self {
            confidence,
            rect,
            keypoints: Vec::new(),
        }
    }

    pub fn with_keypoints(confidence: f32, rect: Rect, keypoints: Vec<Keypoint>) -> Self {
        Self {
            confidence,
            rect,
            keypoints,
        }
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Returns the axis-aligned bounding rectangle containing the detected object.
    pub fn bounding_rect(&self) -> Rect {
        self.rect
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    /// Maps the detection from a network input of `scale` times smaller size to the source image,
    /// where the network input's top left corner sits at `(x, y)`.
    pub fn map_to_source(&mut self, scale: f32, x: f32, y: f32) {
        let (xc, yc) = self.rect.center();
        self.rect = Rect::from_center(
            xc * scale + x,
            yc * scale + y,
            self.rect.width() * scale,
            self.rect.height() * scale,
        );
        for kp in &mut self.keypoints {
            kp.x = kp.x * scale + x;
            kp.y = kp.y * scale + y;
        }
    }
}

/// A 2D keypoint produced as part of a [`Detection`].
///
/// The meaning of a keypoint depends on the specific detector and on its index in the keypoint
/// list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    x: f32,
    y: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_to_source() {
        let mut det = Detection::with_keypoints(
            0.9,
            Rect::from_center(96.0, 96.0, 20.0, 10.0),
            vec![Keypoint::new(0.0, 192.0)],
        );
        det.map_to_source(2.0, 0.0, -40.0);

        assert_eq!(det.bounding_rect(), Rect::from_center(192.0, 152.0, 40.0, 20.0));
        assert_eq!(det.keypoints(), &[Keypoint::new(0.0, 344.0)]);
        assert_eq!(det.confidence(), 0.9);
    }
}
