//! Non-Maximum Suppression.
//!
//! Typical Single-Shot MultiBox Detectors (SSD) produce duplicate detections for individual
//! objects. Non-Maximum Suppression (NMS) filters these duplicates out, leaving only the detection
//! with the highest confidence for each object.

use crate::num::TotalF32;

use super::Detection;

/// A non-maximum suppression algorithm.
pub struct NonMaxSuppression {
    iou_thresh: f32,
}

impl NonMaxSuppression {
    /// The default intersection-over-union threshold used to determine if two detections overlap.
    pub const DEFAULT_IOU_THRESH: f32 = 0.3;

    pub fn new() -> Self {
        Self {
            iou_thresh: Self::DEFAULT_IOU_THRESH,
        }
    }

    /// Sets the intersection-over-union threshold to consider two detections as overlapping.
    ///
    /// By default, [`Self::DEFAULT_IOU_THRESH`] is used.
    pub fn set_iou_thresh(&mut self, iou_thresh: f32) {
        self.iou_thresh = iou_thresh;
    }

    /// Performs non-maximum suppression on `detections`.
    ///
    /// Returns the retained detections, ordered by descending confidence.
    pub fn process(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        let mut out = Vec::new();

        // Sort by ascending confidence, process highest confidence first by starting at the back.
        detections.sort_unstable_by_key(|det| TotalF32(det.confidence()));

        while let Some(seed) = detections.pop() {
            detections.retain(|other| {
                let iou = seed.bounding_rect().iou(&other.bounding_rect());
                iou < self.iou_thresh
            });
            out.push(seed);
        }

        out
    }
}

impl Default for NonMaxSuppression {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use signprep_image::Rect;

    use super::*;

    #[test]
    fn nms_suppresses_non_maximum() {
        let nms = NonMaxSuppression::new();

        let rect = Rect::from_center(0.0, 0.0, 1.0, 1.0);
        let a = Detection::new(0.55, rect.scale(1.5));
        let b = Detection::new(0.6, rect);
        let detections = nms.process(vec![a, b]);
        assert_eq!(detections.len(), 1);

        let d = &detections[0];
        assert_eq!(d.confidence(), 0.6);
        assert_eq!(d.bounding_rect(), rect);
    }

    #[test]
    fn nms_ignores_nonoverlapping() {
        let nms = NonMaxSuppression::new();

        let a = Detection::new(0.7, Rect::from_center(0.0, 0.0, 1.0, 1.0));
        let b = Detection::new(0.9, Rect::from_center(5.0, 0.0, 1.0, 1.0));

        let detections = nms.process(vec![a, b]);
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].confidence(), 0.9);
        assert_eq!(detections[1].confidence(), 0.7);
    }

    #[test]
    fn iou_threshold() {
        let mut nms = NonMaxSuppression::new();
        // IOU of these two is 1/3.
        let a = Detection::new(0.9, Rect::from_top_left(0.0, 0.0, 2.0, 2.0));
        let b = Detection::new(0.8, Rect::from_top_left(1.0, 0.0, 2.0, 2.0));

        assert_eq!(nms.process(vec![a.clone(), b.clone()]).len(), 1);
        nms.set_iou_thresh(0.5);
        assert_eq!(nms.process(vec![a, b]).len(), 2);
    }
}
