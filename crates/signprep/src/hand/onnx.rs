//! Two-stage MediaPipe Hands inference on the CPU.

use std::path::Path;

use nalgebra::{Point2, Vector2};
use signprep_image::{AspectRatio, Image, Rect};

use crate::detection::{nms::NonMaxSuppression, Detection};

use super::{
    detection::{Keypoint, PalmNetwork},
    landmark::LandmarkNetwork,
    HandConfig, LandmarkBackend, RawHand,
};

/// Offset of the hand ROI center from the palm center, towards the fingers, in palm sizes.
const ROI_SHIFT: f32 = 0.5;
/// Side length of the hand ROI, in palm sizes.
const ROI_SCALE: f32 = 2.6;

/// [`LandmarkBackend`] running the palm detection and hand landmark ONNX networks.
///
/// Palms are detected on the letterboxed full frame. Every retained palm is expanded into a square
/// region of interest enclosing the whole hand, which is then passed to the landmark network.
///
/// Every frame is processed from scratch, there is no cross-frame tracking. The
/// [`HandConfig::min_tracking_confidence`] is used as the minimum hand presence reported by the
/// landmark network.
pub struct OnnxHands {
    palm: PalmNetwork,
    landmarks: LandmarkNetwork,
    nms: NonMaxSuppression,
    config: HandConfig,
}

impl OnnxHands {
    /// Loads the palm detection and hand landmark networks.
    pub fn new<P: AsRef<Path>, L: AsRef<Path>>(
        palm_model: P,
        landmark_model: L,
        config: HandConfig,
    ) -> anyhow::Result<Self> {
        let palm = PalmNetwork::load(palm_model)?;
        let landmarks = LandmarkNetwork::load(landmark_model)?;
        log::debug!(
            "palm network input {}, landmark network input {}",
            palm.input_resolution(),
            landmarks.input_resolution()
        );
        if config.static_image_mode {
            log::debug!("static image mode enabled, every frame runs palm detection");
        }

        Ok(Self {
            palm,
            landmarks,
            nms: NonMaxSuppression::new(),
            config,
        })
    }

    fn detect_palms(&self, frame: &Image) -> anyhow::Result<Vec<Detection>> {
        let rect = frame.rect().grow_to_fit_aspect(AspectRatio::SQUARE);
        let view = frame.view(rect);

        let mut detections = self
            .palm
            .detect(&view, self.config.min_detection_confidence)?;
        let scale = view.width() as f32 / self.palm.input_resolution().width() as f32;
        for det in &mut detections {
            det.map_to_source(scale, rect.x().round(), rect.y().round());
        }

        let mut palms = self.nms.process(detections);
        palms.truncate(self.config.max_hands);
        Ok(palms)
    }
}

impl LandmarkBackend for OnnxHands {
    fn infer(&self, frame: &Image) -> anyhow::Result<Option<Vec<RawHand>>> {
        let palms = self.detect_palms(frame)?;
        if palms.is_empty() {
            return Ok(None);
        }

        let input_res = self.landmarks.input_resolution();
        let mut hands = Vec::with_capacity(palms.len());
        for palm in &palms {
            let roi = hand_roi(palm);
            let view = frame.view(roi);
            let result = self.landmarks.estimate(&view)?;
            if result.presence() < self.config.min_tracking_confidence {
                log::trace!(
                    "dropping hand with presence {:.3} (palm confidence {:.3})",
                    result.presence(),
                    palm.confidence()
                );
                continue;
            }
            log::trace!("{:?} hand, presence {:.3}", result.handedness(), result.presence());

            let (x0, y0) = (roi.x().round(), roi.y().round());
            let sx = view.width() as f32 / input_res.width() as f32;
            let sy = view.height() as f32 / input_res.height() as f32;
            hands.push(RawHand {
                landmarks: result
                    .landmarks()
                    .iter()
                    .map(|&[x, y, z]| [x0 + x * sx, y0 + y * sy, z * sx])
                    .collect(),
            });
        }

        Ok(Some(hands))
    }
}

/// Computes the square region enclosing the whole hand of a palm detection.
///
/// The palm box is shifted from the wrist towards the middle finger and enlarged so that the
/// fingers fit inside.
fn hand_roi(palm: &Detection) -> Rect {
    let rect = palm.bounding_rect();
    let size = rect.width().max(rect.height());
    let (xc, yc) = rect.center();
    let mut center = Point2::new(xc, yc);

    let keypoints = palm.keypoints();
    if let (Some(wrist), Some(finger)) = (
        keypoints.get(Keypoint::Wrist as usize),
        keypoints.get(Keypoint::MiddleFingerMcp as usize),
    ) {
        let dir = Vector2::new(finger.x() - wrist.x(), finger.y() - wrist.y());
        if let Some(dir) = dir.try_normalize(f32::EPSILON) {
            center += dir * (ROI_SHIFT * size);
        }
    }

    let side = size * ROI_SCALE;
    Rect::from_center(center.x, center.y, side, side)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::detection::Keypoint as Point;

    use super::*;

    fn palm(wrist: (f32, f32), finger: (f32, f32)) -> Detection {
        let mut keypoints = vec![Point::new(0.0, 0.0); 7];
        keypoints[Keypoint::Wrist as usize] = Point::new(wrist.0, wrist.1);
        keypoints[Keypoint::MiddleFingerMcp as usize] = Point::new(finger.0, finger.1);
        Detection::with_keypoints(0.9, Rect::from_center(100.0, 100.0, 40.0, 20.0), keypoints)
    }

    #[test]
    fn roi_shifts_towards_fingers() {
        let roi = hand_roi(&palm((100.0, 120.0), (100.0, 80.0)));
        let (xc, yc) = roi.center();
        assert_relative_eq!(xc, 100.0);
        assert_relative_eq!(yc, 80.0);
        assert_relative_eq!(roi.width(), 104.0);
        assert_relative_eq!(roi.height(), 104.0);

        let roi = hand_roi(&palm((80.0, 100.0), (120.0, 100.0)));
        let (xc, yc) = roi.center();
        assert_relative_eq!(xc, 120.0);
        assert_relative_eq!(yc, 100.0);
    }

    #[test]
    fn roi_without_direction_stays_centered() {
        let roi = hand_roi(&palm((100.0, 100.0), (100.0, 100.0)));
        assert_eq!(roi.center(), (100.0, 100.0));

        let det = Detection::new(0.9, Rect::from_center(10.0, 20.0, 10.0, 30.0));
        let roi = hand_roi(&det);
        assert_eq!(roi.center(), (10.0, 20.0));
        assert_relative_eq!(roi.width(), 78.0);
    }
}
