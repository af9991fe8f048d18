//! Palm detection.

use std::path::Path;

use signprep_image::{AsImageView, Rect, Resolution};
use tract_onnx::prelude::tract_ndarray::Ix3;

use crate::detection::{
    ssd::{Anchor, AnchorParams, Anchors, LayerInfo},
    Detection,
};
use crate::nn::{Cnn, ColorMapper, NeuralNetwork, Outputs};
use crate::num::sigmoid;

/// A keypoint of a palm [`Detection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keypoint {
    Wrist = 0,
    IndexFingerMcp = 1,
    MiddleFingerMcp = 2,
    RingFingerMcp = 3,
    PinkyMcp = 4,
    ThumbCmc = 5,
    ThumbMcp = 6,
}

const NUM_KEYPOINTS: usize = 7;
const BOX_PARAMS: usize = 4 + NUM_KEYPOINTS * 2;

/// The full-range palm detection network.
pub struct PalmNetwork {
    cnn: Cnn,
    anchors: Anchors,
}

impl PalmNetwork {
    /// Default location of the model file, relative to the working directory.
    pub const DEFAULT_MODEL_PATH: &'static str = "models/palm_detection_full.onnx";

    /// Loads the network from an ONNX file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let cnn = Cnn::new(NeuralNetwork::from_path(path)?, ColorMapper::linear(0.0..=1.0))?;
        Ok(Self {
            cnn,
            anchors: palm_anchors(),
        })
    }

    #[inline]
    pub fn input_resolution(&self) -> Resolution {
        self.cnn.input_resolution()
    }

    /// Runs palm detection on `image`.
    ///
    /// Returns all candidate detections with a confidence of at least `threshold`, in the
    /// coordinate system of the network input. Callers are expected to run non-maximum suppression
    /// on the result.
    pub fn detect<V: AsImageView>(
        &self,
        image: &V,
        threshold: f32,
    ) -> anyhow::Result<Vec<Detection>> {
        let outputs = self.cnn.estimate(image)?;
        log::trace!("palm network outputs: {:?}", outputs);
        extract_outputs(&self.anchors, self.input_resolution(), &outputs, threshold)
    }
}

fn palm_anchors() -> Anchors {
    Anchors::calculate(&AnchorParams {
        layers: &[LayerInfo::new(2, 24, 24), LayerInfo::new(6, 12, 12)],
    })
}

fn extract_outputs(
    anchors: &Anchors,
    input_res: Resolution,
    outputs: &Outputs,
    thresh: f32,
) -> anyhow::Result<Vec<Detection>> {
    anyhow::ensure!(
        outputs.len() >= 2,
        "palm detection network has {} outputs, expected 2",
        outputs.len()
    );
    let num_anchors = anchors.anchor_count();
    let boxes = outputs.f32_view(0)?.into_dimensionality::<Ix3>()?;
    let confidences = outputs.f32_view(1)?.into_dimensionality::<Ix3>()?;

    anyhow::ensure!(
        boxes.shape() == [1, num_anchors, BOX_PARAMS],
        "unexpected palm box output shape {:?}",
        boxes.shape()
    );
    anyhow::ensure!(
        confidences.shape() == [1, num_anchors, 1],
        "unexpected palm confidence output shape {:?}",
        confidences.shape()
    );

    let mut detections = Vec::new();
    for index in 0..num_anchors {
        let conf = sigmoid(confidences[[0, index, 0]]);
        if conf < thresh {
            continue;
        }

        let mut box_params = [0.0; BOX_PARAMS];
        for (i, param) in box_params.iter_mut().enumerate() {
            *param = boxes[[0, index, i]];
        }
        detections.push(extract_detection(
            &anchors[index],
            input_res,
            &box_params,
            conf,
        ));
    }

    Ok(detections)
}

fn extract_detection(
    anchor: &Anchor,
    input_res: Resolution,
    box_params: &[f32; BOX_PARAMS],
    confidence: f32,
) -> Detection {
    let input_w = input_res.width() as f32;
    let input_h = input_res.height() as f32;

    let xc = box_params[0] + anchor.x_center() * input_w;
    let yc = box_params[1] + anchor.y_center() * input_h;
    let w = box_params[2];
    let h = box_params[3];
    let keypoints = box_params[4..]
        .chunks_exact(2)
        .map(|kp| {
            crate::detection::Keypoint::new(
                kp[0] + anchor.x_center() * input_w,
                kp[1] + anchor.y_center() * input_h,
            )
        })
        .collect();

    Detection::with_keypoints(confidence, Rect::from_center(xc, yc, w, h), keypoints)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use tract_onnx::prelude::Tensor;

    use super::*;

    fn outputs(anchors: &Anchors, hits: &[(usize, f32, [f32; BOX_PARAMS])]) -> Outputs {
        let n = anchors.anchor_count();
        let mut boxes = vec![0.0; n * BOX_PARAMS];
        let mut confidences = vec![-10.0; n];
        for &(index, logit, params) in hits {
            boxes[index * BOX_PARAMS..][..BOX_PARAMS].copy_from_slice(&params);
            confidences[index] = logit;
        }

        Outputs::from_tensors(vec![
            Tensor::from_shape(&[1, n, BOX_PARAMS], &boxes[..]).unwrap(),
            Tensor::from_shape(&[1, n, 1], &confidences[..]).unwrap(),
        ])
    }

    #[test]
    fn decodes_boxes_relative_to_anchors() {
        let anchors = palm_anchors();
        let mut params = [0.0; BOX_PARAMS];
        params[..4].copy_from_slice(&[10.0, 20.0, 30.0, 40.0]);
        params[4 + Keypoint::MiddleFingerMcp as usize * 2] = -2.0;

        let outputs = outputs(&anchors, &[(0, 5.0, params)]);
        let dets = extract_outputs(&anchors, Resolution::square(192), &outputs, 0.5).unwrap();
        assert_eq!(dets.len(), 1);

        // The first anchor sits at (4, 4) in a 192x192 input.
        let det = &dets[0];
        assert!(det.confidence() > 0.99);
        let rect = det.bounding_rect();
        assert_relative_eq!(rect.center().0, 14.0);
        assert_relative_eq!(rect.center().1, 24.0);
        assert_eq!((rect.width(), rect.height()), (30.0, 40.0));
        assert_eq!(det.keypoints().len(), NUM_KEYPOINTS);
        assert_relative_eq!(det.keypoints()[Keypoint::Wrist as usize].x(), 4.0);
        assert_relative_eq!(det.keypoints()[Keypoint::MiddleFingerMcp as usize].x(), 2.0);
    }

    #[test]
    fn threshold_filters_candidates() {
        let anchors = palm_anchors();
        let params = [1.0; BOX_PARAMS];
        // sigmoid(0) == 0.5, sigmoid(-1) < 0.5
        let outputs = outputs(&anchors, &[(3, 0.0, params), (2000, -1.0, params)]);

        let dets = extract_outputs(&anchors, Resolution::square(192), &outputs, 0.5).unwrap();
        assert_eq!(dets.len(), 1);
        let dets = extract_outputs(&anchors, Resolution::square(192), &outputs, 0.2).unwrap();
        assert_eq!(dets.len(), 2);
    }

    #[test]
    fn rejects_wrong_anchor_count() {
        let anchors = Anchors::calculate(&AnchorParams {
            layers: &[LayerInfo::new(2, 8, 8)],
        });
        let outputs = outputs(&anchors, &[]);
        assert!(extract_outputs(&palm_anchors(), Resolution::square(192), &outputs, 0.5).is_err());
    }
}
