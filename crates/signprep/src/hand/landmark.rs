//! Hand landmark prediction.

use std::path::Path;

use itertools::Itertools;
use signprep_image::{AsImageView, Resolution};
use tract_onnx::prelude::tract_ndarray::Ix2;

use crate::nn::{Cnn, ColorMapper, NeuralNetwork, Outputs};

/// Number of landmarks estimated per hand.
pub const NUM_LANDMARKS: usize = 21;

/// Names for the hand pose landmarks.
///
/// # Terminology
///
/// - **CMC**: [Carpometacarpal joint], the lowest joint of the thumb, located near the wrist.
/// - **MCP**: [Metacarpophalangeal joint], the lower joint forming the knuckles near the palm of
///   the hand.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: This landmark is just placed on the tip of the finger, above the DIP.
///
/// [Carpometacarpal joint]: https://en.wikipedia.org/wiki/Carpometacarpal_joint
/// [Metacarpophalangeal joint]: https://en.wikipedia.org/wiki/Metacarpophalangeal_joint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// The bones of the hand skeleton, as pairs of connected landmarks.
pub const CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        // Surround the palm:
        (Wrist, ThumbCmc),
        (ThumbCmc, IndexFingerMcp),
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, PinkyMcp),
        (PinkyMcp, Wrist),
        // Thumb:
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index:
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle:
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring:
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky:
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

/// Landmark results estimated by [`LandmarkNetwork`].
#[derive(Debug, Clone)]
pub struct LandmarkResult {
    /// `[x, y, z]` positions in the network input's pixel coordinates.
    landmarks: Vec<[f32; 3]>,
    presence: f32,
    raw_handedness: f32,
}

impl LandmarkResult {
    #[inline]
    pub fn landmarks(&self) -> &[[f32; 3]] {
        &self.landmarks
    }

    /// Returns the confidence that the input actually contains a hand.
    #[inline]
    pub fn presence(&self) -> f32 {
        self.presence
    }

    /// Returns the estimated handedness of the hand in the image.
    ///
    /// The returned value should only be relied on when the `presence` is over some threshold.
    pub fn handedness(&self) -> Handedness {
        if self.raw_handedness > 0.5 {
            Handedness::Right
        } else {
            Handedness::Left
        }
    }
}

/// The full-range MediaPipe hand landmark network.
///
/// Takes a square crop around the hand and regresses the 21 landmarks within it.
#[derive(Clone)]
pub struct LandmarkNetwork {
    cnn: Cnn,
}

impl LandmarkNetwork {
    /// Default location of the model file, relative to the working directory.
    pub const DEFAULT_MODEL_PATH: &'static str = "models/hand_landmark_full.onnx";

    /// Loads the network from an ONNX file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let cnn = Cnn::new(NeuralNetwork::from_path(path)?, ColorMapper::linear(0.0..=1.0))?;
        Ok(Self { cnn })
    }

    #[inline]
    pub fn input_resolution(&self) -> Resolution {
        self.cnn.input_resolution()
    }

    /// Estimates the landmarks of the hand in `image`.
    ///
    /// The image is stretched to the network's input resolution.
    pub fn estimate<V: AsImageView>(&self, image: &V) -> anyhow::Result<LandmarkResult> {
        let outputs = self.cnn.estimate(image)?;
        log::trace!("landmark network outputs: {:?}", outputs);
        extract(&outputs)
    }
}

fn extract(outputs: &Outputs) -> anyhow::Result<LandmarkResult> {
    anyhow::ensure!(
        outputs.len() >= 3,
        "hand landmark network has {} outputs, expected at least 3",
        outputs.len()
    );
    let screen_landmarks = outputs.f32_view(0)?;
    let presence_flag = outputs.f32_view(1)?.into_dimensionality::<Ix2>()?;
    let handedness = outputs.f32_view(2)?.into_dimensionality::<Ix2>()?;

    anyhow::ensure!(
        screen_landmarks.shape() == [1, NUM_LANDMARKS * 3],
        "unexpected landmark output shape {:?}",
        screen_landmarks.shape()
    );
    anyhow::ensure!(
        presence_flag.shape() == [1, 1] && handedness.shape() == [1, 1],
        "unexpected presence/handedness output shapes {:?}/{:?}",
        presence_flag.shape(),
        handedness.shape()
    );

    let landmarks = screen_landmarks
        .iter()
        .copied()
        .tuples()
        .map(|(x, y, z)| [x, y, z])
        .collect();

    Ok(LandmarkResult {
        landmarks,
        presence: presence_flag[[0, 0]],
        raw_handedness: handedness[[0, 0]],
    })
}
