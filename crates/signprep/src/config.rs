//! Run configuration.

use std::path::PathBuf;

use crate::hand::{detection::PalmNetwork, landmark::LandmarkNetwork, HandConfig};

/// Settings of a dataset preparation run.
///
/// [`Config::default`] reproduces the layout of the `vietnamese_hand_sign` dataset.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the input tree, containing one directory of videos per sign class.
    pub source_root: PathBuf,
    /// Output root for the cropped hand images.
    pub image_root: PathBuf,
    /// Output root for the letterboxed skeleton renderings.
    pub bone_root: PathBuf,
    /// Output root for the normalized landmark text files.
    pub point_root: PathBuf,
    /// If set, processed videos are moved to `<done_root>/<class>/` after extraction.
    pub done_root: Option<PathBuf>,
    pub palm_model: PathBuf,
    pub landmark_model: PathBuf,
    /// Pixels added around the hand bounding box on every side.
    pub margin: u32,
    /// Width and height of the hand and bone images.
    pub size: u32,
    /// Number of frames at the end of every video that are never processed.
    pub tail_margin: u64,
    pub hands: HandConfig,
    /// Clip percentage for brightness/contrast normalization of the hand crop. Disabled if `None`.
    pub auto_contrast: Option<f32>,
}

impl Config {
    pub const DEFAULT_MARGIN: u32 = 50;
    pub const DEFAULT_SIZE: u32 = 300;
    pub const DEFAULT_TAIL_MARGIN: u64 = 10;
}

impl Default for Config {
    fn default() -> Self {
        let dataset = PathBuf::from("vietnamese_hand_sign");
        Self {
            source_root: dataset.join("classes"),
            image_root: dataset.join("classes_image"),
            bone_root: dataset.join("classes_bone"),
            point_root: dataset.join("classes_point"),
            done_root: None,
            palm_model: PalmNetwork::DEFAULT_MODEL_PATH.into(),
            landmark_model: LandmarkNetwork::DEFAULT_MODEL_PATH.into(),
            margin: Self::DEFAULT_MARGIN,
            size: Self::DEFAULT_SIZE,
            tail_margin: Self::DEFAULT_TAIL_MARGIN,
            hands: HandConfig::default(),
            auto_contrast: None,
        }
    }
}
