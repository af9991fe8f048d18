use std::path::PathBuf;

use clap::Parser;
use signprep::{
    config::Config,
    hand::{HandConfig, HandLandmarker, OnnxHands},
    pipeline::Pipeline,
};

/// Extracts hand crops, bone renderings, and normalized landmarks from hand-sign videos.
#[derive(Parser, Debug)]
#[command(name = "signprep", version, long_about = None)]
struct Args {
    /// Input directory with one sub-directory of videos per sign class
    #[arg(long, default_value = "vietnamese_hand_sign/classes")]
    source: PathBuf,

    /// Output directory for the cropped hand images
    #[arg(long, default_value = "vietnamese_hand_sign/classes_image")]
    image_out: PathBuf,

    /// Output directory for the skeleton ("bone") images
    #[arg(long, default_value = "vietnamese_hand_sign/classes_bone")]
    bone_out: PathBuf,

    /// Output directory for the normalized landmark text files
    #[arg(long, default_value = "vietnamese_hand_sign/classes_point")]
    point_out: PathBuf,

    /// Move each processed video into this directory, keeping its class folder
    #[arg(long)]
    done_dir: Option<PathBuf>,

    /// Palm detection model (ONNX)
    #[arg(long, default_value = "models/palm_detection_full.onnx")]
    palm_model: PathBuf,

    /// Hand landmark model (ONNX)
    #[arg(long, default_value = "models/hand_landmark_full.onnx")]
    landmark_model: PathBuf,

    /// Pixels added around the hand bounding box
    #[arg(long, default_value_t = Config::DEFAULT_MARGIN)]
    margin: u32,

    /// Side length of the output images
    #[arg(long, default_value_t = Config::DEFAULT_SIZE)]
    size: u32,

    /// Number of trailing frames to skip in every video
    #[arg(long, default_value_t = Config::DEFAULT_TAIL_MARGIN)]
    tail_margin: u64,

    /// Maximum number of hands detected per frame
    #[arg(long, default_value_t = 2)]
    max_hands: usize,

    /// Minimum palm detection confidence
    #[arg(long, default_value_t = 0.5)]
    min_detection_confidence: f32,

    /// Minimum hand presence confidence
    #[arg(long, default_value_t = 0.5)]
    min_tracking_confidence: f32,

    /// Treat frames as unrelated still images
    #[arg(long)]
    static_image_mode: bool,

    /// Normalize brightness and contrast of the hand crops, clipping this percentage of the
    /// histogram
    #[arg(long, value_name = "CLIP_PERCENT")]
    auto_contrast: Option<f32>,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            source_root: self.source,
            image_root: self.image_out,
            bone_root: self.bone_out,
            point_root: self.point_out,
            done_root: self.done_dir,
            palm_model: self.palm_model,
            landmark_model: self.landmark_model,
            margin: self.margin,
            size: self.size,
            tail_margin: self.tail_margin,
            hands: HandConfig {
                static_image_mode: self.static_image_mode,
                max_hands: self.max_hands,
                min_detection_confidence: self.min_detection_confidence,
                min_tracking_confidence: self.min_tracking_confidence,
            },
            auto_contrast: self.auto_contrast,
        }
    }
}

fn main() -> anyhow::Result<()> {
    signprep::init_logger!();

    let config = Args::parse().into_config();
    log::debug!("{:?}", config);

    let backend = OnnxHands::new(&config.palm_model, &config.landmark_model, config.hands)?;
    let landmarker = HandLandmarker::new(backend, config.hands);
    let summary = Pipeline::new(config, landmarker).run()?;

    for video in &summary.videos {
        println!("{}: {}", video.video.display(), video);
    }
    Ok(())
}
