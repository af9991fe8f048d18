//! The batch driver.
//!
//! [`Pipeline::run`] walks `<source_root>/<class>/<video>`, decodes every video frame by frame and
//! writes the three dataset artifacts for each frame with a usable hand. Frames without a hand and
//! frames whose hand geometry is unusable are skipped and counted, everything else that fails
//! aborts the run.

use std::{
    ffi::OsStr,
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use itertools::Itertools;
use signprep_image::{Image, DEFAULT_JPEG_QUALITY};
use signprep_video::FrameSource;

use crate::{
    config::Config,
    crop::{bone_letterbox, hand_crop, GeometryError},
    dataset::{ArtifactPaths, ClassDirs, PendingArtifacts},
    hand::{
        normalize::{normalize, NormalizedLandmarks},
        HandLandmarker, HandObservation, LandmarkBackend,
    },
    timer::Timer,
};

/// What happened to a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// All artifacts were written under the given index.
    Saved { index: u64 },
    NoHandDetected,
    GeometryInvalid(GeometryError),
}

/// Frame statistics of one processed video.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoSummary {
    pub video: PathBuf,
    pub frames_read: u64,
    pub saved: u64,
    pub no_hand: u64,
    pub geometry_invalid: u64,
}

impl VideoSummary {
    fn record(&mut self, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::Saved { .. } => self.saved += 1,
            FrameOutcome::NoHandDetected => self.no_hand += 1,
            FrameOutcome::GeometryInvalid(_) => self.geometry_invalid += 1,
        }
    }
}

impl fmt::Display for VideoSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames read, {} saved, {} without hand, {} with invalid geometry",
            self.frames_read, self.saved, self.no_hand, self.geometry_invalid
        )
    }
}

/// Statistics of a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub videos: Vec<VideoSummary>,
}

impl RunSummary {
    /// Returns the total number of saved frames over all videos.
    pub fn saved(&self) -> u64 {
        self.videos.iter().map(|v| v.saved).sum()
    }
}

/// Drives hand detection and artifact extraction over the input tree.
pub struct Pipeline<B> {
    config: Config,
    landmarker: HandLandmarker<B>,
    t_detect: Timer,
    t_encode: Timer,
    t_commit: Timer,
}

impl<B: LandmarkBackend> Pipeline<B> {
    pub fn new(config: Config, landmarker: HandLandmarker<B>) -> Self {
        Self {
            config,
            landmarker,
            t_detect: Timer::new("detect"),
            t_encode: Timer::new("encode"),
            t_commit: Timer::new("commit"),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Processes every video of every class directory under the source root.
    ///
    /// Classes and videos are visited in name order. Entries starting with a `.` are ignored.
    pub fn run(&self) -> anyhow::Result<RunSummary> {
        let mut summary = RunSummary::default();
        for class_dir in list_dir(&self.config.source_root, EntryKind::Dir)? {
            let Some(class) = class_dir.file_name() else {
                continue;
            };
            log::info!("class '{}'", class.to_string_lossy());
            let dirs = ClassDirs::create(&self.config, class)?;

            for video in list_dir(&class_dir, EntryKind::File)? {
                let video_summary = self.process_video(&video, &dirs)?;
                if let Some(done_root) = &self.config.done_root {
                    move_to_done(&video, &done_root.join(class))?;
                }
                summary.videos.push(video_summary);
            }
        }

        log::info!(
            "processed {} videos, saved {} frames",
            summary.videos.len(),
            summary.saved()
        );
        Ok(summary)
    }

    /// Extracts the artifacts of all frames of the video at `path` into `dirs`.
    pub fn process_video(&self, path: &Path, dirs: &ClassDirs) -> anyhow::Result<VideoSummary> {
        let mut source = signprep_video::open(path)
            .with_context(|| format!("failed to open video '{}'", path.display()))?;
        self.process_source(path, &mut *source, dirs)
    }

    /// Extracts the artifacts of the frames decoded from `source` into `dirs`.
    ///
    /// Output files are named after the file stem of `path`. The last [`Config::tail_margin`]
    /// frames reported by the container are not processed. A frame that fails to decode ends the
    /// video, the frames saved before it are kept.
    pub fn process_source(
        &self,
        path: &Path,
        source: &mut dyn FrameSource,
        dirs: &ClassDirs,
    ) -> anyhow::Result<VideoSummary> {
        let stem = path
            .file_stem()
            .with_context(|| format!("video path '{}' has no file name", path.display()))?;

        let total = source.frame_count();
        match total {
            Some(total) => log::info!("{}: {} frames", path.display(), total),
            None => log::warn!(
                "{}: unknown frame count, processing all frames",
                path.display()
            ),
        }

        let mut summary = VideoSummary {
            video: path.to_path_buf(),
            ..VideoSummary::default()
        };
        let mut count = 0;
        for i in 0.. {
            if let Some(total) = total {
                if total.saturating_sub(i) <= self.config.tail_margin {
                    break;
                }
            }

            let frame = match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("{}: failed to decode frame {}: {:#}", path.display(), i, e);
                    break;
                }
            };
            summary.frames_read += 1;

            let outcome = self.process_frame(&frame, dirs, stem, count)?;
            if let FrameOutcome::Saved { .. } = outcome {
                count += 1;
            }
            summary.record(outcome);
        }

        log::info!("{}: {}", path.display(), summary);
        log::debug!(
            "{}",
            [&self.t_detect, &self.t_encode, &self.t_commit]
                .iter()
                .join(", ")
        );
        Ok(summary)
    }

    /// Detects the hand in `frame` and writes its artifacts as `<video_stem>_<count>`.
    ///
    /// Only the first detected hand is used.
    pub fn process_frame(
        &self,
        frame: &Image,
        dirs: &ClassDirs,
        video_stem: &OsStr,
        count: u64,
    ) -> anyhow::Result<FrameOutcome> {
        let name = Path::new(video_stem).display();
        let output = self.t_detect.time(|| self.landmarker.detect(frame, true))?;
        let Some(hand) = output.hands.first() else {
            log::debug!("{name}: no hand");
            return Ok(FrameOutcome::NoHandDetected);
        };
        let bone = output
            .bone
            .as_ref()
            .context("hand landmarker did not render a bone image")?;

        let (points, hand_image, bone_image) = match self.geometry(frame, bone, hand) {
            Ok(geometry) => geometry,
            Err(e) => {
                log::debug!("{name}: skipping frame: {e}");
                return Ok(FrameOutcome::GeometryInvalid(e));
            }
        };

        let artifacts = self.t_encode.time(|| -> anyhow::Result<_> {
            Ok(PendingArtifacts {
                points: points.to_text(),
                hand_jpeg: hand_image.encode_jpeg(DEFAULT_JPEG_QUALITY)?,
                bone_jpeg: bone_image.encode_jpeg(DEFAULT_JPEG_QUALITY)?,
            })
        })?;
        let paths = ArtifactPaths::new(dirs, video_stem, count);
        self.t_commit.time(|| artifacts.commit(&paths))?;

        log::debug!("{name}: saved frame {count}");
        Ok(FrameOutcome::Saved { index: count })
    }

    fn geometry(
        &self,
        frame: &Image,
        bone: &Image,
        hand: &HandObservation,
    ) -> Result<(NormalizedLandmarks, Image, Image), GeometryError> {
        let bbox = hand.bounding_box();
        let points = normalize(hand)?;
        let hand_image = hand_crop(
            frame,
            bbox,
            self.config.margin,
            self.config.size,
            self.config.auto_contrast,
        )?;
        let bone_image = bone_letterbox(bone, bbox, self.config.margin, self.config.size)?;
        Ok((points, hand_image, bone_image))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
}

/// Lists the non-hidden entries of `dir` of the given kind, sorted by name.
fn list_dir(dir: &Path, kind: EntryKind) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory '{}'", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read directory '{}'", dir.display()))?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let matches = match kind {
            EntryKind::Dir => path.is_dir(),
            EntryKind::File => path.is_file(),
        };
        if matches {
            paths.push(path);
        }
    }

    Ok(paths.into_iter().sorted().collect())
}

/// Moves a processed video into `done_dir`, creating it if needed.
fn move_to_done(video: &Path, done_dir: &Path) -> anyhow::Result<()> {
    let Some(name) = video.file_name() else {
        return Ok(());
    };
    fs::create_dir_all(done_dir)
        .with_context(|| format!("failed to create directory '{}'", done_dir.display()))?;
    let dest = done_dir.join(name);

    if fs::rename(video, &dest).is_err() {
        // Renaming fails across file systems.
        fs::copy(video, &dest).with_context(|| {
            format!("failed to copy '{}' to '{}'", video.display(), dest.display())
        })?;
        fs::remove_file(video)
            .with_context(|| format!("failed to remove '{}'", video.display()))?;
    }
    log::debug!("moved {} to {}", video.display(), dest.display());
    Ok(())
}
