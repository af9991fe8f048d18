//! Output dataset layout and artifact writing.
//!
//! Every retained frame produces three files with a shared name, one in each output tree:
//!
//! ```text
//! <image_root>/<class>/<video>_<n>.jpg
//! <bone_root>/<class>/<video>_<n>.jpg
//! <point_root>/<class>/<video>_<n>.txt
//! ```

use std::{
    ffi::{OsStr, OsString},
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::config::Config;
use crate::iter::zip_exact;

/// The output directories of one sign class.
#[derive(Debug, Clone)]
pub struct ClassDirs {
    image: PathBuf,
    bone: PathBuf,
    point: PathBuf,
}

impl ClassDirs {
    /// Derives the output directories of `class` from the roots in `config` and creates them.
    pub fn create(config: &Config, class: &OsStr) -> anyhow::Result<Self> {
        let this = Self {
            image: config.image_root.join(class),
            bone: config.bone_root.join(class),
            point: config.point_root.join(class),
        };
        for dir in [&this.image, &this.bone, &this.point] {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
        }
        Ok(this)
    }

    #[inline]
    pub fn image(&self) -> &Path {
        &self.image
    }

    #[inline]
    pub fn bone(&self) -> &Path {
        &self.bone
    }

    #[inline]
    pub fn point(&self) -> &Path {
        &self.point
    }
}

/// Destination paths of the artifacts of one retained frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub hand: PathBuf,
    pub bone: PathBuf,
    pub points: PathBuf,
}

impl ArtifactPaths {
    /// `video_stem` is used as-is, so file names that are not valid UTF-8 are kept intact.
    pub fn new(dirs: &ClassDirs, video_stem: &OsStr, count: u64) -> Self {
        let file_name = |ext: &str| {
            let mut name = OsString::from(video_stem);
            name.push(format!("_{count}.{ext}"));
            name
        };
        Self {
            hand: dirs.image.join(file_name("jpg")),
            bone: dirs.bone.join(file_name("jpg")),
            points: dirs.point.join(file_name("txt")),
        }
    }
}

/// Fully encoded artifacts of a frame, not yet written to disk.
#[derive(Debug, Clone)]
pub struct PendingArtifacts {
    pub points: String,
    pub hand_jpeg: Vec<u8>,
    pub bone_jpeg: Vec<u8>,
}

impl PendingArtifacts {
    /// Writes all three artifacts to `paths`.
    ///
    /// Each payload is written to a `.partial` sibling of its destination first. Only once all of
    /// them are written are they renamed into place, existing files are replaced. On error, the
    /// partial files are removed again.
    pub fn commit(&self, paths: &ArtifactPaths) -> anyhow::Result<()> {
        let targets = [&paths.points, &paths.hand, &paths.bone];
        let payloads = [self.points.as_bytes(), &self.hand_jpeg[..], &self.bone_jpeg[..]];
        let partials = targets.map(|target| partial_path(target));

        let result = write_then_rename(&targets, &payloads, &partials);
        if result.is_err() {
            for partial in &partials {
                // May not have been created yet.
                fs::remove_file(partial).ok();
            }
        }
        result
    }
}

fn write_then_rename(
    targets: &[&PathBuf; 3],
    payloads: &[&[u8]; 3],
    partials: &[PathBuf; 3],
) -> anyhow::Result<()> {
    for (partial, payload) in zip_exact(partials, payloads) {
        fs::write(partial, payload)
            .with_context(|| format!("failed to write '{}'", partial.display()))?;
    }
    for (partial, target) in zip_exact(partials, targets) {
        fs::rename(partial, target).with_context(|| {
            format!(
                "failed to move '{}' to '{}'",
                partial.display(),
                target.display()
            )
        })?;
    }
    Ok(())
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path) -> Config {
        Config {
            image_root: root.join("image"),
            bone_root: root.join("bone"),
            point_root: root.join("point"),
            ..Config::default()
        }
    }

    fn artifacts(points: &str) -> PendingArtifacts {
        PendingArtifacts {
            points: points.into(),
            hand_jpeg: vec![0xff, 0xd8, 1],
            bone_jpeg: vec![0xff, 0xd8, 2],
        }
    }

    #[test]
    fn paths_follow_naming_scheme() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = ClassDirs::create(&config(tmp.path()), OsStr::new("A")).unwrap();
        assert!(dirs.image().is_dir());
        assert!(dirs.bone().is_dir());
        assert!(dirs.point().is_dir());

        let paths = ArtifactPaths::new(&dirs, OsStr::new("clip"), 7);
        assert_eq!(paths.hand, tmp.path().join("image/A/clip_7.jpg"));
        assert_eq!(paths.bone, tmp.path().join("bone/A/clip_7.jpg"));
        assert_eq!(paths.points, tmp.path().join("point/A/clip_7.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_stems_stay_distinct() {
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::tempdir().unwrap();
        let dirs = ClassDirs::create(&config(tmp.path()), OsStr::new("A")).unwrap();
        let a = ArtifactPaths::new(&dirs, OsStr::from_bytes(b"clip\xff"), 0);
        let b = ArtifactPaths::new(&dirs, OsStr::from_bytes(b"clip\xfe"), 0);
        assert_ne!(a, b);
        assert_eq!(a.points.file_name().unwrap().as_bytes(), b"clip\xff_0.txt");
    }

    #[test]
    fn commit_writes_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = ClassDirs::create(&config(tmp.path()), OsStr::new("B")).unwrap();
        let paths = ArtifactPaths::new(&dirs, OsStr::new("clip"), 0);

        artifacts("first\n").commit(&paths).unwrap();
        artifacts("second\n").commit(&paths).unwrap();

        assert_eq!(fs::read_to_string(&paths.points).unwrap(), "second\n");
        assert_eq!(fs::read(&paths.hand).unwrap(), [0xff, 0xd8, 1]);
        assert_eq!(fs::read(&paths.bone).unwrap(), [0xff, 0xd8, 2]);
        assert_eq!(fs::read_dir(dirs.point()).unwrap().count(), 1);
    }

    #[test]
    fn failed_commit_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = ClassDirs::create(&config(tmp.path()), OsStr::new("C")).unwrap();
        let mut paths = ArtifactPaths::new(&dirs, OsStr::new("clip"), 0);
        paths.bone = tmp.path().join("missing/clip_0.jpg");

        assert!(artifacts("x\n").commit(&paths).is_err());
        for dir in [dirs.image(), dirs.bone(), dirs.point()] {
            assert_eq!(fs::read_dir(dir).unwrap().count(), 0, "{}", dir.display());
        }
    }
}
