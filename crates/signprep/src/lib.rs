//! Hand-sign dataset preparation.
//!
//! `signprep` walks a tree of sign videos (`<source>/<class>/<video>`), runs a hand landmark
//! detector on every frame, and writes three aligned datasets for each frame with a usable hand:
//!
//! * a square crop of the hand region from the original frame,
//! * a letterboxed rendering of the hand skeleton ("bones") on a white canvas,
//! * the 21 hand landmarks normalized to `[0, 1]` per axis, as text.
//!
//! All three files of a frame share the name `<video>_<n>`, where `n` counts the frames that
//! produced output. See [`pipeline::Pipeline`] for the driver and [`config::Config`] for its
//! settings.
//!
//! # Coordinates
//!
//! Landmark X and Y coordinates are in frame pixels (X points right, Y points down). Z is the
//! relative depth reported by the landmark network, scaled like X so that all three axes share a
//! unit.

use log::LevelFilter;

pub mod config;
pub mod crop;
pub mod dataset;
pub mod detection;
pub mod hand;
pub mod iter;
pub mod nn;
pub mod num;
pub mod pipeline;
pub mod timer;

pub use crop::GeometryError;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), log_level)
        .filter(Some("signprep_image"), log_level)
        .filter(Some("signprep_video"), log_level)
        .filter(Some("tract_core"), LevelFilter::Warn)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and the `signprep` crates log at *debug* level, `tract` at *warn* level.
/// `RUST_LOG` overrides these defaults.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
