//! CPU image manipulation for the signprep dataset tools.
//!
//! # Overview
//!
//! ## Images and Views
//!
//! [`Image`] is an owned 8-bit sRGBA image. Borrowed rectangular sections of an [`Image`] can be
//! accessed through *views*: immutable [`ImageView`]s and mutable [`ImageViewMut`]s. The
//! [`AsImageView`] and [`AsImageViewMut`] traits abstract over the concrete image or view type, so
//! most APIs in this crate accept either.
//!
//! Views may extend past the edges of their [`Image`]. Pixels outside of the image read as
//! [`Color::NONE`] and ignore writes.
//!
//! ## Drawing
//!
//! A few primitive drawing operations are available in the [`draw`] module. They are used to
//! render hand skeletons onto blank canvases.
//!
//! ## Encoding
//!
//! [`Image::encode_jpeg`] produces an in-memory JPEG, which allows callers to prepare all of their
//! output files before writing any of them.

pub mod contrast;
pub mod draw;
pub mod rect;

mod color;
mod image;
mod jpeg;
mod resolution;

#[cfg(test)]
mod tests;

pub use crate::image::*;
pub use color::Color;
pub use jpeg::DEFAULT_QUALITY as DEFAULT_JPEG_QUALITY;
pub use rect::Rect;
pub use resolution::{AspectRatio, Resolution};
