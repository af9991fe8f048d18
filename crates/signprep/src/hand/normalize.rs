//! Per-axis min-max normalization of hand landmarks.

use std::fmt::Write;

use crate::crop::{Axis, GeometryError};
use crate::num::round2;

use super::{Extent, HandObservation};

/// Hand landmarks scaled to `[0, 1]` along every axis, rounded to two decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLandmarks {
    points: Vec<[f32; 3]>,
}

impl NormalizedLandmarks {
    #[inline]
    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }

    /// Renders one line per landmark, with the three coordinates separated by single spaces.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.points.len() * 15);
        for [x, y, z] in &self.points {
            // Writing to a `String` cannot fail.
            let _ = writeln!(out, "{x:.2} {y:.2} {z:.2}");
        }
        out
    }
}

/// Normalizes the landmarks of `hand` by the extrema of each axis.
///
/// Fails with [`GeometryError::DegenerateExtent`] if all landmarks share a coordinate on any axis.
pub fn normalize(hand: &HandObservation) -> Result<NormalizedLandmarks, GeometryError> {
    let [x, y, z] = hand.extents();
    for (extent, axis) in [(x, Axis::X), (y, Axis::Y), (z, Axis::Z)] {
        if extent.span() == 0 {
            return Err(GeometryError::DegenerateExtent(axis));
        }
    }

    let scale = |v: i64, e: Extent| round2((v - e.min) as f32 / e.span() as f32);
    let points = hand
        .landmarks()
        .iter()
        .map(|&[lx, ly, lz]| [scale(lx, x), scale(ly, y), scale(lz, z)])
        .collect();
    Ok(NormalizedLandmarks { points })
}
