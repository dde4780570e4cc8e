//! Plane-aligned grid lines for a rectified view.
//!
//! The grid is anchored at the plate origin, so a line passes through
//! `(0, 0)` of the plane no matter where the plate sits in the output.

use serde::{Deserialize, Serialize};

use crate::view::RectifiedPlateView;

fn default_spacing() -> f64 {
    10.0
}

fn default_extent() -> i32 {
    10
}

/// Grid layout in plane units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Distance between neighboring lines, in plane units.
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    /// Number of lines drawn on each side of the origin.
    #[serde(default = "default_extent")]
    pub extent: i32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            spacing: default_spacing(),
            extent: default_extent(),
        }
    }
}

/// Grid line positions in output pixels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridLines {
    /// Vertical lines, as x coordinates.
    pub xs: Vec<f64>,
    /// Horizontal lines, as y coordinates.
    pub ys: Vec<f64>,
}

fn line_positions(anchor: f64, step: f64, extent: i32, limit: f64) -> Vec<f64> {
    (-extent..=extent)
        .map(|k| anchor + f64::from(k) * step)
        .filter(|v| (0.0..limit).contains(v))
        .collect()
}

/// Positions of grid lines over `view`, every `spec.spacing` plane units.
///
/// Lines outside the output frame are dropped. A spacing that is not a
/// positive finite number yields an empty grid.
pub fn grid_lines(view: &RectifiedPlateView, spec: &GridSpec) -> GridLines {
    let step = spec.spacing * view.px_per_unit;
    if !(step.is_finite() && step > 0.0) {
        return GridLines::default();
    }
    let anchor = view.plate_rect()[0];
    GridLines {
        xs: line_positions(anchor.x, step, spec.extent, view.frame.width as f64),
        ys: line_positions(anchor.y, step, spec.extent, view.frame.height as f64),
    }
}
