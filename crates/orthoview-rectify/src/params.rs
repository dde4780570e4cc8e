//! Rendering parameters for rectified plate views.

use serde::{Deserialize, Serialize};

use orthoview_core::PlateDimensions;

fn default_px_per_unit() -> f64 {
    4.0
}

fn default_max_output_px() -> usize {
    8192
}

/// How a rectified view is rendered.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RectifyParams {
    /// Rectified pixels per plane unit.
    #[serde(default = "default_px_per_unit")]
    pub px_per_unit: f64,
    /// Fill color for output pixels with no source sample.
    #[serde(default)]
    pub background: [u8; 3],
    /// Reject outputs wider or taller than this. Frame corners near the
    /// horizon of the fitted plane can blow the bounding box up
    /// arbitrarily.
    #[serde(default = "default_max_output_px")]
    pub max_output_px: usize,
}

impl Default for RectifyParams {
    fn default() -> Self {
        Self {
            px_per_unit: default_px_per_unit(),
            background: [0, 0, 0],
            max_output_px: default_max_output_px(),
        }
    }
}

impl RectifyParams {
    /// Scale chosen so the rectified plate rectangle spans the full source
    /// frame width.
    pub fn fill_width(src_width: usize, dims: PlateDimensions) -> Self {
        Self {
            px_per_unit: src_width as f64 / dims.width,
            ..Self::default()
        }
    }
}
