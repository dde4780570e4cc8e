//! Session files: persist a plate calibration between runs.
//!
//! A [`PlateSession`] stores the raw inputs of a calibration (corner
//! picks, plate size, origin pick) rather than the solved matrix, so a
//! restored session replays the solve and always agrees with a fresh
//! calibration from the same picks. Files are pretty-printed JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use orthoview_core::{
    canonical_corner_order, CalibrationError, ImagePoint, PlateCalibration, PlateDimensions,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Failures while reading, writing or replaying a session file.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

fn default_px_per_unit() -> f64 {
    4.0
}

/// Snapshot of a plate calibration, stored as JSON.
///
/// Every field is optional in the file; missing fields fall back to an
/// uncalibrated state. Width and height of zero mean the plate size was
/// never entered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlateSession {
    /// Corner picks in pixel coordinates. Order in the file is free;
    /// [`restore`](Self::restore) sorts them into canonical order.
    #[serde(default)]
    pub corners: Option<[[f64; 2]; 4]>,
    /// Plate width in plane units.
    #[serde(default)]
    pub width: f64,
    /// Plate height in plane units.
    #[serde(default)]
    pub height: f64,
    /// Pixel where the local origin was marked.
    #[serde(default)]
    pub origin_pick: Option<[f64; 2]>,
    /// Rectified output scale, in pixels per plane unit.
    #[serde(default = "default_px_per_unit")]
    pub px_per_unit: f64,
}

impl Default for PlateSession {
    fn default() -> Self {
        Self {
            corners: None,
            width: 0.0,
            height: 0.0,
            origin_pick: None,
            px_per_unit: default_px_per_unit(),
        }
    }
}

impl PlateSession {
    /// Snapshot a calibration engine. Only a complete corner quad is
    /// captured; partial picks restart from scratch on restore.
    pub fn capture(calib: &PlateCalibration, px_per_unit: f64) -> Self {
        let corners = match calib.corners() {
            &[a, b, c, d] => Some([[a.x, a.y], [b.x, b.y], [c.x, c.y], [d.x, d.y]]),
            _ => None,
        };
        let (width, height) = calib
            .dimensions()
            .map_or((0.0, 0.0), |d| (d.width, d.height));
        Self {
            corners,
            width,
            height,
            origin_pick: calib.origin_pick().map(|p| [p.x, p.y]),
            px_per_unit,
        }
    }

    /// Replay the stored picks into a fresh calibration engine.
    ///
    /// Stored corners pass through [`canonical_corner_order`], so files
    /// edited by hand may list them in any order. The origin pick is
    /// replayed only when the mapping solves; otherwise it stays in the
    /// session without reaching the engine.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn restore(&self) -> Result<PlateCalibration, SessionError> {
        let mut calib = PlateCalibration::new();
        if self.width != 0.0 || self.height != 0.0 {
            calib.set_dimensions(PlateDimensions {
                width: self.width,
                height: self.height,
            })?;
        }
        if let Some(raw) = self.corners {
            let picks = raw.map(|[x, y]| ImagePoint::new(x, y));
            for p in canonical_corner_order(picks) {
                calib.add_corner(p)?;
            }
        }
        if let Some([x, y]) = self.origin_pick {
            if calib.is_calibrated() {
                calib.set_local_origin(ImagePoint::new(x, y))?;
            }
        }
        Ok(calib)
    }

    /// Read a session from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the session as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }
}
