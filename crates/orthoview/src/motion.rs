//! Stage-shift planning: turn a pixel pick into a relative motor move.
//!
//! With a local origin marked on the plate (the beam spot on a hutch
//! camera), [`plan_shift`] computes the stage move that brings a picked
//! feature under that origin. Stage axes are often mirrored relative to
//! the camera axes, so each axis carries an inversion flag; the defaults
//! match a stage whose X axis runs against the image X axis.
//!
//! [`MotionDriver`] is the seam towards real hardware. [`DryRunDriver`]
//! only logs the planned move and is what the CLI uses.

use std::convert::Infallible;

use log::info;
use serde::{Deserialize, Serialize};

use orthoview_core::{CalibrationError, ImagePoint, PlateCalibration};

#[cfg(feature = "tracing")]
use tracing::instrument;

fn default_invert_x() -> bool {
    true
}

/// Axis conventions of the sample stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionSettings {
    /// Negate the X component of planned shifts.
    #[serde(default = "default_invert_x")]
    pub invert_x: bool,
    /// Negate the Y component of planned shifts.
    #[serde(default)]
    pub invert_y: bool,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            invert_x: default_invert_x(),
            invert_y: false,
        }
    }
}

/// Relative stage move, in plane units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlateShift {
    pub dx: f64,
    pub dy: f64,
}

/// Plan the relative stage move that brings the picked pixel under the
/// local origin.
///
/// The pick is converted with [`PlateCalibration::to_plane`], so the
/// result is origin-relative whenever a local origin is set; without one
/// the move targets the plate origin instead.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(calib)))]
pub fn plan_shift(
    calib: &PlateCalibration,
    pick: ImagePoint,
    settings: &MotionSettings,
) -> Result<PlateShift, CalibrationError> {
    let p = calib.to_plane(pick)?;
    let dx = if settings.invert_x { -p.x } else { p.x };
    let dy = if settings.invert_y { -p.y } else { p.y };
    Ok(PlateShift { dx, dy })
}

/// Sink for planned stage moves.
pub trait MotionDriver {
    type Error;

    /// Execute a relative move, in plane units.
    fn move_relative(&mut self, shift: PlateShift) -> Result<(), Self::Error>;
}

/// Driver that logs planned moves instead of executing them.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunDriver;

impl MotionDriver for DryRunDriver {
    type Error = Infallible;

    fn move_relative(&mut self, shift: PlateShift) -> Result<(), Self::Error> {
        info!(
            "dry run: move stage by dx={:.3}, dy={:.3}",
            shift.dx, shift.dy
        );
        Ok(())
    }
}
