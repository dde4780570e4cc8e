//! Error types shared by the calibration engine and the homography solver.

use std::fmt;

use thiserror::Error;

/// Why a corner set or a conversion was rejected as degenerate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DegenerateReason {
    /// Three of the four corners are collinear within tolerance, so the
    /// quad does not span a plane patch.
    CollinearCorners,
    /// The correspondence system has no stable solution: LU failure,
    /// non-finite coefficients, or a reprojection residual above tolerance.
    SingularSystem,
    /// The homogeneous scale of a mapped point vanished; the point sits on
    /// the horizon of the fitted plane.
    PointAtInfinity,
}

impl fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DegenerateReason::CollinearCorners => "collinear corners",
            DegenerateReason::SingularSystem => "singular correspondence system",
            DegenerateReason::PointAtInfinity => "point maps to infinity",
        };
        f.write_str(s)
    }
}

/// Errors raised by [`PlateCalibration`](crate::PlateCalibration) operations.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    /// A corner pick arrived out of sequence. Raised when the quad already
    /// holds four corners and no `begin_calibration` intervened.
    #[error("calibration quad already holds {corners} corners; call begin_calibration to restart")]
    Incomplete { corners: usize },
    /// Plate dimensions must be finite and strictly positive.
    #[error("invalid plate dimension: width={width}, height={height}")]
    InvalidDimension { width: f64, height: f64 },
    /// No valid homography exists; collect four corners and set the plate
    /// dimensions first.
    #[error("not calibrated")]
    NotCalibrated,
    /// The corner set or the solve cannot produce a stable mapping.
    #[error("degenerate calibration: {0}")]
    Degenerate(DegenerateReason),
}
