//! High-level facade crate for the `orthoview-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the calibration and rectification crates
//! - session files that persist a calibration between runs
//! - stage-shift planning that turns a pixel pick into a motor move
//! - (feature-gated) packed-frame codecs, `image` adapters and marker overlays
//!
//! ## Quickstart
//!
//! ```
//! use orthoview::core::{ImagePoint, PlateCalibration, PlateDimensions};
//! use orthoview::motion::{plan_shift, MotionSettings};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut calib = PlateCalibration::new();
//! calib.calibrate_with(
//!     [
//!         ImagePoint::new(112.0, 85.0),
//!         ImagePoint::new(540.0, 98.0),
//!         ImagePoint::new(515.0, 410.0),
//!         ImagePoint::new(92.0, 388.0),
//!     ],
//!     PlateDimensions {
//!         width: 100.0,
//!         height: 75.0,
//!     },
//! )?;
//! calib.set_local_origin(ImagePoint::new(320.0, 240.0))?;
//!
//! // Plate position of a pixel, relative to the marked origin.
//! let p = calib.to_plane(ImagePoint::new(350.0, 250.0))?;
//! println!("plate offset: ({:.2}, {:.2})", p.x, p.y);
//!
//! // Stage move that brings that feature under the origin.
//! let shift = plan_shift(&calib, ImagePoint::new(350.0, 250.0), &MotionSettings::default())?;
//! println!("stage shift: dx={:.2} dy={:.2}", shift.dx, shift.dy);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `orthoview::core`: corner picks, plate dimensions and the pixel-to-plane mapping.
//! - `orthoview::rectify`: orthographic plate warps and full-frame views.
//! - `orthoview::session`: JSON session files (`PlateSession`).
//! - `orthoview::motion`: stage-shift planning and the `MotionDriver` seam.
//! - `orthoview::frame`: the packed `0x00BBGGRR` wire format; `image` crate
//!   adapters behind the `image` feature.
//! - `orthoview::overlay` (feature `image`): corner, origin and grid markers.

pub use orthoview_core as core;
pub use orthoview_rectify as rectify;

pub use orthoview_core::{
    CalibrationError, CalibrationState, ImagePoint, PlanePoint, PlateCalibration, PlateDimensions,
};
pub use orthoview_rectify::{RectifiedPlateView, RectifyParams};

pub mod frame;
pub mod motion;
pub mod session;

#[cfg(feature = "image")]
pub mod overlay;
