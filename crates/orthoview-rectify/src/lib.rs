//! Orthographic rectification on top of `orthoview-core`.
//!
//! ## Quickstart
//!
//! ```
//! use orthoview_core::{ImagePoint, PlateCalibration, PlateDimensions, RgbFrame};
//! use orthoview_rectify::{rectify_full_frame, RectifyParams};
//!
//! let mut calib = PlateCalibration::new();
//! calib.calibrate_with(
//!     [
//!         ImagePoint::new(40.0, 30.0),
//!         ImagePoint::new(600.0, 42.0),
//!         ImagePoint::new(580.0, 420.0),
//!         ImagePoint::new(55.0, 400.0),
//!     ],
//!     PlateDimensions {
//!         width: 120.0,
//!         height: 80.0,
//!     },
//! )?;
//!
//! let frame = RgbFrame::filled(640, 480, [32, 32, 32]);
//! let view = rectify_full_frame(&frame.as_view(), &calib, &RectifyParams::default())?;
//! println!("rectified to {}x{} px", view.frame.width, view.frame.height);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Both warps run the same inverse mapping:
//! 1. For each output pixel, apply the output-to-source homography.
//! 2. Sample the source bilinearly at the mapped position.
//! 3. Fill with the background color where the sample falls off the frame.
//!
//! [`warp_plate`] renders exactly the calibration rectangle at a caller
//! chosen size; [`rectify_full_frame`] keeps the whole camera frame and
//! reports where the plate and the local origin landed.

mod grid;
mod params;
mod view;

pub use grid::{grid_lines, GridLines, GridSpec};
pub use params::RectifyParams;
pub use view::{rectify_full_frame, warp_plate, RectifiedPlateView, RectifyError};
