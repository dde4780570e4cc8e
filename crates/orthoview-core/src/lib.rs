//! Planar calibration and pixel-to-plate coordinate mapping.
//!
//! A camera views a flat plate at an oblique angle; picking the four
//! corners of a rectangle with known physical size defines a homography
//! between image pixels and plate coordinates. This crate is purely
//! geometric: frames are plain byte buffers and nothing here touches a
//! GUI, a camera, or a motion controller.

mod calibration;
mod error;
mod homography;
mod image;
mod logger;
mod quad;

/// Pixel position in the camera frame. Sub-pixel values are legal.
pub type ImagePoint = nalgebra::Point2<f64>;

/// Position on the plate plane, in physical plane units (typically mm).
pub type PlanePoint = nalgebra::Point2<f64>;

pub use calibration::{CalibrationState, PlateCalibration, PlateDimensions};
pub use error::{CalibrationError, DegenerateReason};
pub use homography::{
    homography_from_quad, warp_perspective_rgb, Homography, PlaneMapping, COLLINEARITY_EPS,
    HOMOGENEOUS_EPS, RESIDUAL_EPS,
};
pub use image::{in_bounds, sample_bilinear_rgb, sample_bilinear_rgb_u8, RgbFrame, RgbFrameView};
pub use quad::{canonical_corner_order, has_collinear_triple, CalibrationQuad, CornerId};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
