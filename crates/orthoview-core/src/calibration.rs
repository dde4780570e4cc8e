//! Calibration engine: corner collection, plate dimensions, and the
//! pixel-to-plane conversion state machine.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{CalibrationError, DegenerateReason};
use crate::homography::PlaneMapping;
use crate::quad::{CalibrationQuad, CornerId};
use crate::{ImagePoint, PlanePoint};

/// Physical size of the calibration rectangle, in plane units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlateDimensions {
    pub width: f64,
    pub height: f64,
}

/// Calibration progress, reported by [`PlateCalibration::state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationState {
    /// No corners picked and no mapping.
    Uncalibrated,
    /// Corner picks in progress. A complete quad whose plate dimensions
    /// are still unknown stays here with `corners = 4`.
    Collecting { corners: usize },
    /// A valid mapping exists; conversions are available.
    Calibrated,
    /// The last solve was rejected; the picks are latched until
    /// `begin_calibration`.
    Degenerate,
}

/// Perspective calibration for a camera viewing a flat plate obliquely.
///
/// Four corner picks of a rectangle with known physical size define a
/// homography between image pixels and plane coordinates. An optional
/// local origin (the beam position on a diffractometer hutch camera)
/// makes every readout relative to that reference point.
#[derive(Clone, Debug, Default)]
pub struct PlateCalibration {
    quad: CalibrationQuad,
    dims: Option<PlateDimensions>,
    mapping: Option<PlaneMapping>,
    degenerate: Option<DegenerateReason>,
    origin_plane: Option<PlanePoint>,
    origin_pick: Option<ImagePoint>,
}

impl PlateCalibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart corner picking: clears the quad and discards the mapping.
    /// Plate dimensions and the local origin persist.
    pub fn begin_calibration(&mut self) {
        self.quad.clear();
        self.mapping = None;
        self.degenerate = None;
        debug!("calibration restarted");
    }

    /// Append the next corner pick. Adding the fourth corner solves the
    /// mapping if the plate dimensions are already known; a degenerate
    /// quad latches the engine until `begin_calibration`.
    pub fn add_corner(&mut self, p: ImagePoint) -> Result<(), CalibrationError> {
        self.quad.push(p)?;
        let id = CornerId::ALL[self.quad.len() - 1];
        debug!("corner {} picked at ({:.2}, {:.2})", id.label(), p.x, p.y);
        if self.quad.is_complete() && self.dims.is_some() {
            self.solve()?;
        }
        Ok(())
    }

    /// Set the physical size of the picked rectangle and recompute the
    /// mapping when the quad is already complete. The same dimensions
    /// always reproduce a bit-identical matrix.
    pub fn set_dimensions(&mut self, dims: PlateDimensions) -> Result<(), CalibrationError> {
        let ok = dims.width.is_finite()
            && dims.height.is_finite()
            && dims.width > 0.0
            && dims.height > 0.0;
        if !ok {
            return Err(CalibrationError::InvalidDimension {
                width: dims.width,
                height: dims.height,
            });
        }
        self.dims = Some(dims);
        if self.quad.is_complete() {
            self.mapping = None;
            self.degenerate = None;
            self.solve()?;
        }
        Ok(())
    }

    /// Convert `p` through the mapping and store the result as the local
    /// origin. The raw pick is kept so sessions can persist it.
    pub fn set_local_origin(&mut self, p: ImagePoint) -> Result<PlanePoint, CalibrationError> {
        let origin = self
            .mapping()?
            .to_plane(p)
            .ok_or(CalibrationError::Degenerate(
                DegenerateReason::PointAtInfinity,
            ))?;
        self.origin_plane = Some(origin);
        self.origin_pick = Some(p);
        info!(
            "local origin set to ({:.3}, {:.3}) plane units",
            origin.x, origin.y
        );
        Ok(origin)
    }

    /// Remove the local origin; readouts become absolute plate coordinates.
    pub fn clear_local_origin(&mut self) {
        self.origin_plane = None;
        self.origin_pick = None;
    }

    /// Map an image pixel to plane coordinates, relative to the local
    /// origin when one is set.
    pub fn to_plane(&self, p: ImagePoint) -> Result<PlanePoint, CalibrationError> {
        let q = self
            .mapping()?
            .to_plane(p)
            .ok_or(CalibrationError::Degenerate(
                DegenerateReason::PointAtInfinity,
            ))?;
        Ok(match self.origin_plane {
            Some(o) => PlanePoint::new(q.x - o.x, q.y - o.y),
            None => q,
        })
    }

    /// Map plane coordinates (relative to the local origin when one is
    /// set) back to an image pixel.
    pub fn to_image(&self, p: PlanePoint) -> Result<ImagePoint, CalibrationError> {
        let abs = match self.origin_plane {
            Some(o) => PlanePoint::new(p.x + o.x, p.y + o.y),
            None => p,
        };
        self.mapping()?
            .to_image(abs)
            .ok_or(CalibrationError::Degenerate(
                DegenerateReason::PointAtInfinity,
            ))
    }

    /// Reset picks, set dimensions, and add all four corners in pick
    /// order. Convenience for when the quad is already known in full.
    pub fn calibrate_with(
        &mut self,
        quad: [ImagePoint; 4],
        dims: PlateDimensions,
    ) -> Result<(), CalibrationError> {
        self.begin_calibration();
        self.set_dimensions(dims)?;
        for p in quad {
            self.add_corner(p)?;
        }
        Ok(())
    }

    /// True when a valid, non-degenerate mapping exists.
    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.mapping.is_some()
    }

    pub fn state(&self) -> CalibrationState {
        if self.degenerate.is_some() {
            CalibrationState::Degenerate
        } else if self.mapping.is_some() {
            CalibrationState::Calibrated
        } else if self.quad.is_empty() {
            CalibrationState::Uncalibrated
        } else {
            CalibrationState::Collecting {
                corners: self.quad.len(),
            }
        }
    }

    /// The current mapping, or `NotCalibrated` when absent or degenerate.
    pub fn mapping(&self) -> Result<&PlaneMapping, CalibrationError> {
        self.mapping.as_ref().ok_or(CalibrationError::NotCalibrated)
    }

    #[inline]
    pub fn corners(&self) -> &[ImagePoint] {
        self.quad.corners()
    }

    /// Which corner the next `add_corner` will define.
    #[inline]
    pub fn next_corner(&self) -> Option<CornerId> {
        self.quad.next_corner()
    }

    #[inline]
    pub fn dimensions(&self) -> Option<PlateDimensions> {
        self.dims
    }

    /// Local origin in plane units, when set.
    #[inline]
    pub fn local_origin(&self) -> Option<PlanePoint> {
        self.origin_plane
    }

    /// The image-space pick that produced the local origin.
    #[inline]
    pub fn origin_pick(&self) -> Option<ImagePoint> {
        self.origin_pick
    }

    /// Why the last solve was rejected, while in the degenerate state.
    #[inline]
    pub fn degenerate_reason(&self) -> Option<DegenerateReason> {
        self.degenerate
    }

    fn solve(&mut self) -> Result<(), CalibrationError> {
        let quad = self.quad.as_array().ok_or(CalibrationError::NotCalibrated)?;
        let dims = self.dims.ok_or(CalibrationError::NotCalibrated)?;
        match PlaneMapping::for_rectangle(&quad, dims.width, dims.height) {
            Ok(mapping) => {
                self.mapping = Some(mapping);
                self.degenerate = None;
                info!(
                    "calibrated: quad maps to a {:.1} x {:.1} plate rectangle",
                    dims.width, dims.height
                );
                Ok(())
            }
            Err(reason) => {
                self.mapping = None;
                self.degenerate = Some(reason);
                warn!("calibration rejected: {}", reason);
                Err(CalibrationError::Degenerate(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn oblique_quad() -> [ImagePoint; 4] {
        [
            ImagePoint::new(112.0, 84.0),
            ImagePoint::new(521.0, 71.0),
            ImagePoint::new(553.0, 412.0),
            ImagePoint::new(87.0, 395.0),
        ]
    }

    fn dims(width: f64, height: f64) -> PlateDimensions {
        PlateDimensions { width, height }
    }

    fn calibrated() -> PlateCalibration {
        let mut cal = PlateCalibration::new();
        cal.calibrate_with(oblique_quad(), dims(120.0, 80.0))
            .expect("calibration");
        cal
    }

    #[test]
    fn corners_round_trip_to_their_plane_targets() {
        let cal = calibrated();
        let targets = [(0.0, 0.0), (120.0, 0.0), (120.0, 80.0), (0.0, 80.0)];
        for (pick, &(tx, ty)) in oblique_quad().iter().zip(targets.iter()) {
            let q = cal.to_plane(*pick).unwrap();
            assert_relative_eq!(q.x, tx, epsilon = 1e-6);
            assert_relative_eq!(q.y, ty, epsilon = 1e-6);
        }
    }

    #[test]
    fn monotonic_rectangle_maps_center_to_center() {
        let mut cal = PlateCalibration::new();
        cal.calibrate_with(
            [
                ImagePoint::new(0.0, 0.0),
                ImagePoint::new(100.0, 0.0),
                ImagePoint::new(100.0, 50.0),
                ImagePoint::new(0.0, 50.0),
            ],
            dims(200.0, 100.0),
        )
        .unwrap();

        let q = cal.to_plane(ImagePoint::new(50.0, 25.0)).unwrap();
        assert_relative_eq!(q.x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(q.y, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn same_dimensions_reproduce_the_identical_matrix() {
        let mut cal = calibrated();
        let first = cal.mapping().unwrap().plane_from_image().to_array();
        cal.set_dimensions(dims(120.0, 80.0)).unwrap();
        let second = cal.mapping().unwrap().plane_from_image().to_array();
        assert_eq!(first, second);
    }

    #[test]
    fn local_origin_shifts_every_readout() {
        let mut cal = calibrated();
        let pick = ImagePoint::new(300.0, 250.0);
        let before = cal.to_plane(ImagePoint::new(400.0, 200.0)).unwrap();

        let origin = cal.set_local_origin(pick).unwrap();
        let at_origin = cal.to_plane(pick).unwrap();
        assert_relative_eq!(at_origin.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(at_origin.y, 0.0, epsilon = 1e-9);

        let after = cal.to_plane(ImagePoint::new(400.0, 200.0)).unwrap();
        assert_relative_eq!(after.x, before.x - origin.x, epsilon = 1e-9);
        assert_relative_eq!(after.y, before.y - origin.y, epsilon = 1e-9);

        cal.clear_local_origin();
        let absolute = cal.to_plane(ImagePoint::new(400.0, 200.0)).unwrap();
        assert_relative_eq!(absolute.x, before.x, epsilon = 1e-9);
    }

    #[test]
    fn to_image_inverts_to_plane() {
        let mut cal = calibrated();
        cal.set_local_origin(ImagePoint::new(200.0, 300.0)).unwrap();

        let pick = ImagePoint::new(431.0, 187.0);
        let plane = cal.to_plane(pick).unwrap();
        let back = cal.to_image(plane).unwrap();
        assert_relative_eq!(back.x, pick.x, epsilon = 1e-6);
        assert_relative_eq!(back.y, pick.y, epsilon = 1e-6);
    }

    #[test]
    fn collecting_reports_progress_and_order() {
        let mut cal = PlateCalibration::new();
        assert_eq!(cal.state(), CalibrationState::Uncalibrated);
        assert_eq!(cal.next_corner(), Some(CornerId::TopLeft));

        cal.add_corner(ImagePoint::new(10.0, 10.0)).unwrap();
        assert_eq!(cal.state(), CalibrationState::Collecting { corners: 1 });
        assert_eq!(cal.next_corner(), Some(CornerId::TopRight));

        cal.add_corner(ImagePoint::new(90.0, 12.0)).unwrap();
        cal.add_corner(ImagePoint::new(95.0, 80.0)).unwrap();
        assert_eq!(cal.state(), CalibrationState::Collecting { corners: 3 });
        assert!(!cal.is_calibrated());
    }

    #[test]
    fn dimensions_can_arrive_after_the_quad() {
        let mut cal = PlateCalibration::new();
        for p in oblique_quad() {
            cal.add_corner(p).unwrap();
        }
        // quad complete, no dimensions: still not calibrated
        assert_eq!(cal.state(), CalibrationState::Collecting { corners: 4 });
        assert!(matches!(
            cal.to_plane(ImagePoint::new(1.0, 1.0)),
            Err(CalibrationError::NotCalibrated)
        ));

        cal.set_dimensions(dims(120.0, 80.0)).unwrap();
        assert_eq!(cal.state(), CalibrationState::Calibrated);
        assert!(cal.is_calibrated());
    }

    #[test]
    fn invalid_dimensions_are_rejected() {
        let mut cal = PlateCalibration::new();
        let bad = [
            (0.0, 50.0),
            (-3.0, 50.0),
            (f64::NAN, 50.0),
            (10.0, f64::INFINITY),
        ];
        for (w, h) in bad {
            assert!(matches!(
                cal.set_dimensions(dims(w, h)),
                Err(CalibrationError::InvalidDimension { .. })
            ));
        }
        assert_eq!(cal.dimensions(), None);
    }

    #[test]
    fn fifth_corner_is_rejected() {
        let mut cal = calibrated();
        assert_eq!(
            cal.add_corner(ImagePoint::new(1.0, 1.0)),
            Err(CalibrationError::Incomplete { corners: 4 })
        );
        // the mapping survives the rejected pick
        assert!(cal.is_calibrated());
    }

    #[test]
    fn collinear_quad_latches_the_degenerate_state() {
        let mut cal = PlateCalibration::new();
        cal.set_dimensions(dims(100.0, 100.0)).unwrap();
        cal.add_corner(ImagePoint::new(0.0, 0.0)).unwrap();
        cal.add_corner(ImagePoint::new(100.0, 0.0)).unwrap();
        cal.add_corner(ImagePoint::new(200.0, 0.0)).unwrap();

        let err = cal.add_corner(ImagePoint::new(300.0, 0.0));
        assert_eq!(
            err,
            Err(CalibrationError::Degenerate(
                DegenerateReason::CollinearCorners
            ))
        );
        assert!(!cal.is_calibrated());
        assert_eq!(cal.state(), CalibrationState::Degenerate);
        assert_eq!(
            cal.degenerate_reason(),
            Some(DegenerateReason::CollinearCorners)
        );

        // latched: conversions and further picks keep failing
        assert!(matches!(
            cal.to_plane(ImagePoint::new(5.0, 5.0)),
            Err(CalibrationError::NotCalibrated)
        ));
        assert!(matches!(
            cal.add_corner(ImagePoint::new(5.0, 5.0)),
            Err(CalibrationError::Incomplete { .. })
        ));

        // re-solving with new dimensions cannot fix collinear picks
        assert!(matches!(
            cal.set_dimensions(dims(50.0, 50.0)),
            Err(CalibrationError::Degenerate(_))
        ));
        assert_eq!(cal.state(), CalibrationState::Degenerate);

        // only a quad reset recovers
        cal.begin_calibration();
        assert_eq!(cal.state(), CalibrationState::Uncalibrated);
        for p in oblique_quad() {
            cal.add_corner(p).unwrap();
        }
        assert!(cal.is_calibrated());
    }

    #[test]
    fn reset_invalidates_the_mapping() {
        let mut cal = calibrated();
        assert!(cal.is_calibrated());

        cal.begin_calibration();
        assert_eq!(cal.state(), CalibrationState::Uncalibrated);
        assert!(matches!(
            cal.to_plane(ImagePoint::new(100.0, 100.0)),
            Err(CalibrationError::NotCalibrated)
        ));
        // dimensions persist across the reset
        assert_eq!(cal.dimensions(), Some(dims(120.0, 80.0)));
    }

    #[test]
    fn conversion_on_the_horizon_is_degenerate() {
        // strongly convergent quad: the side edges meet at (50, 62.5)
        let mut cal = PlateCalibration::new();
        cal.calibrate_with(
            [
                ImagePoint::new(0.0, 0.0),
                ImagePoint::new(100.0, 0.0),
                ImagePoint::new(60.0, 50.0),
                ImagePoint::new(40.0, 50.0),
            ],
            dims(100.0, 100.0),
        )
        .unwrap();

        assert_eq!(
            cal.to_plane(ImagePoint::new(50.0, 62.5)),
            Err(CalibrationError::Degenerate(
                DegenerateReason::PointAtInfinity
            ))
        );
        // interior points still convert
        assert!(cal.to_plane(ImagePoint::new(50.0, 25.0)).is_ok());
    }

    #[test]
    fn dimensions_deserialize_from_json() {
        let d: PlateDimensions = serde_json::from_str(r#"{"width":120.0,"height":80.0}"#).unwrap();
        assert_eq!(d, dims(120.0, 80.0));
    }
}
