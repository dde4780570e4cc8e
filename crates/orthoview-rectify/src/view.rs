use log::debug;
use nalgebra::{Matrix3, Point2, Vector2};
use thiserror::Error;

use orthoview_core::{
    warp_perspective_rgb, CalibrationError, DegenerateReason, Homography, ImagePoint, PlanePoint,
    PlateCalibration, RgbFrame, RgbFrameView,
};

use crate::params::RectifyParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors raised while building a rectified view.
#[derive(Error, Debug)]
pub enum RectifyError {
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error("rectification scale must be positive and finite (px_per_unit={0})")]
    InvalidScale(f64),
    #[error("rectified output size must be nonzero ({width}x{height})")]
    EmptyOutput { width: usize, height: usize },
    #[error("rectified output {width}x{height} exceeds the {limit} px per side limit")]
    OutputTooLarge {
        width: usize,
        height: usize,
        limit: usize,
    },
}

/// Render exactly the calibration rectangle into an `out_w x out_h` frame.
///
/// Output pixel `(0, 0)` sits on the plate origin and the two axes scale
/// independently, `W / out_w` and `H / out_h` units per pixel, so the
/// requested size is always filled. Pixels whose source sample falls
/// outside the frame take the `background` color.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(src, calib), fields(src_w = src.width, src_h = src.height))
)]
pub fn warp_plate(
    src: &RgbFrameView<'_>,
    calib: &PlateCalibration,
    out_w: usize,
    out_h: usize,
    background: [u8; 3],
) -> Result<RgbFrame, RectifyError> {
    let mapping = calib.mapping()?;
    let dims = calib.dimensions().ok_or(CalibrationError::NotCalibrated)?;
    if out_w == 0 || out_h == 0 {
        return Err(RectifyError::EmptyOutput {
            width: out_w,
            height: out_h,
        });
    }

    // out (x, y) -> plane (x * W / out_w, y * H / out_h) -> image
    let sx = dims.width / out_w as f64;
    let sy = dims.height / out_h as f64;
    let scale = Matrix3::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0);
    let h_src_from_out = Homography::new(mapping.image_from_plane().h * scale);

    debug!(
        "plate warp to {}x{} px ({:.4} x {:.4} units per px)",
        out_w, out_h, sx, sy
    );
    Ok(warp_perspective_rgb(
        src,
        h_src_from_out,
        out_w,
        out_h,
        background,
    ))
}

/// Orthographic view of the whole camera frame.
///
/// The output covers the plane-space bounding box of the warped frame;
/// [`plate_rect`](Self::plate_rect) and [`origin_px`](Self::origin_px)
/// report where the calibration rectangle and the local origin landed in
/// output pixels.
#[derive(Clone, Debug)]
pub struct RectifiedPlateView {
    pub frame: RgbFrame,
    pub px_per_unit: f64,
    offset: Vector2<f64>,
    plate_rect: [Point2<f64>; 4],
    origin_px: Option<Point2<f64>>,
    h_src_from_out: Homography,
    h_out_from_src: Homography,
}

impl RectifiedPlateView {
    /// Map an output pixel back into the source frame.
    pub fn to_source(&self, p_out: Point2<f64>) -> Option<ImagePoint> {
        self.h_src_from_out.apply(p_out)
    }

    /// Map a source pixel into the output.
    pub fn from_source(&self, p_img: ImagePoint) -> Option<Point2<f64>> {
        self.h_out_from_src.apply(p_img)
    }

    /// Absolute plane coordinates of an output pixel.
    pub fn plane_at(&self, p_out: Point2<f64>) -> PlanePoint {
        PlanePoint::new(
            (p_out.x + self.offset.x) / self.px_per_unit,
            (p_out.y + self.offset.y) / self.px_per_unit,
        )
    }

    /// Corners of the calibration rectangle in output pixels, in pick
    /// order.
    #[inline]
    pub fn plate_rect(&self) -> &[Point2<f64>; 4] {
        &self.plate_rect
    }

    /// Local origin in output pixels, when the calibration has one.
    #[inline]
    pub fn origin_px(&self) -> Option<Point2<f64>> {
        self.origin_px
    }

    /// Plane-pixel offset of the output's top-left corner.
    #[inline]
    pub fn offset(&self) -> (f64, f64) {
        (self.offset.x, self.offset.y)
    }
}

/// Render an orthographic view of the whole frame.
///
/// The four source frame corners are mapped to the plane; their bounding
/// box at `params.px_per_unit` becomes the output raster. A corner whose
/// conversion degenerates is an error, not a garbage box, and the box is
/// capped at `params.max_output_px` per side.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(src, calib, params), fields(src_w = src.width, src_h = src.height))
)]
pub fn rectify_full_frame(
    src: &RgbFrameView<'_>,
    calib: &PlateCalibration,
    params: &RectifyParams,
) -> Result<RectifiedPlateView, RectifyError> {
    let mapping = calib.mapping()?;
    let dims = calib.dimensions().ok_or(CalibrationError::NotCalibrated)?;
    let s = params.px_per_unit;
    if !(s.is_finite() && s > 0.0) {
        return Err(RectifyError::InvalidScale(s));
    }

    // 1) source frame corners in plane pixels
    let w = src.width as f64;
    let h = src.height as f64;
    let frame_corners = [
        ImagePoint::new(0.0, 0.0),
        ImagePoint::new(w, 0.0),
        ImagePoint::new(w, h),
        ImagePoint::new(0.0, h),
    ];
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for c in frame_corners {
        let p = mapping
            .to_plane(c)
            .ok_or(CalibrationError::Degenerate(
                DegenerateReason::PointAtInfinity,
            ))?;
        min_x = min_x.min(p.x * s);
        min_y = min_y.min(p.y * s);
        max_x = max_x.max(p.x * s);
        max_y = max_y.max(p.y * s);
    }

    // 2) integer bounding box. Snapped against solve noise so a corner
    // sitting on an exact integer cannot flip floor or ceil.
    const BOX_SNAP: f64 = 1e-6;
    let off_x = (min_x + BOX_SNAP).floor();
    let off_y = (min_y + BOX_SNAP).floor();
    let out_w = ((max_x - BOX_SNAP).ceil() - off_x).max(1.0) as usize;
    let out_h = ((max_y - BOX_SNAP).ceil() - off_y).max(1.0) as usize;
    if out_w > params.max_output_px || out_h > params.max_output_px {
        return Err(RectifyError::OutputTooLarge {
            width: out_w,
            height: out_h,
            limit: params.max_output_px,
        });
    }

    // 3) output <-> source homographies by composition
    let to_plane_px = Matrix3::new(s, 0.0, -off_x, 0.0, s, -off_y, 0.0, 0.0, 1.0);
    let h_out_from_src = Homography::new(to_plane_px * mapping.plane_from_image().h);
    let from_plane_px = Matrix3::new(
        1.0 / s,
        0.0,
        off_x / s,
        0.0,
        1.0 / s,
        off_y / s,
        0.0,
        0.0,
        1.0,
    );
    let h_src_from_out = Homography::new(mapping.image_from_plane().h * from_plane_px);

    // 4) warp
    let frame = warp_perspective_rgb(src, h_src_from_out, out_w, out_h, params.background);

    // 5) plate rectangle and local origin in output pixels
    let plate_targets = [
        PlanePoint::new(0.0, 0.0),
        PlanePoint::new(dims.width, 0.0),
        PlanePoint::new(dims.width, dims.height),
        PlanePoint::new(0.0, dims.height),
    ];
    let plate_rect = plate_targets.map(|p| Point2::new(p.x * s - off_x, p.y * s - off_y));
    let origin_px = calib
        .local_origin()
        .map(|o| Point2::new(o.x * s - off_x, o.y * s - off_y));

    debug!(
        "full-frame rectified view {}x{} px, offset ({:.1}, {:.1})",
        out_w, out_h, off_x, off_y
    );

    Ok(RectifiedPlateView {
        frame,
        px_per_unit: s,
        offset: Vector2::new(off_x, off_y),
        plate_rect,
        origin_px,
        h_src_from_out,
        h_out_from_src,
    })
}
