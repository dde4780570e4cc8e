//! Planar homography estimation between the camera image and the plate.
//!
//! The mapping comes from the four corner picks of a rectangle with known
//! physical size. Points are Hartley-normalized, the eight unknowns
//! (`h33 = 1`) are solved with LU, and the result is verified by
//! reprojecting the defining correspondences. Every rejection carries a
//! [`DegenerateReason`] instead of producing a silently unstable matrix.

use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

use crate::error::DegenerateReason;
use crate::image::{sample_bilinear_rgb_u8, RgbFrame, RgbFrameView};
use crate::quad::{has_collinear_triple, span_squared};
use crate::{ImagePoint, PlanePoint};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Relative triangle-area threshold below which three corners count as
/// collinear. Twice the triangle area is compared against this fraction of
/// the squared span of the point set.
pub const COLLINEARITY_EPS: f64 = 1e-6;

/// Homogeneous-scale threshold: a conversion whose third coordinate falls
/// below this is degenerate, never a huge cartesian value.
pub const HOMOGENEOUS_EPS: f64 = 1e-9;

/// Reprojection tolerance for the four defining correspondences, as a
/// fraction of the target-point span.
pub const RESIDUAL_EPS: f64 = 1e-6;

/// 3x3 projective map between image pixels and plane coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    /// Apply to a point and normalize. `None` when the homogeneous scale
    /// vanishes (below [`HOMOGENEOUS_EPS`]) or the result is not finite.
    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Option<Point2<f64>> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= HOMOGENEOUS_EPS {
            return None;
        }
        let q = Point2::new(v[0] / w, v[1] / w);
        if !(q.x.is_finite() && q.y.is_finite()) {
            return None;
        }
        Some(q)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn normalize_quad(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    // Hartley normalization: translate to centroid, scale so mean distance = sqrt(2)
    let n = 4.0_f64;
    let mut cx = 0.0_f64;
    let mut cy = 0.0_f64;
    for p in pts {
        cx += p.x;
        cy += p.y;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0_f64;
    for p in pts {
        let dx = p.x - cx;
        let dy = p.y - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;

    let t = hartley_normalization(cx, cy, mean_dist);

    let mut out = [Point2::origin(); 4];
    for (i, p) in pts.iter().enumerate() {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        out[i] = Point2::new(v[0], v[1]);
    }

    (out, t)
}

fn rescale_h33(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

fn denormalize(hn: Matrix3<f64>, t_src: Matrix3<f64>, t_dst: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let t_dst_inv = t_dst.try_inverse()?;
    Some(t_dst_inv * hn * t_src)
}

/// Compute H such that `dst ~ H * src` from four point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Degenerate
/// input is rejected with a reason, checked in this order: a collinear
/// triple in either point set, an unsolvable or non-finite system, a
/// reprojection residual above [`RESIDUAL_EPS`] of the target span.
pub fn homography_from_quad(
    src: &[Point2<f64>; 4],
    dst: &[Point2<f64>; 4],
) -> Result<Homography, DegenerateReason> {
    if has_collinear_triple(src, COLLINEARITY_EPS) || has_collinear_triple(dst, COLLINEARITY_EPS) {
        return Err(DegenerateReason::CollinearCorners);
    }

    let (src_n, t_src) = normalize_quad(src);
    let (dst_n, t_dst) = normalize_quad(dst);

    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // For each correspondence (x,y)->(u,v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a
        .lu()
        .solve(&b)
        .ok_or(DegenerateReason::SingularSystem)?;
    if x.iter().any(|v| !v.is_finite()) {
        return Err(DegenerateReason::SingularSystem);
    }

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    let h = denormalize(hn, t_src, t_dst)
        .and_then(rescale_h33)
        .map(Homography::new)
        .ok_or(DegenerateReason::SingularSystem)?;

    verify_reprojection(&h, src, dst)?;
    Ok(h)
}

// The LU solve accepts some near-singular systems; reprojecting the four
// defining correspondences catches those before a bad matrix leaks out.
fn verify_reprojection(
    h: &Homography,
    src: &[Point2<f64>; 4],
    dst: &[Point2<f64>; 4],
) -> Result<(), DegenerateReason> {
    let tol = RESIDUAL_EPS * span_squared(dst).sqrt().max(1.0);
    for k in 0..4 {
        let q = h.apply(src[k]).ok_or(DegenerateReason::PointAtInfinity)?;
        let r = (q - dst[k]).norm();
        if !(r <= tol) {
            return Err(DegenerateReason::SingularSystem);
        }
    }
    Ok(())
}

/// The two directions of one estimated calibration mapping.
///
/// Both matrices come from a single solve and are discarded together when
/// the quad or the plate dimensions change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneMapping {
    plane_from_image: Homography,
    image_from_plane: Homography,
}

impl PlaneMapping {
    /// Build the mapping for a quad picked over a `width x height` plate
    /// rectangle. Plane targets follow the pick order: `(0,0)`, `(W,0)`,
    /// `(W,H)`, `(0,H)`.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(quad)))]
    pub fn for_rectangle(
        quad: &[ImagePoint; 4],
        width: f64,
        height: f64,
    ) -> Result<Self, DegenerateReason> {
        let targets = [
            PlanePoint::new(0.0, 0.0),
            PlanePoint::new(width, 0.0),
            PlanePoint::new(width, height),
            PlanePoint::new(0.0, height),
        ];
        let plane_from_image = homography_from_quad(quad, &targets)?;
        let image_from_plane = plane_from_image
            .inverse()
            .ok_or(DegenerateReason::SingularSystem)?;
        Ok(Self {
            plane_from_image,
            image_from_plane,
        })
    }

    #[inline]
    pub fn plane_from_image(&self) -> &Homography {
        &self.plane_from_image
    }

    #[inline]
    pub fn image_from_plane(&self) -> &Homography {
        &self.image_from_plane
    }

    /// Image pixel to plane coordinates.
    #[inline]
    pub fn to_plane(&self, p: ImagePoint) -> Option<PlanePoint> {
        self.plane_from_image.apply(p)
    }

    /// Plane coordinates back to an image pixel.
    #[inline]
    pub fn to_image(&self, p: PlanePoint) -> Option<ImagePoint> {
        self.image_from_plane.apply(p)
    }
}

/// Warp into a rectified frame: every output pixel `(x, y)` is mapped
/// through `h_src_from_out` and bilinear-sampled from `src`.
///
/// Output coordinates feed the homography as-is, so source pixel centers
/// sit on the integer grid, the same convention the corner picks use.
/// Pixels that land outside the source, or whose homogeneous scale
/// vanishes, take the `background` color. Identical inputs produce
/// bit-identical output.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(src, h_src_from_out),
        fields(src_w = src.width, src_h = src.height)
    )
)]
pub fn warp_perspective_rgb(
    src: &RgbFrameView<'_>,
    h_src_from_out: Homography,
    out_w: usize,
    out_h: usize,
    background: [u8; 3],
) -> RgbFrame {
    let mut out = RgbFrame::filled(out_w, out_h, background);

    for y in 0..out_h {
        for x in 0..out_w {
            let sampled = h_src_from_out
                .apply(Point2::new(x as f64, y as f64))
                .and_then(|p| sample_bilinear_rgb_u8(src, p.x, p.y));
            if let Some(px) = sampled {
                let i = (y * out_w + x) * 3;
                out.data[i..i + 3].copy_from_slice(&px);
            }
        }
    }

    out
}
