//! Marker overlays for live and rectified frames.
//!
//! Markers draw on a copy of the frame which is then alpha-blended onto
//! the original, so unmarked pixels come through unchanged while markers
//! stay slightly translucent. Marker sizes scale with the frame height;
//! colors and the blend weight live in [`OverlayStyle`].

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use imageproc::pixelops::interpolate;
use serde::{Deserialize, Serialize};

use orthoview_core::PlateCalibration;
use orthoview_rectify::{GridLines, RectifiedPlateView};

fn default_corner_color() -> [u8; 3] {
    [0, 192, 0]
}

fn default_active_corner_color() -> [u8; 3] {
    [64, 64, 255]
}

fn default_origin_color() -> [u8; 3] {
    [255, 0, 0]
}

fn default_grid_color() -> [u8; 3] {
    [192, 192, 192]
}

fn default_alpha() -> f32 {
    0.75
}

fn default_marker_scale() -> f32 {
    0.02
}

/// Colors and proportions of the drawn markers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// Settled corner picks.
    #[serde(default = "default_corner_color")]
    pub corner_color: [u8; 3],
    /// The most recent pick while the quad is still being collected.
    #[serde(default = "default_active_corner_color")]
    pub active_corner_color: [u8; 3],
    /// Ring around the local origin.
    #[serde(default = "default_origin_color")]
    pub origin_color: [u8; 3],
    /// Plane-aligned grid lines.
    #[serde(default = "default_grid_color")]
    pub grid_color: [u8; 3],
    /// Weight of the marker layer in the final blend.
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    /// Marker size as a fraction of the frame height.
    #[serde(default = "default_marker_scale")]
    pub marker_scale: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            corner_color: default_corner_color(),
            active_corner_color: default_active_corner_color(),
            origin_color: default_origin_color(),
            grid_color: default_grid_color(),
            alpha: default_alpha(),
            marker_scale: default_marker_scale(),
        }
    }
}

/// Base marker size in pixels for a frame of the given height.
fn marker_px(style: &OverlayStyle, height: u32) -> i32 {
    ((height as f32 * style.marker_scale).round() as i32).max(2)
}

/// Ring of roughly `2 * half_width + 1` px line weight.
fn draw_ring(
    canvas: &mut RgbImage,
    center: (i32, i32),
    radius: i32,
    half_width: i32,
    color: Rgb<u8>,
) {
    for r in (radius - half_width).max(1)..=(radius + half_width) {
        draw_hollow_circle_mut(canvas, center, r, color);
    }
}

/// Draw the corner picks and the origin ring of a live view.
///
/// While the quad is still being collected the most recent pick uses
/// [`OverlayStyle::active_corner_color`] so the operator can see which
/// dot the next adjustment moves.
pub fn draw_pick_markers(canvas: &mut RgbImage, calib: &PlateCalibration, style: &OverlayStyle) {
    let ps = marker_px(style, canvas.height());
    let picks = calib.corners();
    for (i, p) in picks.iter().enumerate() {
        let color = if !calib.is_calibrated() && i + 1 == picks.len() {
            style.active_corner_color
        } else {
            style.corner_color
        };
        let center = (p.x.round() as i32, p.y.round() as i32);
        draw_filled_circle_mut(canvas, center, ps / 3, Rgb(color));
    }
    if let Some(p) = calib.origin_pick() {
        let center = (p.x.round() as i32, p.y.round() as i32);
        draw_ring(canvas, center, ps, (ps / 6).max(1), Rgb(style.origin_color));
    }
}

/// Draw grid lines, plate corners and the origin ring of a rectified view.
pub fn draw_plate_markers(
    canvas: &mut RgbImage,
    view: &RectifiedPlateView,
    lines: &GridLines,
    style: &OverlayStyle,
) {
    let ps = marker_px(style, canvas.height());
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);

    // grid lines carry 2 px of weight
    let grid = Rgb(style.grid_color);
    for &x in &lines.xs {
        let x = x as f32;
        draw_line_segment_mut(canvas, (x, 0.0), (x, h - 1.0), grid);
        draw_line_segment_mut(canvas, (x + 1.0, 0.0), (x + 1.0, h - 1.0), grid);
    }
    for &y in &lines.ys {
        let y = y as f32;
        draw_line_segment_mut(canvas, (0.0, y), (w - 1.0, y), grid);
        draw_line_segment_mut(canvas, (0.0, y + 1.0), (w - 1.0, y + 1.0), grid);
    }

    for p in view.plate_rect() {
        let center = (p.x.round() as i32, p.y.round() as i32);
        draw_filled_circle_mut(canvas, center, ps / 3, Rgb(style.corner_color));
    }

    if let Some(p) = view.origin_px() {
        let center = (p.x.round() as i32, p.y.round() as i32);
        draw_ring(
            canvas,
            center,
            (ps * 3) / 4,
            (ps / 6).max(1),
            Rgb(style.origin_color),
        );
    }
}

/// Blend a marker layer onto its base frame.
///
/// Pixels equal in both images come through bit-identical, so only the
/// drawn markers change. Both images must share dimensions.
pub fn blend_overlay(base: &RgbImage, overlay: &RgbImage, alpha: f32) -> RgbImage {
    debug_assert_eq!(base.dimensions(), overlay.dimensions());
    let mut out = base.clone();
    for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
        *dst = interpolate(*src, *dst, alpha);
    }
    out
}

/// Live camera frame with pick markers blended in.
pub fn annotate_live(frame: &RgbImage, calib: &PlateCalibration, style: &OverlayStyle) -> RgbImage {
    let mut over = frame.clone();
    draw_pick_markers(&mut over, calib, style);
    blend_overlay(frame, &over, style.alpha)
}

/// Rectified frame with grid and plate markers blended in.
pub fn annotate_rectified(
    frame: &RgbImage,
    view: &RectifiedPlateView,
    lines: &GridLines,
    style: &OverlayStyle,
) -> RgbImage {
    let mut over = frame.clone();
    draw_plate_markers(&mut over, view, lines, style);
    blend_overlay(frame, &over, style.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orthoview_core::{ImagePoint, PlateDimensions, RgbFrame};
    use orthoview_rectify::{grid_lines, rectify_full_frame, GridSpec, RectifyParams};

    #[test]
    fn style_defaults_fill_missing_json_fields() {
        let style: OverlayStyle = serde_json::from_str("{}").expect("all fields default");
        assert_eq!(style, OverlayStyle::default());
        assert_eq!(style.alpha, 0.75);
    }

    #[test]
    fn latest_pick_uses_the_active_color() {
        let mut calib = PlateCalibration::new();
        calib.add_corner(ImagePoint::new(100.0, 100.0)).unwrap();
        calib.add_corner(ImagePoint::new(300.0, 120.0)).unwrap();

        let style = OverlayStyle::default();
        let mut canvas = RgbImage::new(640, 480);
        draw_pick_markers(&mut canvas, &calib, &style);

        assert_eq!(canvas.get_pixel(100, 100), &Rgb(style.corner_color));
        assert_eq!(canvas.get_pixel(300, 120), &Rgb(style.active_corner_color));
    }

    #[test]
    fn settled_quad_paints_every_pick_alike() {
        let mut calib = PlateCalibration::new();
        calib
            .calibrate_with(
                [
                    ImagePoint::new(100.0, 100.0),
                    ImagePoint::new(500.0, 110.0),
                    ImagePoint::new(480.0, 400.0),
                    ImagePoint::new(90.0, 380.0),
                ],
                PlateDimensions {
                    width: 100.0,
                    height: 75.0,
                },
            )
            .unwrap();
        calib.set_local_origin(ImagePoint::new(320.0, 240.0)).unwrap();

        let style = OverlayStyle::default();
        let mut canvas = RgbImage::new(640, 480);
        draw_pick_markers(&mut canvas, &calib, &style);

        for (x, y) in [(100, 100), (500, 110), (480, 400), (90, 380)] {
            assert_eq!(canvas.get_pixel(x, y), &Rgb(style.corner_color));
        }
        // origin ring: radius ps = 10 on a 480-high frame, probe on the axis
        assert_eq!(canvas.get_pixel(330, 240), &Rgb(style.origin_color));
        assert_eq!(canvas.get_pixel(320, 240), &Rgb([0, 0, 0]));
    }

    #[test]
    fn blend_keeps_untouched_pixels_bit_identical() {
        let base = RgbImage::from_pixel(8, 8, Rgb([92, 88, 64]));
        let mut over = base.clone();
        over.put_pixel(3, 3, Rgb([200, 100, 40]));

        let out = blend_overlay(&base, &over, 0.75);
        assert_eq!(out.get_pixel(0, 0), &Rgb([92, 88, 64]));
        // 0.75 * overlay + 0.25 * base, integral per channel
        assert_eq!(out.get_pixel(3, 3), &Rgb([173, 97, 46]));
    }

    #[test]
    fn rectified_annotation_places_grid_and_corners() {
        let mut calib = PlateCalibration::new();
        calib
            .calibrate_with(
                [
                    ImagePoint::new(10.0, 20.0),
                    ImagePoint::new(40.0, 20.0),
                    ImagePoint::new(40.0, 45.0),
                    ImagePoint::new(10.0, 45.0),
                ],
                PlateDimensions {
                    width: 30.0,
                    height: 25.0,
                },
            )
            .unwrap();

        let src = RgbFrame::filled(60, 50, [0, 0, 0]);
        let params = RectifyParams {
            px_per_unit: 1.0,
            ..RectifyParams::default()
        };
        let view = rectify_full_frame(&src.as_view(), &calib, &params).unwrap();
        let lines = grid_lines(&view, &GridSpec::default());

        let style = OverlayStyle::default();
        let base = RgbImage::new(60, 50);
        let out = annotate_rectified(&base, &view, &lines, &style);

        // vertical line at x = 0, horizontal at y = 0, anchored on the plate
        assert_eq!(out.get_pixel(0, 5), &Rgb([144, 144, 144]));
        assert_eq!(out.get_pixel(5, 0), &Rgb([144, 144, 144]));
        assert_eq!(out.get_pixel(5, 5), &Rgb([0, 0, 0]));
        // plate corner dot at the top-left plate corner (10, 20)
        assert_eq!(out.get_pixel(10, 20), &Rgb([0, 144, 0]));
    }

    #[test]
    fn annotations_are_deterministic() {
        let mut calib = PlateCalibration::new();
        calib.add_corner(ImagePoint::new(12.0, 9.0)).unwrap();

        let mut base = RgbImage::new(64, 48);
        for (x, y, px) in base.enumerate_pixels_mut() {
            *px = Rgb([(x * 3) as u8, (y * 5) as u8, (x + y) as u8]);
        }

        let style = OverlayStyle::default();
        let a = annotate_live(&base, &calib, &style);
        let b = annotate_live(&base, &calib, &style);
        assert_eq!(a, b);
        assert_ne!(a.get_pixel(12, 9), base.get_pixel(12, 9));
        assert_eq!(a.get_pixel(40, 40), base.get_pixel(40, 40));
    }
}
