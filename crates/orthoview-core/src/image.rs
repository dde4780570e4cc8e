//! Owned and borrowed RGB frame buffers with bilinear sampling.
//!
//! Buffers are plain row-major byte triplets so the crate works directly on
//! whatever the camera hands over. Adapters to `image::RgbImage` and the
//! packed wire format live in the `orthoview` facade.

#[derive(Clone, Copy, Debug)]
pub struct RgbFrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major RGB, len = w*h*3
}

#[derive(Clone, Debug)]
pub struct RgbFrame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbFrame {
    /// Allocate a frame filled with a single color.
    pub fn filled(width: usize, height: usize, color: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn as_view(&self) -> RgbFrameView<'_> {
        RgbFrameView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

// Taps clamp at the border so edge samples blend with edge pixels instead
// of an implicit black rim.
#[inline]
fn tap_rgb(src: &RgbFrameView<'_>, x: i64, y: i64) -> [u8; 3] {
    let xc = x.clamp(0, src.width as i64 - 1) as usize;
    let yc = y.clamp(0, src.height as i64 - 1) as usize;
    let i = (yc * src.width + xc) * 3;
    [src.data[i], src.data[i + 1], src.data[i + 2]]
}

/// True when a sample center lies inside the frame.
///
/// The frame covers `[0, w-1] x [0, h-1]` in pixel-center coordinates;
/// anything outside is background, never an extrapolation.
#[inline]
pub fn in_bounds(src: &RgbFrameView<'_>, x: f64, y: f64) -> bool {
    x >= 0.0 && y >= 0.0 && x <= src.width as f64 - 1.0 && y <= src.height as f64 - 1.0
}

/// Bilinear sample at `(x, y)`, `None` when the center falls outside the
/// frame.
#[inline]
pub fn sample_bilinear_rgb(src: &RgbFrameView<'_>, x: f64, y: f64) -> Option<[f64; 3]> {
    if !in_bounds(src, x, y) {
        return None;
    }

    let x0f = x.floor();
    let y0f = y.floor();
    let fx = x - x0f;
    let fy = y - y0f;
    let x0 = x0f as i64;
    let y0 = y0f as i64;

    let p00 = tap_rgb(src, x0, y0);
    let p10 = tap_rgb(src, x0 + 1, y0);
    let p01 = tap_rgb(src, x0, y0 + 1);
    let p11 = tap_rgb(src, x0 + 1, y0 + 1);

    let mut out = [0.0_f64; 3];
    for c in 0..3 {
        let a = p00[c] as f64 + fx * (p10[c] as f64 - p00[c] as f64);
        let b = p01[c] as f64 + fx * (p11[c] as f64 - p01[c] as f64);
        out[c] = a + fy * (b - a);
    }
    Some(out)
}

#[inline]
pub fn sample_bilinear_rgb_u8(src: &RgbFrameView<'_>, x: f64, y: f64) -> Option<[u8; 3]> {
    sample_bilinear_rgb(src, x, y).map(|px| px.map(|v| v.clamp(0.0, 255.0).round() as u8))
}
