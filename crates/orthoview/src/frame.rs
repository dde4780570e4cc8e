//! Frame ingestion: the packed wire format and `image` crate adapters.
//!
//! Camera acquisition services publish one `u32` word per pixel with the
//! layout `0x00BBGGRR`: blue in bits 16..24, green in bits 8..16 and red
//! in bits 0..8. [`decode_packed_rgb`] unpacks such a buffer into an
//! [`RgbFrame`]; [`encode_packed_rgb`] is its inverse. With the `image`
//! feature the same frames convert to and from [`image::RgbImage`].

use thiserror::Error;

use orthoview_core::{RgbFrame, RgbFrameView};

/// Buffer validation failures when building frames from raw data.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame buffer holds {got} elements, expected {expected} for the given size")]
    InvalidBufferLength { expected: usize, got: usize },
    #[error("frame dimensions {width}x{height} overflow the addressable size")]
    InvalidDimensions { width: usize, height: usize },
}

/// Unpack a `0x00BBGGRR` word buffer into an RGB frame.
///
/// `words` must hold exactly `width * height` entries, row major.
pub fn decode_packed_rgb(
    words: &[u32],
    width: usize,
    height: usize,
) -> Result<RgbFrame, FrameError> {
    let pixels = width
        .checked_mul(height)
        .ok_or(FrameError::InvalidDimensions { width, height })?;
    let bytes = pixels
        .checked_mul(3)
        .ok_or(FrameError::InvalidDimensions { width, height })?;
    if words.len() != pixels {
        return Err(FrameError::InvalidBufferLength {
            expected: pixels,
            got: words.len(),
        });
    }

    let mut data = Vec::with_capacity(bytes);
    for &w in words {
        // word layout: B << 16 | G << 8 | R
        data.push((w & 0xff) as u8);
        data.push(((w >> 8) & 0xff) as u8);
        data.push(((w >> 16) & 0xff) as u8);
    }
    Ok(RgbFrame {
        width,
        height,
        data,
    })
}

/// Pack an RGB frame back into `0x00BBGGRR` words.
pub fn encode_packed_rgb(src: &RgbFrameView<'_>) -> Vec<u32> {
    src.data
        .chunks_exact(3)
        .map(|px| (u32::from(px[2]) << 16) | (u32::from(px[1]) << 8) | u32::from(px[0]))
        .collect()
}

/// Build an owned frame from a tightly packed RGB byte slice.
///
/// `data` must hold exactly `width * height * 3` bytes, row major.
pub fn rgb_frame_from_slice(
    data: &[u8],
    width: usize,
    height: usize,
) -> Result<RgbFrame, FrameError> {
    let expected = width
        .checked_mul(height)
        .and_then(|px| px.checked_mul(3))
        .ok_or(FrameError::InvalidDimensions { width, height })?;
    if data.len() != expected {
        return Err(FrameError::InvalidBufferLength {
            expected,
            got: data.len(),
        });
    }
    Ok(RgbFrame {
        width,
        height,
        data: data.to_vec(),
    })
}

/// Borrow an [`image::RgbImage`] as a frame view, without copying.
#[cfg(feature = "image")]
pub fn rgb_view(img: &image::RgbImage) -> RgbFrameView<'_> {
    RgbFrameView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy a frame view into an [`image::RgbImage`] for encoding or drawing.
#[cfg(feature = "image")]
pub fn to_rgb_image(src: &RgbFrameView<'_>) -> Result<image::RgbImage, FrameError> {
    let expected = src
        .width
        .checked_mul(src.height)
        .and_then(|px| px.checked_mul(3))
        .ok_or(FrameError::InvalidDimensions {
            width: src.width,
            height: src.height,
        })?;
    if src.data.len() != expected {
        return Err(FrameError::InvalidBufferLength {
            expected,
            got: src.data.len(),
        });
    }
    let width = u32::try_from(src.width).map_err(|_| FrameError::InvalidDimensions {
        width: src.width,
        height: src.height,
    })?;
    let height = u32::try_from(src.height).map_err(|_| FrameError::InvalidDimensions {
        width: src.width,
        height: src.height,
    })?;
    image::RgbImage::from_raw(width, height, src.data.to_vec()).ok_or(
        FrameError::InvalidDimensions {
            width: src.width,
            height: src.height,
        },
    )
}
