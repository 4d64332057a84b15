//! Owned RGB frames and screen-space geometry.
//!
//! A `Frame` is a packed, row-major buffer of 8-bit RGB pixels with no row
//! padding, so the stride is always `width * CHANNELS`. Screen captures and
//! decoded template files are both normalized to this layout, which keeps
//! template coordinates directly comparable to capture coordinates.

use crate::util::{TriggerError, TriggerResult};

pub mod annotate;
pub mod io;

/// Number of interleaved color channels per pixel (R, G, B).
pub const CHANNELS: usize = 3;

/// Absolute screen coordinate in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this point shifted by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Width and height in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Returns true when `self` fits inside `outer` on both axes.
    pub fn fits_within(self, outer: Size) -> bool {
        self.width <= outer.width && self.height <= outer.height
    }
}

/// Immutable RGB image, either a screen capture or a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Frame {
    /// Creates a frame from packed RGB bytes.
    ///
    /// Extra trailing bytes are dropped.
    pub fn from_rgb(mut data: Vec<u8>, width: usize, height: usize) -> TriggerResult<Self> {
        let needed = required_len(width, height)?;
        if data.len() < needed {
            return Err(TriggerError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        data.truncate(needed);
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates a frame from packed RGBA bytes, discarding alpha.
    pub fn from_rgba(data: &[u8], width: usize, height: usize) -> TriggerResult<Self> {
        let needed = required_len(width, height)?;
        let needed_rgba = needed / CHANNELS * 4;
        if data.len() < needed_rgba {
            return Err(TriggerError::BufferTooSmall {
                needed: needed_rgba,
                got: data.len(),
            });
        }
        let mut rgb = Vec::with_capacity(needed);
        for px in data[..needed_rgba].chunks_exact(4) {
            rgb.extend_from_slice(&px[..CHANNELS]);
        }
        Ok(Self {
            data: rgb,
            width,
            height,
        })
    }

    /// Creates a frame where every pixel has the same color.
    pub fn filled(width: usize, height: usize, rgb: [u8; CHANNELS]) -> TriggerResult<Self> {
        let needed = required_len(width, height)?;
        let mut data = Vec::with_capacity(needed);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns the frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the frame dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Returns the packed RGB buffer.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the frame and returns the packed RGB buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Returns the pixel at `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; CHANNELS]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * CHANNELS;
        let px = self.data.get(idx..idx + CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }

    /// Returns row `y` as `width * CHANNELS` interleaved bytes.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.width * CHANNELS;
        let start = y * stride;
        self.data.get(start..start + stride)
    }

    /// Copies a rectangular region into a new frame.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> TriggerResult<Frame> {
        if width == 0 || height == 0 {
            return Err(TriggerError::InvalidDimensions { width, height });
        }
        let out_of_bounds = TriggerError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for row_idx in y..end_y {
            let row = self.row(row_idx).ok_or_else(|| out_of_bounds.clone())?;
            data.extend_from_slice(&row[x * CHANNELS..end_x * CHANNELS]);
        }
        Ok(Frame {
            data,
            width,
            height,
        })
    }
}

fn required_len(width: usize, height: usize) -> TriggerResult<usize> {
    if width == 0 || height == 0 {
        return Err(TriggerError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or(TriggerError::InvalidDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::{Frame, Point, Size};
    use crate::util::TriggerError;

    #[test]
    fn from_rgba_drops_alpha() {
        let rgba = [1u8, 2, 3, 255, 4, 5, 6, 0];
        let frame = Frame::from_rgba(&rgba, 2, 1).unwrap();
        assert_eq!(frame.as_raw(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn crop_copies_expected_pixels() {
        let data: Vec<u8> = (0u8..48).collect();
        let frame = Frame::from_rgb(data, 4, 4).unwrap();
        let roi = frame.crop(1, 2, 2, 1).unwrap();
        assert_eq!(roi.size(), Size::new(2, 1));
        assert_eq!(roi.pixel(0, 0), frame.pixel(1, 2));
        assert_eq!(roi.pixel(1, 0), frame.pixel(2, 2));

        let err = frame.crop(3, 3, 2, 2).unwrap_err();
        assert!(matches!(err, TriggerError::RoiOutOfBounds { .. }));
    }

    #[test]
    fn rejects_empty_and_short_buffers() {
        assert_eq!(
            Frame::from_rgb(Vec::new(), 0, 3).unwrap_err(),
            TriggerError::InvalidDimensions {
                width: 0,
                height: 3
            }
        );
        assert_eq!(
            Frame::from_rgb(vec![0; 5], 1, 2).unwrap_err(),
            TriggerError::BufferTooSmall { needed: 6, got: 5 }
        );
    }

    #[test]
    fn point_offset_saturates() {
        assert_eq!(Point::new(3, 4).offset(100, -4), Point::new(103, 0));
        assert_eq!(Point::new(i32::MAX, 0).offset(1, 0).x, i32::MAX);
    }
}
