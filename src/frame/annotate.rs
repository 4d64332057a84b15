//! Bounding-box overlays for detection previews.

use crate::frame::{Frame, Point, Size, CHANNELS};

/// Outline color for detections.
pub const BOX_COLOR: [u8; CHANNELS] = [0, 255, 0];

/// Outline thickness in pixels.
pub const BOX_THICKNESS: usize = 2;

impl Frame {
    /// Returns a copy of the frame with a rectangle outline drawn inside the
    /// region `[top_left, top_left + size)`. The outline is clipped to the frame.
    pub fn with_box(&self, top_left: Point, size: Size, color: [u8; CHANNELS]) -> Frame {
        let mut out = self.clone();
        if size.width == 0 || size.height == 0 {
            return out;
        }

        let x0 = top_left.x.max(0) as usize;
        let y0 = top_left.y.max(0) as usize;
        let x1 = (top_left.x.max(0) as usize + size.width).min(self.width);
        let y1 = (top_left.y.max(0) as usize + size.height).min(self.height);
        let thickness = BOX_THICKNESS.min(size.width).min(size.height);

        for y in y0..y1 {
            let on_horizontal_edge = y < y0 + thickness || y + thickness >= y0 + size.height;
            for x in x0..x1 {
                let on_vertical_edge = x < x0 + thickness || x + thickness >= x0 + size.width;
                if on_horizontal_edge || on_vertical_edge {
                    let idx = (y * self.width + x) * CHANNELS;
                    out.data[idx..idx + CHANNELS].copy_from_slice(&color);
                }
            }
        }
        out
    }
}
