//! Conversions between `Frame` and the `image` crate.

use crate::frame::Frame;
use crate::util::{TriggerError, TriggerResult};
use std::io::Cursor;
use std::path::Path;

/// Creates a frame from an RGB image buffer.
pub fn frame_from_rgb_image(img: &image::RgbImage) -> TriggerResult<Frame> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    Frame::from_rgb(img.as_raw().clone(), width, height)
}

/// Creates a frame from a dynamic image, converting to RGB.
pub fn frame_from_dynamic_image(img: &image::DynamicImage) -> TriggerResult<Frame> {
    frame_from_rgb_image(&img.to_rgb8())
}

/// Loads a PNG or JPEG file and converts it to an RGB frame.
///
/// Any decode failure is reported as `InvalidTemplateImage`.
pub fn load_frame<P: AsRef<Path>>(path: P) -> TriggerResult<Frame> {
    let path = path.as_ref();
    let invalid = |reason: String| TriggerError::InvalidTemplateImage {
        path: path.display().to_string(),
        reason,
    };
    let img = image::open(path).map_err(|err| invalid(err.to_string()))?;
    frame_from_dynamic_image(&img).map_err(|err| invalid(err.to_string()))
}

/// Copies a frame into an `image::RgbImage`.
pub fn to_rgb_image(frame: &Frame) -> TriggerResult<image::RgbImage> {
    image::RgbImage::from_raw(
        frame.width() as u32,
        frame.height() as u32,
        frame.as_raw().to_vec(),
    )
    .ok_or(TriggerError::ImageEncode {
        reason: "frame buffer does not match its dimensions".to_string(),
    })
}

/// Encodes a frame as PNG bytes.
pub fn encode_png(frame: &Frame) -> TriggerResult<Vec<u8>> {
    let img = to_rgb_image(frame)?;
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|err| TriggerError::ImageEncode {
            reason: err.to_string(),
        })?;
    Ok(buf.into_inner())
}
