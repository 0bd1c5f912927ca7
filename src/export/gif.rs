use super::GifEncoderPort;
use crate::canvas::surface::{PixelBuffer, MAX_SURFACE_SIDE};
use crate::error::EncodeError;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use std::path::Path;

/// Palette quantisation speed passed to the `image` GIF encoder (1 = best,
/// 30 = fastest).
pub const QUANTIZE_SPEED: i32 = 10;

#[derive(Clone, Copy, Debug)]
struct Params {
    width: u32,
    height: u32,
    fps: u32,
}

/// [`GifEncoderPort`] backed by `image`'s GIF codec.
///
/// Frames are validated and buffered as they arrive; the actual encoding
/// happens in `finish`, so an abandoned export never writes anything.
#[derive(Default)]
pub struct ImageGifEncoder {
    params: Option<Params>,
    frames: Vec<RgbaImage>,
}

impl ImageGifEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl GifEncoderPort for ImageGifEncoder {
    fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<(), EncodeError> {
        if width == 0 || height == 0 {
            return Err(EncodeError::InvalidParams(format!(
                "frame size must be non-zero, got {width}x{height}"
            )));
        }
        // GIF stores the logical screen size as u16
        let limit = MAX_SURFACE_SIDE.min(u16::MAX as u32);
        if width > limit || height > limit {
            return Err(EncodeError::InvalidParams(format!(
                "frame size {width}x{height} is too large"
            )));
        }
        if fps == 0 {
            return Err(EncodeError::InvalidParams("fps must be > 0".to_string()));
        }
        self.params = Some(Params { width, height, fps });
        self.frames.clear();
        Ok(())
    }

    fn add_frame(&mut self, frame: &PixelBuffer) -> Result<(), EncodeError> {
        let params = self.params.ok_or(EncodeError::NotStarted)?;
        if frame.width != params.width || frame.height != params.height {
            return Err(EncodeError::FrameSize {
                width: params.width,
                height: params.height,
                actual_width: frame.width,
                actual_height: frame.height,
            });
        }
        let image = frame.to_rgba_image().ok_or(EncodeError::FrameSize {
            width: params.width,
            height: params.height,
            actual_width: frame.width,
            actual_height: frame.height,
        })?;
        self.frames.push(image);
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<u8>, EncodeError> {
        let params = self.params.take().ok_or(EncodeError::NotStarted)?;
        let delay = Delay::from_numer_denom_ms(1000, params.fps);
        let frames: Vec<Frame> = self
            .frames
            .drain(..)
            .map(|image| Frame::from_parts(image, 0, 0, delay))
            .collect();

        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut bytes, QUANTIZE_SPEED);
            encoder.set_repeat(Repeat::Infinite)?;
            encoder.encode_frames(frames)?;
        }
        tracing::debug!(
            width = params.width,
            height = params.height,
            fps = params.fps,
            bytes = bytes.len(),
            "GIF encoded"
        );
        Ok(bytes)
    }

    fn abort(&mut self) {
        self.params = None;
        self.frames.clear();
    }
}

/// Writes encoded bytes to `path`, creating parent directories as needed.
pub fn write_gif(path: &Path, bytes: &[u8]) -> Result<(), EncodeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "GIF written");
    Ok(())
}
