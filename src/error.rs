//! Error types for the render, encode and export boundaries.
//!
//! Jitter and history are pure in-memory logic and never fail; everything
//! that can go wrong happens when a raster surface is acquired or while the
//! GIF is being encoded.

use thiserror::Error;

/// Errors raised by a renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("raster surface unavailable for {width}x{height}")]
    SurfaceUnavailable { width: u32, height: u32 },

    #[error("cycle index {index} out of range (cycle has {count} frames)")]
    CycleIndexOutOfRange { index: usize, count: usize },

    #[error("renderer exposes neither basic nor cycle-cache rendering")]
    NoCapability,
}

/// Errors raised by a GIF encoder port.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("encoder used before begin()")]
    NotStarted,

    #[error("frame is {actual_width}x{actual_height}, encoder expects {width}x{height}")]
    FrameSize {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("invalid GIF parameters: {0}")]
    InvalidParams(String),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the export entry point. No partial output accompanies
/// any of them.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("renderer configuration error: {0}")]
    Configuration(String),

    #[error("raster surface unavailable for {width}x{height}")]
    SurfaceUnavailable { width: u32, height: u32 },

    #[error("encoding failed at frame {frame}: {source}")]
    Encoding {
        frame: usize,
        #[source]
        source: EncodeError,
    },

    #[error("encoder failed to start: {0}")]
    Begin(#[source] EncodeError),

    #[error("encoder failed to finish: {0}")]
    Finish(#[source] EncodeError),

    #[error("render failed at frame {frame}: {reason}")]
    Render { frame: usize, reason: String },
}

impl ExportError {
    /// Maps a renderer failure at `frame` onto the export taxonomy.
    pub fn from_render(frame: usize, err: RenderError) -> Self {
        match &err {
            RenderError::SurfaceUnavailable { width, height } => ExportError::SurfaceUnavailable {
                width: *width,
                height: *height,
            },
            RenderError::NoCapability => ExportError::Configuration(err.to_string()),
            RenderError::CycleIndexOutOfRange { .. } => ExportError::Render {
                frame,
                reason: err.to_string(),
            },
        }
    }
}
