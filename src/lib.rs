//! Wiggle: freehand drawings that tremble in a short loop, played live and
//! baked into GIFs.
//!
//! Live playback and GIF export share the cycle constants in [`constants`]
//! and the frame acquisition path in [`canvas::renderer`], which keeps the
//! exported frames pixel-identical to what the canvas showed.

pub mod animations;
pub mod brush;
pub mod canvas;
pub mod constants;
pub mod document;
pub mod drawing;
pub mod error;
pub mod export;
pub mod project_settings;
pub mod states;

pub use canvas::{CachingRenderer, DrawingRenderer, LivePlayback, PixelBuffer, RendererPort};
pub use drawing::{Drawing, DrawingRevision, JitterConfig, Point, Stroke, StrokeKind};
pub use error::{EncodeError, ExportError, RenderError};
pub use export::{export_drawing_as_gif, ExportJob, GifEncoderPort, ImageGifEncoder};
pub use states::{History, Session, Tool};
