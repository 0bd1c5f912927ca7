//! Raster side of the animation: surfaces, stroke rasterization, the per-cycle
//! bitmap cache and the playback clock.
//!
//! Everything here runs on the caller's thread. The viewer drives it from
//! egui's frame loop; export drives it from a plain loop.
pub mod cycle_cache;
pub mod rasterizer;
pub mod renderer;
pub mod scheduler;
pub mod surface;

pub use cycle_cache::{BitmapLease, CacheKey, CacheStats, CycleCache};
pub use renderer::{
    acquire_cycle_frame, with_cycle_frame, CachingRenderer, CycleBitmapSource, CycleParams,
    DrawingRenderer, FrameRenderer, RenderParams, RendererPort,
};
pub use scheduler::{CycleTick, LivePlayback, RenderScheduler};
pub use surface::{PixelBuffer, RasterSurface};
