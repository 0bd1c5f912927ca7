//! Renderer capabilities and the frame acquisition path shared by live
//! playback and export.
//!
//! A renderer either offers plain render-then-read-back (`FrameRenderer`) or
//! hands out cached cycle bitmaps (`CycleBitmapSource`). Consumers receive a
//! `RendererPort` and dispatch on its tag.

use super::cycle_cache::{BitmapLease, CacheKey, CacheStats, CycleCache};
use super::rasterizer::paint_drawing;
use super::surface::{PixelBuffer, RasterSurface};
use crate::brush::Palette;
use crate::constants::{cycle_elapsed_ms, CYCLE_COUNT};
use crate::drawing::{Drawing, DrawingRevision, JitterConfig};
use crate::error::RenderError;

pub const DEFAULT_BACKGROUND: [u8; 4] = [244, 240, 226, 255];

#[derive(Clone, Copy, Debug)]
pub struct RenderParams<'a> {
    pub drawing: &'a Drawing,
    pub revision: DrawingRevision,
    pub elapsed_ms: f64,
    pub jitter: JitterConfig,
}

/// Request for one cycle frame. Elapsed time is implied by the index.
#[derive(Clone, Copy, Debug)]
pub struct CycleParams<'a> {
    pub drawing: &'a Drawing,
    pub revision: DrawingRevision,
    pub cycle_index: usize,
    pub jitter: JitterConfig,
}

impl<'a> CycleParams<'a> {
    pub fn new(
        drawing: &'a Drawing,
        revision: DrawingRevision,
        cycle_index: usize,
        jitter: JitterConfig,
    ) -> Self {
        Self {
            drawing,
            revision,
            cycle_index,
            jitter,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        cycle_elapsed_ms(self.cycle_index)
    }

    pub fn render_params(&self) -> RenderParams<'a> {
        RenderParams {
            drawing: self.drawing,
            revision: self.revision,
            elapsed_ms: self.elapsed_ms(),
            jitter: self.jitter,
        }
    }
}

/// Basic capability: paint a frame, then read it back.
pub trait FrameRenderer {
    fn render(&mut self, params: &RenderParams<'_>) -> Result<(), RenderError>;
    fn read_pixels(&self) -> Result<PixelBuffer, RenderError>;
}

/// Extended capability: cached bitmaps, one per cycle frame.
pub trait CycleBitmapSource {
    fn cycle_bitmap(&mut self, params: &CycleParams<'_>) -> Result<BitmapLease, RenderError>;
    fn cycle_count(&self) -> usize;
}

/// The renderer as seen by its consumers.
pub enum RendererPort<'a> {
    Basic(&'a mut dyn FrameRenderer),
    Caching(&'a mut dyn CycleBitmapSource),
    /// No surface to render into; exporting through it is a configuration
    /// error.
    Unavailable,
}

impl RendererPort<'_> {
    pub fn is_available(&self) -> bool {
        !matches!(self, RendererPort::Unavailable)
    }

    pub fn capability_name(&self) -> &'static str {
        match self {
            RendererPort::Basic(_) => "basic",
            RendererPort::Caching(_) => "cycle-cache",
            RendererPort::Unavailable => "none",
        }
    }
}

/// Produces cycle frame `params.cycle_index` through whichever capability the
/// port has and hands it to `use_frame`.
///
/// The cached path keeps the lease alive only for the duration of the
/// callback. An index outside `0..CYCLE_COUNT` is rejected on every path.
pub fn with_cycle_frame<R>(
    port: &mut RendererPort<'_>,
    params: &CycleParams<'_>,
    use_frame: impl FnOnce(&PixelBuffer) -> R,
) -> Result<R, RenderError> {
    if params.cycle_index >= CYCLE_COUNT {
        return Err(RenderError::CycleIndexOutOfRange {
            index: params.cycle_index,
            count: CYCLE_COUNT,
        });
    }
    match port {
        RendererPort::Caching(source) => {
            let lease = source.cycle_bitmap(params)?;
            let out = use_frame(lease.pixels());
            lease.release();
            Ok(out)
        }
        RendererPort::Basic(renderer) => {
            renderer.render(&params.render_params())?;
            let pixels = renderer.read_pixels()?;
            Ok(use_frame(&pixels))
        }
        RendererPort::Unavailable => Err(RenderError::NoCapability),
    }
}

/// Owned copy of a cycle frame.
pub fn acquire_cycle_frame(
    port: &mut RendererPort<'_>,
    params: &CycleParams<'_>,
) -> Result<PixelBuffer, RenderError> {
    with_cycle_frame(port, params, PixelBuffer::clone)
}

fn surface_for(
    slot: &mut Option<RasterSurface>,
    width: u32,
    height: u32,
    background: [u8; 4],
) -> Result<&mut RasterSurface, RenderError> {
    match slot {
        Some(surface) => surface.ensure_size(width, height)?,
        None => *slot = Some(RasterSurface::new(width, height, background)?),
    }
    slot.as_mut()
        .ok_or(RenderError::SurfaceUnavailable { width, height })
}

/// Paints drawings into a [`RasterSurface`] it acquires on first use.
pub struct DrawingRenderer {
    surface: Option<RasterSurface>,
    palette: Palette,
    background: [u8; 4],
}

impl DrawingRenderer {
    pub fn new(palette: Palette, background: [u8; 4]) -> Self {
        Self {
            surface: None,
            palette,
            background,
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn background(&self) -> [u8; 4] {
        self.background
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    pub fn set_background(&mut self, background: [u8; 4]) {
        self.background = background;
        if let Some(surface) = &mut self.surface {
            surface.set_background(background);
        }
    }
}

impl Default for DrawingRenderer {
    fn default() -> Self {
        Self::new(Palette::default(), DEFAULT_BACKGROUND)
    }
}

impl FrameRenderer for DrawingRenderer {
    fn render(&mut self, params: &RenderParams<'_>) -> Result<(), RenderError> {
        let drawing = params.drawing;
        let surface = surface_for(&mut self.surface, drawing.width, drawing.height, self.background)?;
        paint_drawing(surface, drawing, params.elapsed_ms, &params.jitter, &self.palette);
        Ok(())
    }

    fn read_pixels(&self) -> Result<PixelBuffer, RenderError> {
        self.surface
            .as_ref()
            .map(RasterSurface::read_pixels)
            .ok_or(RenderError::SurfaceUnavailable {
                width: 0,
                height: 0,
            })
    }
}

/// A [`DrawingRenderer`] with a [`CycleCache`] in front of it.
pub struct CachingRenderer {
    inner: DrawingRenderer,
    cache: CycleCache,
}

impl CachingRenderer {
    pub fn new(inner: DrawingRenderer) -> Self {
        Self {
            inner,
            cache: CycleCache::new(),
        }
    }

    pub fn cache(&self) -> &CycleCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.inner.set_palette(palette);
        self.cache.clear();
    }

    pub fn set_background(&mut self, background: [u8; 4]) {
        self.inner.set_background(background);
        self.cache.clear();
    }

    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Renders every frame of the cycle that is not cached yet.
    pub fn prewarm(
        &mut self,
        drawing: &Drawing,
        revision: DrawingRevision,
        jitter: JitterConfig,
    ) -> Result<(), RenderError> {
        for i in 0..CYCLE_COUNT {
            self.cycle_bitmap(&CycleParams::new(drawing, revision, i, jitter))?
                .release();
        }
        Ok(())
    }
}

impl Default for CachingRenderer {
    fn default() -> Self {
        Self::new(DrawingRenderer::default())
    }
}

impl FrameRenderer for CachingRenderer {
    fn render(&mut self, params: &RenderParams<'_>) -> Result<(), RenderError> {
        self.inner.render(params)
    }

    fn read_pixels(&self) -> Result<PixelBuffer, RenderError> {
        self.inner.read_pixels()
    }
}

impl CycleBitmapSource for CachingRenderer {
    fn cycle_bitmap(&mut self, params: &CycleParams<'_>) -> Result<BitmapLease, RenderError> {
        let key = CacheKey::new(
            params.revision,
            &params.jitter,
            params.drawing.width,
            params.drawing.height,
        );
        let inner = &mut self.inner;
        self.cache.get_or_render(key, params.cycle_index, || {
            inner.render(&params.render_params())?;
            inner.read_pixels()
        })
    }

    fn cycle_count(&self) -> usize {
        CYCLE_COUNT
    }
}
