//! Fixed-cadence playback clock.
//!
//! The host calls [`RenderScheduler::tick`] from its own frame loop (egui's
//! `update` in the viewer). A tick is produced only when the wall clock has
//! crossed into a new cycle frame, and its elapsed time is the quantised one
//! export uses, never the raw clock.

use super::renderer::{acquire_cycle_frame, CycleParams, RendererPort};
use super::surface::PixelBuffer;
use crate::constants::{cycle_elapsed_ms, cycle_index_at, wrap_elapsed_ms, CYCLE_INTERVAL_MS};
use crate::drawing::{Drawing, DrawingRevision, JitterConfig};
use crate::error::RenderError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CycleTick {
    pub index: usize,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug, Default)]
pub struct RenderScheduler {
    started_at: Option<f64>,
    paused_at: Option<f64>,
    last_index: Option<usize>,
    dirty: bool,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_ms: f64) {
        self.started_at = Some(now_ms);
        self.paused_at = None;
        self.last_index = None;
        self.dirty = true;
    }

    pub fn pause(&mut self, now_ms: f64) {
        if self.is_running() {
            self.paused_at = Some(now_ms);
        }
    }

    /// Continues from the frame that was showing when playback paused.
    pub fn resume(&mut self, now_ms: f64) {
        if let (Some(start), Some(paused)) = (self.started_at, self.paused_at.take()) {
            self.started_at = Some(start + (now_ms - paused));
            self.dirty = true;
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.paused_at.is_none()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Forces the next tick to fire even if the frame index is unchanged.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn current_index(&self) -> Option<usize> {
        self.last_index
    }

    fn elapsed(&self, now_ms: f64) -> Option<f64> {
        let start = self.started_at?;
        let now = self.paused_at.unwrap_or(now_ms);
        Some(wrap_elapsed_ms(now - start))
    }

    /// While paused the index is frozen, so only an invalidation produces a
    /// tick (the held frame is redrawn with the new content).
    pub fn tick(&mut self, now_ms: f64) -> Option<CycleTick> {
        let index = cycle_index_at(self.elapsed(now_ms)?);
        if self.last_index == Some(index) && !self.dirty {
            return None;
        }
        self.last_index = Some(index);
        self.dirty = false;
        Some(CycleTick {
            index,
            elapsed_ms: cycle_elapsed_ms(index),
        })
    }

    /// Wall-clock time at which the next frame boundary is crossed.
    pub fn next_deadline_ms(&self, now_ms: f64) -> Option<f64> {
        if !self.is_running() {
            return None;
        }
        let interval = CYCLE_INTERVAL_MS as f64;
        let into_frame = self.elapsed(now_ms)?.rem_euclid(interval);
        Some(now_ms + (interval - into_frame))
    }
}

/// Scheduler plus the bookkeeping needed to repaint when the drawing or the
/// jitter settings change between frame boundaries.
#[derive(Debug, Default)]
pub struct LivePlayback {
    scheduler: RenderScheduler,
    shown: Option<(DrawingRevision, u64)>,
}

impl LivePlayback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut RenderScheduler {
        &mut self.scheduler
    }

    /// Returns the frame to present, or `None` if the one already on screen
    /// is still current.
    pub fn tick(
        &mut self,
        now_ms: f64,
        port: &mut RendererPort<'_>,
        drawing: &Drawing,
        revision: DrawingRevision,
        jitter: JitterConfig,
    ) -> Result<Option<PixelBuffer>, RenderError> {
        let key = (revision, jitter.signature());
        if self.shown != Some(key) {
            self.scheduler.invalidate();
        }
        let Some(tick) = self.scheduler.tick(now_ms) else {
            return Ok(None);
        };

        let params = CycleParams::new(drawing, revision, tick.index, jitter);
        let frame = acquire_cycle_frame(port, &params)?;
        self.shown = Some(key);
        Ok(Some(frame))
    }
}
