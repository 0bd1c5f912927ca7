//! One rendered bitmap per cycle frame, reused by live playback and export.
//!
//! Frames are keyed by drawing revision and jitter signature. Jitter touches
//! every pixel of every frame, so a key change drops the whole cache instead
//! of trying to work out which frames are still valid.

use super::surface::PixelBuffer;
use crate::constants::CYCLE_COUNT;
use crate::drawing::{DrawingRevision, JitterConfig};
use crate::error::RenderError;
use std::cell::Cell;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub revision: DrawingRevision,
    pub jitter_signature: u64,
    pub width: u32,
    pub height: u32,
}

impl CacheKey {
    pub fn new(revision: DrawingRevision, jitter: &JitterConfig, width: u32, height: u32) -> Self {
        Self {
            revision,
            jitter_signature: jitter.signature(),
            width,
            height,
        }
    }
}

/// Borrowed view of a cached cycle bitmap.
///
/// The cache keeps its own reference, so dropping a lease never frees the
/// cached frame; it only tells the cache the caller is done with it. Leases
/// are meant to be short-lived: acquire, use, drop.
pub struct BitmapLease {
    index: usize,
    bitmap: Arc<PixelBuffer>,
    outstanding: Rc<Cell<usize>>,
}

impl BitmapLease {
    fn new(index: usize, bitmap: Arc<PixelBuffer>, outstanding: &Rc<Cell<usize>>) -> Self {
        outstanding.set(outstanding.get() + 1);
        Self {
            index,
            bitmap,
            outstanding: Rc::clone(outstanding),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.bitmap
    }

    /// Explicit release; same as dropping the lease.
    pub fn release(self) {}
}

impl Deref for BitmapLease {
    type Target = PixelBuffer;

    fn deref(&self) -> &PixelBuffer {
        &self.bitmap
    }
}

impl Drop for BitmapLease {
    fn drop(&mut self) {
        self.outstanding.set(self.outstanding.get().saturating_sub(1));
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

pub struct CycleCache {
    key: Option<CacheKey>,
    frames: Vec<Option<Arc<PixelBuffer>>>,
    outstanding: Rc<Cell<usize>>,
    stats: CacheStats,
}

impl CycleCache {
    pub fn new() -> Self {
        Self {
            key: None,
            frames: vec![None; CYCLE_COUNT],
            outstanding: Rc::new(Cell::new(0)),
            stats: CacheStats::default(),
        }
    }

    pub fn key(&self) -> Option<CacheKey> {
        self.key
    }

    /// Drops every frame if `key` differs from the one the cache holds.
    pub fn sync_key(&mut self, key: CacheKey) {
        if self.key != Some(key) {
            if self.len() > 0 {
                tracing::debug!(
                    revision = %key.revision,
                    jitter = key.jitter_signature,
                    dropped = self.len(),
                    "cycle cache invalidated"
                );
                self.stats.invalidations += 1;
            }
            self.frames.iter_mut().for_each(|f| *f = None);
            self.key = Some(key);
        }
    }

    pub fn get(&mut self, key: CacheKey, index: usize) -> Option<BitmapLease> {
        if self.key != Some(key) {
            return None;
        }
        let bitmap = self.frames.get(index)?.as_ref()?;
        Some(BitmapLease::new(index, Arc::clone(bitmap), &self.outstanding))
    }

    /// Returns the cached frame, rendering and storing it first on a miss.
    pub fn get_or_render<F>(
        &mut self,
        key: CacheKey,
        index: usize,
        render: F,
    ) -> Result<BitmapLease, RenderError>
    where
        F: FnOnce() -> Result<PixelBuffer, RenderError>,
    {
        if index >= CYCLE_COUNT {
            return Err(RenderError::CycleIndexOutOfRange {
                index,
                count: CYCLE_COUNT,
            });
        }
        self.sync_key(key);

        if let Some(bitmap) = &self.frames[index] {
            self.stats.hits += 1;
            return Ok(BitmapLease::new(index, Arc::clone(bitmap), &self.outstanding));
        }

        self.stats.misses += 1;
        let bitmap = Arc::new(render()?);
        self.frames[index] = Some(Arc::clone(&bitmap));
        Ok(BitmapLease::new(index, bitmap, &self.outstanding))
    }

    pub fn clear(&mut self) {
        self.frames.iter_mut().for_each(|f| *f = None);
        self.key = None;
    }

    /// Number of frames currently held.
    pub fn len(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complete(&self) -> bool {
        self.len() == CYCLE_COUNT
    }

    pub fn memory_bytes(&self) -> usize {
        self.frames
            .iter()
            .flatten()
            .map(|f| f.byte_len())
            .sum()
    }

    /// Leases handed out and not yet dropped.
    pub fn outstanding_leases(&self) -> usize {
        self.outstanding.get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl Default for CycleCache {
    fn default() -> Self {
        Self::new()
    }
}
