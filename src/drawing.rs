use crate::brush::BrushSettings;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A sampled pointer position. `t` is milliseconds since the stroke started.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub t: f32,
}

impl Point {
    pub fn new(x: f32, y: f32, t: f32) -> Self {
        Self { x, y, t }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeKind {
    Draw,
    Erase,
}

/// One committed gesture. Frozen once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: u64,
    pub kind: StrokeKind,
    pub brush: BrushSettings,
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn is_erase(&self) -> bool {
        self.kind == StrokeKind::Erase
    }
}

/// Stroke under construction, between pointer-down and pointer-up.
///
/// Points can only be appended. Timestamps are clamped so they never go
/// backwards even if the host clock stutters.
#[derive(Clone, Debug)]
pub struct ActiveStroke {
    id: u64,
    kind: StrokeKind,
    brush: BrushSettings,
    started_at_ms: f64,
    points: Vec<Point>,
}

impl ActiveStroke {
    pub fn begin(id: u64, kind: StrokeKind, brush: BrushSettings, x: f32, y: f32, now_ms: f64) -> Self {
        Self {
            id,
            kind,
            brush,
            started_at_ms: now_ms,
            points: vec![Point::new(x, y, 0.0)],
        }
    }

    pub fn push(&mut self, x: f32, y: f32, now_ms: f64) {
        let last_t = self.points.last().map(|p| p.t).unwrap_or(0.0);
        let t = ((now_ms - self.started_at_ms) as f32).max(last_t);
        if let Some(last) = self.points.last() {
            // duplicate samples add nothing to the path
            if last.x == x && last.y == y {
                return;
            }
        }
        self.points.push(Point::new(x, y, t));
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Snapshot of the in-progress stroke, used to preview it before commit.
    pub fn preview(&self) -> Stroke {
        Stroke {
            id: self.id,
            kind: self.kind,
            brush: self.brush.clone(),
            points: self.points.clone(),
        }
    }

    pub fn finish(self) -> Stroke {
        Stroke {
            id: self.id,
            kind: self.kind,
            brush: self.brush,
            points: self.points,
        }
    }
}

/// Canvas content: dimensions plus strokes in commit order.
///
/// A committed `Drawing` is never mutated. Adding a stroke produces a new
/// value that shares the earlier strokes through `Arc`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub width: u32,
    pub height: u32,
    pub strokes: Vec<Arc<Stroke>>,
}

impl Drawing {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            strokes: Vec::new(),
        }
    }

    pub fn with_stroke(&self, stroke: Stroke) -> Self {
        let mut strokes = Vec::with_capacity(self.strokes.len() + 1);
        strokes.extend(self.strokes.iter().cloned());
        strokes.push(Arc::new(stroke));
        Self {
            width: self.width,
            height: self.height,
            strokes,
        }
    }

    pub fn cleared(&self) -> Self {
        Self::empty(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Highest stroke id in use, so a reopened document keeps ids unique.
    pub fn max_stroke_id(&self) -> Option<u64> {
        self.strokes.iter().map(|s| s.id).max()
    }
}

/// Global wiggle strength. Changing it invalidates every cached frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JitterConfig {
    /// Peak displacement in pixels.
    pub amplitude: f32,
    /// Angular speed in radians per millisecond, rounded to a whole number of
    /// oscillations per loop.
    pub frequency: f32,
}

impl JitterConfig {
    pub fn new(amplitude: f32, frequency: f32) -> Self {
        Self {
            amplitude,
            frequency,
        }
    }

    /// Cache key component. Equal configs give equal signatures.
    pub fn signature(&self) -> u64 {
        ((self.amplitude.to_bits() as u64) << 32) | self.frequency.to_bits() as u64
    }
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            amplitude: 1.2,
            frequency: 0.008,
        }
    }
}

/// Bumped once per committed mutation. Only ever used as a cache key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DrawingRevision(pub u64);

impl DrawingRevision {
    pub fn next(self) -> Self {
        DrawingRevision(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for DrawingRevision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{BrushColor, BrushSettings};

    fn pen() -> BrushSettings {
        BrushSettings::pen(BrushColor::Palette(1), 2.0)
    }

    #[test]
    fn active_stroke_keeps_timestamps_monotonic() {
        let mut s = ActiveStroke::begin(7, StrokeKind::Draw, pen(), 1.0, 1.0, 1000.0);
        s.push(2.0, 1.0, 1016.0);
        s.push(3.0, 1.0, 1010.0);
        s.push(3.0, 1.0, 1040.0);
        let stroke = s.finish();
        assert_eq!(stroke.id, 7);
        assert_eq!(stroke.points.len(), 3);
        assert_eq!(stroke.points[1].t, 16.0);
        assert_eq!(stroke.points[2].t, 16.0);
    }

    #[test]
    fn with_stroke_leaves_original_untouched() {
        let base = Drawing::empty(10, 10);
        let stroke = ActiveStroke::begin(1, StrokeKind::Draw, pen(), 0.0, 0.0, 0.0).finish();
        let next = base.with_stroke(stroke);
        assert!(base.is_empty());
        assert_eq!(next.strokes.len(), 1);
        let third = next.with_stroke(ActiveStroke::begin(2, StrokeKind::Erase, pen(), 0.0, 0.0, 0.0).finish());
        assert!(Arc::ptr_eq(&next.strokes[0], &third.strokes[0]));
        assert_eq!(third.max_stroke_id(), Some(2));
        assert_eq!(third.cleared(), base);
    }

    #[test]
    fn jitter_signature_tracks_both_fields() {
        let a = JitterConfig::new(1.2, 0.008);
        assert_eq!(a.signature(), JitterConfig::default().signature());
        assert_ne!(a.signature(), JitterConfig::new(1.3, 0.008).signature());
        assert_ne!(a.signature(), JitterConfig::new(1.2, 0.009).signature());
    }
}
