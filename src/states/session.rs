//! Editing session: the context object the viewer talks to.
//!
//! Owns the history, the current tool and brush, the jitter settings and the
//! stroke being drawn. Nothing here is global; the host constructs one
//! `Session` and passes it around.

use super::history::History;
use crate::brush::{BrushColor, BrushSettings, PatternId};
use crate::drawing::{ActiveStroke, Drawing, DrawingRevision, JitterConfig, StrokeKind};
use crate::export::ExportJob;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub const DEFAULT_ERASER_WIDTH: f32 = 12.0;

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Tool {
    Pen,
    Pattern(PatternId),
    Eraser,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pen => "Pen",
            Tool::Pattern(_) => "Pattern",
            Tool::Eraser => "Eraser",
        }
    }
}

pub struct Session {
    history: History,
    jitter: JitterConfig,
    tool: Tool,
    color: BrushColor,
    brush_width: f32,
    eraser_width: f32,
    active: Option<ActiveStroke>,
    next_stroke_id: u64,
}

impl Session {
    pub fn new(drawing: Drawing, jitter: JitterConfig, max_depth: usize) -> Self {
        let next_stroke_id = drawing.max_stroke_id().map_or(1, |id| id + 1);
        Self {
            history: History::new(drawing, max_depth),
            jitter: sanitize(jitter),
            tool: Tool::Pen,
            color: BrushColor::Palette(1),
            brush_width: 3.0,
            eraser_width: DEFAULT_ERASER_WIDTH,
            active: None,
            next_stroke_id,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Last committed drawing, without the stroke in progress.
    pub fn drawing(&self) -> &Drawing {
        self.history.current()
    }

    pub fn revision(&self) -> DrawingRevision {
        self.history.revision()
    }

    /// What the canvas should show right now: the committed drawing plus a
    /// preview of the stroke being drawn.
    pub fn display_drawing(&self) -> Cow<'_, Drawing> {
        match &self.active {
            Some(active) => Cow::Owned(self.drawing().with_stroke(active.preview())),
            None => Cow::Borrowed(self.drawing()),
        }
    }

    pub fn jitter(&self) -> JitterConfig {
        self.jitter
    }

    pub fn set_jitter(&mut self, jitter: JitterConfig) {
        let jitter = sanitize(jitter);
        if jitter != self.jitter {
            tracing::debug!(
                amplitude = jitter.amplitude,
                frequency = jitter.frequency,
                "Jitter changed"
            );
            self.jitter = jitter;
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn color(&self) -> BrushColor {
        self.color
    }

    pub fn set_color(&mut self, color: BrushColor) {
        self.color = color;
    }

    pub fn brush_width(&self) -> f32 {
        self.brush_width
    }

    pub fn set_brush_width(&mut self, width: f32) {
        if width.is_finite() {
            self.brush_width = width.max(1.0);
        }
    }

    pub fn eraser_width(&self) -> f32 {
        self.eraser_width
    }

    pub fn set_eraser_width(&mut self, width: f32) {
        if width.is_finite() {
            self.eraser_width = width.max(1.0);
        }
    }

    /// Stroke kind and brush the current tool paints with.
    pub fn brush_for_tool(&self) -> (StrokeKind, BrushSettings) {
        match self.tool {
            Tool::Pen => (StrokeKind::Draw, BrushSettings::pen(self.color, self.brush_width)),
            Tool::Pattern(pattern) => (
                StrokeKind::Draw,
                BrushSettings::pattern(self.color, self.brush_width * 3.0, pattern),
            ),
            Tool::Eraser => (
                StrokeKind::Erase,
                BrushSettings::pen(BrushColor::Palette(0), self.eraser_width),
            ),
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, now_ms: f64) {
        // a lost pointer-up leaves a stroke open; keep what was drawn
        if self.active.is_some() {
            self.finish_active();
        }
        let (kind, brush) = self.brush_for_tool();
        let id = self.next_stroke_id;
        self.next_stroke_id += 1;
        self.active = Some(ActiveStroke::begin(id, kind, brush, x, y, now_ms));
    }

    /// Returns `true` if the preview changed.
    pub fn pointer_move(&mut self, x: f32, y: f32, now_ms: f64) -> bool {
        let Some(active) = &mut self.active else {
            return false;
        };
        let before = active.points().len();
        active.push(x, y, now_ms);
        active.points().len() != before
    }

    /// Commits the stroke in progress and returns its id.
    pub fn pointer_up(&mut self, x: f32, y: f32, now_ms: f64) -> Option<u64> {
        let active = self.active.as_mut()?;
        active.push(x, y, now_ms);
        self.finish_active()
    }

    fn finish_active(&mut self) -> Option<u64> {
        let stroke = self.active.take()?.finish();
        let id = stroke.id;
        self.history.commit_stroke(stroke);
        Some(id)
    }

    pub fn cancel_stroke(&mut self) -> bool {
        self.active.take().is_some()
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_stroke();
        self.history.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_stroke();
        self.history.redo()
    }

    pub fn clear(&mut self) {
        self.cancel_stroke();
        self.history.clear();
    }

    /// Swaps in a freshly opened drawing. Undo history does not carry over.
    pub fn load(&mut self, drawing: Drawing, jitter: JitterConfig) {
        self.cancel_stroke();
        let next = drawing.max_stroke_id().map_or(1, |id| id + 1);
        self.next_stroke_id = self.next_stroke_id.max(next);
        self.history.reset(drawing);
        self.set_jitter(jitter);
    }

    /// Captures what an export started now has to render. Later edits do not
    /// affect the job.
    pub fn export_job(&self) -> ExportJob {
        ExportJob::new(self.drawing().clone(), self.revision(), self.jitter)
    }
}

fn sanitize(jitter: JitterConfig) -> JitterConfig {
    let amplitude = if jitter.amplitude.is_finite() {
        jitter.amplitude.max(0.0)
    } else {
        0.0
    };
    let frequency = if jitter.frequency.is_finite() {
        jitter.frequency.abs()
    } else {
        JitterConfig::default().frequency
    };
    JitterConfig::new(amplitude, frequency)
}
