//! Snapshot-based undo/redo over immutable [`Drawing`] values.
//!
//! The stack holds every committed drawing plus a cursor. Undo and redo only
//! move the cursor; committing after an undo drops the redo tail. Snapshots
//! share strokes through `Arc`, so keeping a hundred of them is cheap.
//!
//! Every successful transition bumps the [`DrawingRevision`] and notifies the
//! listener, which is how render caches learn that their frames went stale.

use crate::drawing::{Drawing, DrawingRevision, Stroke};

pub const DEFAULT_MAX_DEPTH: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryEventKind {
    Commit,
    Clear,
    Undo,
    Redo,
    Reset,
}

/// Sent to the listener after every successful transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryEvent {
    pub kind: HistoryEventKind,
    pub revision: DrawingRevision,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Clone, Debug)]
struct HistoryEntry {
    label: &'static str,
    drawing: Drawing,
}

type Listener = Box<dyn FnMut(&HistoryEvent)>;

pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    max_depth: usize,
    revision: DrawingRevision,
    listener: Option<Listener>,
}

impl History {
    /// `max_depth` is the number of undo steps kept; a depth of 0 is treated
    /// as 1.
    pub fn new(initial: Drawing, max_depth: usize) -> Self {
        Self {
            entries: vec![HistoryEntry {
                label: "Initial",
                drawing: initial,
            }],
            cursor: 0,
            max_depth: max_depth.max(1),
            revision: DrawingRevision::default(),
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: impl FnMut(&HistoryEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub fn current(&self) -> &Drawing {
        &self.entries[self.cursor].drawing
    }

    pub fn revision(&self) -> DrawingRevision {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    pub fn redo_depth(&self) -> usize {
        self.entries.len() - self.cursor - 1
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Label of the step `undo` would revert.
    pub fn undo_label(&self) -> Option<&'static str> {
        self.can_undo().then(|| self.entries[self.cursor].label)
    }

    pub fn redo_label(&self) -> Option<&'static str> {
        self.entries.get(self.cursor + 1).map(|e| e.label)
    }

    pub fn commit(&mut self, drawing: Drawing) {
        self.push("Commit", drawing, HistoryEventKind::Commit);
    }

    pub fn commit_stroke(&mut self, stroke: Stroke) {
        let label = if stroke.is_erase() { "Erase" } else { "Stroke" };
        let next = self.current().with_stroke(stroke);
        self.push(label, next, HistoryEventKind::Commit);
    }

    /// Commits an empty drawing of the same size. Always undoable, even when
    /// the canvas was already empty.
    pub fn clear(&mut self) {
        let next = self.current().cleared();
        self.push("Clear", next, HistoryEventKind::Clear);
    }

    fn push(&mut self, label: &'static str, drawing: Drawing, kind: HistoryEventKind) {
        let dropped = self.redo_depth();
        self.entries.truncate(self.cursor + 1);
        self.entries.push(HistoryEntry { label, drawing });

        while self.entries.len() > self.max_depth + 1 {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;

        tracing::debug!(
            label,
            undo_depth = self.undo_depth(),
            redo_dropped = dropped,
            "History entry pushed"
        );
        self.bump(kind);
    }

    /// Replaces the whole stack with `initial`, e.g. after opening a
    /// document. The revision keeps counting up so frames cached for the old
    /// drawing can never be mistaken for the new one.
    pub fn reset(&mut self, initial: Drawing) {
        self.entries.clear();
        self.entries.push(HistoryEntry {
            label: "Initial",
            drawing: initial,
        });
        self.cursor = 0;
        tracing::debug!(revision = %self.revision, "History reset");
        self.bump(HistoryEventKind::Reset);
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        let label = self.entries[self.cursor].label;
        self.cursor -= 1;
        tracing::debug!(label, undo_remaining = self.undo_depth(), "Undo");
        self.bump(HistoryEventKind::Undo);
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        tracing::debug!(
            label = self.entries[self.cursor].label,
            redo_remaining = self.redo_depth(),
            "Redo"
        );
        self.bump(HistoryEventKind::Redo);
        true
    }

    fn bump(&mut self, kind: HistoryEventKind) {
        self.revision = self.revision.next();
        let event = HistoryEvent {
            kind,
            revision: self.revision,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        };
        if let Some(listener) = &mut self.listener {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("entries", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("max_depth", &self.max_depth)
            .field("revision", &self.revision)
            .finish()
    }
}
