//! Drawing documents: a drawing plus the jitter it was made with, saved as
//! JSON on local disk.

use crate::drawing::{Drawing, JitterConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DOCUMENT_VERSION: u32 = 1;
pub const DOCUMENT_EXTENSION: &str = "wiggle";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawingDocument {
    pub version: u32,
    pub drawing: Drawing,
    #[serde(default)]
    pub jitter: JitterConfig,
}

impl DrawingDocument {
    pub fn new(drawing: Drawing, jitter: JitterConfig) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            drawing,
            jitter,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(json).context("Failed to parse drawing document")?;
        if doc.version != DOCUMENT_VERSION {
            anyhow::bail!(
                "Unsupported drawing document version {} (expected {})",
                doc.version,
                DOCUMENT_VERSION
            );
        }
        if doc.drawing.width == 0 || doc.drawing.height == 0 {
            anyhow::bail!(
                "Drawing size must be > 0, got {}x{}",
                doc.drawing.width,
                doc.drawing.height
            );
        }
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize drawing document")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read drawing from {}", path.display()))?;
        let doc = Self::from_json(&contents)
            .with_context(|| format!("Failed to load drawing from {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            strokes = doc.drawing.strokes.len(),
            "Drawing opened"
        );
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write drawing to {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            strokes = self.drawing.strokes.len(),
            "Drawing saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{BrushColor, BrushSettings, PatternId};
    use crate::drawing::{Point, Stroke, StrokeKind};
    use tempfile::tempdir;

    fn sample() -> DrawingDocument {
        let drawing = Drawing::empty(96, 64)
            .with_stroke(Stroke {
                id: 1,
                kind: StrokeKind::Draw,
                brush: BrushSettings::pattern(BrushColor::Fixed([1, 2, 3, 255]), 9.0, PatternId::Bricks),
                points: vec![Point::new(4.0, 4.0, 0.0), Point::new(40.0, 30.0, 120.0)],
            })
            .with_stroke(Stroke {
                id: 2,
                kind: StrokeKind::Erase,
                brush: BrushSettings::default(),
                points: vec![Point::new(10.0, 10.0, 0.0)],
            });
        DrawingDocument::new(drawing, JitterConfig::new(2.0, 0.012))
    }

    #[test]
    fn saved_document_reopens_identically() {
        let td = tempdir().expect("tempdir");
        let path = td.path().join(format!("sketch.{DOCUMENT_EXTENSION}"));
        let doc = sample();
        doc.save(&path).unwrap();
        assert_eq!(DrawingDocument::load(&path).unwrap(), doc);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut doc = sample();
        doc.version = 99;
        let json = serde_json::to_string(&doc).unwrap();
        let err = DrawingDocument::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("version 99"));
    }

    #[test]
    fn missing_jitter_uses_default() {
        let json = r#"{"version":1,"drawing":{"width":8,"height":8,"strokes":[]}}"#;
        let doc = DrawingDocument::from_json(json).unwrap();
        assert_eq!(doc.jitter, JitterConfig::default());
        assert!(doc.drawing.is_empty());
    }

    #[test]
    fn missing_file_reports_path() {
        let td = tempdir().expect("tempdir");
        let err = DrawingDocument::load(&td.path().join("nope.wiggle")).unwrap_err();
        assert!(err.to_string().contains("nope.wiggle"));
    }
}
