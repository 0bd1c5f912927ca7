//! Viewer configuration, stored as `wiggle.json` next to the working
//! directory. Every field has a default, so a partial file is fine.

use crate::brush::Palette;
use crate::drawing::{Drawing, JitterConfig};
use crate::states::history::DEFAULT_MAX_DEPTH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "wiggle.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background: [u8; 4],
    pub palette: Palette,
    pub jitter: JitterConfig,
    pub history_depth: usize,
    /// Screen pixels per logical canvas pixel in the viewer.
    pub zoom: f32,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            canvas_width: 384,
            canvas_height: 256,
            background: crate::canvas::renderer::DEFAULT_BACKGROUND,
            palette: Palette::default(),
            jitter: JitterConfig::default(),
            history_depth: DEFAULT_MAX_DEPTH,
            zoom: 2.0,
        }
    }
}

impl ProjectSettings {
    pub fn default_path() -> PathBuf {
        PathBuf::from(SETTINGS_FILE_NAME)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads `path`, falling back to defaults if it is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "Ignoring settings file");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            anyhow::bail!(
                "Canvas size must be > 0, got {}x{}",
                self.canvas_width,
                self.canvas_height
            );
        }
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            anyhow::bail!("Zoom must be a positive number, got {}", self.zoom);
        }
        if self.palette.is_empty() {
            anyhow::bail!("Palette must contain at least one color");
        }
        Ok(())
    }

    pub fn blank_drawing(&self) -> Drawing {
        Drawing::empty(self.canvas_width, self.canvas_height)
    }
}
