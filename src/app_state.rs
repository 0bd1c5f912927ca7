use std::path::PathBuf;
use wiggle::canvas::{CachingRenderer, DrawingRenderer, LivePlayback};
use wiggle::document::DrawingDocument;
use wiggle::export::ExportJob;
use wiggle::project_settings::ProjectSettings;
use wiggle::Session;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ToastType {
    Info,
    Success,
    Error,
}

/// Export runs one frame after it was requested, so the "Generating…" label
/// gets painted before the synchronous encode blocks the UI thread.
pub enum ExportStage {
    Idle,
    Requested { job: ExportJob, path: PathBuf },
    Running { job: ExportJob, path: PathBuf },
}

impl ExportStage {
    pub fn is_busy(&self) -> bool {
        !matches!(self, ExportStage::Idle)
    }
}

pub struct AppState {
    pub settings: ProjectSettings,
    pub settings_path: PathBuf,
    pub session: Session,
    pub renderer: CachingRenderer,
    pub playback: LivePlayback,

    pub canvas_texture: Option<egui::TextureHandle>,
    /// Last pointer position on the canvas, in logical pixels.
    pub last_pointer: Option<(f32, f32)>,
    pub playing: bool,

    pub document_path: Option<PathBuf>,
    pub export: ExportStage,

    pub toast_message: Option<String>,
    pub toast_type: ToastType,
    pub toast_deadline: f64,
}

impl AppState {
    pub fn new(settings: ProjectSettings, settings_path: PathBuf) -> Self {
        let session = Session::new(settings.blank_drawing(), settings.jitter, settings.history_depth);
        let renderer = CachingRenderer::new(DrawingRenderer::new(
            settings.palette.clone(),
            settings.background,
        ));
        Self {
            settings,
            settings_path,
            session,
            renderer,
            playback: LivePlayback::new(),
            canvas_texture: None,
            last_pointer: None,
            playing: true,
            document_path: None,
            export: ExportStage::Idle,
            toast_message: None,
            toast_type: ToastType::Info,
            toast_deadline: 0.0,
        }
    }

    pub fn toast(&mut self, now: f64, kind: ToastType, message: impl Into<String>) {
        self.toast_message = Some(message.into());
        self.toast_type = kind;
        self.toast_deadline = now + 3.0;
    }

    pub fn open_document(&mut self, path: PathBuf) -> anyhow::Result<()> {
        let doc = DrawingDocument::load(&path)?;
        self.session.load(doc.drawing, doc.jitter);
        self.document_path = Some(path);
        self.playback.scheduler_mut().invalidate();
        Ok(())
    }

    pub fn save_document(&mut self, path: PathBuf) -> anyhow::Result<()> {
        let doc = DrawingDocument::new(self.session.drawing().clone(), self.session.jitter());
        doc.save(&path)?;
        self.document_path = Some(path);
        Ok(())
    }
}
