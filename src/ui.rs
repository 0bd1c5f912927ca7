use crate::app_state::{AppState, ExportStage, ToastType};
use eframe::egui;
use std::path::PathBuf;
use std::time::Duration;
use wiggle::brush::{BrushColor, PatternId};
use wiggle::canvas::{PixelBuffer, RendererPort};
use wiggle::document::DOCUMENT_EXTENSION;
use wiggle::export::{export_drawing_as_gif, write_gif, ImageGifEncoder};
use wiggle::project_settings::ProjectSettings;
use wiggle::{JitterConfig, Tool};

pub struct MyApp {
    state: AppState,
}

pub fn create_app(settings: ProjectSettings, settings_path: PathBuf, open: Option<PathBuf>) -> MyApp {
    let mut state = AppState::new(settings, settings_path);
    if let Some(path) = open {
        if let Err(err) = state.open_document(path) {
            tracing::warn!(error = %format!("{err:#}"), "Could not open drawing");
            state.toast(0.0, ToastType::Error, format!("Open failed: {err}"));
        }
    }
    MyApp { state }
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let state = &mut self.state;
        let now = ctx.input(|i| i.time);
        let now_ms = now * 1000.0;

        if !state.playing && !state.playback.scheduler().is_paused() {
            state.playback.scheduler_mut().pause(now_ms);
        }
        if state.playback.scheduler().current_index().is_none() && state.playing {
            state.playback.scheduler_mut().start(now_ms);
        }

        handle_shortcuts(ctx, state);
        run_pending_export(ctx, state, now);

        // 1. Tools (left)
        egui::SidePanel::left("tools_panel")
            .resizable(false)
            .exact_width(180.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                tools_panel(ui, state, now);
            });

        // 2. Canvas
        egui::CentralPanel::default().show(ctx, |ui| {
            canvas_view(ui, state, now_ms);
        });

        present_frame(ctx, state, now_ms);

        // Toast Notification
        if let Some(msg) = &state.toast_message {
            if now > state.toast_deadline {
                state.toast_message = None;
            } else {
                let bg_color = match state.toast_type {
                    ToastType::Error => egui::Color32::from_rgb(200, 50, 50),
                    ToastType::Success => egui::Color32::from_rgb(50, 150, 50),
                    ToastType::Info => egui::Color32::from_gray(80),
                };

                egui::Area::new("toast_notification")
                    .order(egui::Order::Tooltip)
                    .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -60.0))
                    .show(ctx, |ui| {
                        egui::Frame::none()
                            .fill(bg_color)
                            .rounding(8.0)
                            .inner_margin(12.0)
                            .show(ui, |ui| {
                                ui.label(egui::RichText::new(msg).color(egui::Color32::WHITE).size(16.0));
                            });
                    });
                ctx.request_repaint_after(Duration::from_millis(250));
            }
        }

        // Wake up again at the next cycle boundary
        if let Some(deadline) = state.playback.scheduler().next_deadline_ms(now_ms) {
            let wait = (deadline - now_ms).max(1.0);
            ctx.request_repaint_after(Duration::from_millis(wait as u64));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(err) = self.state.settings.save(&self.state.settings_path) {
            tracing::warn!(error = %format!("{err:#}"), "Could not save settings");
        }
    }
}

fn handle_shortcuts(ctx: &egui::Context, state: &mut AppState) {
    let (undo, redo) = ctx.input(|i| {
        let z = i.modifiers.command && i.key_pressed(egui::Key::Z);
        let y = i.modifiers.command && i.key_pressed(egui::Key::Y);
        (z && !i.modifiers.shift, (z && i.modifiers.shift) || y)
    });
    if state.export.is_busy() {
        return;
    }
    if undo {
        state.session.undo();
    } else if redo {
        state.session.redo();
    }
}

fn tools_panel(ui: &mut egui::Ui, state: &mut AppState, now: f64) {
    let busy = state.export.is_busy();

    ui.heading("Tool");
    ui.horizontal(|ui| {
        let tool = state.session.tool();
        if ui.selectable_label(tool == Tool::Pen, "✏ Pen").clicked() {
            state.session.set_tool(Tool::Pen);
        }
        if ui.selectable_label(tool == Tool::Eraser, "⌫ Eraser").clicked() {
            state.session.set_tool(Tool::Eraser);
        }
    });

    let current_pattern = match state.session.tool() {
        Tool::Pattern(p) => Some(p),
        _ => None,
    };
    egui::ComboBox::from_id_source("pattern_picker")
        .selected_text(current_pattern.map_or("Pattern…", |p| p.name()))
        .show_ui(ui, |ui| {
            for pattern in PatternId::ALL {
                if ui
                    .selectable_label(current_pattern == Some(pattern), pattern.name())
                    .clicked()
                {
                    state.session.set_tool(Tool::Pattern(pattern));
                }
            }
        });

    ui.add_space(8.0);
    ui.label("Color");
    ui.horizontal_wrapped(|ui| {
        let palette = state.settings.palette.clone();
        for (idx, rgba) in palette.colors.iter().enumerate() {
            let color = egui::Color32::from_rgba_unmultiplied(rgba[0], rgba[1], rgba[2], rgba[3]);
            let selected = state.session.color() == BrushColor::Palette(idx as u8);
            let stroke = if selected {
                egui::Stroke::new(2.0, ui.visuals().selection.stroke.color)
            } else {
                egui::Stroke::new(1.0, egui::Color32::from_gray(60))
            };
            let swatch = egui::Button::new("")
                .fill(color)
                .stroke(stroke)
                .min_size(egui::vec2(18.0, 18.0));
            if ui.add(swatch).clicked() {
                state.session.set_color(BrushColor::Palette(idx as u8));
            }
        }
    });

    let mut width = state.session.brush_width();
    if ui
        .add(egui::Slider::new(&mut width, 1.0..=16.0).text("Width"))
        .changed()
    {
        state.session.set_brush_width(width);
    }
    let mut eraser = state.session.eraser_width();
    if ui
        .add(egui::Slider::new(&mut eraser, 2.0..=48.0).text("Eraser"))
        .changed()
    {
        state.session.set_eraser_width(eraser);
    }

    ui.separator();
    ui.heading("Wiggle");
    let JitterConfig {
        mut amplitude,
        mut frequency,
    } = state.session.jitter();
    let amp_changed = ui
        .add(egui::Slider::new(&mut amplitude, 0.0..=6.0).text("Amplitude"))
        .changed();
    let freq_changed = ui
        .add(
            egui::Slider::new(&mut frequency, 0.004..=0.08)
                .logarithmic(true)
                .text("Speed"),
        )
        .changed();
    if amp_changed || freq_changed {
        let jitter = JitterConfig::new(amplitude, frequency);
        state.session.set_jitter(jitter);
        state.settings.jitter = state.session.jitter();
    }
    let play_label = if state.playing { "⏸ Pause" } else { "▶ Play" };
    if ui.button(play_label).clicked() {
        state.playing = !state.playing;
        if state.playing {
            state.playback.scheduler_mut().resume(now * 1000.0);
        }
    }

    ui.separator();
    ui.heading("History");
    ui.horizontal(|ui| {
        let history = state.session.history();
        let (can_undo, can_redo) = (history.can_undo(), history.can_redo());
        if ui
            .add_enabled(can_undo && !busy, egui::Button::new("↶ Undo"))
            .on_hover_text("Ctrl+Z")
            .clicked()
        {
            state.session.undo();
        }
        if ui
            .add_enabled(can_redo && !busy, egui::Button::new("↷ Redo"))
            .on_hover_text("Ctrl+Shift+Z")
            .clicked()
        {
            state.session.redo();
        }
    });
    if ui.add_enabled(!busy, egui::Button::new("🗑 Clear")).clicked() {
        state.session.clear();
    }

    ui.separator();
    ui.heading("File");
    if ui.add_enabled(!busy, egui::Button::new("📂 Open…")).clicked() {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Wiggle drawing", &[DOCUMENT_EXTENSION])
            .pick_file()
        {
            match state.open_document(path) {
                Ok(()) => state.toast(now, ToastType::Success, "Drawing opened"),
                Err(err) => state.toast(now, ToastType::Error, format!("Open failed: {err}")),
            }
        }
    }
    if ui.add_enabled(!busy, egui::Button::new("💾 Save…")).clicked() {
        let dialog = rfd::FileDialog::new()
            .add_filter("Wiggle drawing", &[DOCUMENT_EXTENSION])
            .set_file_name(format!("drawing.{DOCUMENT_EXTENSION}"));
        if let Some(path) = dialog.save_file() {
            match state.save_document(path) {
                Ok(()) => state.toast(now, ToastType::Success, "Drawing saved"),
                Err(err) => state.toast(now, ToastType::Error, format!("Save failed: {err}")),
            }
        }
    }

    let export_label = if busy { "Generating…" } else { "🎞 Export GIF…" };
    if ui.add_enabled(!busy, egui::Button::new(export_label)).clicked() {
        let dialog = rfd::FileDialog::new()
            .add_filter("GIF", &["gif"])
            .set_file_name("wiggle.gif");
        if let Some(path) = dialog.save_file() {
            // snapshot now; edits made while the export runs are not included
            let job = state.session.export_job();
            state.export = ExportStage::Requested { job, path };
        }
    }
}

fn run_pending_export(ctx: &egui::Context, state: &mut AppState, now: f64) {
    match std::mem::replace(&mut state.export, ExportStage::Idle) {
        ExportStage::Idle => {}
        ExportStage::Requested { job, path } => {
            // let the "Generating…" state paint first
            state.export = ExportStage::Running { job, path };
            ctx.request_repaint();
        }
        ExportStage::Running { job, path } => {
            let mut encoder = ImageGifEncoder::new();
            let result = export_drawing_as_gif(
                &job.drawing,
                job.revision,
                &mut RendererPort::Caching(&mut state.renderer),
                &mut encoder,
                job.jitter,
            );
            let written = result
                .map_err(anyhow::Error::from)
                .and_then(|bytes| write_gif(&path, &bytes).map_err(anyhow::Error::from));
            match written {
                Ok(()) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    state.toast(now, ToastType::Success, format!("Exported {name}"));
                }
                Err(err) => {
                    tracing::error!(error = %format!("{err:#}"), "GIF export failed");
                    state.toast(now, ToastType::Error, format!("Export failed: {err}"));
                }
            }
        }
    }
}

fn canvas_view(ui: &mut egui::Ui, state: &mut AppState, now_ms: f64) {
    let drawing = state.session.drawing();
    let zoom = state.settings.zoom;
    let size = egui::vec2(drawing.width as f32 * zoom, drawing.height as f32 * zoom);

    ui.centered_and_justified(|ui| {
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::drag());

        match &state.canvas_texture {
            Some(texture) => {
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                ui.painter().image(texture.id(), rect, uv, egui::Color32::WHITE);
            }
            None => {
                ui.painter().rect_filled(rect, 0.0, egui::Color32::from_gray(230));
            }
        }

        if state.export.is_busy() {
            return;
        }

        let to_logical = |pos: egui::Pos2| ((pos.x - rect.min.x) / zoom, (pos.y - rect.min.y) / zoom);
        let pointer = response.interact_pointer_pos().map(to_logical);

        if response.drag_started() {
            if let Some((x, y)) = pointer {
                state.session.pointer_down(x, y, now_ms);
                state.last_pointer = Some((x, y));
                state.playback.scheduler_mut().invalidate();
            }
        } else if response.dragged() {
            if let Some((x, y)) = pointer {
                if state.session.pointer_move(x, y, now_ms) {
                    state.playback.scheduler_mut().invalidate();
                }
                state.last_pointer = Some((x, y));
            }
        }
        if response.drag_released() {
            if let Some((x, y)) = pointer.or(state.last_pointer) {
                state.session.pointer_up(x, y, now_ms);
            }
            state.last_pointer = None;
        }
    });
}

/// Pulls the next frame from live playback and uploads it.
fn present_frame(ctx: &egui::Context, state: &mut AppState, now_ms: f64) {
    let revision = state.session.revision();
    let jitter = state.session.jitter();

    let frame = if state.session.is_drawing() {
        // the stroke in progress is not committed yet, so it cannot be cached
        let drawing = state.session.display_drawing().into_owned();
        let mut port = RendererPort::Basic(&mut state.renderer);
        state.playback.tick(now_ms, &mut port, &drawing, revision, jitter)
    } else {
        let drawing = state.session.drawing();
        let mut port = RendererPort::Caching(&mut state.renderer);
        state.playback.tick(now_ms, &mut port, drawing, revision, jitter)
    };

    match frame {
        Ok(Some(pixels)) => upload(ctx, state, &pixels),
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(error = %err, "Live frame failed");
        }
    }
}

fn upload(ctx: &egui::Context, state: &mut AppState, pixels: &PixelBuffer) {
    let image = egui::ColorImage::from_rgba_unmultiplied(
        [pixels.width as usize, pixels.height as usize],
        &pixels.data,
    );
    match &mut state.canvas_texture {
        Some(texture) => texture.set(image, egui::TextureOptions::NEAREST),
        None => {
            state.canvas_texture = Some(ctx.load_texture("wiggle_canvas", image, egui::TextureOptions::NEAREST));
        }
    }
}
