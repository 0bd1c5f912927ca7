mod app_state;
mod ui;

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wiggle::project_settings::ProjectSettings;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wiggle=info")),
        )
        .init();

    let settings_path = ProjectSettings::default_path();
    let settings = ProjectSettings::load_or_default(&settings_path);
    let open = std::env::args_os().nth(1).map(PathBuf::from);

    let zoom = settings.zoom;
    let canvas = egui::vec2(
        settings.canvas_width as f32 * zoom,
        settings.canvas_height as f32 * zoom,
    );
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Wiggle")
            .with_inner_size(canvas + egui::vec2(220.0, 40.0)),
        ..Default::default()
    };

    eframe::run_native(
        "Wiggle",
        native_options,
        Box::new(move |_cc| Box::new(ui::create_app(settings, settings_path, open))),
    )
    .map_err(|e| anyhow::anyhow!("eframe failed: {e}"))?;
    Ok(())
}
