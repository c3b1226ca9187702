mod app;
mod color;
mod state;
mod ui;

use anyhow::anyhow;
use app::ExplorerApp;
use eframe::egui;
use clap::Parser;
use timss_explorer::config::{Cli, Settings};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;
    log::debug!("settings: {settings:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "TIMSS Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(ExplorerApp::new(settings)))),
    )
    .map_err(|e| anyhow!("{e}"))
}
