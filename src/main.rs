mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use app::ExplorerApp;
use clap::Parser;
use config::{Cli, ExplorerConfig};
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = ExplorerConfig::from_cli(&cli)?;
    log::debug!("configuration: {config:?}");

    let mut state = AppState::new(config);
    state.load_configured_sources();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "GDP per Capita vs. Average IQ",
        options,
        Box::new(|_cc| Ok(Box::new(ExplorerApp { state }))),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
