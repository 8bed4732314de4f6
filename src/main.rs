mod app;
mod cli;
mod error;
mod hotkey;
mod injector;
mod motion;
mod runner;
mod target;

use clap::Parser;
use eframe::egui;

use crate::{app::AppState, cli::Options};

fn main() -> eframe::Result<()> {
    let opts = Options::parse();

    env_logger::Builder::new()
        .filter_level(opts.log_level())
        .parse_default_env()
        .init();
    log::info!("spot-clicker v{}", env!("CARGO_PKG_VERSION"));

    let mut native = eframe::NativeOptions::default();
    native.viewport.inner_size = Some(egui::vec2(680.0, 800.0));
    native.viewport.resizable = Some(true);
    native.follow_system_theme = true;

    eframe::run_native(
        "Spot Clicker",
        native,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(AppState::new(&opts))
        }),
    )
}
