mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::CordExplorerApp;
use clap::Parser;
use eframe::egui;

use cord_explorer::config::Config;

/// Interactive explorer for the cleaned CORD-19 snapshot.
#[derive(Parser, Debug)]
#[command(name = "cord-explorer", version)]
struct Args {
    /// Cleaned snapshot written by cord-analyze
    snapshot: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let config = match Config::load_or_default(args.config.as_deref()) {
        Ok(c) => c.dashboard,
        Err(e) => {
            log::error!("{e}; using default settings");
            Config::default().dashboard
        }
    };
    let snapshot = args.snapshot.unwrap_or_else(|| config.snapshot.clone());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CORD-19 Research Explorer",
        options,
        Box::new(move |_cc| Ok(Box::new(CordExplorerApp::new(config, &snapshot)))),
    )
}
