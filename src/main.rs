mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::EmissionLinesApp;
use clap::Parser;
use eframe::egui;
use state::AppState;

/// Browse, search and sort UV/optical emission lines.
#[derive(Parser, Debug)]
#[command(name = "emission-lines", version, about)]
struct Args {
    /// Catalog or raw table to open at startup (.parquet, .json, .html, .csv, .tsv)
    path: Option<PathBuf>,

    /// Start with air wavelengths instead of vacuum
    #[arg(long)]
    air: bool,
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let mut state = AppState::default();
    state.show_vacuum = !args.air;
    if let Some(path) = &args.path {
        state.load_path(path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([700.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Emission Lines – UV/Optical Line Atlas",
        options,
        Box::new(|_cc| Ok(Box::new(EmissionLinesApp::new(state)))),
    )
}
