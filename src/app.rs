use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct EmissionLinesApp {
    pub state: AppState,
}

impl EmissionLinesApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for EmissionLinesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Footer: conventions and credits ----
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            panels::footer(ui);
        });

        // ---- Bottom panel: line positions ----
        egui::TopBottomPanel::bottom("line_positions_panel")
            .default_height(140.0)
            .resizable(true)
            .show(ctx, |ui| {
                plot::line_positions_plot(ui, &self.state);
            });

        // ---- Central panel: table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::lines_table(ui, &mut self.state);
        });
    }
}
