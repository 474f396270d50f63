use eframe::egui::{Color32, Ui};
use egui_plot::{Plot, VLine};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Line position strip (bottom panel)
// ---------------------------------------------------------------------------

/// One vertical marker per visible line at its displayed wavelength,
/// coloured by transition type. Common lines are drawn thicker.
pub fn line_positions_plot(ui: &mut Ui, state: &AppState) {
    if state.catalog.is_none() {
        return;
    }

    let color_map = &state.color_map;

    Plot::new("line_positions")
        .x_axis_label(format!("λ ({}) Å", state.medium().short_label()))
        .show_y(false)
        .show_axes([true, false])
        .include_y(0.0)
        .include_y(1.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for row in &state.visible {
                let Some(line) = state.line(row) else {
                    continue;
                };
                let color = color_map
                    .as_ref()
                    .map(|cm| cm.color_for(&line.transition_type))
                    .unwrap_or(Color32::LIGHT_BLUE);
                let width: f32 = if row.is_common { 2.5 } else { 1.0 };

                plot_ui.vline(VLine::new(row.display_wavelength).color(color).width(width));
            }
        });
}
