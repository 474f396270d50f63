use eframe::egui::{self, Align, Layout, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use emission_lines::data::query::SortKey;
use emission_lines::data::wavelength::format_wavelength;

use crate::color::COMMON_LINE_HIGHLIGHT;
use crate::ui::markup::markup_job;
use crate::state::AppState;

const ROW_HEIGHT: f32 = 18.0;

fn format_optional(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "—".to_string(), |v| format!("{v:.decimals$}"))
}

/// Column header text, with the sort marker when `key` is active.
fn header_label(state: &AppState, title: &str, key: SortKey) -> String {
    if state.query.sort.key == key {
        format!("{title} {}", state.query.sort.direction.indicator())
    } else {
        title.to_string()
    }
}

// ---------------------------------------------------------------------------
// Emission line table (central panel)
// ---------------------------------------------------------------------------

/// Render the line table in the central panel.
pub fn lines_table(ui: &mut Ui, state: &mut AppState) {
    if state.catalog.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a line table to begin  (File → Open…)");
        });
        return;
    }
    if state.visible.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No emission lines match your filters.");
        });
        return;
    }

    let wavelength_title = format!("λ ({}) Å", state.medium().short_label());
    let mut clicked: Option<SortKey> = None;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(Layout::left_to_right(Align::Center))
        .column(Column::initial(100.0).at_least(80.0))
        .column(Column::initial(80.0))
        .columns(Column::initial(65.0), 2)
        .column(Column::initial(140.0))
        .column(Column::initial(110.0))
        .column(Column::initial(70.0))
        .column(Column::initial(50.0))
        .column(Column::initial(65.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            let sortable = [
                (wavelength_title.as_str(), Some(SortKey::Wavelength)),
                ("Ion", Some(SortKey::Ion)),
                ("Eᵢ (eV)", None),
                ("Eₖ (eV)", None),
                ("Configurations", None),
                ("Terms", None),
                ("Jᵢ - Jₖ", None),
                ("Type", Some(SortKey::TransitionType)),
                ("IP (eV)", Some(SortKey::IonizationPotential)),
                ("Refs", None),
            ];
            for (title, key) in sortable {
                header.col(|ui: &mut Ui| match key {
                    Some(key) => {
                        let text = RichText::new(header_label(state, title, key)).strong();
                        if ui.add(egui::Button::new(text).frame(false)).clicked() {
                            clicked = Some(key);
                        }
                    }
                    None => {
                        ui.strong(title);
                    }
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, state.visible.len(), |mut row| {
                let visible = state.visible[row.index()];
                let Some(line) = state.line(&visible) else {
                    return;
                };
                let ion_text = if visible.is_common {
                    RichText::new(&line.ion).color(COMMON_LINE_HIGHLIGHT).strong()
                } else {
                    RichText::new(&line.ion)
                };

                row.col(|ui: &mut Ui| {
                    let mut text = format_wavelength(visible.display_wavelength, 3);
                    if visible.converted {
                        text.push('*');
                    }
                    ui.label(text)
                        .on_hover_text(format!("Tabulated: {} Å", line.wavelength_original()));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(ion_text);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format_optional(line.energy_initial, 3));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format_optional(line.energy_final, 3));
                });
                row.col(|ui: &mut Ui| {
                    let color = ui.visuals().text_color();
                    ui.label(markup_job(&line.configurations, color));
                });
                row.col(|ui: &mut Ui| {
                    let color = ui.visuals().text_color();
                    ui.label(markup_job(&line.terms, color));
                });
                row.col(|ui: &mut Ui| {
                    let color = ui.visuals().text_color();
                    ui.label(markup_job(&line.j_transition, color));
                });
                row.col(|ui: &mut Ui| {
                    let color = state
                        .color_map
                        .as_ref()
                        .map(|cm| cm.color_for(&line.transition_type));
                    let mut text = RichText::new(&line.transition_type);
                    if let Some(color) = color {
                        text = text.color(color);
                    }
                    ui.label(text);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format_optional(line.ionization_potential, 2));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(&line.references);
                });
            });
        });

    if let Some(key) = clicked {
        state.toggle_sort(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_numbers_render_as_dash() {
        assert_eq!(format_optional(None, 3), "—");
        assert_eq!(format_optional(Some(10.19886), 3), "10.199");
        assert_eq!(format_optional(Some(13.598), 2), "13.60");
    }

    #[test]
    fn active_sort_column_gets_marker() {
        let mut state = AppState::default();
        assert_eq!(header_label(&state, "Ion", SortKey::Ion), "Ion");
        state.toggle_sort(SortKey::Ion);
        assert_eq!(header_label(&state, "Ion", SortKey::Ion), "Ion ▲");
        state.toggle_sort(SortKey::Ion);
        assert_eq!(header_label(&state, "Ion", SortKey::Ion), "Ion ▼");
    }
}
