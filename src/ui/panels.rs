use eframe::egui::{self, Color32, RichText, ScrollArea, TextEdit, Ui};

use emission_lines::data::wavelength::{Medium, VACUUM_THRESHOLD};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.catalog.is_none() {
        ui.label("No catalog loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Search ion / config / refs");
            let search = ui.add(
                TextEdit::singleline(&mut state.query.search_text)
                    .hint_text("e.g. [O III], Fe, Ha, Lyb…"),
            );
            if search.changed() {
                state.refresh();
            }
            ui.add_space(6.0);

            ui.strong("λ range (Å)");
            let mut range_changed = false;
            ui.horizontal(|ui: &mut Ui| {
                ui.label("min");
                range_changed |= ui
                    .add(TextEdit::singleline(&mut state.min_text).hint_text("700").desired_width(70.0))
                    .changed();
                ui.label("max");
                range_changed |= ui
                    .add(TextEdit::singleline(&mut state.max_text).hint_text("11000").desired_width(70.0))
                    .changed();
            });
            if range_changed {
                state.apply_range_text();
            }
            ui.add_space(6.0);

            if ui
                .checkbox(&mut state.query.common_only, "Common lines only")
                .changed()
            {
                state.refresh();
            }

            if ui.button("Clear filters").clicked() {
                state.clear_filters();
            }

            ui.separator();

            // ---- Transition type legend ----
            if let Some(cm) = &state.color_map {
                ui.strong("Transition types");
                for (label, color) in cm.legend_entries() {
                    ui.label(RichText::new(format!("■ {label}")).color(color));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label("λ:");
        if ui
            .selectable_label(!state.show_vacuum, "Air")
            .clicked()
        {
            state.set_show_vacuum(false);
        }
        if ui
            .selectable_label(state.show_vacuum, "Vacuum")
            .clicked()
        {
            state.set_show_vacuum(true);
        }
        let converted = match state.medium() {
            Medium::Vacuum => format!("λ > {VACUUM_THRESHOLD:.0} Å converted"),
            Medium::Air => format!("λ < {VACUUM_THRESHOLD:.0} Å converted"),
        };
        ui.label(RichText::new(format!("Showing {} wavelengths ({converted})", state.medium())).weak());

        ui.separator();

        if state.catalog.is_some() {
            ui.label(state.summary());
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Footer
// ---------------------------------------------------------------------------

fn convention_note() -> String {
    format!(
        "Vacuum wavelengths are tabulated for λ < {VACUUM_THRESHOLD:.0} Å, \
         air wavelengths for λ > {VACUUM_THRESHOLD:.0} Å. * = converted value."
    )
}

/// Wavelength convention, converted-value marker, and data credits.
pub fn footer(ui: &mut Ui) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label(RichText::new(convention_note()).small());
    });
    ui.label(
        RichText::new(
            "λ_air = λ_vac / (1 + 2.735182×10⁻⁴ + 131.4182/λ_vac² + 2.76249×10⁸/λ_vac⁴); \
             air → vacuum by fixed-point iteration.",
        )
        .small()
        .weak(),
    );
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label(RichText::new("Data from").small().weak());
        ui.hyperlink_to(
            RichText::new("Drew Chojnowski's Table of Emission Lines").small(),
            "http://astronomy.nmsu.edu/drewski/tableofemissionlines.html",
        );
        ui.label(RichText::new("· atomic data from").small().weak());
        ui.hyperlink_to(
            RichText::new("NIST ASD").small(),
            "https://www.nist.gov/pml/atomic-spectra-database",
        );
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open emission line table")
        .add_filter("Supported files", &["parquet", "pq", "json", "html", "htm", "csv", "tsv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("HTML table", &["html", "htm"])
        .add_filter("CSV / TSV", &["csv", "tsv"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_explains_threshold_and_marker() {
        assert_eq!(
            convention_note(),
            "Vacuum wavelengths are tabulated for λ < 2000 Å, \
             air wavelengths for λ > 2000 Å. * = converted value."
        );
    }
}
