use std::collections::BTreeSet;
use std::path::Path;

use emission_lines::data::loader::load_file;
use emission_lines::data::query::{parse_bound, run_query, LineView, QuerySpec, SortKey};
use emission_lines::data::wavelength::Medium;
use emission_lines::{EmissionLine, LineCatalog};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Visible rows
// ---------------------------------------------------------------------------

/// One row of the current view, detached from the catalog borrow so it can
/// be cached between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRow {
    /// Position in `LineCatalog::lines()`.
    pub index: usize,
    pub display_wavelength: f64,
    pub converted: bool,
    pub is_common: bool,
}

impl From<&LineView<'_>> for VisibleRow {
    fn from(view: &LineView<'_>) -> Self {
        VisibleRow {
            index: view.line.id() as usize - 1,
            display_wavelength: view.display_wavelength,
            converted: view.converted,
            is_common: view.is_common,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded catalog (None until user loads a file).
    pub catalog: Option<LineCatalog>,

    /// Display wavelengths in vacuum (true) or air (false).
    pub show_vacuum: bool,

    /// Search, range, common-only and sort settings.
    pub query: QuerySpec,

    /// Raw text of the range inputs; parsed into `query` on change.
    pub min_text: String,
    pub max_text: String,

    /// Rows passing the current query (cached).
    pub visible: Vec<VisibleRow>,

    /// Transition type → colour.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            catalog: None,
            show_vacuum: true,
            query: QuerySpec::default(),
            min_text: String::new(),
            max_text: String::new(),
            visible: Vec::new(),
            color_map: None,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded catalog, rebuild colours and the view.
    pub fn set_catalog(&mut self, catalog: LineCatalog) {
        let types: BTreeSet<String> = catalog
            .lines()
            .iter()
            .map(|l| l.transition_type.clone())
            .collect();
        self.color_map = Some(ColorMap::new(&types));
        self.catalog = Some(catalog);
        self.status_message = None;
        self.refresh();
    }

    /// Load a file from disk, reporting failures in the status line.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(catalog) => {
                log::info!("Loaded {} emission lines from {}", catalog.len(), path.display());
                self.set_catalog(catalog);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Recompute `visible` after any query or medium change.
    pub fn refresh(&mut self) {
        self.visible = match &self.catalog {
            Some(catalog) => run_query(catalog, self.show_vacuum, &self.query)
                .rows
                .iter()
                .map(VisibleRow::from)
                .collect(),
            None => Vec::new(),
        };
    }

    pub fn medium(&self) -> Medium {
        Medium::from_show_vacuum(self.show_vacuum)
    }

    pub fn set_show_vacuum(&mut self, show_vacuum: bool) {
        if self.show_vacuum != show_vacuum {
            self.show_vacuum = show_vacuum;
            self.refresh();
        }
    }

    /// Header click on a sortable column.
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.query.sort.toggle(key);
        self.refresh();
    }

    /// Re-read the range text inputs. Unparseable text means no bound.
    pub fn apply_range_text(&mut self) {
        self.query.wavelength_min = parse_bound(&self.min_text);
        self.query.wavelength_max = parse_bound(&self.max_text);
        self.refresh();
    }

    /// Reset search, range and common-only filters.
    pub fn clear_filters(&mut self) {
        self.query.clear();
        self.min_text.clear();
        self.max_text.clear();
        self.refresh();
    }

    /// The catalog record behind a visible row.
    pub fn line(&self, row: &VisibleRow) -> Option<&EmissionLine> {
        self.catalog.as_ref()?.lines().get(row.index)
    }

    pub fn total_count(&self) -> usize {
        self.catalog.as_ref().map_or(0, LineCatalog::len)
    }

    pub fn summary(&self) -> String {
        format!(
            "Showing {} of {} lines",
            self.visible.len(),
            self.total_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_lines() -> AppState {
        let lines = vec![
            EmissionLine::builder(1215.67, "Lyα").build().unwrap(),
            EmissionLine::builder(5006.84, "[O III]").transition_type("M1").build().unwrap(),
            EmissionLine::builder(7135.8, "[Ar III]").build().unwrap(),
        ];
        let mut state = AppState::default();
        state.set_catalog(LineCatalog::from_lines(lines));
        state
    }

    #[test]
    fn new_catalog_shows_everything() {
        let state = state_with_lines();
        assert_eq!(state.visible.len(), 3);
        assert_eq!(state.summary(), "Showing 3 of 3 lines");
        assert!(state.color_map.is_some());
    }

    #[test]
    fn range_text_is_parsed_leniently() {
        let mut state = state_with_lines();
        state.min_text = "5000".into();
        state.max_text = "oops".into();
        state.apply_range_text();
        assert_eq!(state.query.wavelength_max, None);
        assert_eq!(state.visible.len(), 2);

        state.clear_filters();
        assert!(state.min_text.is_empty());
        assert_eq!(state.visible.len(), 3);
    }

    #[test]
    fn medium_toggle_reconverts() {
        let mut state = state_with_lines();
        let oiii = state.visible[1];
        assert!(oiii.converted);
        state.set_show_vacuum(false);
        assert_eq!(state.medium(), Medium::Air);
        let oiii_air = state.visible[1];
        assert!(!oiii_air.converted);
        assert_eq!(oiii_air.display_wavelength, 5006.84);
        assert!(state.visible[0].converted);
    }

    #[test]
    fn rows_map_back_to_catalog_lines() {
        let mut state = state_with_lines();
        state.toggle_sort(SortKey::Wavelength);
        let first = state.visible[0];
        assert_eq!(state.line(&first).map(|l| l.ion.as_str()), Some("[Ar III]"));
    }
}
