use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::wavelength::{validate_wavelength, ConversionError, Medium, VACUUM_THRESHOLD};

/// Transition type assumed when the source leaves the column blank.
pub const DEFAULT_TRANSITION_TYPE: &str = "E1";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A record that would violate the catalog invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("invalid wavelength: {0}")]
    Wavelength(#[from] ConversionError),

    #[error("isVacuum={is_vacuum} disagrees with wavelength {wavelength} Å")]
    VacuumFlagMismatch { wavelength: f64, is_vacuum: bool },
}

// ---------------------------------------------------------------------------
// EmissionLine – one row of the canonical catalog
// ---------------------------------------------------------------------------

/// A single tabulated emission line.
///
/// `wavelength` is kept exactly as stated by the source, in vacuum below
/// 2000 Å and in air above. The medium flag is derived from it and cannot be
/// set on its own; `id` is owned by [`LineCatalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LineRecord")]
pub struct EmissionLine {
    id: u32,
    wavelength: f64,
    wavelength_original: String,
    is_vacuum: bool,
    pub ion: String,
    pub energy_initial: Option<f64>,
    pub energy_final: Option<f64>,
    /// Electron configurations, markup preserved.
    pub configurations: String,
    /// Term symbols, markup preserved.
    pub terms: String,
    pub j_transition: String,
    pub transition_type: String,
    pub ionization_potential: Option<f64>,
    pub references: String,
    pub note: String,
}

impl EmissionLine {
    /// Start a record for the given wavelength (Å) and species label.
    pub fn builder(wavelength: f64, ion: impl Into<String>) -> EmissionLineBuilder {
        EmissionLineBuilder::new(wavelength, ion.into())
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }

    pub fn wavelength_original(&self) -> &str {
        &self.wavelength_original
    }

    pub fn is_vacuum(&self) -> bool {
        self.is_vacuum
    }

    pub fn medium(&self) -> Medium {
        Medium::from_show_vacuum(self.is_vacuum)
    }
}

impl fmt::Display for EmissionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Å - {}", self.wavelength_original, self.ion)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EmissionLineBuilder {
    id: u32,
    wavelength: f64,
    wavelength_original: Option<String>,
    ion: String,
    energy_initial: Option<f64>,
    energy_final: Option<f64>,
    configurations: String,
    terms: String,
    j_transition: String,
    transition_type: String,
    ionization_potential: Option<f64>,
    references: String,
    note: String,
}

impl EmissionLineBuilder {
    fn new(wavelength: f64, ion: String) -> Self {
        Self {
            id: 0,
            wavelength,
            wavelength_original: None,
            ion,
            energy_initial: None,
            energy_final: None,
            configurations: String::new(),
            terms: String::new(),
            j_transition: String::new(),
            transition_type: String::new(),
            ionization_potential: None,
            references: String::new(),
            note: String::new(),
        }
    }

    /// Provisional id; [`LineCatalog`] reassigns ids when it orders records.
    pub fn id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn wavelength_original(mut self, text: impl Into<String>) -> Self {
        self.wavelength_original = Some(text.into());
        self
    }

    pub fn energies(mut self, initial: Option<f64>, final_: Option<f64>) -> Self {
        self.energy_initial = initial;
        self.energy_final = final_;
        self
    }

    pub fn configurations(mut self, text: impl Into<String>) -> Self {
        self.configurations = text.into();
        self
    }

    pub fn terms(mut self, text: impl Into<String>) -> Self {
        self.terms = text.into();
        self
    }

    pub fn j_transition(mut self, text: impl Into<String>) -> Self {
        self.j_transition = text.into();
        self
    }

    pub fn transition_type(mut self, text: impl Into<String>) -> Self {
        self.transition_type = text.into();
        self
    }

    pub fn ionization_potential(mut self, ip: Option<f64>) -> Self {
        self.ionization_potential = ip;
        self
    }

    pub fn references(mut self, text: impl Into<String>) -> Self {
        self.references = text.into();
        self
    }

    pub fn note(mut self, text: impl Into<String>) -> Self {
        self.note = text.into();
        self
    }

    /// Validate the wavelength and derive the medium flag.
    pub fn build(self) -> Result<EmissionLine, RecordError> {
        let wavelength = validate_wavelength(self.wavelength)?;
        let transition_type = if self.transition_type.trim().is_empty() {
            DEFAULT_TRANSITION_TYPE.to_string()
        } else {
            self.transition_type
        };
        Ok(EmissionLine {
            id: self.id,
            wavelength,
            wavelength_original: self
                .wavelength_original
                .unwrap_or_else(|| wavelength.to_string()),
            is_vacuum: wavelength < VACUUM_THRESHOLD,
            ion: self.ion,
            energy_initial: self.energy_initial,
            energy_final: self.energy_final,
            configurations: self.configurations,
            terms: self.terms,
            j_transition: self.j_transition,
            transition_type,
            ionization_potential: self.ionization_potential,
            references: self.references,
            note: self.note,
        })
    }
}

// ---------------------------------------------------------------------------
// LineRecord – unchecked serialized form
// ---------------------------------------------------------------------------

/// Wire shape of a persisted record, validated into an [`EmissionLine`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    #[serde(default)]
    pub id: u32,
    pub wavelength: f64,
    #[serde(default)]
    pub wavelength_original: Option<String>,
    #[serde(default)]
    pub is_vacuum: Option<bool>,
    pub ion: String,
    #[serde(default)]
    pub energy_initial: Option<f64>,
    #[serde(default)]
    pub energy_final: Option<f64>,
    #[serde(default)]
    pub configurations: String,
    #[serde(default)]
    pub terms: String,
    #[serde(default)]
    pub j_transition: String,
    #[serde(default)]
    pub transition_type: String,
    #[serde(default)]
    pub ionization_potential: Option<f64>,
    #[serde(default)]
    pub references: String,
    #[serde(default)]
    pub note: String,
}

impl TryFrom<LineRecord> for EmissionLine {
    type Error = RecordError;

    fn try_from(rec: LineRecord) -> Result<Self, Self::Error> {
        let mut builder = EmissionLine::builder(rec.wavelength, rec.ion)
            .id(rec.id)
            .energies(rec.energy_initial, rec.energy_final)
            .configurations(rec.configurations)
            .terms(rec.terms)
            .j_transition(rec.j_transition)
            .transition_type(rec.transition_type)
            .ionization_potential(rec.ionization_potential)
            .references(rec.references)
            .note(rec.note);
        if let Some(text) = rec.wavelength_original {
            builder = builder.wavelength_original(text);
        }
        let line = builder.build()?;

        match rec.is_vacuum {
            Some(flag) if flag != line.is_vacuum => Err(RecordError::VacuumFlagMismatch {
                wavelength: line.wavelength,
                is_vacuum: flag,
            }),
            _ => Ok(line),
        }
    }
}

// ---------------------------------------------------------------------------
// LineCatalog – the complete canonical dataset
// ---------------------------------------------------------------------------

/// All emission lines, ordered by ascending tabulated wavelength with dense
/// ids `1..=N`. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineCatalog {
    lines: Vec<EmissionLine>,
}

impl LineCatalog {
    /// Order the records and assign ids. Equal wavelengths keep their input
    /// order; incoming ids are ignored and overwritten.
    pub fn from_lines(mut lines: Vec<EmissionLine>) -> Self {
        lines.sort_by(|a, b| a.wavelength.total_cmp(&b.wavelength));
        for (idx, line) in lines.iter_mut().enumerate() {
            line.id = idx as u32 + 1;
        }
        LineCatalog { lines }
    }

    pub fn lines(&self) -> &[EmissionLine] {
        &self.lines
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up a line by its id.
    pub fn get(&self, id: u32) -> Option<&EmissionLine> {
        let idx = usize::try_from(id).ok()?.checked_sub(1)?;
        self.lines.get(idx)
    }

    pub fn stats(&self) -> CatalogStats {
        let unique_ions: BTreeSet<&str> = self.lines.iter().map(|l| l.ion.as_str()).collect();
        let vacuum_count = self.lines.iter().filter(|l| l.is_vacuum).count();
        CatalogStats {
            count: self.lines.len(),
            unique_ions: unique_ions.len(),
            wavelength_range: self
                .lines
                .first()
                .zip(self.lines.last())
                .map(|(lo, hi)| (lo.wavelength, hi.wavelength)),
            vacuum_count,
            air_count: self.lines.len() - vacuum_count,
        }
    }
}

/// Summary numbers printed after a load or a catalog build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogStats {
    pub count: usize,
    pub unique_ions: usize,
    pub wavelength_range: Option<(f64, f64)>,
    pub vacuum_count: usize,
    pub air_count: usize,
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} unique ions, {} vacuum / {} air",
            self.count, self.unique_ions, self.vacuum_count, self.air_count
        )?;
        if let Some((lo, hi)) = self.wavelength_range {
            write!(f, ", {lo} - {hi} Å")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(wavelength: f64, ion: &str) -> EmissionLine {
        EmissionLine::builder(wavelength, ion).build().unwrap()
    }

    #[test]
    fn vacuum_flag_follows_threshold() {
        assert!(line(1999.99, "X").is_vacuum());
        assert!(!line(2000.0, "X").is_vacuum());
        assert!(!line(6562.8, "Hα").is_vacuum());
    }

    #[test]
    fn builder_defaults_transition_type() {
        let l = EmissionLine::builder(1215.67, "Lyα")
            .transition_type("   ")
            .build()
            .unwrap();
        assert_eq!(l.transition_type, "E1");
        let l = EmissionLine::builder(1215.67, "Lyα")
            .transition_type("M1")
            .build()
            .unwrap();
        assert_eq!(l.transition_type, "M1");
    }

    #[test]
    fn builder_rejects_bad_wavelengths() {
        assert!(EmissionLine::builder(0.0, "X").build().is_err());
        assert!(EmissionLine::builder(-1.0, "X").build().is_err());
        assert!(EmissionLine::builder(f64::NAN, "X").build().is_err());
    }

    #[test]
    fn catalog_orders_and_numbers_lines() {
        let catalog = LineCatalog::from_lines(vec![
            line(6562.8, "Hα").into_with_id(7),
            line(1215.67, "Lyα").into_with_id(3),
            line(4861.3, "Hβ").into_with_id(1),
        ]);
        let ids: Vec<u32> = catalog.lines().iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let ions: Vec<&str> = catalog.lines().iter().map(|l| l.ion.as_str()).collect();
        assert_eq!(ions, vec!["Lyα", "Hβ", "Hα"]);
        assert_eq!(catalog.get(3).map(|l| l.ion.as_str()), Some("Hα"));
        assert!(catalog.get(0).is_none());
        assert!(catalog.get(4).is_none());
    }

    #[test]
    fn equal_wavelengths_keep_input_order() {
        let catalog = LineCatalog::from_lines(vec![
            line(5000.0, "first").into_with_id(9),
            line(4000.0, "lower").into_with_id(5),
            line(5000.0, "second").into_with_id(2),
        ]);
        let ions: Vec<&str> = catalog.lines().iter().map(|l| l.ion.as_str()).collect();
        assert_eq!(ions, vec!["lower", "first", "second"]);
        assert_eq!(catalog.lines()[1].id(), 2);
    }

    #[test]
    fn stats_summarise_catalog() {
        let catalog = LineCatalog::from_lines(vec![
            line(1215.67, "Lyα"),
            line(5006.84, "[O III]"),
            line(4958.91, "[O III]"),
        ]);
        let stats = catalog.stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.unique_ions, 2);
        assert_eq!(stats.vacuum_count, 1);
        assert_eq!(stats.air_count, 2);
        assert_eq!(stats.wavelength_range, Some((1215.67, 5006.84)));
        assert!(LineCatalog::default().stats().wavelength_range.is_none());
    }

    #[test]
    fn json_uses_camel_case_and_round_trips() {
        let l = EmissionLine::builder(5006.84, "[O III]")
            .id(2)
            .wavelength_original("5006.84")
            .energies(Some(2.5), None)
            .terms("<sup>3</sup>P-<sup>1</sup>D")
            .build()
            .unwrap();
        let json = serde_json::to_string(&l).unwrap();
        assert!(json.contains("\"wavelengthOriginal\":\"5006.84\""));
        assert!(json.contains("\"isVacuum\":false"));
        assert!(json.contains("\"energyFinal\":null"));
        let back: EmissionLine = serde_json::from_str(&json).unwrap();
        assert_eq!(back, l);
    }

    #[test]
    fn json_with_inconsistent_vacuum_flag_is_rejected() {
        let json = r#"{"id":1,"wavelength":5006.84,"isVacuum":true,"ion":"[O III]"}"#;
        let err = serde_json::from_str::<EmissionLine>(json).unwrap_err();
        assert!(err.to_string().contains("disagrees"), "{err}");
    }

    impl EmissionLine {
        fn into_with_id(mut self, id: u32) -> Self {
            self.id = id;
            self
        }
    }
}
