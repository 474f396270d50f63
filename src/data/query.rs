use std::cmp::Ordering;
use std::fmt;

use super::model::{EmissionLine, LineCatalog};
use super::text::parse_number;
use super::wavelength::{display_wavelength, needs_conversion};

// ---------------------------------------------------------------------------
// Common lines
// ---------------------------------------------------------------------------

/// Astrophysically prominent transitions, highlighted in the viewer.
pub const COMMON_LINES: &[&str] = &[
    "Hα", "Hβ", "Hγ", "Hδ", "Lyα", "Lyβ",
    "[O III]", "[O II]", "[O I]",
    "[N II]", "[N I]",
    "[S II]", "[S III]",
    "[Ne III]", "[Ne V]",
    "He I", "He II",
    "C IV", "C III]", "C II]",
    "Mg II", "Ca II",
    "[Fe VII]", "[Fe X]", "[Fe XIV]",
];

/// Plain substring containment against [`COMMON_LINES`], or equality with a
/// label's bracket-free form. Over-matches on purpose (`"He II"` contains
/// `"He I"`).
pub fn is_common_line(ion: &str) -> bool {
    COMMON_LINES.iter().any(|common| {
        ion.contains(common) || ion == common.replace(['[', ']'], "")
    })
}

// ---------------------------------------------------------------------------
// Search term expansion
// ---------------------------------------------------------------------------

/// Roman spellings of Greek letters, checked as suffixes of the search text.
pub const GREEK_ALIASES: &[(&str, &str)] = &[
    ("a", "α"),
    ("alpha", "α"),
    ("b", "β"),
    ("beta", "β"),
    ("g", "γ"),
    ("gamma", "γ"),
    ("d", "δ"),
    ("delta", "δ"),
    ("e", "ε"),
    ("epsilon", "ε"),
    ("z", "ζ"),
    ("zeta", "ζ"),
    ("h", "η"),
    ("eta", "η"),
];

/// Lower-case the term and add one variant per matching Greek suffix, so
/// `"Ha"` also searches `"hα"` and `"lybeta"` also searches `"lyβ"`.
pub fn expand_search_term(term: &str) -> Vec<String> {
    let lower = term.to_lowercase();
    let mut variants = vec![lower.clone()];
    for (roman, greek) in GREEK_ALIASES {
        if let Some(prefix) = lower.strip_suffix(roman) {
            variants.push(format!("{prefix}{greek}"));
        }
    }
    variants
}

fn matches_search(line: &EmissionLine, variants: &[String]) -> bool {
    let fields = [
        line.ion.to_lowercase(),
        line.configurations.to_lowercase(),
        line.references.to_lowercase(),
    ];
    variants
        .iter()
        .any(|v| fields.iter().any(|f| f.contains(v.as_str())))
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Column a result set can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Displayed (medium-adjusted) wavelength.
    #[default]
    Wavelength,
    Ion,
    EnergyInitial,
    EnergyFinal,
    Configurations,
    Terms,
    JTransition,
    TransitionType,
    IonizationPotential,
    References,
    Note,
}

impl SortKey {
    pub const ALL: [SortKey; 11] = [
        SortKey::Wavelength,
        SortKey::Ion,
        SortKey::EnergyInitial,
        SortKey::EnergyFinal,
        SortKey::Configurations,
        SortKey::Terms,
        SortKey::JTransition,
        SortKey::TransitionType,
        SortKey::IonizationPotential,
        SortKey::References,
        SortKey::Note,
    ];

    /// Field name as used in the persisted records.
    pub fn name(self) -> &'static str {
        match self {
            SortKey::Wavelength => "wavelength",
            SortKey::Ion => "ion",
            SortKey::EnergyInitial => "energyInitial",
            SortKey::EnergyFinal => "energyFinal",
            SortKey::Configurations => "configurations",
            SortKey::Terms => "terms",
            SortKey::JTransition => "jTransition",
            SortKey::TransitionType => "transitionType",
            SortKey::IonizationPotential => "ionizationPotential",
            SortKey::References => "references",
            SortKey::Note => "note",
        }
    }

    /// Exact (case-insensitive) field name lookup.
    pub fn from_name(name: &str) -> Option<SortKey> {
        let name = name.trim();
        SortKey::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }

    /// Resolve a field name; unknown names fall back to wavelength.
    pub fn parse(name: &str) -> SortKey {
        SortKey::from_name(name).unwrap_or_else(|| {
            log::debug!("unknown sort key {name:?}, using wavelength");
            SortKey::Wavelength
        })
    }

    fn text<'a>(self, line: &'a EmissionLine) -> Option<&'a str> {
        match self {
            SortKey::Ion => Some(&line.ion),
            SortKey::Configurations => Some(&line.configurations),
            SortKey::Terms => Some(&line.terms),
            SortKey::JTransition => Some(&line.j_transition),
            SortKey::TransitionType => Some(&line.transition_type),
            SortKey::References => Some(&line.references),
            SortKey::Note => Some(&line.note),
            _ => None,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Header marker for the active sort column.
    pub fn indicator(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Sort by a named field. An unknown name means canonical order
    /// (wavelength ascending), whatever `direction` was asked for.
    pub fn from_name(name: &str, direction: SortDirection) -> SortSpec {
        match SortKey::from_name(name) {
            Some(key) => SortSpec { key, direction },
            None => {
                log::debug!("unknown sort key {name:?}, using canonical order");
                SortSpec::default()
            }
        }
    }

    /// Header-click behaviour: the active key flips direction, a new key
    /// starts ascending.
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key;
            self.direction = SortDirection::Ascending;
        }
    }

    fn compare(&self, a: &LineView<'_>, b: &LineView<'_>) -> Ordering {
        let ord = match self.key {
            SortKey::Wavelength => a.display_wavelength.total_cmp(&b.display_wavelength),
            // Absent values compare as 0.
            SortKey::IonizationPotential => numeric_or_zero(a.line.ionization_potential)
                .total_cmp(&numeric_or_zero(b.line.ionization_potential)),
            SortKey::EnergyInitial => numeric_or_zero(a.line.energy_initial)
                .total_cmp(&numeric_or_zero(b.line.energy_initial)),
            SortKey::EnergyFinal => numeric_or_zero(a.line.energy_final)
                .total_cmp(&numeric_or_zero(b.line.energy_final)),
            key => {
                let a = key.text(a.line).unwrap_or_default().to_lowercase();
                let b = key.text(b.line).unwrap_or_default().to_lowercase();
                a.cmp(&b)
            }
        };
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

fn numeric_or_zero(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Query specification
// ---------------------------------------------------------------------------

/// Everything the caller can ask of the catalog, apart from the medium.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySpec {
    pub search_text: String,
    pub wavelength_min: Option<f64>,
    pub wavelength_max: Option<f64>,
    pub common_only: bool,
    pub sort: SortSpec,
}

impl QuerySpec {
    /// Reset every filter, keeping the current sort.
    pub fn clear(&mut self) {
        *self = QuerySpec {
            sort: self.sort,
            ..QuerySpec::default()
        };
    }
}

/// Parse a user-typed range bound. Blank or non-numeric text means no bound.
pub fn parse_bound(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    parse_number(text)
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A catalog row as displayed for one query. Never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineView<'a> {
    pub line: &'a EmissionLine,
    /// Wavelength in the requested medium.
    pub display_wavelength: f64,
    /// Whether `display_wavelength` was converted from the tabulated medium.
    pub converted: bool,
    pub is_common: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    pub rows: Vec<LineView<'a>>,
    pub matched_count: usize,
    pub total_count: usize,
}

impl QueryResult<'_> {
    /// "Showing N of M lines" summary.
    pub fn summary(&self) -> String {
        format!("Showing {} of {} lines", self.matched_count, self.total_count)
    }
}

/// Attach the display wavelength and common-line flag to every record.
///
/// Records whose wavelength cannot be converted are left out with a warning
/// rather than displayed as NaN.
pub fn augment(catalog: &LineCatalog, show_vacuum: bool) -> Vec<LineView<'_>> {
    catalog
        .lines()
        .iter()
        .filter_map(|line| match display_wavelength(line, show_vacuum) {
            Ok(display) => Some(LineView {
                line,
                display_wavelength: display,
                converted: needs_conversion(line, show_vacuum),
                is_common: is_common_line(&line.ion),
            }),
            Err(e) => {
                log::warn!("line {} ({}): {e}", line.id(), line.ion);
                None
            }
        })
        .collect()
}

/// Run one query: augment, search, range-filter, common-filter, sort.
pub fn run_query<'a>(catalog: &'a LineCatalog, show_vacuum: bool, spec: &QuerySpec) -> QueryResult<'a> {
    let mut rows = augment(catalog, show_vacuum);

    if !spec.search_text.is_empty() {
        let variants = expand_search_term(&spec.search_text);
        rows.retain(|row| matches_search(row.line, &variants));
    }
    if let Some(min) = spec.wavelength_min.filter(|v| v.is_finite()) {
        rows.retain(|row| row.display_wavelength >= min);
    }
    if let Some(max) = spec.wavelength_max.filter(|v| v.is_finite()) {
        rows.retain(|row| row.display_wavelength <= max);
    }
    if spec.common_only {
        rows.retain(|row| row.is_common);
    }

    // `sort_by` is stable: ties keep catalog order.
    rows.sort_by(|a, b| spec.sort.compare(a, b));

    QueryResult {
        matched_count: rows.len(),
        total_count: catalog.len(),
        rows,
    }
}
