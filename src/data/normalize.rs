use super::model::{EmissionLine, LineCatalog};
use super::text::{collapse_whitespace, decode_entities, parse_number};

/// Minimum number of cells a source row needs to be considered.
pub const MIN_FIELDS: usize = 10;

/// Column positions in a raw table row.
pub mod field {
    pub const WAVELENGTH: usize = 0;
    pub const ION: usize = 1;
    pub const ENERGY_INITIAL: usize = 2;
    pub const ENERGY_FINAL: usize = 3;
    pub const CONFIGURATIONS: usize = 4;
    pub const TERMS: usize = 5;
    pub const J_TRANSITION: usize = 6;
    pub const TRANSITION_TYPE: usize = 7;
    pub const IONIZATION_POTENTIAL: usize = 8;
    pub const REFERENCES: usize = 9;
    pub const NOTE: usize = 10;
}

/// One source row: ordered text cells.
pub type RawRow = Vec<String>;

/// What happened to the rows handed to [`normalize_rows`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub rows_seen: usize,
    pub too_short: usize,
    pub bad_wavelength: usize,
}

impl NormalizeReport {
    pub fn dropped(&self) -> usize {
        self.too_short + self.bad_wavelength
    }

    pub fn kept(&self) -> usize {
        self.rows_seen - self.dropped()
    }
}

/// Label text: entities decoded and whitespace folded.
fn clean_label(cell: &str) -> String {
    collapse_whitespace(&decode_entities(cell))
}

/// Turn one row into a record with provisional id `position`.
///
/// `None` when the row is too short or its wavelength is not a finite
/// positive number.
pub fn normalize_row<S: AsRef<str>>(row: &[S], position: usize) -> Option<EmissionLine> {
    if row.len() < MIN_FIELDS {
        return None;
    }
    let cell = |i: usize| row.get(i).map(AsRef::as_ref).unwrap_or("");

    let wavelength_text = collapse_whitespace(cell(field::WAVELENGTH));
    let wavelength = parse_number(&wavelength_text)?;

    EmissionLine::builder(wavelength, clean_label(cell(field::ION)))
        .id(u32::try_from(position).unwrap_or(u32::MAX))
        .wavelength_original(wavelength_text)
        .energies(
            parse_number(cell(field::ENERGY_INITIAL)),
            parse_number(cell(field::ENERGY_FINAL)),
        )
        .configurations(cell(field::CONFIGURATIONS))
        .terms(cell(field::TERMS))
        .j_transition(cell(field::J_TRANSITION))
        .transition_type(clean_label(cell(field::TRANSITION_TYPE)))
        .ionization_potential(parse_number(cell(field::IONIZATION_POTENTIAL)))
        .references(clean_label(cell(field::REFERENCES)))
        .note(clean_label(cell(field::NOTE)))
        .build()
        .ok()
}

/// Normalize data rows (no header) into the canonical catalog.
///
/// Malformed rows are expected in scraped tables; they are skipped and only
/// counted in the report.
pub fn normalize_rows<I>(rows: I) -> (LineCatalog, NormalizeReport)
where
    I: IntoIterator,
    I::Item: AsRef<[String]>,
{
    let mut report = NormalizeReport::default();
    let mut lines = Vec::new();

    for (position, row) in rows.into_iter().enumerate() {
        let row = row.as_ref();
        report.rows_seen += 1;
        if row.len() < MIN_FIELDS {
            log::debug!("row {position}: {} fields, skipped", row.len());
            report.too_short += 1;
            continue;
        }
        match normalize_row(row, position + 1) {
            Some(line) => lines.push(line),
            None => {
                log::debug!(
                    "row {position}: no usable wavelength in {:?}, skipped",
                    row[field::WAVELENGTH]
                );
                report.bad_wavelength += 1;
            }
        }
    }

    if report.dropped() > 0 {
        log::info!(
            "normalized {} of {} rows ({} too short, {} without wavelength)",
            report.kept(),
            report.rows_seen,
            report.too_short,
            report.bad_wavelength
        );
    }

    (LineCatalog::from_lines(lines), report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn example_rows() -> Vec<Vec<String>> {
        vec![
            row(&["1215.67", "Lyα", "", "", "", "", "", "", "13.6", "Morton 1991", ""]),
            row(&["5006.84", "[O III]", "2.5", "0.0", "2p2", "3P-1D", "2-2", "", "35.1", "NIST", ""]),
        ]
    }

    #[test]
    fn end_to_end_example_rows() {
        let (catalog, report) = normalize_rows(example_rows());
        assert_eq!(report.kept(), 2);
        let lines = catalog.lines();
        assert_eq!(lines.len(), 2);

        assert_eq!(lines[0].id(), 1);
        assert_eq!(lines[0].ion, "Lyα");
        assert_eq!(lines[0].wavelength(), 1215.67);
        assert!(lines[0].is_vacuum());
        assert_eq!(lines[0].energy_initial, None);
        assert_eq!(lines[0].ionization_potential, Some(13.6));
        assert_eq!(lines[0].references, "Morton 1991");

        assert_eq!(lines[1].id(), 2);
        assert_eq!(lines[1].ion, "[O III]");
        assert!(!lines[1].is_vacuum());
        assert_eq!(lines[1].energy_initial, Some(2.5));
        assert_eq!(lines[1].energy_final, Some(0.0));
        assert_eq!(lines[1].terms, "3P-1D");
        assert_eq!(lines[1].j_transition, "2-2");
    }

    #[test]
    fn empty_transition_type_defaults_to_e1() {
        let (catalog, _) = normalize_rows(example_rows());
        assert!(catalog.lines().iter().all(|l| l.transition_type == "E1"));

        let mut rows = example_rows();
        rows[0][field::TRANSITION_TYPE] = "M1".into();
        let (catalog, _) = normalize_rows(rows);
        assert_eq!(catalog.lines()[0].transition_type, "M1");
    }

    #[test]
    fn rows_without_wavelength_are_dropped() {
        let rows = vec![
            row(&["n/a", "X", "", "", "", "", "", "", "", ""]),
            row(&["", "Y", "", "", "", "", "", "", "", ""]),
            row(&["0", "Z", "", "", "", "", "", "", "", ""]),
            row(&["6562.80", "Hα", "", "", "", "", "", "", "", ""]),
        ];
        let (catalog, report) = normalize_rows(rows);
        assert_eq!(catalog.len(), 1);
        assert_eq!(report.bad_wavelength, 3);
        assert_eq!(catalog.lines()[0].id(), 1);
    }

    #[test]
    fn short_rows_are_skipped_and_extra_fields_ignored() {
        let rows = vec![
            row(&["1549.0", "C IV", "", ""]),
            row(&["1909.0", "C III]", "", "", "", "", "", "", "", "", "note", "extra", "more"]),
        ];
        let (catalog, report) = normalize_rows(rows);
        assert_eq!(report.too_short, 1);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lines()[0].note, "note");
    }

    #[test]
    fn ten_field_rows_have_empty_note() {
        let r = row(&["1909.0", "C III]", "", "", "", "", "", "", "", "ref"]);
        let line = normalize_row(&r, 1).unwrap();
        assert_eq!(line.note, "");
        assert_eq!(line.references, "ref");
    }

    #[test]
    fn unparseable_numerics_are_absent_not_zero() {
        let r = row(&["4861.33", "Hβ", "—", "abc", "", "", "", "", " ", "", ""]);
        let line = normalize_row(&r, 1).unwrap();
        assert_eq!(line.energy_initial, None);
        assert_eq!(line.energy_final, None);
        assert_eq!(line.ionization_potential, None);
    }

    #[test]
    fn ion_entities_are_decoded_but_terms_kept_verbatim() {
        let r = row(&[
            " 6562.80 ",
            "H&alpha;",
            "",
            "",
            "2p<sup>2</sup>",
            "<sup>3</sup>P&ndash;<sup>1</sup>D",
            "",
            "",
            "",
            "",
            "",
        ]);
        let line = normalize_row(&r, 1).unwrap();
        assert_eq!(line.ion, "Hα");
        assert_eq!(line.wavelength_original(), "6562.80");
        assert_eq!(line.configurations, "2p<sup>2</sup>");
        assert_eq!(line.terms, "<sup>3</sup>P&ndash;<sup>1</sup>D");
    }

    #[test]
    fn label_cells_are_decoded_once() {
        let r = row(&[
            "6716.44",
            "&lsqb;S&thinsp;II&rsqb;",
            "",
            "",
            "",
            "",
            "",
            "M1",
            "",
            "see &amp;lt;ref&amp;gt;",
            "A &amp; B",
        ]);
        let line = normalize_row(&r, 1).unwrap();
        assert_eq!(line.ion, "[S II]");
        assert_eq!(line.references, "see &lt;ref&gt;");
        assert_eq!(line.note, "A & B");
    }

    #[test]
    fn ids_are_dense_and_follow_wavelength() {
        let rows: Vec<Vec<String>> = [9000.5, 1200.0, 3000.0, 700.1, 5000.0, 3000.0]
            .iter()
            .map(|w| row(&[w.to_string().as_str(), "X", "", "", "", "", "", "", "", ""]))
            .collect();
        let (catalog, _) = normalize_rows(rows);
        let ids: Vec<u32> = catalog.lines().iter().map(|l| l.id()).collect();
        assert_eq!(ids, (1..=6).collect::<Vec<u32>>());
        assert!(catalog
            .lines()
            .windows(2)
            .all(|w| w[0].wavelength() <= w[1].wavelength()));
    }
}
