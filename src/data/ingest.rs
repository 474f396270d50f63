use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::Value as JsonValue;

use super::normalize::{field, RawRow};
use super::text::collapse_whitespace;

// ---------------------------------------------------------------------------
// Source formats
// ---------------------------------------------------------------------------

/// Raw table layouts the ingestion step understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// A scraped web page; every `<tr>` of every table is a row.
    Html,
    Csv,
    Tsv,
    /// `[["1215.67", "Lyα", ...], ...]`
    Json,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(SourceFormat::Html),
            "csv" => Some(SourceFormat::Csv),
            "tsv" | "tab" => Some(SourceFormat::Tsv),
            "json" => Some(SourceFormat::Json),
            _ => None,
        }
    }
}

/// Read the data rows of a raw table file. Header rows are consumed here,
/// so every returned row is a candidate record.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let Some(format) = SourceFormat::from_path(path) else {
        bail!("Unsupported table file: {}", path.display());
    };
    let rows = match format {
        SourceFormat::Html => {
            let html = std::fs::read_to_string(path).context("reading HTML file")?;
            parse_html_rows(&html)?
        }
        SourceFormat::Csv | SourceFormat::Tsv => {
            let file = std::fs::File::open(path).context("opening delimited file")?;
            let delimiter = if format == SourceFormat::Tsv { b'\t' } else { b',' };
            parse_delimited_rows(file, delimiter)?
        }
        SourceFormat::Json => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
            json_rows(&root)?
        }
    };
    log::info!("read {} raw rows from {}", rows.len(), path.display());
    Ok(rows)
}

// ---------------------------------------------------------------------------
// HTML tables
// ---------------------------------------------------------------------------

/// Columns whose sub/superscript markup is kept in the cell text.
fn keeps_markup(column: usize) -> bool {
    matches!(
        column,
        field::CONFIGURATIONS | field::TERMS | field::J_TRANSITION
    )
}

fn tag_name(e: &BytesStart<'_>) -> Vec<u8> {
    e.local_name().as_ref().to_ascii_lowercase()
}

/// Cell being accumulated: text with tags dropped, plus a copy that keeps
/// sub/sup tags. Entity references stay encoded in both; the normalizer
/// resolves them once.
#[derive(Default)]
struct CellBuffer {
    text: String,
    markup: String,
}

#[derive(Default)]
struct TableScanner {
    rows: Vec<RawRow>,
    row: Option<RawRow>,
    cell: Option<CellBuffer>,
}

impl TableScanner {
    fn start_row(&mut self) {
        self.finish_row();
        self.row = Some(Vec::new());
    }

    fn start_cell(&mut self) {
        self.finish_cell();
        if self.row.is_none() {
            self.row = Some(Vec::new());
        }
        self.cell = Some(CellBuffer::default());
    }

    fn finish_cell(&mut self) {
        let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) else {
            return;
        };
        let value = if keeps_markup(row.len()) {
            collapse_whitespace(&cell.markup)
        } else {
            collapse_whitespace(&cell.text)
        };
        row.push(value);
    }

    fn finish_row(&mut self) {
        self.finish_cell();
        if let Some(row) = self.row.take() {
            if !row.is_empty() {
                self.rows.push(row);
            }
        }
    }

    fn text(&mut self, raw: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.text.push_str(raw);
            cell.markup.push_str(raw);
        }
    }

    fn markup(&mut self, tag: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.markup.push_str(tag);
        }
    }
}

/// Extract table rows from a scraped HTML page.
///
/// The first row of the document is the column header and is dropped.
/// Missing `</td>` / `</tr>` are tolerated, as browsers do. Cell text is
/// returned as written, entity references included.
pub fn parse_html_rows(html: &str) -> Result<Vec<RawRow>> {
    let mut reader = Reader::from_str(html);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
    }

    let mut scanner = TableScanner::default();
    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("parsing HTML at byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(e) => match tag_name(&e).as_slice() {
                b"tr" => scanner.start_row(),
                b"td" | b"th" => scanner.start_cell(),
                b"sub" => scanner.markup("<sub>"),
                b"sup" => scanner.markup("<sup>"),
                b"br" => scanner.text(" "),
                _ => {}
            },
            Event::Empty(e) => {
                if tag_name(&e) == b"br" {
                    scanner.text(" ");
                }
            }
            Event::End(e) => match e.local_name().as_ref().to_ascii_lowercase().as_slice() {
                b"td" | b"th" => scanner.finish_cell(),
                b"tr" | b"table" => scanner.finish_row(),
                b"sub" => scanner.markup("</sub>"),
                b"sup" => scanner.markup("</sup>"),
                _ => {}
            },
            Event::Text(t) => {
                let raw = reader.decoder().decode(&t).context("decoding HTML text")?;
                scanner.text(&raw);
            }
            Event::CData(t) => {
                let raw = String::from_utf8_lossy(&t);
                scanner.text(&raw);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    scanner.finish_row();

    let mut rows = scanner.rows;
    if !rows.is_empty() {
        rows.remove(0);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// CSV / TSV
// ---------------------------------------------------------------------------

/// Read delimited rows; the first line is a header and is skipped.
pub fn parse_delimited_rows<R: Read>(input: R, delimiter: u8) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    reader
        .records()
        .enumerate()
        .map(|(row_no, result)| {
            let record = result.with_context(|| format!("delimited row {row_no}"))?;
            Ok(record.iter().map(str::to_string).collect())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// JSON rows
// ---------------------------------------------------------------------------

/// Whether a parsed JSON document is an array of raw rows (rather than an
/// array of canonical records).
pub fn is_row_array(root: &JsonValue) -> bool {
    root.as_array()
        .and_then(|rows| rows.first())
        .is_some_and(JsonValue::is_array)
}

fn json_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// `[[cell, ...], ...]` with string, number, or null cells. No header row.
pub fn json_rows(root: &JsonValue) -> Result<Vec<RawRow>> {
    let rows = root.as_array().context("Expected top-level JSON array")?;
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let cells = row
                .as_array()
                .with_context(|| format!("Row {i} is not a JSON array"))?;
            Ok(cells.iter().map(json_cell).collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Emission lines</title></head>
<body>
<table border=1>
<tr><th>λ</th><th>Ion</th><th>Ei</th><th>Ek</th><th>Conf</th><th>Terms</th><th>J</th><th>Type</th><th>IP</th><th>Ref</th><th>Note</th></tr>
<tr><td>1215.67</td><td>Ly&alpha;</td><td>0.000</td><td>10.199</td><td>1s-2p</td><td><sup>2</sup>S-<sup>2</sup>P&deg;</td><td>1/2-3/2</td><td></td><td>13.598</td><td>NIST</td><td></td></tr>
<tr><td> 5006.843 </td><td>[O&nbsp;III]</td><td>2.514</td><td>0.014</td><td>2s<sup>2</sup>2p<sup>2</sup></td><td><sup>3</sup>P-<sup>1</sup>D</td><td>2-2</td><td>M1</td><td>35.12</td><td>Morton<br>1991</td><td>strong</td></tr>
<tr><td>bad</td><td>short row</td></tr>
</table>
</body></html>"#;

    #[test]
    fn html_rows_skip_header_and_decode_text() {
        let rows = parse_html_rows(PAGE).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], "1215.67");
        assert_eq!(rows[0][1], "Ly&alpha;");
        assert_eq!(rows[0][7], "");
        assert_eq!(rows[1][0], "5006.843");
        assert_eq!(rows[1][1], "[O&nbsp;III]");
        assert_eq!(rows[1][9], "Morton 1991");
        assert_eq!(rows[1][10], "strong");
        assert_eq!(rows[2].len(), 2);
    }

    #[test]
    fn html_cells_are_not_unescaped() {
        let html = "<table><tr><th>h</th></tr>\
                    <tr><td>4068.60</td><td>[S&thinsp;II]</td><td>see &amp;lt;ref&amp;gt;</td></tr></table>";
        let rows = parse_html_rows(html).unwrap();
        assert_eq!(rows[0][1], "[S&thinsp;II]");
        assert_eq!(rows[0][2], "see &amp;lt;ref&amp;gt;");
    }

    #[test]
    fn html_terms_keep_markup() {
        let rows = parse_html_rows(PAGE).unwrap();
        assert_eq!(rows[0][5], "<sup>2</sup>S-<sup>2</sup>P&deg;");
        assert_eq!(rows[1][4], "2s<sup>2</sup>2p<sup>2</sup>");
    }

    #[test]
    fn html_tolerates_unclosed_cells() {
        let html = "<table><tr><td>h<tr><td>1<td>2<td>3</table>";
        let rows = parse_html_rows(html).unwrap();
        assert_eq!(rows, vec![vec!["1".to_string(), "2".into(), "3".into()]]);
    }

    #[test]
    fn delimited_rows_skip_header() {
        let csv_text = "wl,ion,ei,ek,conf,terms,j,type,ip,ref\n\
                        1215.67,Lyα,,,,,,,13.6,Morton 1991\n\
                        6562.80, Hα ,,,,,,,,\n";
        let rows = parse_delimited_rows(csv_text.as_bytes(), b',').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 10);
        assert_eq!(rows[1][1], "Hα");

        let tsv_text = "wl\tion\n4861.33\tHβ\n";
        let rows = parse_delimited_rows(tsv_text.as_bytes(), b'\t').unwrap();
        assert_eq!(rows, vec![vec!["4861.33".to_string(), "Hβ".into()]]);
    }

    #[test]
    fn json_rows_accept_mixed_cells() {
        let root: JsonValue =
            serde_json::from_str(r#"[["1215.67", "Lyα", null, 10.2], [5006.84, "[O III]"]]"#).unwrap();
        assert!(is_row_array(&root));
        let rows = json_rows(&root).unwrap();
        assert_eq!(rows[0], vec!["1215.67", "Lyα", "", "10.2"]);
        assert_eq!(rows[1][0], "5006.84");
    }

    #[test]
    fn record_arrays_are_not_row_arrays() {
        let root: JsonValue = serde_json::from_str(r#"[{"wavelength": 1.0}]"#).unwrap();
        assert!(!is_row_array(&root));
        assert!(json_rows(&root).is_err());
    }

    #[test]
    fn formats_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("t.HTML")), Some(SourceFormat::Html));
        assert_eq!(SourceFormat::from_path(Path::new("t.tsv")), Some(SourceFormat::Tsv));
        assert_eq!(SourceFormat::from_path(Path::new("t.parquet")), None);
    }
}
