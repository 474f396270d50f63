use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use serde_json::Value as JsonValue;

use super::ingest;
use super::model::{EmissionLine, LineCatalog, LineRecord};
use super::normalize::normalize_rows;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a catalog from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – canonical catalog written by [`save_file`]
/// * `.json`    – canonical records `[{ "wavelength": ..., "ion": ... }, ...]`
///                or raw rows `[["1215.67", "Lyα", ...], ...]`
/// * `.html` / `.csv` / `.tsv` – raw source tables, normalized on load
pub fn load_file(path: &Path) -> Result<LineCatalog> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let catalog = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "html" | "htm" | "csv" | "tsv" | "tab" => {
            let rows = ingest::read_rows(path)?;
            normalize_rows(rows).0
        }
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::info!("Loaded {} from {}", catalog.stats(), path.display());
    Ok(catalog)
}

/// Persist a catalog as `.json` (pretty-printed records) or `.parquet`.
pub fn save_file(catalog: &LineCatalog, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => save_parquet(catalog, path)?,
        "json" => save_json(catalog, path)?,
        other => bail!("Unsupported output extension: .{other}"),
    }
    log::info!("Wrote {} lines to {}", catalog.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<LineCatalog> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    if ingest::is_row_array(&root) {
        let rows = ingest::json_rows(&root)?;
        return Ok(normalize_rows(rows).0);
    }
    catalog_from_json(root)
}

/// Build a catalog from an array of canonical records.
pub fn catalog_from_json(root: JsonValue) -> Result<LineCatalog> {
    let records = match root {
        JsonValue::Array(records) => records,
        _ => bail!("Expected top-level JSON array"),
    };

    let lines = records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| {
            serde_json::from_value::<EmissionLine>(rec)
                .with_context(|| format!("Record {i} is not a valid emission line"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LineCatalog::from_lines(lines))
}

fn save_json(catalog: &LineCatalog, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).context("creating JSON file")?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, catalog.lines()).context("writing JSON")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Column layout of a persisted catalog.
pub fn catalog_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("wavelength", DataType::Float64, false),
        Field::new("wavelength_original", DataType::Utf8, false),
        Field::new("is_vacuum", DataType::Boolean, false),
        Field::new("ion", DataType::Utf8, false),
        Field::new("energy_initial", DataType::Float64, true),
        Field::new("energy_final", DataType::Float64, true),
        Field::new("configurations", DataType::Utf8, false),
        Field::new("terms", DataType::Utf8, false),
        Field::new("j_transition", DataType::Utf8, false),
        Field::new("transition_type", DataType::Utf8, false),
        Field::new("ionization_potential", DataType::Float64, true),
        Field::new("references", DataType::Utf8, false),
        Field::new("note", DataType::Utf8, false),
    ]))
}

fn string_column<'a>(lines: &'a [EmissionLine], f: impl Fn(&'a EmissionLine) -> &'a str) -> Arc<dyn Array> {
    Arc::new(StringArray::from(lines.iter().map(f).collect::<Vec<_>>()))
}

fn optional_f64_column(lines: &[EmissionLine], f: impl Fn(&EmissionLine) -> Option<f64>) -> Arc<dyn Array> {
    Arc::new(Float64Array::from(lines.iter().map(f).collect::<Vec<_>>()))
}

fn catalog_to_batch(catalog: &LineCatalog) -> Result<RecordBatch> {
    let lines = catalog.lines();
    let columns: Vec<Arc<dyn Array>> = vec![
        Arc::new(Int64Array::from(
            lines.iter().map(|l| i64::from(l.id())).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            lines.iter().map(EmissionLine::wavelength).collect::<Vec<_>>(),
        )),
        string_column(lines, EmissionLine::wavelength_original),
        Arc::new(BooleanArray::from(
            lines.iter().map(EmissionLine::is_vacuum).collect::<Vec<_>>(),
        )),
        string_column(lines, |l| l.ion.as_str()),
        optional_f64_column(lines, |l| l.energy_initial),
        optional_f64_column(lines, |l| l.energy_final),
        string_column(lines, |l| l.configurations.as_str()),
        string_column(lines, |l| l.terms.as_str()),
        string_column(lines, |l| l.j_transition.as_str()),
        string_column(lines, |l| l.transition_type.as_str()),
        optional_f64_column(lines, |l| l.ionization_potential),
        string_column(lines, |l| l.references.as_str()),
        string_column(lines, |l| l.note.as_str()),
    ];
    RecordBatch::try_new(catalog_schema(), columns).context("building record batch")
}

fn save_parquet(catalog: &LineCatalog, path: &Path) -> Result<()> {
    let batch = catalog_to_batch(catalog)?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

// -- Parquet / Arrow helpers --

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .with_context(|| format!("Parquet file missing '{name}' column"))?
        .as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("Column '{name}' has unexpected type"))
}

fn optional_f64(col: &Float64Array, row: usize) -> Option<f64> {
    (!col.is_null(row)).then(|| col.value(row))
}

fn load_parquet(path: &Path) -> Result<LineCatalog> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut lines = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let id = column::<Int64Array>(&batch, "id")?;
        let wavelength = column::<Float64Array>(&batch, "wavelength")?;
        let wavelength_original = column::<StringArray>(&batch, "wavelength_original")?;
        let is_vacuum = column::<BooleanArray>(&batch, "is_vacuum")?;
        let ion = column::<StringArray>(&batch, "ion")?;
        let energy_initial = column::<Float64Array>(&batch, "energy_initial")?;
        let energy_final = column::<Float64Array>(&batch, "energy_final")?;
        let configurations = column::<StringArray>(&batch, "configurations")?;
        let terms = column::<StringArray>(&batch, "terms")?;
        let j_transition = column::<StringArray>(&batch, "j_transition")?;
        let transition_type = column::<StringArray>(&batch, "transition_type")?;
        let ionization_potential = column::<Float64Array>(&batch, "ionization_potential")?;
        let references = column::<StringArray>(&batch, "references")?;
        let note = column::<StringArray>(&batch, "note")?;

        for row in 0..batch.num_rows() {
            let record = LineRecord {
                id: u32::try_from(id.value(row)).unwrap_or(0),
                wavelength: wavelength.value(row),
                wavelength_original: Some(wavelength_original.value(row).to_string()),
                is_vacuum: Some(is_vacuum.value(row)),
                ion: ion.value(row).to_string(),
                energy_initial: optional_f64(energy_initial, row),
                energy_final: optional_f64(energy_final, row),
                configurations: configurations.value(row).to_string(),
                terms: terms.value(row).to_string(),
                j_transition: j_transition.value(row).to_string(),
                transition_type: transition_type.value(row).to_string(),
                ionization_potential: optional_f64(ionization_potential, row),
                references: references.value(row).to_string(),
                note: note.value(row).to_string(),
            };
            let line = EmissionLine::try_from(record)
                .with_context(|| format!("Row {row}: invalid emission line"))?;
            lines.push(line);
        }
    }

    Ok(LineCatalog::from_lines(lines))
}
