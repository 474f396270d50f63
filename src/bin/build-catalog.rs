use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use emission_lines::data::ingest::read_rows;
use emission_lines::data::loader::save_file;
use emission_lines::data::normalize::normalize_rows;

/// Turn a scraped emission line table into a canonical catalog file.
#[derive(Parser, Debug)]
#[command(name = "build-catalog", version, about)]
struct Args {
    /// Raw table (.html, .csv, .tsv, or .json array of rows)
    input: PathBuf,

    /// Output catalog (.json or .parquet)
    #[arg(short, long, default_value = "emission_lines.json")]
    output: PathBuf,

    /// Number of leading lines to print for verification
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rows = read_rows(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let (catalog, report) = normalize_rows(rows);
    if catalog.is_empty() {
        bail!(
            "No emission lines found in {} ({} rows, {} without wavelength)",
            args.input.display(),
            report.rows_seen,
            report.bad_wavelength
        );
    }

    println!(
        "Parsed {} emission lines ({} rows skipped)",
        catalog.len(),
        report.dropped()
    );

    save_file(&catalog, &args.output)?;
    println!("Written to {}", args.output.display());

    let stats = catalog.stats();
    println!("\nUnique ions: {}", stats.unique_ions);
    if let Some((lo, hi)) = stats.wavelength_range {
        println!("Wavelength range: {lo} - {hi} Å");
    }
    println!("Vacuum / air: {} / {}", stats.vacuum_count, stats.air_count);

    println!("\nFirst {} entries:", args.preview.min(catalog.len()));
    for line in catalog.lines().iter().take(args.preview) {
        println!("  {line}");
    }

    Ok(())
}
