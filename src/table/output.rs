use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{EstablishmentRecord, GeocodedTable};

/// Serialization format for establishment records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values with a header row
    #[default]
    Csv,
    /// A single pretty-printed JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

/// Write records in the requested format, preserving their order
pub fn write_records<W: Write>(
    writer: W,
    records: &[EstablishmentRecord],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            if records.is_empty() {
                csv_writer.write_record(crate::domain::RECORD_COLUMNS)?;
            }
            for record in records {
                csv_writer
                    .serialize(record)
                    .context("Failed to write CSV record")?;
            }
            csv_writer.flush()?;
        }
        OutputFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, records)
                .context("Failed to write JSON output")?;
            writeln!(writer)?;
            writer.flush()?;
        }
        OutputFormat::Jsonl => {
            let mut writer = writer;
            for record in records {
                serde_json::to_writer(&mut writer, record)
                    .context("Failed to write JSON line")?;
                writeln!(writer)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

pub fn write_records_file(
    path: &Path,
    records: &[EstablishmentRecord],
    format: OutputFormat,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_records(BufWriter::new(file), records, format)
}

/// Write a geocoded table as `name,latitude,longitude` CSV
pub fn write_locations<W: Write>(writer: W, table: &GeocodedTable) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["name", "latitude", "longitude"])?;
    for location in table.locations() {
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        csv_writer.write_record([location.name.as_str(), latitude.as_str(), longitude.as_str()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_locations_file(path: &Path, table: &GeocodedTable) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create locations file: {}", path.display()))?;
    write_locations(BufWriter::new(file), table)
}
