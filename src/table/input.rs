use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

use crate::domain::Location;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {message}")]
    Row { line: u64, message: String },
}

/// Read one place name per line, skipping blank lines
pub fn read_names<R: Read>(reader: R) -> Result<Vec<String>, TableError> {
    let mut names = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

pub fn read_names_file(path: &Path) -> Result<Vec<String>, TableError> {
    read_names(open(path)?)
}

/// Read (name, latitude, longitude) rows from CSV.
///
/// Columns past the third are ignored. Rows keep file order.
pub fn read_locations<R: Read>(reader: R, has_headers: bool) -> Result<Vec<Location>, TableError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut locations = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        if row.len() < 3 {
            return Err(TableError::Row {
                line,
                message: format!("expected at least 3 columns, found {}", row.len()),
            });
        }

        let latitude = parse_float(&row[1], "latitude", line)?;
        let longitude = parse_float(&row[2], "longitude", line)?;
        locations.push(Location::new(&row[0], latitude, longitude));
    }

    Ok(locations)
}

pub fn read_locations_file(path: &Path, has_headers: bool) -> Result<Vec<Location>, TableError> {
    read_locations(open(path)?, has_headers)
}

fn parse_float(value: &str, column: &str, line: u64) -> Result<f64, TableError> {
    value.parse().map_err(|_| TableError::Row {
        line,
        message: format!("invalid {} '{}'", column, value),
    })
}

fn open(path: &Path) -> Result<File, TableError> {
    File::open(path).map_err(|source| TableError::Open {
        path: path.display().to_string(),
        source,
    })
}
