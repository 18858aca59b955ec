//! Tabular input and output
//!
//! Input tables are read positionally: column 0 is the place name, column 1
//! the latitude and column 2 the longitude. Column names are ignored.

pub mod input;
pub mod output;

pub use input::{TableError, read_locations, read_locations_file, read_names, read_names_file};
pub use output::{OutputFormat, write_locations, write_locations_file, write_records, write_records_file};
