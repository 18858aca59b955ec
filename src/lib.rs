//! muniplaces - Geocode municipalities and enumerate nearby establishments

pub mod api;
pub mod config;
pub mod domain;
pub mod logging;
pub mod pipeline;
pub mod table;

pub use domain::{Category, CategoryMap, EstablishmentRecord, GeocodedTable, Location};
pub use pipeline::{ErrorPolicy, enumerate, geocode_names};
